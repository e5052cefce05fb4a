//! Round scheduler.
//!
//! Drives one initial full pass followed by any number of incremental
//! rounds, wiring the relation store, the affected-set detector, the score
//! cache and a fresh top-K accumulator together each round.
//!
//! # Round state machine
//!
//! ```text
//! Uninitialized --initial()--> Ready{round: 0} --update()--> Ready{round: n+1}
//! ```
//!
//! `load()` is only allowed while uninitialized; afterwards every graph
//! mutation must go through `update()` so the cache stays consistent.
//!
//! A batch rejected by the store leaves everything untouched. A round that
//! fails after the batch was applied keeps the previous result and forces
//! the next round onto a full pass, since the cache may no longer cover the
//! applied changes.

use toprank_core::{
    BatchDelta, CommentId, EngineConfig, ScoringRecord, StrategyKind, TopRankError, TopRankResult,
};
use toprank_storage::RelationStore;

use crate::affected::{detect, AffectedSet};
use crate::cache::ScoreCache;
use crate::score::{rescore_all, FriendClusterScore, ScoreFunction};
use crate::topk::TopK;

/// Where the engine is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundState {
    /// No round has run yet; the initial graph may still be loaded.
    Uninitialized,
    /// At least the initial round has run.
    Ready {
        /// Number of the last completed round (0 = initial).
        round: u64,
        /// Ranked records emitted by that round.
        last_result: Vec<ScoringRecord>,
    },
}

/// Outcome of one round, handed to the result consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundReport {
    /// Round number (0 = initial).
    pub round: u64,
    /// Ranked records, best first, at most K.
    pub records: Vec<ScoringRecord>,
    /// Comments the detector flagged (all comments on a full pass).
    pub affected: usize,
    /// Comments run through the score function this round.
    pub rescored: usize,
    /// Comments served unchanged from the cache.
    pub reused: usize,
}

impl RoundReport {
    /// Ranked comment ids, best first.
    pub fn comment_ids(&self) -> Vec<CommentId> {
        self.records.iter().map(|r| r.comment).collect()
    }
}

/// Maintains a ranked top-K of comments across batches of graph updates.
pub struct RankingEngine<S = FriendClusterScore> {
    config: EngineConfig,
    store: RelationStore,
    cache: ScoreCache,
    score_fn: S,
    state: RoundState,
    needs_full_pass: bool,
}

impl RankingEngine<FriendClusterScore> {
    /// Create an engine that ranks with [`FriendClusterScore`].
    pub fn with_default_score(config: EngineConfig) -> TopRankResult<Self> {
        Self::new(config, FriendClusterScore)
    }
}

impl<S: ScoreFunction> RankingEngine<S> {
    /// Create an engine over an empty relation store.
    pub fn new(config: EngineConfig, score_fn: S) -> TopRankResult<Self> {
        config.validate()?;
        let store = RelationStore::with_config(&config)?;
        Ok(Self::from_parts(config, store, score_fn))
    }

    /// Create an engine over an already populated relation store.
    ///
    /// The store's worker pool must match `config.worker_threads`.
    pub fn with_store(
        config: EngineConfig,
        store: RelationStore,
        score_fn: S,
    ) -> TopRankResult<Self> {
        config.validate()?;
        if store.worker_threads() != config.worker_threads {
            return Err(TopRankError::config(format!(
                "store runs {} worker threads, config asks for {}",
                store.worker_threads(),
                config.worker_threads
            )));
        }
        Ok(Self::from_parts(config, store, score_fn))
    }

    fn from_parts(config: EngineConfig, store: RelationStore, score_fn: S) -> Self {
        Self {
            config,
            store,
            cache: ScoreCache::new(),
            score_fn,
            state: RoundState::Uninitialized,
            needs_full_pass: false,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current relation store.
    pub fn store(&self) -> &RelationStore {
        &self.store
    }

    /// Current score cache.
    pub fn cache(&self) -> &ScoreCache {
        &self.cache
    }

    /// Lifecycle state.
    pub fn state(&self) -> &RoundState {
        &self.state
    }

    /// Last completed round, if any.
    pub fn round(&self) -> Option<u64> {
        match &self.state {
            RoundState::Uninitialized => None,
            RoundState::Ready { round, .. } => Some(*round),
        }
    }

    /// Ranked records of the last completed round, if any.
    pub fn last_result(&self) -> Option<&[ScoringRecord]> {
        match &self.state {
            RoundState::Uninitialized => None,
            RoundState::Ready { last_result, .. } => Some(last_result),
        }
    }

    // =========================================================================
    // Rounds
    // =========================================================================

    /// Append initial graph data before the initial round.
    pub fn load(&mut self, delta: &BatchDelta) -> TopRankResult<()> {
        if self.state != RoundState::Uninitialized {
            return Err(TopRankError::AlreadyInitialized);
        }
        self.store.apply(delta)
    }

    /// Run the initial round: score every comment, fill the cache, rank.
    pub fn initial(&mut self) -> TopRankResult<RoundReport> {
        if self.state != RoundState::Uninitialized {
            return Err(TopRankError::AlreadyInitialized);
        }
        let report = self.full_pass(0)?;
        self.finish(report)
    }

    /// Apply `delta` to the store and run one incremental round.
    pub fn update(&mut self, delta: &BatchDelta) -> TopRankResult<RoundReport> {
        let round = match &self.state {
            RoundState::Uninitialized => return Err(TopRankError::NotInitialized),
            RoundState::Ready { round, .. } => round + 1,
        };

        self.store.apply(delta)?;

        let full = self.needs_full_pass || self.config.strategy == StrategyKind::Full;
        let result = if full {
            self.full_pass(round)
        } else {
            self.incremental_pass(round, delta)
        };
        let report = result.and_then(|report| self.finish(report));
        match &report {
            Ok(_) => self.needs_full_pass = false,
            Err(e) => {
                tracing::warn!(
                    target: "toprank::engine",
                    round,
                    error = %e,
                    "Round failed after batch was applied; next round runs a full pass"
                );
                self.needs_full_pass = true;
            }
        }
        report
    }

    fn full_pass(&mut self, round: u64) -> TopRankResult<RoundReport> {
        let records = rescore_all(&self.score_fn, &self.store)?;
        let mut topk = self.fresh_topk();
        for record in &records {
            self.cache.put(*record);
            topk.insert(*record);
        }
        Ok(RoundReport {
            round,
            records: topk.finalize(),
            affected: records.len(),
            rescored: records.len(),
            reused: 0,
        })
    }

    fn incremental_pass(&mut self, round: u64, delta: &BatchDelta) -> TopRankResult<RoundReport> {
        let affected = detect(delta, &self.store)?;
        // zero scores are never served from cache
        let rescore = AffectedSet::from_ids(affected.iter().chain(self.cache.zero_scored()));

        let fresh: Vec<ScoringRecord> = rescore
            .iter()
            .map(|c| self.score_fn.score(c, &self.store))
            .collect::<TopRankResult<_>>()?;

        let mut topk = self.fresh_topk();
        let mut reused = 0usize;
        for cached in self.cache.reusable() {
            if !rescore.contains(cached.comment) {
                topk.insert(*cached);
                reused += 1;
            }
        }
        for record in &fresh {
            self.cache.put(*record);
            topk.insert(*record);
        }

        Ok(RoundReport {
            round,
            records: topk.finalize(),
            affected: affected.len(),
            rescored: fresh.len(),
            reused,
        })
    }

    fn fresh_topk(&self) -> TopK {
        TopK::new(self.config.top_k, self.config.zero_scores)
    }

    fn finish(&mut self, report: RoundReport) -> TopRankResult<RoundReport> {
        if report.records.len() > self.config.top_k {
            return Err(TopRankError::invariant(format!(
                "round {} produced {} records for top-{}",
                report.round,
                report.records.len(),
                self.config.top_k
            )));
        }

        tracing::info!(
            target: "toprank::engine",
            round = report.round,
            strategy = ?self.config.strategy,
            affected = report.affected,
            rescored = report.rescored,
            reused = report.reused,
            ranked = report.records.len(),
            "Round complete"
        );

        self.state = RoundState::Ready {
            round: report.round,
            last_result: report.records.clone(),
        };
        Ok(report)
    }
}
