//! Ranking Engine Integration Tests
//!
//! These tests drive the engine end-to-end through its public API:
//! - Initial and incremental rounds on a hand-built scenario
//! - Empty-delta idempotence and zero-score refresh
//! - Cache contents after incremental rounds
//! - Incremental vs full rescoring on random batch streams
//! - Affected-set soundness against brute-force rescoring

use proptest::prelude::*;
use rustc_hash::FxHashMap;
use tempfile::TempDir;
use toprank_core::{
    BatchDelta, CommentId, EngineConfig, ScoringRecord, StrategyKind, Timestamp, TopRankError,
    UserId, ZeroScorePolicy,
};
use toprank_engine::{detect, rescore_all, FriendClusterScore, RankingEngine};
use toprank_storage::RelationStore;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn c(id: u32) -> CommentId {
    CommentId(id)
}

fn u(id: u32) -> UserId {
    UserId(id)
}

/// Brute-force ranking: score everything, sort, drop zeros, truncate.
fn brute_force(store: &RelationStore, k: usize) -> Vec<ScoringRecord> {
    let mut records: Vec<ScoringRecord> = rescore_all(&FriendClusterScore, store)
        .unwrap()
        .into_iter()
        .filter(|r| !r.is_zero())
        .collect();
    records.sort_unstable_by(|a, b| b.cmp(a));
    records.truncate(k);
    records
}

fn scores_by_comment(store: &RelationStore) -> FxHashMap<CommentId, ScoringRecord> {
    rescore_all(&FriendClusterScore, store)
        .unwrap()
        .into_iter()
        .map(|r| (r.comment, r))
        .collect()
}

// ============================================================================
// Scenario tests
// ============================================================================

/// Test: single comment gains a like, then an irrelevant friendship arrives
#[test]
fn test_single_comment_scenario() {
    init_tracing();
    let mut engine = RankingEngine::with_default_score(EngineConfig::default()).unwrap();
    engine
        .load(&BatchDelta::new().with_comment(c(0), Timestamp(100)))
        .unwrap();

    // Round 0: nobody likes c0, zero scores are excluded from the ranking
    let initial = engine.initial().unwrap();
    assert!(initial.records.is_empty());
    assert_eq!(engine.cache().get(c(0)).unwrap().score, 0);

    // Round 1: direct like
    let like = BatchDelta::new().with_like(u(0), c(0));
    let r1 = engine.update(&like).unwrap();
    assert_eq!(r1.affected, 1);
    assert_eq!(r1.comment_ids(), vec![c(0)]);
    let cached = *engine.cache().get(c(0)).unwrap();
    assert!(cached.score > 0);

    // Round 2: u1 likes c0 (applied in a separate batch), then u1 befriends u2
    let r2 = engine
        .update(&BatchDelta::new().with_like(u(1), c(0)))
        .unwrap();
    assert_eq!(r2.records[0].score, 2);

    // u2 does not like c0, so the friendship cannot change its score
    let friendship = BatchDelta::new().with_friendship(u(1), u(2));
    let r3 = engine.update(&friendship).unwrap();
    assert_eq!(r3.affected, 0);
    assert_eq!(r3.rescored, 0);
    assert_eq!(r3.reused, 1);
    assert_eq!(r3.records, r2.records);
}

/// Test: same scenario with zero scores included in the ranking
#[test]
fn test_single_comment_scenario_zero_included() {
    let cfg = EngineConfig::new().zero_scores(ZeroScorePolicy::Include);
    let mut engine = RankingEngine::with_default_score(cfg).unwrap();
    engine
        .load(&BatchDelta::new().with_comment(c(0), Timestamp(100)))
        .unwrap();

    let initial = engine.initial().unwrap();
    assert_eq!(initial.records, vec![ScoringRecord::new(0, Timestamp(100), c(0))]);

    let r1 = engine
        .update(&BatchDelta::new().with_like(u(0), c(0)))
        .unwrap();
    assert_eq!(r1.records, vec![ScoringRecord::new(1, Timestamp(100), c(0))]);
}

/// Test: a friendship merging two liker clusters lifts the comment to the top
#[test]
fn test_friendship_merges_clusters() {
    init_tracing();
    let mut engine = RankingEngine::with_default_score(EngineConfig::default()).unwrap();
    engine
        .load(
            &BatchDelta::new()
                .with_comment(c(0), Timestamp(1))
                .with_comment(c(1), Timestamp(2))
                .with_comment(c(2), Timestamp(3))
                .with_comment(c(3), Timestamp(4))
                // c0: likers 0,1,2,3 with no friendships -> 4
                .with_like(u(0), c(0))
                .with_like(u(1), c(0))
                .with_like(u(2), c(0))
                .with_like(u(3), c(0))
                // c1: likers 4,5 friends -> 4
                .with_like(u(4), c(1))
                .with_like(u(5), c(1))
                .with_friendship(u(4), u(5))
                // c2: one liker -> 1
                .with_like(u(6), c(2))
                // c3: two likers -> 2
                .with_like(u(7), c(3))
                .with_like(u(8), c(3)),
        )
        .unwrap();

    let initial = engine.initial().unwrap();
    // c0 and c1 tie on score, c1 is newer
    assert_eq!(initial.comment_ids(), vec![c(1), c(0), c(3)]);

    // merging {0,1} and {2,3} gives c0 2^2 + 2^2 = 8
    let r1 = engine
        .update(
            &BatchDelta::new()
                .with_friendship(u(0), u(1))
                .with_friendship(u(2), u(3)),
        )
        .unwrap();
    assert_eq!(r1.affected, 1);
    assert_eq!(r1.records[0], ScoringRecord::new(8, Timestamp(1), c(0)));
    assert_eq!(r1.comment_ids(), vec![c(0), c(1), c(3)]);

    // one more edge joins everything into a single cluster of 4
    let r2 = engine
        .update(&BatchDelta::new().with_friendship(u(1), u(2)))
        .unwrap();
    assert_eq!(r2.records[0].score, 16);
}

/// Test: new comments beyond K push weaker ones out
#[test]
fn test_new_comments_displace_weaker_ones() {
    let cfg = EngineConfig::new().top_k(2);
    let mut engine = RankingEngine::with_default_score(cfg).unwrap();
    engine
        .load(
            &BatchDelta::new()
                .with_comment(c(0), Timestamp(1))
                .with_comment(c(1), Timestamp(2))
                .with_like(u(0), c(0))
                .with_like(u(0), c(1)),
        )
        .unwrap();
    assert_eq!(engine.initial().unwrap().comment_ids(), vec![c(1), c(0)]);

    let r1 = engine
        .update(
            &BatchDelta::new()
                .with_comment(c(2), Timestamp(3))
                .with_like(u(1), c(2))
                .with_like(u(2), c(2)),
        )
        .unwrap();
    assert_eq!(r1.comment_ids(), vec![c(2), c(1)]);
    assert_eq!(r1.affected, 1);
    assert_eq!(r1.reused, 2);
}

// ============================================================================
// Round properties
// ============================================================================

/// Test: an empty delta reproduces the previous ranking
#[test]
fn test_empty_delta_is_idempotent() {
    let mut engine = RankingEngine::with_default_score(EngineConfig::default()).unwrap();
    engine
        .load(
            &BatchDelta::new()
                .with_comment(c(0), Timestamp(5))
                .with_comment(c(1), Timestamp(6))
                .with_comment(c(2), Timestamp(7))
                .with_like(u(0), c(1))
                .with_like(u(1), c(1))
                .with_like(u(2), c(2)),
        )
        .unwrap();
    let initial = engine.initial().unwrap();

    for round in 1..=3 {
        let report = engine.update(&BatchDelta::new()).unwrap();
        assert_eq!(report.round, round);
        assert_eq!(report.affected, 0);
        assert_eq!(report.records, initial.records);
    }
}

/// Test: zero-scored comments are recomputed even when nothing touches them
#[test]
fn test_zero_scores_refreshed_every_round() {
    let mut engine = RankingEngine::with_default_score(EngineConfig::default()).unwrap();
    engine
        .load(
            &BatchDelta::new()
                .with_comment(c(0), Timestamp(1))
                .with_comment(c(1), Timestamp(2))
                .with_like(u(0), c(1)),
        )
        .unwrap();
    engine.initial().unwrap();

    let report = engine
        .update(&BatchDelta::new().with_friendship(u(3), u(4)))
        .unwrap();
    assert_eq!(report.affected, 0);
    assert_eq!(report.rescored, 1);
    assert_eq!(report.reused, 1);
}

/// Test: cache after an incremental round matches fresh scores everywhere
#[test]
fn test_cache_matches_fresh_scores() {
    let mut engine = RankingEngine::with_default_score(EngineConfig::default()).unwrap();
    engine
        .load(
            &BatchDelta::new()
                .with_comment(c(0), Timestamp(1))
                .with_comment(c(1), Timestamp(2))
                .with_like(u(0), c(0))
                .with_like(u(1), c(0))
                .with_like(u(1), c(1)),
        )
        .unwrap();
    engine.initial().unwrap();
    let before = *engine.cache().get(c(1)).unwrap();

    engine
        .update(&BatchDelta::new().with_friendship(u(0), u(1)))
        .unwrap();

    // c1 was not affected and keeps its record
    assert_eq!(*engine.cache().get(c(1)).unwrap(), before);
    for (id, fresh) in scores_by_comment(engine.store()) {
        assert_eq!(engine.cache().get(id), Some(&fresh));
    }
    assert_eq!(engine.cache().get(c(0)).unwrap().score, 4);
}

/// Test: errors surface as the right variants
#[test]
fn test_error_states() {
    let mut engine = RankingEngine::with_default_score(EngineConfig::default()).unwrap();
    assert!(matches!(
        engine.update(&BatchDelta::new()),
        Err(TopRankError::NotInitialized)
    ));
    engine.initial().unwrap();
    assert!(matches!(engine.initial(), Err(TopRankError::AlreadyInitialized)));

    let dup = BatchDelta::new()
        .with_comment(c(0), Timestamp(1))
        .with_comment(c(0), Timestamp(2));
    assert!(matches!(
        engine.update(&dup),
        Err(TopRankError::DuplicateComment(id)) if id == c(0)
    ));

    let self_loop = BatchDelta::new().with_friendship(u(2), u(2));
    assert!(matches!(
        engine.update(&self_loop),
        Err(TopRankError::SelfFriendship(user)) if user == u(2)
    ));

    // rejected batches leave the store untouched
    assert_eq!(engine.store().comment_count(), 0);
    assert_eq!(engine.round(), Some(0));
}

/// Test: engine configured from a TOML file on disk
#[test]
fn test_engine_from_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("toprank.toml");
    std::fs::write(
        &path,
        "top_k = 1\nzero_scores = \"exclude\"\nstrategy = \"full\"\nworker_threads = 2\n",
    )
    .unwrap();

    let cfg = EngineConfig::from_file(&path).unwrap();
    let mut engine = RankingEngine::with_default_score(cfg).unwrap();
    assert_eq!(engine.store().worker_threads(), 2);
    engine
        .load(
            &BatchDelta::new()
                .with_comment(c(0), Timestamp(1))
                .with_comment(c(1), Timestamp(2))
                .with_like(u(0), c(0))
                .with_like(u(1), c(1)),
        )
        .unwrap();
    assert_eq!(engine.initial().unwrap().comment_ids(), vec![c(1)]);
}

// ============================================================================
// Randomized checks
// ============================================================================

const USERS: u32 = 8;

/// Raw material for one batch; turned into a valid delta by `build_delta`.
#[derive(Debug, Clone)]
struct RawBatch {
    comments: Vec<i64>,
    likes: Vec<(u32, u32)>,
    friendships: Vec<(u32, u32)>,
}

fn raw_batch() -> impl Strategy<Value = RawBatch> {
    (
        prop::collection::vec(0i64..4, 0..3),
        prop::collection::vec((0..USERS, any::<u32>()), 0..5),
        prop::collection::vec((0..USERS, 0..USERS), 0..4),
    )
        .prop_map(|(comments, likes, friendships)| RawBatch {
            comments,
            likes,
            friendships,
        })
}

/// Assign fresh comment ids and point likes at existing comments only.
fn build_delta(raw: &RawBatch, next_comment: &mut u32) -> BatchDelta {
    let mut delta = BatchDelta::new();
    for ts in &raw.comments {
        delta = delta.with_comment(c(*next_comment), Timestamp(*ts));
        *next_comment += 1;
    }
    if *next_comment > 0 {
        for (user, pick) in &raw.likes {
            delta = delta.with_like(u(*user), c(pick % *next_comment));
        }
    }
    for (a, b) in &raw.friendships {
        if a != b {
            delta = delta.with_friendship(u(*a), u(*b));
        }
    }
    delta
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Incremental rounds rank exactly like brute-force rescoring.
    #[test]
    fn prop_incremental_matches_brute_force(
        initial in raw_batch(),
        batches in prop::collection::vec(raw_batch(), 1..6),
        k in 1usize..5,
    ) {
        let mut next = 0u32;
        let mut engine = RankingEngine::with_default_score(EngineConfig::new().top_k(k)).unwrap();
        engine.load(&build_delta(&initial, &mut next)).unwrap();
        let report = engine.initial().unwrap();
        prop_assert_eq!(&report.records, &brute_force(engine.store(), k));

        for raw in &batches {
            let delta = build_delta(raw, &mut next);
            let report = engine.update(&delta).unwrap();
            prop_assert!(report.records.len() <= k);
            prop_assert!(report.records.windows(2).all(|w| w[0] > w[1]));
            prop_assert_eq!(&report.records, &brute_force(engine.store(), k));
        }
    }

    /// Incremental and full strategies emit the same rankings.
    #[test]
    fn prop_strategies_agree(
        batches in prop::collection::vec(raw_batch(), 1..6),
    ) {
        let mut incremental = RankingEngine::with_default_score(EngineConfig::default()).unwrap();
        let mut full = RankingEngine::with_default_score(
            EngineConfig::new().strategy(StrategyKind::Full).worker_threads(3),
        )
        .unwrap();
        incremental.initial().unwrap();
        full.initial().unwrap();

        let mut next = 0u32;
        for raw in &batches {
            let delta = build_delta(raw, &mut next);
            let a = incremental.update(&delta).unwrap();
            let b = full.update(&delta).unwrap();
            prop_assert_eq!(a.records, b.records);
        }
    }

    /// Every comment whose score changes is detected, and nothing else
    /// outside the structural candidates is.
    #[test]
    fn prop_affected_set_sound_and_minimal(
        initial in raw_batch(),
        raw in raw_batch(),
    ) {
        let mut next = 0u32;
        let mut store = RelationStore::new(2).unwrap();
        store.apply(&build_delta(&initial, &mut next)).unwrap();
        let before = scores_by_comment(&store);

        let delta = build_delta(&raw, &mut next);
        store.apply(&delta).unwrap();
        let after = scores_by_comment(&store);
        let affected = detect(&delta, &store).unwrap();

        for (id, record) in &after {
            if before.get(id) != Some(record) {
                prop_assert!(affected.contains(*id), "missed changed comment {}", id);
            }
        }

        for id in affected.iter() {
            let is_new = delta.comments.iter().any(|n| n.id == id);
            let gained_like = delta.likes.iter().any(|l| l.comment == id);
            let both_like = delta
                .friendships
                .iter()
                .any(|f| store.likes(f.a, id) && store.likes(f.b, id));
            prop_assert!(is_new || gained_like || both_like, "spurious comment {}", id);
        }
    }
}
