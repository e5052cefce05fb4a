//! Engine configuration.
//!
//! Use the builder-style setters, or load from TOML:
//!
//! ```
//! use toprank_core::{EngineConfig, ZeroScorePolicy};
//!
//! let cfg = EngineConfig::new().top_k(10).zero_scores(ZeroScorePolicy::Include);
//! assert_eq!(cfg.top_k, 10);
//!
//! let cfg = EngineConfig::from_toml_str("top_k = 5\nstrategy = \"full\"").unwrap();
//! assert_eq!(cfg.top_k, 5);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{TopRankError, TopRankResult};

/// Whether zero-score comments may appear in the ranked output.
///
/// Zero-score comments are always tracked and always rescored; this only
/// controls whether they are admitted into the top-K.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZeroScorePolicy {
    /// Leave zero-score comments out of the ranking (default).
    #[default]
    Exclude,
    /// Rank zero-score comments like any other.
    Include,
}

/// How each round after the first is scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Rescore only affected comments, reuse cached records for the rest.
    #[default]
    Incremental,
    /// Rescore every comment every round.
    Full,
}

/// Configuration for a ranking engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Capacity K of the ranked result.
    pub top_k: usize,
    /// Zero-score admission policy.
    pub zero_scores: ZeroScorePolicy,
    /// Round strategy.
    pub strategy: StrategyKind,
    /// Worker threads for the sparse set-algebra primitives.
    pub worker_threads: usize,
}

impl EngineConfig {
    /// Default result capacity.
    pub const DEFAULT_TOP_K: usize = 3;

    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the result capacity.
    pub fn top_k(mut self, k: usize) -> Self {
        self.top_k = k;
        self
    }

    /// Set the zero-score policy.
    pub fn zero_scores(mut self, policy: ZeroScorePolicy) -> Self {
        self.zero_scores = policy;
        self
    }

    /// Set the round strategy.
    pub fn strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the worker count for set-algebra primitives.
    pub fn worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads;
        self
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> TopRankResult<()> {
        if self.top_k == 0 {
            return Err(TopRankError::config("top_k must be at least 1"));
        }
        if self.worker_threads == 0 {
            return Err(TopRankError::config("worker_threads must be at least 1"));
        }
        Ok(())
    }

    /// Parse and validate a TOML document. Missing keys take defaults.
    pub fn from_toml_str(s: &str) -> TopRankResult<Self> {
        let cfg: EngineConfig =
            toml::from_str(s).map_err(|e| TopRankError::config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> TopRankResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            top_k: Self::DEFAULT_TOP_K,
            zero_scores: ZeroScorePolicy::Exclude,
            strategy: StrategyKind::Incremental,
            worker_threads: 1,
        }
    }
}
