//! Public types for the TopRank API.
//!
//! This module re-exports types from internal crates with a clean public interface.

// ============================================================================
// Public API types - these are what users should use
// ============================================================================

// Identifiers and time
pub use toprank_core::{CommentId, Timestamp, UserId};

// Ranking unit
pub use toprank_core::ScoringRecord;

// Batch mutations applied between rounds
pub use toprank_core::{BatchDelta, FriendEdge, LikeEdge, NewComment};

// Configuration
pub use toprank_core::{EngineConfig, StrategyKind, ZeroScorePolicy};

// Errors
pub use toprank_core::{TopRankError, TopRankResult};

// Round outcomes
pub use toprank_engine::{RoundReport, RoundState};
