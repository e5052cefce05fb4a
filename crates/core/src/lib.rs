//! Core types for TopRank.
//!
//! This crate defines the vocabulary shared by the storage and engine
//! layers:
//! - [`UserId`], [`CommentId`], [`Timestamp`]: dense identifiers
//! - [`ScoringRecord`]: the `(score, timestamp, comment)` ranking unit
//! - [`BatchDelta`]: the mutations applied between two rounds
//! - [`TopRankError`]: the workspace error type
//! - [`EngineConfig`]: engine configuration

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod types;

pub use config::{EngineConfig, StrategyKind, ZeroScorePolicy};
pub use error::{TopRankError, TopRankResult};
pub use types::{
    BatchDelta, CommentId, FriendEdge, LikeEdge, NewComment, ScoringRecord, Timestamp, UserId,
};
