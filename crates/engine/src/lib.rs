//! Ranking engine for TopRank.
//!
//! This crate turns a stream of graph batches into a ranked top-K of
//! comments, recomputing only what a batch can have changed:
//! - `affected`: finds the comments a batch may have changed
//! - `cache`: last scoring record per comment
//! - `score`: the [`ScoreFunction`] seam and [`FriendClusterScore`]
//! - `topk`: bounded min-heap accumulator
//! - `scheduler`: [`RankingEngine`], which runs initial and incremental rounds

#![warn(missing_docs)]

pub mod affected;
pub mod cache;
pub mod scheduler;
pub mod score;
pub mod topk;

pub use affected::{detect, AffectedSet};
pub use cache::ScoreCache;
pub use scheduler::{RankingEngine, RoundReport, RoundState};
pub use score::{rescore_all, FriendClusterScore, ScoreFunction};
pub use topk::TopK;
