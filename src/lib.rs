//! TopRank: incremental top-K comment ranking over an evolving social graph.
//!
//! Users befriend each other, write comments and like comments. After every
//! batch of such mutations the engine emits the K best comments, rescoring
//! only the comments the batch could have changed.
//!
//! ```no_run
//! use toprank::prelude::*;
//!
//! # fn main() -> TopRankResult<()> {
//! let mut engine = RankingEngine::with_default_score(EngineConfig::default())?;
//! engine.load(&BatchDelta::new().with_comment(CommentId(0), Timestamp(1)))?;
//! engine.initial()?;
//!
//! let report = engine.update(&BatchDelta::new().with_like(UserId(0), CommentId(0)))?;
//! assert_eq!(report.comment_ids(), vec![CommentId(0)]);
//! # Ok(())
//! # }
//! ```

pub mod types;

pub use toprank_engine::{FriendClusterScore, RankingEngine, ScoreFunction};
pub use toprank_storage::RelationStore;
pub use types::*;

/// Everything needed to drive an engine.
pub mod prelude {
    pub use crate::types::*;
    pub use crate::{FriendClusterScore, RankingEngine, RelationStore, ScoreFunction};
}
