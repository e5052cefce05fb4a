//! Per-comment score cache.
//!
//! Holds the last scoring record computed for every comment. Entries are
//! overwritten on rescoring and never evicted; comment ids are never reused.

use rustc_hash::FxHashMap;

use toprank_core::{CommentId, ScoringRecord};

/// Last computed scoring record per comment.
#[derive(Debug, Clone, Default)]
pub struct ScoreCache {
    entries: FxHashMap<CommentId, ScoringRecord>,
}

impl ScoreCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached record for `comment`, if it was ever scored.
    pub fn get(&self, comment: CommentId) -> Option<&ScoringRecord> {
        self.entries.get(&comment)
    }

    /// Store `record`, replacing any previous record for the same comment.
    /// Returns the replaced record.
    pub fn put(&mut self, record: ScoringRecord) -> Option<ScoringRecord> {
        self.entries.insert(record.comment, record)
    }

    /// Number of cached comments.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records that may be served from cache: every nonzero record.
    pub fn reusable(&self) -> impl Iterator<Item = &ScoringRecord> {
        self.entries.values().filter(|r| !r.is_zero())
    }

    /// Comments whose cached score is zero, ascending. These are always
    /// recomputed instead of being served from cache.
    pub fn zero_scored(&self) -> Vec<CommentId> {
        let mut ids: Vec<CommentId> = self
            .entries
            .values()
            .filter(|r| r.is_zero())
            .map(|r| r.comment)
            .collect();
        ids.sort_unstable();
        ids
    }
}
