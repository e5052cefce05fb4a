//! The relation store: friendships, likes and comments.
//!
//! All three relations are append-only. Users and comments are dense
//! indices; the user dimension grows with the largest user seen, the
//! comment dimension with the largest registered comment id.
//!
//! Likes are held in both orientations so the detector can read a user's
//! liked comments and the score function can read a comment's likers
//! without transposing on every query.

use std::fmt;

use rayon::ThreadPool;
use rustc_hash::FxHashSet;

use toprank_core::{
    BatchDelta, CommentId, EngineConfig, Timestamp, TopRankError, TopRankResult, UserId,
};

use crate::matrix::{mxm_land_land, BoolMatrix};

/// Incrementally growing friendship, like and comment relations.
pub struct RelationStore {
    /// users × users, symmetric.
    friends: BoolMatrix,
    /// users × comments.
    likes_by_user: BoolMatrix,
    /// comments × users, transpose of `likes_by_user`.
    likers: BoolMatrix,
    /// Creation time per comment index; `None` for unregistered slots.
    comments: Vec<Option<Timestamp>>,
    comment_count: usize,
    worker_threads: usize,
    pool: ThreadPool,
}

impl RelationStore {
    /// Create an empty store whose set-algebra primitives run on
    /// `worker_threads` threads.
    pub fn new(worker_threads: usize) -> TopRankResult<Self> {
        if worker_threads == 0 {
            return Err(TopRankError::relation("worker pool needs at least one thread"));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(worker_threads)
            .thread_name(|i| format!("toprank-worker-{}", i))
            .build()
            .map_err(|e| TopRankError::relation(format!("worker pool: {}", e)))?;

        Ok(Self {
            friends: BoolMatrix::default(),
            likes_by_user: BoolMatrix::default(),
            likers: BoolMatrix::default(),
            comments: Vec::new(),
            comment_count: 0,
            worker_threads,
            pool,
        })
    }

    /// Create an empty store sized by the engine configuration.
    pub fn with_config(config: &EngineConfig) -> TopRankResult<Self> {
        Self::new(config.worker_threads)
    }

    // =========================================================================
    // Dimensions
    // =========================================================================

    /// Size of the user dimension (largest user index seen + 1).
    pub fn user_count(&self) -> usize {
        self.friends.nrows()
    }

    /// Size of the comment dimension (largest comment id + 1).
    pub fn comment_dim(&self) -> usize {
        self.comments.len()
    }

    /// Number of registered comments.
    pub fn comment_count(&self) -> usize {
        self.comment_count
    }

    /// Number of friendship pairs.
    pub fn friendship_count(&self) -> usize {
        self.friends.nnz() / 2
    }

    /// Number of like edges.
    pub fn like_count(&self) -> usize {
        self.likes_by_user.nnz()
    }

    /// Worker threads used by the set-algebra primitives.
    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    // =========================================================================
    // Appends
    // =========================================================================

    /// Register a comment created at `timestamp`.
    pub fn add_comment(&mut self, id: CommentId, timestamp: Timestamp) -> TopRankResult<()> {
        if self.has_comment(id) {
            return Err(TopRankError::DuplicateComment(id));
        }
        self.grow_comments(id.index() + 1);
        self.comments[id.index()] = Some(timestamp);
        self.comment_count += 1;
        Ok(())
    }

    /// Add a friendship between `a` and `b`. Returns `false` if it existed.
    pub fn add_friendship(&mut self, a: UserId, b: UserId) -> TopRankResult<bool> {
        if a == b {
            return Err(TopRankError::SelfFriendship(a));
        }
        self.grow_users(a.index().max(b.index()) + 1);
        let added = self.friends.insert(a.index(), b.index())?;
        self.friends.insert(b.index(), a.index())?;
        Ok(added)
    }

    /// Record that `user` likes `comment`. Returns `false` if it existed.
    pub fn add_like(&mut self, user: UserId, comment: CommentId) -> TopRankResult<bool> {
        if !self.has_comment(comment) {
            return Err(TopRankError::UnknownComment { user, comment });
        }
        self.grow_users(user.index() + 1);
        let added = self.likes_by_user.insert(user.index(), comment.index())?;
        self.likers.insert(comment.index(), user.index())?;
        Ok(added)
    }

    /// Append a whole batch: comments first, then friendships, then likes,
    /// so a like may target a comment created in the same batch.
    ///
    /// The batch is validated before anything is written; a rejected batch
    /// leaves the store untouched.
    pub fn apply(&mut self, delta: &BatchDelta) -> TopRankResult<()> {
        self.validate(delta)?;

        for c in &delta.comments {
            self.add_comment(c.id, c.timestamp)?;
        }

        let mut repeated = 0usize;
        for f in &delta.friendships {
            if !self.add_friendship(f.a, f.b)? {
                repeated += 1;
            }
        }
        for l in &delta.likes {
            if !self.add_like(l.user, l.comment)? {
                repeated += 1;
            }
        }

        if repeated > 0 {
            tracing::warn!(
                target: "toprank::storage",
                repeated,
                "Batch repeated edges already present; ignored"
            );
        }
        tracing::debug!(
            target: "toprank::storage",
            comments = delta.comments.len(),
            friendships = delta.friendships.len(),
            likes = delta.likes.len(),
            users = self.user_count(),
            "Applied batch"
        );
        Ok(())
    }

    fn validate(&self, delta: &BatchDelta) -> TopRankResult<()> {
        let mut incoming: FxHashSet<CommentId> = FxHashSet::default();
        for c in &delta.comments {
            if self.has_comment(c.id) || !incoming.insert(c.id) {
                return Err(TopRankError::DuplicateComment(c.id));
            }
        }
        if let Some(f) = delta.friendships.iter().find(|f| f.is_loop()) {
            return Err(TopRankError::SelfFriendship(f.a));
        }
        for l in &delta.likes {
            if !self.has_comment(l.comment) && !incoming.contains(&l.comment) {
                return Err(TopRankError::UnknownComment {
                    user: l.user,
                    comment: l.comment,
                });
            }
        }
        Ok(())
    }

    fn grow_users(&mut self, users: usize) {
        if users > self.user_count() {
            self.friends.grow(users, users);
            self.likes_by_user.grow(users, self.comments.len());
            self.likers.grow(self.comments.len(), users);
        }
    }

    fn grow_comments(&mut self, comments: usize) {
        if comments > self.comments.len() {
            self.comments.resize(comments, None);
            let users = self.user_count();
            self.likes_by_user.grow(users, comments);
            self.likers.grow(comments, users);
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Whether `comment` has been registered.
    pub fn has_comment(&self, comment: CommentId) -> bool {
        matches!(self.comments.get(comment.index()), Some(Some(_)))
    }

    /// Creation time of `comment`, if registered.
    pub fn timestamp(&self, comment: CommentId) -> Option<Timestamp> {
        self.comments.get(comment.index()).copied().flatten()
    }

    /// Registered comment ids in ascending order.
    pub fn comment_ids(&self) -> impl Iterator<Item = CommentId> + '_ {
        self.comments
            .iter()
            .enumerate()
            .filter(|(_, ts)| ts.is_some())
            .map(|(i, _)| CommentId(i as u32))
    }

    /// Friends of `user`, ascending.
    pub fn friends_of(&self, user: UserId) -> impl Iterator<Item = UserId> + '_ {
        self.friends.row(user.index()).iter().map(|&u| UserId(u))
    }

    /// Whether `user` likes `comment`.
    pub fn likes(&self, user: UserId, comment: CommentId) -> bool {
        self.likes_by_user.contains(user.index(), comment.index())
    }

    /// Users who like `comment`, ascending.
    pub fn likers_of(&self, comment: CommentId) -> impl Iterator<Item = UserId> + '_ {
        self.likers.row(comment.index()).iter().map(|&u| UserId(u))
    }

    /// For each row of `incidence` (a selection of users), the comments
    /// liked by every selected user.
    ///
    /// `incidence` must be `n × user_count()`; the result is
    /// `n × comment_dim()`.
    pub fn co_liked(&self, incidence: &BoolMatrix) -> TopRankResult<BoolMatrix> {
        mxm_land_land(&self.pool, incidence, &self.likes_by_user)
    }
}

impl fmt::Debug for RelationStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelationStore")
            .field("users", &self.user_count())
            .field("comments", &self.comment_count)
            .field("friendships", &self.friendship_count())
            .field("likes", &self.like_count())
            .field("worker_threads", &self.worker_threads)
            .finish()
    }
}
