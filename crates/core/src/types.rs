//! Identifiers, scoring records and batch deltas shared by every layer.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Dense index of a user in the friendship and like relations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u32);

impl UserId {
    /// Position of this user in row/column space.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "u{}", self.0)
    }
}

/// Dense index of a comment. Comments are append-only and never renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(pub u32);

impl CommentId {
    /// Position of this comment in row/column space.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Creation time of a comment, in whole seconds since the Unix epoch.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Convert to a UTC datetime. Returns `None` when out of chrono's range.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.0, 0).single()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Timestamp(dt.timestamp())
    }
}

/// The unit of ranking and caching: `(score, timestamp, comment)`.
///
/// Ordering is the derived lexicographic order over the three fields, so a
/// *greater* record ranks *higher*: higher score first, then the newer
/// comment, then the higher comment id. Field order is load-bearing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScoringRecord {
    /// Non-negative score computed by the score function.
    pub score: u64,
    /// Creation time of the comment.
    pub timestamp: Timestamp,
    /// The comment this record belongs to.
    pub comment: CommentId,
}

impl ScoringRecord {
    /// Create a new record.
    pub fn new(score: u64, timestamp: Timestamp, comment: CommentId) -> Self {
        Self {
            score,
            timestamp,
            comment,
        }
    }

    /// Whether the score is exactly zero (never served from cache).
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.score == 0
    }
}

/// A new friendship between two users. Unordered: `(a, b)` equals `(b, a)`.
#[derive(Debug, Clone, Copy, Eq, Serialize, Deserialize)]
pub struct FriendEdge {
    /// One endpoint.
    pub a: UserId,
    /// The other endpoint.
    pub b: UserId,
}

impl FriendEdge {
    /// Create a friendship edge between two users.
    pub fn new(a: UserId, b: UserId) -> Self {
        Self { a, b }
    }

    /// Endpoints with the lower index first.
    pub fn normalized(&self) -> (UserId, UserId) {
        if self.a <= self.b {
            (self.a, self.b)
        } else {
            (self.b, self.a)
        }
    }

    /// Whether both endpoints name the same user.
    pub fn is_loop(&self) -> bool {
        self.a == self.b
    }
}

impl PartialEq for FriendEdge {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl Hash for FriendEdge {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized().hash(state);
    }
}

/// A user liking a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LikeEdge {
    /// The user giving the like.
    pub user: UserId,
    /// The liked comment.
    pub comment: CommentId,
}

impl LikeEdge {
    /// Create a like edge.
    pub fn new(user: UserId, comment: CommentId) -> Self {
        Self { user, comment }
    }
}

/// A comment created during a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NewComment {
    /// Identifier of the new comment.
    pub id: CommentId,
    /// When it was created.
    pub timestamp: Timestamp,
}

impl NewComment {
    /// Create a new-comment entry.
    pub fn new(id: CommentId, timestamp: Timestamp) -> Self {
        Self { id, timestamp }
    }
}

/// Everything added to the graph between two scoring rounds.
///
/// An empty delta is valid and means "nothing changed".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchDelta {
    /// New friendship pairs.
    #[serde(default)]
    pub friendships: Vec<FriendEdge>,
    /// New like edges.
    #[serde(default)]
    pub likes: Vec<LikeEdge>,
    /// New comments.
    #[serde(default)]
    pub comments: Vec<NewComment>,
}

impl BatchDelta {
    /// Create an empty delta.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a friendship pair.
    pub fn with_friendship(mut self, a: UserId, b: UserId) -> Self {
        self.friendships.push(FriendEdge::new(a, b));
        self
    }

    /// Add a like edge.
    pub fn with_like(mut self, user: UserId, comment: CommentId) -> Self {
        self.likes.push(LikeEdge::new(user, comment));
        self
    }

    /// Add a new comment.
    pub fn with_comment(mut self, id: CommentId, timestamp: Timestamp) -> Self {
        self.comments.push(NewComment::new(id, timestamp));
        self
    }

    /// True when the delta carries no mutation at all.
    pub fn is_empty(&self) -> bool {
        self.friendships.is_empty() && self.likes.is_empty() && self.comments.is_empty()
    }
}
