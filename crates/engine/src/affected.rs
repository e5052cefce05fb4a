//! Affected-set detection.
//!
//! Given the relation store *after* a batch has been applied and the batch
//! itself, find every comment whose score may have changed:
//!
//! - every new comment, and the comment of every new like (direct);
//! - every comment liked by *both* endpoints of a new friendship
//!   (transitive: the friendship can merge liker clusters of that comment).
//!
//! The friendship step is sparse set algebra: the new friendships become an
//! incidence matrix (one row per edge, two marked users per row), which is
//! multiplied against the user × comment like relation under LAND/LAND and
//! OR-reduced into a single comment vector.

use toprank_core::{BatchDelta, CommentId, FriendEdge, TopRankError, TopRankResult};
use toprank_storage::{BoolMatrix, BoolVector, RelationStore};

/// Sorted, deduplicated comment ids that must be rescored this round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AffectedSet {
    ids: Vec<CommentId>,
}

impl AffectedSet {
    /// The empty set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from arbitrary ids; sorts and deduplicates.
    pub fn from_ids(ids: impl IntoIterator<Item = CommentId>) -> Self {
        let mut ids: Vec<CommentId> = ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        Self { ids }
    }

    /// Logarithmic membership test.
    pub fn contains(&self, comment: CommentId) -> bool {
        self.ids.binary_search(&comment).is_ok()
    }

    /// Number of affected comments.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether nothing needs rescoring.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Ids in ascending order.
    pub fn as_slice(&self) -> &[CommentId] {
        &self.ids
    }

    /// Iterate ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = CommentId> + '_ {
        self.ids.iter().copied()
    }
}

/// Compute the affected set for `delta` against the post-update `store`.
pub fn detect(delta: &BatchDelta, store: &RelationStore) -> TopRankResult<AffectedSet> {
    if delta.is_empty() {
        return Ok(AffectedSet::empty());
    }

    let dim = store.comment_dim();

    // new comments and comments with new likes are always re-evaluated
    let direct = delta
        .likes
        .iter()
        .map(|l| l.comment.index())
        .chain(delta.comments.iter().map(|c| c.id.index()));
    let mut affected = BoolVector::build(dim, direct)?;
    let direct_count = affected.nvals();

    if !delta.friendships.is_empty() {
        let incidence = friendship_incidence(&delta.friendships, store.user_count())?;
        // row j: comments liked by both endpoints of friendship j
        let per_edge = store.co_liked(&incidence)?;
        check_shape(&per_edge, delta.friendships.len(), dim)?;
        affected.lor_assign(&per_edge.lor_reduce())?;
    }

    let declared = affected.nvals();
    let ids: Vec<CommentId> = affected.iter().map(CommentId).collect();
    if let Some(missing) = ids.iter().find(|c| !store.has_comment(**c)) {
        return Err(TopRankError::invariant(format!(
            "affected comment {} is not registered",
            missing
        )));
    }

    tracing::debug!(
        target: "toprank::engine",
        direct = direct_count,
        via_friendship = declared - direct_count,
        friendships = delta.friendships.len(),
        "Detected affected comments"
    );

    Ok(AffectedSet { ids })
}

/// The co-liked product must keep one row per friendship over the full
/// comment dimension.
fn check_shape(per_edge: &BoolMatrix, edges: usize, dim: usize) -> TopRankResult<()> {
    if per_edge.nrows() != edges || per_edge.ncols() != dim {
        return Err(TopRankError::invariant(format!(
            "co-liked product is {}x{}, expected {}x{}",
            per_edge.nrows(),
            per_edge.ncols(),
            edges,
            dim
        )));
    }
    Ok(())
}

/// One row per friendship, with its two endpoint users marked.
fn friendship_incidence(edges: &[FriendEdge], users: usize) -> TopRankResult<BoolMatrix> {
    let cells = edges
        .iter()
        .enumerate()
        .flat_map(|(row, e)| [(row, e.a.index()), (row, e.b.index())]);
    BoolMatrix::build(edges.len(), users, cells)
}
