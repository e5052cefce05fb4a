//! Score functions.
//!
//! A score function turns one comment and the current relation store into a
//! scoring record. It must be deterministic for a given store state and must
//! not mutate anything the engine can observe.

use toprank_core::{CommentId, ScoringRecord, TopRankError, TopRankResult, UserId};
use toprank_storage::RelationStore;

/// Computes the scoring record of a single comment.
pub trait ScoreFunction {
    /// Score `comment` against `store`.
    fn score(&self, comment: CommentId, store: &RelationStore) -> TopRankResult<ScoringRecord>;
}

impl<F> ScoreFunction for F
where
    F: Fn(CommentId, &RelationStore) -> TopRankResult<ScoringRecord>,
{
    fn score(&self, comment: CommentId, store: &RelationStore) -> TopRankResult<ScoringRecord> {
        self(comment, store)
    }
}

/// Scores every registered comment, in ascending id order.
pub fn rescore_all<S: ScoreFunction + ?Sized>(
    score_fn: &S,
    store: &RelationStore,
) -> TopRankResult<Vec<ScoringRecord>> {
    store
        .comment_ids()
        .map(|c| score_fn.score(c, store))
        .collect()
}

/// Friend-cluster score.
///
/// Take the users who like the comment and connect two of them when they
/// are friends. The score is the sum, over the connected components of that
/// graph, of the squared component size. A comment nobody likes scores 0;
/// `n` likers with no friendships among them score `n`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FriendClusterScore;

impl ScoreFunction for FriendClusterScore {
    fn score(&self, comment: CommentId, store: &RelationStore) -> TopRankResult<ScoringRecord> {
        let timestamp = store.timestamp(comment).ok_or_else(|| {
            TopRankError::invariant(format!("scored unregistered comment {}", comment))
        })?;

        // ascending, so positions can be found by binary search
        let likers: Vec<UserId> = store.likers_of(comment).collect();
        let mut clusters = DisjointSet::new(likers.len());
        for (i, &user) in likers.iter().enumerate() {
            for friend in store.friends_of(user) {
                if let Ok(j) = likers.binary_search(&friend) {
                    clusters.union(i, j);
                }
            }
        }

        let score = clusters
            .component_sizes()
            .into_iter()
            .map(|size| (size as u64) * (size as u64))
            .sum();

        Ok(ScoringRecord::new(score, timestamp, comment))
    }
}

/// Union-find with path halving and union by size.
struct DisjointSet {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (mut ra, mut rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        if self.size[ra] < self.size[rb] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb] = ra;
        self.size[ra] += self.size[rb];
    }

    /// Sizes of all components (one entry per root).
    fn component_sizes(&mut self) -> Vec<usize> {
        let roots: Vec<usize> = (0..self.parent.len())
            .filter(|&x| self.find(x) == x)
            .collect();
        roots.into_iter().map(|root| self.size[root]).collect()
    }
}
