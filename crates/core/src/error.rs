//! Error type shared by every TopRank crate.
//!
//! Every variant is fatal for the round that produced it: the scheduler
//! never retries, and no partial top-K is published after an error.

use thiserror::Error;

use crate::types::{CommentId, UserId};

/// Result alias used across the workspace.
pub type TopRankResult<T> = Result<T, TopRankError>;

/// Errors raised by the relation store, the detector or the scheduler.
#[derive(Debug, Error)]
pub enum TopRankError {
    /// A sparse set-algebra primitive failed (bad dimensions, index out of
    /// range, worker pool construction).
    #[error("relation algebra error: {message}")]
    Relation {
        /// What went wrong.
        message: String,
    },

    /// A like edge referenced a comment that was never registered.
    #[error("like from {user} references unknown comment {comment}")]
    UnknownComment {
        /// The user giving the like.
        user: UserId,
        /// The missing comment.
        comment: CommentId,
    },

    /// A comment id was registered twice.
    #[error("comment {0} is already registered")]
    DuplicateComment(CommentId),

    /// A friendship whose two endpoints are the same user.
    #[error("user {0} cannot befriend themselves")]
    SelfFriendship(UserId),

    /// An incremental round was requested before the initial round.
    #[error("engine has not run its initial round")]
    NotInitialized,

    /// The initial round was requested twice.
    #[error("engine already ran its initial round")]
    AlreadyInitialized,

    /// An internal consistency check failed. Indicates a logic bug.
    #[error("invariant violated: {message}")]
    Invariant {
        /// The check that failed.
        message: String,
    },

    /// Configuration could not be parsed or failed validation.
    #[error("invalid configuration: {message}")]
    Config {
        /// Why the configuration was rejected.
        message: String,
    },

    /// Reading a configuration file failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl TopRankError {
    /// Build a [`TopRankError::Relation`].
    pub fn relation(message: impl Into<String>) -> Self {
        TopRankError::Relation {
            message: message.into(),
        }
    }

    /// Build a [`TopRankError::Invariant`].
    pub fn invariant(message: impl Into<String>) -> Self {
        TopRankError::Invariant {
            message: message.into(),
        }
    }

    /// Build a [`TopRankError::Config`].
    pub fn config(message: impl Into<String>) -> Self {
        TopRankError::Config {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_ids() {
        let err = TopRankError::UnknownComment {
            user: UserId(4),
            comment: CommentId(9),
        };
        assert_eq!(err.to_string(), "like from u4 references unknown comment c9");

        let err = TopRankError::DuplicateComment(CommentId(2));
        assert_eq!(err.to_string(), "comment c2 is already registered");
    }

    #[test]
    fn helper_constructors() {
        assert!(matches!(
            TopRankError::relation("dims"),
            TopRankError::Relation { .. }
        ));
        assert!(matches!(
            TopRankError::invariant("count"),
            TopRankError::Invariant { .. }
        ));
        assert_eq!(
            TopRankError::config("top_k must be at least 1").to_string(),
            "invalid configuration: top_k must be at least 1"
        );
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: TopRankError = io.into();
        assert!(matches!(err, TopRankError::Io(_)));
    }
}
