//! Relation storage for TopRank.
//!
//! This crate holds the social graph the ranking engine reads:
//! - `matrix`: sparse boolean matrices/vectors and the LAND/LAND product
//! - `relation`: the append-only friendship, like and comment relations

pub mod matrix;
pub mod relation;

pub use matrix::{mxm_land_land, BoolMatrix, BoolVector};
pub use relation::RelationStore;
