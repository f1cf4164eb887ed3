//! `kn-kdtree` — the spatial-index primitive.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                     |
//! |------------|--------------------------------------------------------------|
//! | [`metric`] | `Metric` trait, `SquaredEuclidean`, `TimeTranslated`         |
//! | [`tree`]   | `KdTree<D, M, T>` — insert, move, regenerate, node traversal |
//! | [`query`]  | k-nearest-neighbour search (`KdTree::nearest`)               |
//! | [`error`]  | `KdError`, `KdResult<T>`                                     |
//!
//! # Soft deletes
//!
//! Moving a point never touches the tree structure above its old leaf: the
//! old entry is flagged dead and a new entry is inserted along the normal
//! descent path.  Dead entries are skipped by queries and counted in
//! [`KdTree::removal_count`]; [`KdTree::regenerate`] drops them and bulk
//! builds a balanced tree.  The caller decides when that is worth it.
//!
//! # Correctness of pruning
//!
//! Queries prune only on node bounding boxes through
//! [`Metric::bounds_distance_2`], never on split planes.  Split values only
//! steer where new entries land, so any partition is a valid tree and
//! metrics whose distance is not a plain coordinate norm (time translation)
//! stay exact as long as their box bound is a true lower bound.

pub mod error;
pub mod metric;
pub mod query;
pub mod tree;


pub use error::{KdError, KdResult};
pub use metric::{Metric, SquaredEuclidean, TimeTranslated};
pub use query::Neighbour;
pub use tree::{KdTree, MovingTree, NodeBounds, StaticTree};
