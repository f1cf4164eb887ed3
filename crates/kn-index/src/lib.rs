//! `kn-index` — the mode-aware index adapter.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                     |
//! |-------------|--------------------------------------------------------------|
//! | [`adapter`] | `IndexAdapter` — seed, switch_mode, add, move, export, query |
//! | [`tree`]    | `ModeTree` — one live k-d tree in either encoding            |
//! | [`error`]   | `IndexError`, `IndexResult<T>`                               |
//!
//! # Encodings
//!
//! | Mode                | Coordinates                    | Metric             |
//! |---------------------|--------------------------------|--------------------|
//! | `Static`            | `(x, y)`                       | `SquaredEuclidean` |
//! | `VelocityAugmented` | `(x, y, vx, vy, origin_time)`  | `TimeTranslated`   |
//!
//! The adapter is the only place that knows both encodings; everything above
//! it deals in [`MotionPoint`](kn_core::MotionPoint) and
//! [`Point2D`](kn_core::Point2D).

pub mod adapter;
pub mod error;
pub mod tree;


pub use adapter::{IndexAdapter, IndexIdentity};
pub use error::{IndexError, IndexResult};
pub use tree::{Match, ModeTree, NodeRect};
