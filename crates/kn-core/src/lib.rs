//! `kn-core` — foundational types for the `kinetic_nn` moving-point index.
//!
//! This crate is a dependency of every other `kn-*` crate.  It intentionally
//! has no `kn-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `PointId`                                             |
//! | [`geo`]         | `Point2D`, unit-square helpers                        |
//! | [`point`]       | `MotionPoint`, `Mode`                                 |
//! | [`time`]        | `Timestamp`, `Clock`, `SystemClock`, `ManualClock`    |
//! | [`rng`]         | `SimRng` (velocity sampling)                          |
//! | [`config`]      | `MotionConfig`                                        |
//! | [`error`]       | `CoreError`, `CoreResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------------------------------------|
//! | `serde` | `Serialize`/`Deserialize` on public value types; needed to load `MotionConfig` from JSON. |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod point;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::MotionConfig;
pub use error::{CoreError, CoreResult};
pub use geo::Point2D;
pub use ids::PointId;
pub use point::{Mode, MotionPoint};
pub use rng::SimRng;
pub use time::{Clock, ManualClock, SystemClock, Timestamp};
