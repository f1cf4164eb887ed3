//! `kn-sim` — motion, queries, and scheduling over a shared index.
//!
//! # Three contexts, one lock
//!
//! ```text
//!   render path ──┐   (once per frame: QueryEngine::frame, one lock)
//!                 │
//!   motion loop ──┼──► SharedIndex = Arc<Mutex<IndexAdapter>>
//!                 │   (every tick_interval: lock per point, identity re-check)
//!   user actions ─┘   (reseed / toggle motion: one lock per action)
//! ```
//!
//! A simulator tick snapshots the live set, then re-locks for every point.
//! If the index identity changed in between (reseed, mode switch), the rest
//! of the tick is dropped silently.  Stopping motion is a switch back to
//! `Static`; the loop notices on its next cycle and does not reschedule.
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | Display extrapolation on Rayon's thread pool.          |
//! | `serde`    | Derives on core value types.                           |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use kn_core::{MotionConfig, SystemClock};
//! use kn_sim::{Canvas, NoopSink, Scene};
//!
//! let mut scene = Scene::new(MotionConfig::default(), Arc::new(SystemClock), Canvas::new(800.0, 600.0))?;
//! scene.reseed(500)?;
//! scene.start_motion()?;
//! scene.render(&mut NoopSink)?;
//! ```

pub mod error;
pub mod frame;
pub mod observer;
pub mod params;
pub mod query;
pub mod scene;
pub mod scheduler;
pub mod shared;
pub mod simulator;

#[cfg(test)]
mod tests;

pub use error::{SimError, SimResult};
pub use frame::{Frame, FrameSink, NoopSink, OverlayRect, PaletteColor, grid_overlay};
pub use observer::{NoopObserver, TickObserver};
pub use params::{Canvas, ParamValidity, QueryParams};
pub use query::{DisplayPoint, QueryEngine, QueryResult};
pub use scene::Scene;
pub use scheduler::MotionLoop;
pub use shared::SharedIndex;
pub use simulator::{MotionSimulator, TickOutcome};
