//! Simulator observer trait for progress reporting and instrumentation.

use kn_core::{MotionPoint, PointId, Timestamp};

use crate::TickOutcome;

/// Callbacks invoked by [`MotionSimulator::tick`][crate::MotionSimulator::tick].
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.  Callbacks run on the simulator's thread
/// with the index lock released.
///
/// # Example — tick counter
///
/// ```rust,ignore
/// struct Counter { completed: usize }
///
/// impl TickObserver for Counter {
///     fn on_tick_end(&mut self, _now: Timestamp, outcome: &TickOutcome) {
///         if matches!(outcome, TickOutcome::Completed { .. }) {
///             self.completed += 1;
///         }
///     }
/// }
/// ```
pub trait TickObserver {
    /// Called after the snapshot, before any point is moved.
    fn on_tick_start(&mut self, _now: Timestamp, _points: usize) {}

    /// Called after each point is written back, lock released.
    fn on_point_moved(&mut self, _id: PointId, _state: &MotionPoint) {}

    /// Called when the rebuild policy fired.
    fn on_regenerate(&mut self, _removed: usize, _live: usize) {}

    /// Called once per tick with its outcome (including skipped ticks).
    fn on_tick_end(&mut self, _now: Timestamp, _outcome: &TickOutcome) {}
}

/// A [`TickObserver`] that does nothing.
pub struct NoopObserver;

impl TickObserver for NoopObserver {}
