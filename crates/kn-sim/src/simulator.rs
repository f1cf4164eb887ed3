//! The `MotionSimulator` and its per-tick algorithm.

use std::sync::Arc;

use tracing::{debug, warn};

use kn_core::{Clock, MotionConfig, MotionPoint, Point2D, SimRng, Timestamp};

use crate::{SharedIndex, TickObserver};

/// Result of one simulator tick.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The index was static; nothing moves and the loop should stop.
    Skipped,
    /// Every snapshotted point was moved.
    Completed { moved: usize, regenerated: bool },
    /// The index was replaced mid-tick; `moved` points were written to the
    /// old index before that was noticed, the rest were dropped.
    Abandoned { moved: usize },
}

/// Advances every moving point once per tick.
///
/// # Per-tick algorithm
///
/// 1. Snapshot the live set (one lock).
/// 2. For each point (one lock each, identity re-checked first):
///    - extrapolate to `now`;
///    - outside `[0,1]²` → velocity points back at the domain centre at the
///      inbound speed; inside → fresh random velocity;
///    - write back with `move_point`, anchored at `now`.
/// 3. Rebuild if soft deletes exceed `rebuild_ratio × live` (one lock).
pub struct MotionSimulator {
    rng:        SimRng,
    clock:      Arc<dyn Clock>,
    resolution: f64,
    inbound:    f64,
}

impl MotionSimulator {
    pub fn new(config: &MotionConfig, clock: Arc<dyn Clock>) -> Self {
        // Offset the seed so a seeded run does not replay the adapter's
        // layout sequence as velocities.
        let rng = SimRng::from_seed_opt(config.seed.map(|s| s.wrapping_add(1)));
        Self {
            rng,
            clock,
            resolution: config.speed_resolution_ms,
            inbound:    config.inbound_speed(),
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Run one tick against `shared` at instant `now`.
    pub fn tick<O: TickObserver>(
        &mut self,
        shared:   &SharedIndex,
        now:      Timestamp,
        observer: &mut O,
    ) -> TickOutcome {
        let (identity, snapshot) = {
            let index = shared.lock();
            if !index.mode().is_moving() {
                drop(index);
                observer.on_tick_end(now, &TickOutcome::Skipped);
                return TickOutcome::Skipped;
            }
            (index.identity(), index.export())
        };
        observer.on_tick_start(now, snapshot.len());

        let mut moved = 0;
        for (id, point) in snapshot {
            let mut index = shared.lock();
            if index.identity() != identity {
                drop(index);
                return self.abandon(now, moved, observer);
            }
            let next = self.next_state(&point, now);
            let written = index.move_point(id, next);
            drop(index);
            if let Err(e) = written {
                warn!(%id, error = %e, "failed to move point");
                continue;
            }
            moved += 1;
            observer.on_point_moved(id, &next);
        }

        let regenerated = {
            let mut index = shared.lock();
            if index.identity() != identity {
                drop(index);
                return self.abandon(now, moved, observer);
            }
            if index.needs_regenerate() {
                let (removed, live) = (index.removal_count(), index.live_count());
                index.regenerate();
                drop(index);
                observer.on_regenerate(removed, live);
                true
            } else {
                false
            }
        };

        let outcome = TickOutcome::Completed { moved, regenerated };
        debug!(%now, moved, regenerated, "motion tick complete");
        observer.on_tick_end(now, &outcome);
        outcome
    }

    fn abandon<O: TickObserver>(&self, now: Timestamp, moved: usize, observer: &mut O) -> TickOutcome {
        debug!(%now, moved, "index replaced mid-tick; abandoning");
        let outcome = TickOutcome::Abandoned { moved };
        observer.on_tick_end(now, &outcome);
        outcome
    }

    /// New state for `p` at `now`: current position plus a new velocity.
    ///
    /// Any non-finite intermediate yields the motionless centre point.
    pub fn next_state(&mut self, p: &MotionPoint, now: Timestamp) -> MotionPoint {
        let here = p.position_at(now);
        if !here.is_finite() {
            return MotionPoint::centered(now);
        }

        let velocity = if here.in_unit_square() {
            Some((self.rng.speed(self.resolution), self.rng.speed(self.resolution)))
        } else {
            bounce_velocity(here, self.inbound)
        };

        match velocity {
            Some((vx, vy)) => MotionPoint::moving(here.x, here.y, vx, vy, now),
            None => MotionPoint::centered(now),
        }
    }
}

/// Velocity of magnitude `speed` pointing from `here` to the domain centre.
///
/// This is a radial return, not a reflection off the crossed edge.  `None`
/// if the direction is undefined or overflows.
pub fn bounce_velocity(here: Point2D, speed: f64) -> Option<(f64, f64)> {
    let dx = here.x - Point2D::CENTER.x;
    let dy = here.y - Point2D::CENTER.y;
    let norm = dx.hypot(dy);
    let vx = -dx / norm * speed;
    let vy = -dy / norm * speed;
    (vx.is_finite() && vy.is_finite()).then_some((vx, vy))
}
