//! `IndexAdapter` — owns the live index, its mode, and the encoding rules.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use kn_core::{Clock, Mode, MotionConfig, MotionPoint, Point2D, PointId, SimRng, Timestamp};

use crate::{IndexError, IndexResult, Match, ModeTree, NodeRect};

/// Generation number of the live index.
///
/// Bumped every time the index is replaced (reseed, effective mode switch).
/// Anything holding point ids from an earlier identity must treat them as
/// dead.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct IndexIdentity(pub u64);

impl IndexIdentity {
    #[inline]
    fn next(self) -> IndexIdentity {
        IndexIdentity(self.0 + 1)
    }
}

impl fmt::Display for IndexIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen{}", self.0)
    }
}

/// Owner of the single live spatial index.
///
/// Not internally synchronised; wrap it in a mutex to share between the
/// render path, the simulator, and user actions.
pub struct IndexAdapter {
    tree:     ModeTree,
    identity: IndexIdentity,
    config:   MotionConfig,
    clock:    Arc<dyn Clock>,
    rng:      SimRng,
}

impl IndexAdapter {
    /// An empty static index.
    pub fn new(config: MotionConfig, clock: Arc<dyn Clock>) -> IndexResult<Self> {
        config.validate()?;
        Ok(Self {
            tree:     ModeTree::empty(Mode::Static, config.bucket_capacity),
            identity: IndexIdentity::default(),
            rng:      SimRng::from_seed_opt(config.seed),
            config,
            clock,
        })
    }

    // ── Inspection ────────────────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.tree.mode()
    }

    pub fn identity(&self) -> IndexIdentity {
        self.identity
    }

    pub fn live_count(&self) -> usize {
        self.tree.len()
    }

    pub fn removal_count(&self) -> usize {
        self.tree.removal_count()
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// The adapter's notion of "now".
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn tree(&self) -> &ModeTree {
        &self.tree
    }

    pub fn get(&self, id: PointId) -> Option<&MotionPoint> {
        self.tree.get(id)
    }

    // ── Reconfiguration ───────────────────────────────────────────────────

    /// Replace the index with `count` uniformly random points in `mode`.
    ///
    /// Moving points also get a random velocity and `origin_time = now`.
    ///
    /// # Errors
    ///
    /// [`IndexError::InvalidCount`] if `count` is negative or exceeds the id
    /// space.  The current index is left untouched.
    pub fn seed(&mut self, count: i64, mode: Mode) -> IndexResult<()> {
        if count < 0 || count > i64::from(u32::MAX) {
            return Err(IndexError::InvalidCount(count));
        }

        let now = self.clock.now();
        let resolution = self.config.speed_resolution_ms;
        let points: Vec<MotionPoint> = (0..count)
            .map(|_| {
                let (x, y) = (self.rng.unit(), self.rng.unit());
                match mode {
                    Mode::Static => MotionPoint::stationary(x, y),
                    Mode::VelocityAugmented => {
                        let (vx, vy) = (self.rng.speed(resolution), self.rng.speed(resolution));
                        MotionPoint::moving(x, y, vx, vy, now)
                    }
                }
            })
            .collect();

        self.replace(mode, points)?;
        info!(count, %mode, identity = %self.identity, "seeded point set");
        Ok(())
    }

    /// Re-encode every live point for `target` and rebuild.
    ///
    /// Static → moving assigns each point a fresh random velocity anchored
    /// at now.  Moving → static freezes each point where it is now.  No-op
    /// when already in `target`.  Returns the resulting mode.
    pub fn switch_mode(&mut self, target: Mode) -> IndexResult<Mode> {
        if self.mode() == target {
            return Ok(target);
        }

        let now = self.clock.now();
        let resolution = self.config.speed_resolution_ms;
        let points: Vec<MotionPoint> = self
            .tree
            .export()
            .into_iter()
            .map(|(_, p)| match target {
                Mode::VelocityAugmented => MotionPoint::moving(
                    p.x,
                    p.y,
                    self.rng.speed(resolution),
                    self.rng.speed(resolution),
                    now,
                ),
                Mode::Static => {
                    let here = p.position_at(now);
                    MotionPoint::stationary(here.x, here.y)
                }
            })
            .collect();

        let count = points.len();
        self.replace(target, points)?;
        info!(count, mode = %target, identity = %self.identity, "switched index mode");
        Ok(target)
    }

    fn replace(&mut self, mode: Mode, points: Vec<MotionPoint>) -> IndexResult<()> {
        let now = self.clock.now();
        let points = points.into_iter().map(|p| sanitize(p, now)).collect();
        self.tree = ModeTree::bulk_load(mode, self.config.bucket_capacity, points)?;
        self.identity = self.identity.next();
        Ok(())
    }

    // ── Incremental mutation ──────────────────────────────────────────────

    /// Insert one point, encoded for the current mode.
    pub fn add(&mut self, point: MotionPoint) -> IndexResult<PointId> {
        let point = sanitize(point, self.clock.now());
        Ok(self.tree.insert(point)?)
    }

    /// Replace the state of a live point.  The old coordinate stays behind
    /// as a soft delete until the next [`regenerate`](Self::regenerate).
    ///
    /// # Errors
    ///
    /// [`IndexError::Tree`] if `id` is not live in the current index.
    pub fn move_point(&mut self, id: PointId, state: MotionPoint) -> IndexResult<()> {
        let state = sanitize(state, self.clock.now());
        Ok(self.tree.move_point(id, state)?)
    }

    /// Snapshot of all live points.
    pub fn export(&self) -> Vec<(PointId, MotionPoint)> {
        self.tree.export()
    }

    /// Drop soft deletes and rebalance.  No-op if there are none.
    pub fn regenerate(&mut self) {
        let removed = self.tree.removal_count();
        if removed == 0 {
            return;
        }
        self.tree.regenerate();
        debug!(removed, live = self.tree.len(), height = self.tree.height(), "regenerated index");
    }

    /// `true` once soft deletes exceed `rebuild_ratio × live`.
    pub fn needs_regenerate(&self) -> bool {
        self.tree.removal_count() > self.config.rebuild_ratio.saturating_mul(self.tree.len())
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Up to `k` points nearest `reference` at `now`, nearest first.
    pub fn nearest(
        &self,
        reference:      Point2D,
        k:              usize,
        max_distance_2: Option<f64>,
        now:            Timestamp,
    ) -> Vec<Match> {
        self.tree.nearest(reference, now, k, max_distance_2)
    }

    /// Node rectangles in pre-order, in display space at `now`.
    pub fn node_rects(&self, now: Timestamp) -> Vec<NodeRect> {
        self.tree.node_rects(now)
    }
}

/// Replace any state carrying NaN or infinity with a motionless point at
/// the domain centre.
fn sanitize(p: MotionPoint, now: Timestamp) -> MotionPoint {
    if p.is_finite() {
        return p;
    }
    warn!(?p, "non-finite point state replaced with domain centre");
    MotionPoint::centered(now)
}
