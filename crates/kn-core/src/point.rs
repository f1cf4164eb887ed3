//! The moving-point entity and the two index encodings.

use crate::{Point2D, Timestamp};

// ── Mode ──────────────────────────────────────────────────────────────────────

/// Coordinate-encoding scheme of an index instance.
///
/// The two coordinate spaces are incompatible; an index holds exactly one.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mode {
    /// `(x, y)`.
    #[default]
    Static,
    /// `(x, y, vx, vy, origin_time)`.
    VelocityAugmented,
}

impl Mode {
    /// Index dimensionality for this encoding.
    #[inline]
    pub fn dimensions(self) -> usize {
        match self {
            Mode::Static => 2,
            Mode::VelocityAugmented => 5,
        }
    }

    #[inline]
    pub fn is_moving(self) -> bool {
        matches!(self, Mode::VelocityAugmented)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Static => f.write_str("static"),
            Mode::VelocityAugmented => f.write_str("velocity-augmented"),
        }
    }
}

// ── MotionPoint ───────────────────────────────────────────────────────────────

/// A point with an optional linear motion.
///
/// `(x, y)` is the position *at* `origin_time`.  While a point moves its
/// current position is never stored; it is always derived with
/// [`position_at`](Self::position_at).  In static mode `vx`, `vy` and
/// `origin_time` are zero.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotionPoint {
    pub x: f64,
    pub y: f64,
    /// Domain units per millisecond.
    pub vx: f64,
    pub vy: f64,
    pub origin_time: Timestamp,
}

impl MotionPoint {
    /// A point that never moves.
    #[inline]
    pub const fn stationary(x: f64, y: f64) -> Self {
        Self { x, y, vx: 0.0, vy: 0.0, origin_time: Timestamp::ZERO }
    }

    #[inline]
    pub const fn moving(x: f64, y: f64, vx: f64, vy: f64, origin_time: Timestamp) -> Self {
        Self { x, y, vx, vy, origin_time }
    }

    /// The stationary point at the domain centre.  Substituted for any
    /// state that would otherwise carry non-finite numbers.
    #[inline]
    pub const fn centered(origin_time: Timestamp) -> Self {
        Self::moving(0.5, 0.5, 0.0, 0.0, origin_time)
    }

    #[inline]
    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    /// Extrapolated position at `now`.
    #[inline]
    pub fn position_at(&self, now: Timestamp) -> Point2D {
        let dt = now.since(self.origin_time) as f64;
        Point2D::new(self.x + self.vx * dt, self.y + self.vy * dt)
    }

    /// Same motion, re-anchored at `now`.
    #[inline]
    pub fn advanced_to(&self, now: Timestamp) -> MotionPoint {
        let p = self.position_at(now);
        MotionPoint { x: p.x, y: p.y, origin_time: now, ..*self }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.vx.is_finite() && self.vy.is_finite()
    }

    // ── Index encodings ───────────────────────────────────────────────────

    #[inline]
    pub fn static_coords(&self) -> [f64; 2] {
        [self.x, self.y]
    }

    #[inline]
    pub fn moving_coords(&self) -> [f64; 5] {
        [self.x, self.y, self.vx, self.vy, self.origin_time.as_f64()]
    }

    pub fn from_static_coords(c: [f64; 2]) -> Self {
        Self::stationary(c[0], c[1])
    }

    pub fn from_moving_coords(c: [f64; 5]) -> Self {
        Self::moving(c[0], c[1], c[2], c[3], Timestamp::from_f64(c[4]))
    }
}
