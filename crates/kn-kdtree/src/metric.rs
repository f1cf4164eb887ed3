//! Distance functions for the k-d tree.
//!
//! A metric supplies two things: the distance from a query vector to a
//! stored vector, and a *lower bound* on that distance for every vector
//! inside an axis-aligned box.  The tree prunes a subtree whenever the box
//! bound already exceeds the current search radius, so the bound must never
//! overestimate.

/// Pluggable distance over `D`-dimensional coordinate vectors.
///
/// The first argument of both methods is always the query vector.
pub trait Metric<const D: usize>: Send + Sync {
    /// Squared distance from query `q` to stored vector `p`.
    fn distance_2(&self, q: &[f64; D], p: &[f64; D]) -> f64;

    /// Lower bound of `distance_2(q, p)` over all `p` with
    /// `min[i] <= p[i] <= max[i]`.
    fn bounds_distance_2(&self, q: &[f64; D], min: &[f64; D], max: &[f64; D]) -> f64;

    /// Number of leading axes the tree may split on.
    fn split_axes(&self) -> usize {
        D
    }
}

/// Squared gap between `v` and the interval `[lo, hi]` (zero if inside).
#[inline]
fn interval_gap_2(v: f64, lo: f64, hi: f64) -> f64 {
    if v < lo {
        (lo - v) * (lo - v)
    } else if v > hi {
        (v - hi) * (v - hi)
    } else {
        0.0
    }
}

// ── SquaredEuclidean ──────────────────────────────────────────────────────────

/// Plain squared Euclidean distance over all axes.
#[derive(Copy, Clone, Debug, Default)]
pub struct SquaredEuclidean;

impl<const D: usize> Metric<D> for SquaredEuclidean {
    #[inline]
    fn distance_2(&self, q: &[f64; D], p: &[f64; D]) -> f64 {
        q.iter().zip(p).map(|(a, b)| (a - b) * (a - b)).sum()
    }

    fn bounds_distance_2(&self, q: &[f64; D], min: &[f64; D], max: &[f64; D]) -> f64 {
        (0..D).map(|i| interval_gap_2(q[i], min[i], max[i])).sum()
    }
}

// ── TimeTranslated ────────────────────────────────────────────────────────────

/// Squared Euclidean distance between two moving points after both are
/// extrapolated to the instant carried by the query.
///
/// Vectors are `(x, y, vx, vy, t)`: position at time `t` plus a constant
/// velocity.  Only the extrapolated `(x, y)` contribute to the distance.
#[derive(Copy, Clone, Debug, Default)]
pub struct TimeTranslated;

impl TimeTranslated {
    pub const X: usize = 0;
    pub const Y: usize = 1;
    pub const VX: usize = 2;
    pub const VY: usize = 3;
    pub const T: usize = 4;

    /// `(x, y)` of `v` at instant `at`.
    #[inline]
    pub fn extrapolate(v: &[f64; 5], at: f64) -> (f64, f64) {
        let dt = at - v[Self::T];
        (v[Self::X] + v[Self::VX] * dt, v[Self::Y] + v[Self::VY] * dt)
    }

    /// Range of `pos + vel * (at - t)` over the box.  The product term is
    /// bilinear in `(vel, t)`, so its extremes sit on the box corners.
    #[inline]
    fn swept_range(axis: usize, min: &[f64; 5], max: &[f64; 5], at: f64) -> (f64, f64) {
        let (v_lo, v_hi) = (min[axis + 2], max[axis + 2]);
        let (dt_lo, dt_hi) = (at - max[Self::T], at - min[Self::T]);
        let corners = [v_lo * dt_lo, v_lo * dt_hi, v_hi * dt_lo, v_hi * dt_hi];
        let lo = corners.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = corners.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        (min[axis] + lo, max[axis] + hi)
    }
}

impl Metric<5> for TimeTranslated {
    #[inline]
    fn distance_2(&self, q: &[f64; 5], p: &[f64; 5]) -> f64 {
        let at = q[Self::T];
        let (qx, qy) = Self::extrapolate(q, at);
        let (px, py) = Self::extrapolate(p, at);
        (qx - px) * (qx - px) + (qy - py) * (qy - py)
    }

    fn bounds_distance_2(&self, q: &[f64; 5], min: &[f64; 5], max: &[f64; 5]) -> f64 {
        let at = q[Self::T];
        let (qx, qy) = Self::extrapolate(q, at);
        let (x_lo, x_hi) = Self::swept_range(Self::X, min, max, at);
        let (y_lo, y_hi) = Self::swept_range(Self::Y, min, max, at);
        interval_gap_2(qx, x_lo, x_hi) + interval_gap_2(qy, y_lo, y_hi)
    }

    /// Only `x` and `y` are split.
    fn split_axes(&self) -> usize {
        2
    }
}
