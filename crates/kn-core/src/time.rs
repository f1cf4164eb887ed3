//! Time model.
//!
//! # Design
//!
//! Time is an integer millisecond count since the Unix epoch, wrapped in
//! [`Timestamp`].  Velocities are expressed in normalised domain units per
//! millisecond, so extrapolation is a single multiply-add:
//!
//!   pos(t) = pos + vel * (t - origin_time)
//!
//! Using an integer timestamp keeps "elapsed time" exact and lets the
//! 5-D index encoding carry it losslessly in an `f64` coordinate (epoch
//! milliseconds stay well below 2^53).
//!
//! The wall clock is reached only through the [`Clock`] trait so tests and
//! deterministic demos can drive time by hand with [`ManualClock`].

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

// ── Timestamp ────────────────────────────────────────────────────────────────

/// An absolute instant in milliseconds since the Unix epoch.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0);

    /// Milliseconds elapsed from `earlier` to `self`.  Negative if `earlier`
    /// is in the future; saturates instead of overflowing.
    #[inline]
    pub fn since(self, earlier: Timestamp) -> i64 {
        self.0.saturating_sub(earlier.0)
    }

    /// Return the instant `ms` milliseconds after `self`.
    #[inline]
    pub fn offset(self, ms: i64) -> Timestamp {
        Timestamp(self.0.saturating_add(ms))
    }

    /// The timestamp as an index coordinate.
    #[inline]
    pub fn as_f64(self) -> f64 {
        self.0 as f64
    }

    /// Recover a timestamp from an index coordinate.  Non-finite input maps
    /// to [`Timestamp::ZERO`].
    #[inline]
    pub fn from_f64(v: f64) -> Timestamp {
        if v.is_finite() { Timestamp(v.round() as i64) } else { Timestamp::ZERO }
    }
}

impl std::ops::Add<i64> for Timestamp {
    type Output = Timestamp;
    #[inline]
    fn add(self, rhs: i64) -> Timestamp {
        self.offset(rhs)
    }
}

impl std::ops::Sub for Timestamp {
    type Output = i64;
    #[inline]
    fn sub(self, rhs: Timestamp) -> i64 {
        self.since(rhs)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

// ── Clock ─────────────────────────────────────────────────────────────────────

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time via `SystemTime`.
#[derive(Copy, Clone, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(d) => Timestamp(d.as_millis() as i64),
            // Host clock set before 1970.
            Err(e) => Timestamp(-(e.duration().as_millis() as i64)),
        }
    }
}

/// A settable clock shared between clones.
///
/// Every clone observes the same instant, so a test can hand one clone to
/// the index and keep another to advance time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self { now: Arc::new(AtomicI64::new(start.0)) }
    }

    pub fn set(&self, t: Timestamp) {
        self.now.store(t.0, Ordering::SeqCst);
    }

    /// Move the clock forward by `ms` and return the new instant.
    pub fn advance(&self, ms: i64) -> Timestamp {
        Timestamp(self.now.fetch_add(ms, Ordering::SeqCst) + ms)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.now.load(Ordering::SeqCst))
    }
}
