//! Motion and index policy configuration.
//!
//! Typically built with `MotionConfig::default()` or loaded from a JSON file
//! by the application crate (`serde` feature) and handed to the index
//! adapter and simulator.

use std::time::Duration;

use crate::{CoreError, CoreResult};

/// Policy constants for seeding, motion, and rebuild.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MotionConfig {
    /// Interval between simulator ticks.  Default: 1000 ms.
    pub tick_interval_ms: u64,

    /// Milliseconds per unit of random speed.  A random velocity component is
    /// `(u - 0.5) / speed_resolution_ms` with `u ∈ [0,1)`, so at the default
    /// of 2000 a point drifts at most a quarter of the domain per second.
    pub speed_resolution_ms: f64,

    /// Inbound speed after a boundary bounce is
    /// `1 / (speed_resolution_ms * inbound_speed_divisor)`.  Default: 1.5.
    pub inbound_speed_divisor: f64,

    /// Rebuild when soft-deleted entries exceed `rebuild_ratio × live`.
    /// Default: 2.
    pub rebuild_ratio: usize,

    /// Maximum entries per k-d tree leaf before it splits.  Default: 24.
    pub bucket_capacity: usize,

    /// RNG seed.  `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms:      1_000,
            speed_resolution_ms:   2_000.0,
            inbound_speed_divisor: 1.5,
            rebuild_ratio:         2,
            bucket_capacity:       24,
            seed:                  None,
        }
    }
}

impl MotionConfig {
    /// Reject settings that would make motion or the index degenerate.
    pub fn validate(&self) -> CoreResult<()> {
        if !(self.speed_resolution_ms.is_finite() && self.speed_resolution_ms > 0.0) {
            return Err(CoreError::Config(format!(
                "speed_resolution_ms must be positive and finite, got {}",
                self.speed_resolution_ms
            )));
        }
        if !(self.inbound_speed_divisor.is_finite() && self.inbound_speed_divisor > 0.0) {
            return Err(CoreError::Config(format!(
                "inbound_speed_divisor must be positive and finite, got {}",
                self.inbound_speed_divisor
            )));
        }
        if self.tick_interval_ms == 0 {
            return Err(CoreError::Config("tick_interval_ms must be non-zero".into()));
        }
        if self.bucket_capacity < 2 {
            return Err(CoreError::Config(format!(
                "bucket_capacity must be at least 2, got {}",
                self.bucket_capacity
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Magnitude of the velocity assigned by a boundary bounce.
    #[inline]
    pub fn inbound_speed(&self) -> f64 {
        1.0 / (self.speed_resolution_ms * self.inbound_speed_divisor)
    }
}
