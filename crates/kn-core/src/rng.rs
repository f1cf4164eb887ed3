//! Simulation RNG wrapper.
//!
//! Seeding, reseeding, and random-walk velocity changes all draw from one
//! `SmallRng`.  A fixed seed reproduces the same point layout and velocity
//! sequence; `None` seeds from OS entropy for interactive use.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Simulation-level RNG.
///
/// Used only behind the index lock or by the single simulator thread; each
/// consumer owns its own instance.
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        SimRng(SmallRng::from_entropy())
    }

    /// Seeded if `seed` is `Some`, otherwise from entropy.
    pub fn from_seed_opt(seed: Option<u64>) -> Self {
        match seed {
            Some(s) => Self::new(s),
            None => Self::from_entropy(),
        }
    }

    /// Uniform coordinate in `[0, 1)`.
    #[inline]
    pub fn unit(&mut self) -> f64 {
        self.0.r#gen::<f64>()
    }

    /// One random velocity component: `(u - 0.5) / resolution_ms`.
    #[inline]
    pub fn speed(&mut self, resolution_ms: f64) -> f64 {
        (self.unit() - 0.5) / resolution_ms
    }
}
