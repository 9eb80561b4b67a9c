//! # Random Sources
//!
//! Seedable randomness injected into validator selection and ID generation.
//! Nothing in the workspace self-seeds; callers choose between a fixed seed
//! (tests, replays) and OS entropy (production).

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform random source.
pub trait RandomSource: Send + Sync {
    /// Uniform sample in `[0, 1)`.
    fn next_unit(&self) -> f64;

    /// Uniform `u32`.
    fn next_u32(&self) -> u32;
}

/// `StdRng` behind a mutex so a single source can be shared across threads.
#[derive(Debug)]
pub struct SeededRandomSource {
    rng: Mutex<StdRng>,
}

impl SeededRandomSource {
    /// Deterministic source: the same seed always yields the same sequence.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Source seeded from operating system entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }
}

impl RandomSource for SeededRandomSource {
    fn next_unit(&self) -> f64 {
        self.rng.lock().gen::<f64>()
    }

    fn next_u32(&self) -> u32 {
        self.rng.lock().gen::<u32>()
    }
}
