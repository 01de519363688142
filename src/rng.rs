//! # RandomNumberGenerator
//!
//! The `RandomNumberGenerator` struct provides uniform sampling over closed
//! ranges of integers or reals using the `rand` crate. Both endpoints are
//! included, which is what gene bounds and crossover intervals require.
//!
//! ## Example
//!
//! ```rust
//! use gannet::rng::RandomNumberGenerator;
//!
//! let mut rng = RandomNumberGenerator::from_seed(7);
//! let gene: i32 = rng.uniform(-9, 9);
//! assert!((-9..=9).contains(&gene));
//!
//! let weight: f64 = rng.uniform(-1.0, 1.0);
//! assert!((-1.0..=1.0).contains(&weight));
//! ```

use rand::distributions::uniform::SampleUniform;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// A wrapper around the `rand` crate's `StdRng` that samples closed ranges.
#[derive(Debug, Clone)]
pub struct RandomNumberGenerator {
    pub rng: StdRng,
}

impl RandomNumberGenerator {
    /// Creates a new `RandomNumberGenerator` instance seeded from the system entropy.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates a new `RandomNumberGenerator` instance with a specific seed.
    ///
    /// This is useful for reproducible tests and benchmarks.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Draws one value uniformly from `[min, max]`.
    ///
    /// Callers validate `min <= max` (and finiteness for reals) beforehand;
    /// an inverted range panics inside `rand`.
    pub fn uniform<T>(&mut self, min: T, max: T) -> T
    where
        T: SampleUniform + PartialOrd,
    {
        self.rng.gen_range(min..=max)
    }

    /// Overwrites every slot of `buffer` with an independent draw from `[min, max]`.
    pub fn fill_uniform<T>(&mut self, buffer: &mut [T], min: T, max: T)
    where
        T: SampleUniform + PartialOrd + Copy,
    {
        for slot in buffer.iter_mut() {
            *slot = self.uniform(min, max);
        }
    }
}

impl Default for RandomNumberGenerator {
    fn default() -> Self {
        Self::new()
    }
}
