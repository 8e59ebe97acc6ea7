//! Random source capability.
//!
//! Controllers draw every random decision through [`RandomSource`]. In
//! production each controller owns an entropy-seeded [`StdRng`]; tests pass a
//! seeded `StdRng` or a [`FixedSequence`] to pin behavior down exactly.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Uniform draws plus the handful of derived helpers the controllers use.
pub trait RandomSource: Send {
    /// Uniform sample in `[0, 1)`.
    fn next_unit(&mut self) -> f64;

    /// Uniform integer in `[0, n)`; `0` when `n == 0`.
    fn below(&mut self, n: u64) -> u64 {
        if n == 0 {
            return 0;
        }
        ((self.next_unit() * n as f64) as u64).min(n - 1)
    }

    /// Uniform float in `[low, high)`.
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.next_unit()
    }

    /// `true` with probability `p`.
    fn chance(&mut self, p: f64) -> bool {
        self.next_unit() < p
    }

    /// `base + [0, spread)` milliseconds.
    fn millis(&mut self, base: u64, spread: u64) -> Duration {
        Duration::from_millis(base + self.below(spread))
    }
}

impl RandomSource for StdRng {
    fn next_unit(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

/// A fresh OS-seeded generator.
pub fn entropy() -> Box<dyn RandomSource> {
    Box::new(StdRng::from_entropy())
}

/// A reproducible generator for a given seed.
pub fn seeded(seed: u64) -> Box<dyn RandomSource> {
    Box::new(StdRng::seed_from_u64(seed))
}

/// Replays a fixed list of unit samples, cycling when exhausted.
///
/// `FixedSequence::repeat(0.99)` makes every `chance` below 0.99 fail and
/// every `below(n)` return `n - 1`; `FixedSequence::repeat(0.0)` does the
/// opposite.
#[derive(Debug, Clone)]
pub struct FixedSequence {
    values: Vec<f64>,
    cursor: usize,
}

impl FixedSequence {
    pub fn new(values: Vec<f64>) -> Self {
        assert!(!values.is_empty(), "FixedSequence needs at least one value");
        let values = values
            .into_iter()
            .map(|v| v.clamp(0.0, 1.0 - f64::EPSILON))
            .collect();
        Self { values, cursor: 0 }
    }

    pub fn repeat(value: f64) -> Self {
        Self::new(vec![value])
    }
}

impl RandomSource for FixedSequence {
    fn next_unit(&mut self) -> f64 {
        let v = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        v
    }
}
