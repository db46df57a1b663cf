//! Uniform draws for the stochastic terrain rules.
//!
//! Every cell owns its own stream, derived from the run seed and the cell
//! index, so evaluation order never changes the outcome of a run.

use std::collections::VecDeque;

use rand::rngs::OsRng;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RandomnessError {
    #[error("entropy source failed: {0}")]
    Entropy(#[from] rand::Error),
    #[error("replayed draw sequence exhausted after {0} draws")]
    Exhausted(usize),
    #[error("draw {0} lies outside [0, 1]")]
    OutOfRange(f64),
}

/// Source of uniform draws in the closed interval `[0, 1]`.
pub trait Randomness {
    fn draw(&mut self) -> Result<f64, RandomnessError>;
}

impl<R: Randomness + ?Sized> Randomness for &mut R {
    fn draw(&mut self) -> Result<f64, RandomnessError> {
        (**self).draw()
    }
}

impl<R: Randomness + ?Sized> Randomness for Box<R> {
    fn draw(&mut self) -> Result<f64, RandomnessError> {
        (**self).draw()
    }
}

/// Seeded per-cell stream.
#[derive(Debug, Clone)]
pub struct CellRng {
    inner: ChaCha8Rng,
}

impl CellRng {
    pub fn seed_from_u64(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Randomness for CellRng {
    fn draw(&mut self) -> Result<f64, RandomnessError> {
        Ok(self.inner.gen_range(0.0..=1.0))
    }
}

/// Fresh OS-seeded generator for every draw. Not reproducible.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntropySource;

impl Randomness for EntropySource {
    fn draw(&mut self) -> Result<f64, RandomnessError> {
        let mut rng = ChaCha8Rng::from_rng(OsRng)?;
        Ok(rng.gen_range(0.0..=1.0))
    }
}

/// Plays back a fixed sequence of draws, failing once it runs dry.
#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    draws: VecDeque<f64>,
    consumed: usize,
}

impl ReplaySource {
    pub fn new(draws: impl IntoIterator<Item = f64>) -> Self {
        Self {
            draws: draws.into_iter().collect(),
            consumed: 0,
        }
    }

    pub fn consumed(&self) -> usize {
        self.consumed
    }

    pub fn remaining(&self) -> usize {
        self.draws.len()
    }
}

impl Randomness for ReplaySource {
    fn draw(&mut self) -> Result<f64, RandomnessError> {
        let value = self
            .draws
            .pop_front()
            .ok_or(RandomnessError::Exhausted(self.consumed))?;
        self.consumed += 1;
        if !(0.0..=1.0).contains(&value) {
            return Err(RandomnessError::OutOfRange(value));
        }
        Ok(value)
    }
}

/// Hands out one independent stream per cell from a single run seed.
#[derive(Debug, Clone, Copy)]
pub struct RngManager {
    master_seed: u64,
}

impl RngManager {
    pub fn new(seed: u64) -> Self {
        Self { master_seed: seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    pub fn cell_stream(&self, cell_index: u64) -> CellRng {
        CellRng::seed_from_u64(self.derive_seed(cell_index))
    }

    fn derive_seed(&self, cell_index: u64) -> u64 {
        let mut seed = self.master_seed;
        seed = seed
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        seed ^= cell_index.wrapping_mul(48271);
        seed = seed
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        seed
    }
}

impl Default for RngManager {
    fn default() -> Self {
        Self::new(42)
    }
}
