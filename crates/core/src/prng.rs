//! Deterministic PRNG based on the Xorshift64 algorithm.
//!
//! Every random choice in the simulation (speed class, spawn position,
//! lifespan) is drawn from an [`Xorshift64`], so a seed fully determines a run.
//! The engine owns one generator and hands each particle a child generator
//! via [`Xorshift64::fork`], which keeps particles independent of each other
//! and of iteration order.

use serde::{Deserialize, Serialize};

/// Xorshift64 deterministic PRNG with shifts (13, 7, 17).
///
/// A seed of 0 is replaced with a non-zero fallback to avoid the all-zeros
/// fixed point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Xorshift64 {
    state: u64,
}

impl Xorshift64 {
    const FALLBACK_SEED: u64 = 0x5EED_DEAD_BEEF_CAFE;

    /// Creates a new PRNG with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { Self::FALLBACK_SEED } else { seed },
        }
    }

    /// Advances the state and returns the next 64-bit value.
    pub fn next_u64(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }

    /// Returns a uniformly distributed f64 in [0, 1) built from the upper 53 bits.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Returns a uniformly distributed f64 in [min, max).
    pub fn next_range(&mut self, min: f64, max: f64) -> f64 {
        min + self.next_f64() * (max - min)
    }

    /// Returns `true` with probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Returns a uniformly distributed u32 in the inclusive range [min, max].
    ///
    /// Callers guarantee `min <= max`.
    pub fn next_u32_inclusive(&mut self, min: u32, max: u32) -> u32 {
        let span = u64::from(max - min) + 1;
        min + (self.next_u64() % span) as u32
    }

    /// Derives an independent child generator.
    ///
    /// The child seed is the next output passed through a splitmix64
    /// finalizer, so consecutive forks do not share xorshift streams.
    pub fn fork(&mut self) -> Xorshift64 {
        let mut z = self.next_u64().wrapping_add(0x9E37_79B9_7F4A_7C15);
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        Xorshift64::new(z ^ (z >> 31))
    }
}
