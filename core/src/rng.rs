//! Seeded spawn generator.
//!
//! A Park–Miller-modulus linear congruential generator. The whole future spawn
//! sequence is a function of the current seed, which is why snapshots store it
//! and undo reinstates it verbatim.

use rand::Rng;

/// 2^31 - 1.
pub const MODULUS: u64 = 2_147_483_647;
const MULTIPLIER: u64 = 1_664_525;
const INCREMENT: u64 = 1_013_904_223;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpawnRng {
    seed: u32,
}

impl SpawnRng {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }

    /// Current generator state.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Replace the state, e.g. when restoring a snapshot.
    pub fn reseed(&mut self, seed: u32) {
        self.seed = seed;
    }

    /// Advance the generator and return a value in `[0, 1)`.
    pub fn draw(&mut self) -> f64 {
        // u32 * multiplier stays below 2^53, so the intermediate never overflows.
        let next = (u64::from(self.seed) * MULTIPLIER + INCREMENT) % MODULUS;
        self.seed = next as u32;
        next as f64 / MODULUS as f64
    }

    /// Uniform index in `0..len` using a single draw. `len` must be non-zero.
    pub fn draw_index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0);
        let index = (self.draw() * len as f64).floor() as usize;
        index.min(len - 1)
    }
}

/// A seed in `1..2^31-1`, drawn from the thread RNG.
pub fn fresh_seed() -> u32 {
    rand::thread_rng().gen_range(1..MODULUS as u32)
}
