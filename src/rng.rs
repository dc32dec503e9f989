// Permuted-congruential random number generator for transport sampling.
//
// A bare LCG state with an RXS-M-XS output permutation: 8 bytes of state,
// fully inlineable, and cheap enough to reseed per history.

use rand::{RngCore, SeedableRng};

/// LCG multiplier.
const LCG_MULT: u64 = 6364136223846793005;
/// LCG increment.
const LCG_ADD: u64 = 1442695040888963407;

/// Minimal PCG-style generator used for collision sampling.
///
/// Reference: Melissa E. O'Neill, "PCG: A Family of Simple Fast
/// Space-Efficient Statistically Good Algorithms for Random Number
/// Generation".
#[derive(Clone, Copy, Debug)]
pub struct FastRng {
    state: u64,
}

impl FastRng {
    #[inline]
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Generator seeded for one particle history.
    ///
    /// Re-running history N draws the same random sequence regardless of
    /// which worker thread picks it up.
    #[inline]
    pub fn for_history(master_seed: u64, history: u64) -> Self {
        Self::new(history_seed(master_seed, history))
    }

    /// Next f64 uniform in [0, 1).
    #[inline(always)]
    pub fn random(&mut self) -> f64 {
        // Equivalent to ldexp(next_u64, -64)
        (self.next_u64() as f64) * 5.421010862427522e-20
    }

    /// Reset the state, e.g. to replay a history.
    #[inline]
    pub fn reseed(&mut self, seed: u64) {
        self.state = seed;
    }
}

/// Derive an independent stream seed for a given history index.
///
/// SplitMix64 finalizer over the history index; consecutive histories get
/// decorrelated streams from one master seed.
#[inline]
pub fn history_seed(master_seed: u64, history: u64) -> u64 {
    let mut z = master_seed
        .wrapping_add(history.wrapping_add(1).wrapping_mul(0x9E3779B97F4A7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

impl RngCore for FastRng {
    #[inline(always)]
    fn next_u32(&mut self) -> u32 {
        self.next_u64() as u32
    }

    #[inline(always)]
    fn next_u64(&mut self) -> u64 {
        self.state = LCG_MULT.wrapping_mul(self.state).wrapping_add(LCG_ADD);

        // RXS-M-XS output permutation
        let word = ((self.state >> ((self.state >> 59) + 5)) ^ self.state)
            .wrapping_mul(12605985483714917081);
        (word >> 43) ^ word
    }

    #[inline]
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        let mut left = dest;
        while left.len() >= 8 {
            let bytes = self.next_u64().to_le_bytes();
            left[..8].copy_from_slice(&bytes);
            left = &mut left[8..];
        }
        if !left.is_empty() {
            let bytes = self.next_u64().to_le_bytes();
            left.copy_from_slice(&bytes[..left.len()]);
        }
    }

    #[inline]
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for FastRng {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self {
            state: u64::from_le_bytes(seed),
        }
    }
}
