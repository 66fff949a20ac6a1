//! A deterministic pseudo-random-number generator used by the fuzz-style
//! integration tests in `testcrate`. Ported from `starlight::misc::rng::
//! StarRng`, re-based on `u64`s and [`crate::PackedBits`] directly since
//! this crate has no arbitrary-width mimicking layer to buffer against.

use rand_xoshiro::{
    rand_core::{RngCore, SeedableRng},
    Xoshiro128StarStar,
};

use crate::bits::PackedBits;

/// A small, fast, seedable PRNG good enough for building random wiring
/// graphs and random-width connect/disconnect sequences in tests.
#[derive(Debug)]
pub struct LoomRng {
    rng: Xoshiro128StarStar,
}

impl LoomRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Xoshiro128StarStar::seed_from_u64(seed),
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    pub fn next_bool(&mut self) -> bool {
        (self.rng.next_u64() & 1) != 0
    }

    /// Returns a random index in `0..len`, or `None` if `len == 0`.
    #[must_use]
    pub fn index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            None
        } else {
            Some((self.rng.next_u64() % (len as u64)) as usize)
        }
    }

    /// Takes a random index of a slice, or `None` if it is empty.
    #[must_use]
    pub fn index_slice<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        let i = self.index(slice.len())?;
        slice.get(i)
    }

    /// Fills `bits` with uniformly random bits, one `u64` draw per word.
    pub fn next_bits(&mut self, bits: &mut PackedBits) {
        let mut remaining = bits.len();
        let mut idx = 0;
        while remaining > 0 {
            let word = self.rng.next_u64();
            let take = remaining.min(64);
            for b in 0..take {
                bits.copy_bit(idx + b, ((word >> b) & 1) != 0);
            }
            idx += take;
            remaining -= take;
        }
    }
}
