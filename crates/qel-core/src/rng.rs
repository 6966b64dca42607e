//! Deterministic RNG wrapper and seed-derivation helpers.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use siphasher::sip::SipHasher13;
use std::cmp::Ordering;
use std::hash::Hasher;

/// Deterministic RNG handle used by the prepare and test phases.
///
/// The handle is a thin wrapper around `StdRng`. A master seed (the question
/// variant seed) is provided by the host. Substreams are derived by hashing
/// `(master_seed, substream_id)` with SipHash-1-3 under fixed zero keys, so
/// two elements in the same question never share a stream and a rerun with
/// the same variant seed reproduces every synthesized answer.
#[derive(Debug, Clone)]
pub struct RngHandle {
    rng: StdRng,
}

impl RngHandle {
    /// Creates a new RNG handle from a master seed.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Creates the handle dedicated to one answer name of a variant.
    pub fn for_answer(variant_seed: u64, answers_name: &str) -> Self {
        Self::from_seed(derive_substream_seed(
            variant_seed,
            label_substream(answers_name),
        ))
    }

    /// Returns a uniformly chosen index below `len`; `len` must be non-zero.
    pub fn index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        self.rng.gen_range(0..len)
    }

    /// Returns a fair coin flip.
    pub fn coin(&mut self) -> bool {
        self.rng.gen_bool(0.5)
    }

    /// Returns a float uniformly drawn from `[low, high)`; an empty range
    /// yields `low`.
    pub fn uniform(&mut self, low: f64, high: f64) -> f64 {
        match low.partial_cmp(&high) {
            Some(Ordering::Less) => self.rng.gen_range(low..high),
            _ => low,
        }
    }

    /// Returns a mutable reference to the underlying RNG for advanced usage.
    pub fn inner_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

impl RngCore for RngHandle {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.rng.try_fill_bytes(dest)
    }
}

/// Derives the deterministic seed for a specific substream.
pub fn derive_substream_seed(master_seed: u64, substream: u64) -> u64 {
    let mut hasher = SipHasher13::new_with_keys(0, 0);
    hasher.write_u64(master_seed);
    hasher.write_u64(substream);
    hasher.finish()
}

/// Maps a textual label (usually an answer name) onto a substream id.
pub fn label_substream(label: &str) -> u64 {
    let mut hasher = SipHasher13::new_with_keys(0, 0);
    hasher.write(label.as_bytes());
    hasher.finish()
}
