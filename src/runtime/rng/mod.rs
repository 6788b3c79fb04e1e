//! Per-thread pseudo-random generation.
//!
//! Each worker owns one generator. Its seed is derived from the run seed and
//! the worker's thread id with SHA-256, so a run reproduces exactly given
//! the generator type, the run seed and the worker count.

use std::fmt;

use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

mod mt19937;
pub mod random_matrix;
mod sampling;
mod sfmt;
mod xoshiro;

pub use mt19937::Mt19937_64;
pub use random_matrix::random_matrix;
pub use sampling::Sampling;
pub use sfmt::Sfmt216091;
pub use xoshiro::{Xoshiro256PlusPlus, Xoshiro256StarStar};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum RngType {
    /// 64-bit Mersenne Twister.
    #[default]
    Mt19937,
    /// SIMD-oriented Fast Mersenne Twister, period 2^216091 - 1.
    Mt216091,
    Xoshiro256StarStar,
    Xoshiro256PlusPlus,
}

impl fmt::Display for RngType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RngType::Mt19937 => "mt19937",
            RngType::Mt216091 => "mt216091",
            RngType::Xoshiro256StarStar => "xoshiro256**",
            RngType::Xoshiro256PlusPlus => "xoshiro256++",
        };
        f.write_str(name)
    }
}

/// A 256-bit run seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RngSeed(pub [u64; 4]);

impl RngSeed {
    pub const fn new(words: [u64; 4]) -> Self {
        Self(words)
    }

    pub const fn from_u64(value: u64) -> Self {
        Self([value, 0, 0, 0])
    }

    pub fn words(&self) -> [u64; 4] {
        self.0
    }

    /// Seed words for one worker: `SHA-256(seed ∥ thread_id)` read as four
    /// little-endian words.
    pub fn derive(&self, thread_id: u32) -> [u64; 4] {
        let mut hasher = Sha256::new();
        for word in self.0 {
            hasher.update(word.to_le_bytes());
        }
        hasher.update(u64::from(thread_id).to_le_bytes());
        let digest = hasher.finalize();

        let mut words = [0u64; 4];
        for (word, chunk) in words.iter_mut().zip(digest.chunks_exact(8)) {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(chunk);
            *word = u64::from_le_bytes(bytes);
        }
        words
    }
}

impl From<u64> for RngSeed {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

/// Seeds a generator from four words through its byte seed.
fn seed_from_words<R: SeedableRng<Seed = [u8; 32]>>(words: [u64; 4]) -> R {
    let mut seed = [0u8; 32];
    for (chunk, word) in seed.chunks_exact_mut(8).zip(words) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
    R::from_seed(seed)
}

/// The generator owned by one worker.
#[derive(Debug, Clone)]
pub enum PerThreadRng {
    Mt19937(Box<Mt19937_64>),
    Mt216091(Box<Sfmt216091>),
    Xoshiro256StarStar(Xoshiro256StarStar),
    Xoshiro256PlusPlus(Xoshiro256PlusPlus),
}

impl PerThreadRng {
    /// Generator for worker `thread_id` of a run seeded with `seed`.
    pub fn for_thread(rng_type: RngType, seed: &RngSeed, thread_id: u32) -> Self {
        Self::from_words(rng_type, seed.derive(thread_id))
    }

    pub fn from_words(rng_type: RngType, words: [u64; 4]) -> Self {
        match rng_type {
            RngType::Mt19937 => PerThreadRng::Mt19937(Box::new(seed_from_words(words))),
            RngType::Mt216091 => PerThreadRng::Mt216091(Box::new(seed_from_words(words))),
            RngType::Xoshiro256StarStar => PerThreadRng::Xoshiro256StarStar(seed_from_words(words)),
            RngType::Xoshiro256PlusPlus => PerThreadRng::Xoshiro256PlusPlus(seed_from_words(words)),
        }
    }

    pub fn rng_type(&self) -> RngType {
        match self {
            PerThreadRng::Mt19937(_) => RngType::Mt19937,
            PerThreadRng::Mt216091(_) => RngType::Mt216091,
            PerThreadRng::Xoshiro256StarStar(_) => RngType::Xoshiro256StarStar,
            PerThreadRng::Xoshiro256PlusPlus(_) => RngType::Xoshiro256PlusPlus,
        }
    }
}

impl RngCore for PerThreadRng {
    fn next_u32(&mut self) -> u32 {
        match self {
            PerThreadRng::Mt19937(rng) => rng.next_u32(),
            PerThreadRng::Mt216091(rng) => rng.next_u32(),
            PerThreadRng::Xoshiro256StarStar(rng) => rng.next_u32(),
            PerThreadRng::Xoshiro256PlusPlus(rng) => rng.next_u32(),
        }
    }

    fn next_u64(&mut self) -> u64 {
        match self {
            PerThreadRng::Mt19937(rng) => rng.next_u64(),
            PerThreadRng::Mt216091(rng) => rng.next_u64(),
            PerThreadRng::Xoshiro256StarStar(rng) => rng.next_u64(),
            PerThreadRng::Xoshiro256PlusPlus(rng) => rng.next_u64(),
        }
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        fill_bytes_from_u64(self, dest);
    }
}

/// Fills `dest` with little-endian words from `next_u64`.
pub(crate) fn fill_bytes_from_u64<R: RngCore + ?Sized>(rng: &mut R, dest: &mut [u8]) {
    let mut chunks = dest.chunks_exact_mut(8);
    for chunk in &mut chunks {
        chunk.copy_from_slice(&rng.next_u64().to_le_bytes());
    }
    let rest = chunks.into_remainder();
    if !rest.is_empty() {
        let bytes = rng.next_u64().to_le_bytes();
        rest.copy_from_slice(&bytes[..rest.len()]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_seeds_differ_per_thread_and_repeat_per_seed() {
        let seed = RngSeed::new([1, 2, 3, 4]);
        assert_ne!(seed.derive(0), seed.derive(1));
        assert_eq!(seed.derive(7), RngSeed::new([1, 2, 3, 4]).derive(7));
        assert_ne!(seed.derive(0), RngSeed::from_u64(1).derive(0));
    }

    #[test]
    fn every_generator_reproduces_from_its_seed() {
        let seed = RngSeed::from_u64(42);
        for rng_type in [
            RngType::Mt19937,
            RngType::Mt216091,
            RngType::Xoshiro256StarStar,
            RngType::Xoshiro256PlusPlus,
        ] {
            let mut a = PerThreadRng::for_thread(rng_type, &seed, 3);
            let mut b = PerThreadRng::for_thread(rng_type, &seed, 3);
            let mut c = PerThreadRng::for_thread(rng_type, &seed, 4);
            assert_eq!(a.rng_type(), rng_type);
            let first: Vec<u64> = (0..16).map(|_| a.next_u64()).collect();
            let again: Vec<u64> = (0..16).map(|_| b.next_u64()).collect();
            let other: Vec<u64> = (0..16).map(|_| c.next_u64()).collect();
            assert_eq!(first, again, "{}", rng_type);
            assert_ne!(first, other, "{}", rng_type);
        }
    }

    #[test]
    fn fill_bytes_handles_partial_words() {
        let mut a = PerThreadRng::from_words(RngType::Xoshiro256PlusPlus, [1, 2, 3, 4]);
        let mut b = a.clone();
        let mut bytes = [0u8; 11];
        a.fill_bytes(&mut bytes);
        let first = b.next_u64().to_le_bytes();
        let second = b.next_u64().to_le_bytes();
        assert_eq!(&bytes[..8], &first);
        assert_eq!(&bytes[8..], &second[..3]);
    }
}
