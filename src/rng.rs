//! Seeded random stream that feeds shape generation.
//!
//! A game is reproducible from its seed string alone: the string is hashed
//! to a `u64` and expanded with ChaCha8, so the same seed always yields the
//! same sequence of shapes and colors.
//!
//! ```
//! use shape_sorter::rng::ShapeRng;
//!
//! let mut a = ShapeRng::from_seed_str("abc");
//! let mut b = ShapeRng::from_seed_str("abc");
//! assert_eq!(a.pick(10), b.pick(10));
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};

/// Characters used for generated seeds.
pub const SEED_ALPHABET: &str = "0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of a generated seed.
pub const SEED_LEN: usize = 6;

/// Deterministic uniform stream owned by a single game.
///
/// Not `Clone`: two games must never share a stream position.
#[derive(Debug)]
pub struct ShapeRng {
    inner: ChaCha8Rng,
    draws: u64,
}

impl ShapeRng {
    /// Create a stream from a seed string.
    #[must_use]
    pub fn from_seed_str(seed: &str) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(hash_seed(seed)),
            draws: 0,
        }
    }

    /// Uniform draw in `[0, 1)`.
    pub fn next_unit(&mut self) -> f64 {
        self.draws += 1;
        self.inner.gen::<f64>()
    }

    /// Uniform index in `0..len`, computed as `floor(next_unit() * len)`.
    ///
    /// Always consumes exactly one draw. `len` must be non-zero.
    pub fn pick(&mut self, len: usize) -> usize {
        debug_assert!(len > 0, "pick from an empty range");
        let idx = (self.next_unit() * len as f64).floor() as usize;
        idx.min(len.saturating_sub(1))
    }

    /// Number of draws consumed since construction.
    #[must_use]
    pub fn draws(&self) -> u64 {
        self.draws
    }
}

/// Hash a seed string to the 64-bit ChaCha seed.
///
/// FxHasher has no per-process keys, so the mapping is stable between runs.
#[must_use]
pub fn hash_seed(seed: &str) -> u64 {
    let mut hasher = FxHasher::default();
    seed.hash(&mut hasher);
    hasher.finish()
}

/// Generate a fresh shareable seed from the thread RNG.
#[must_use]
pub fn generate_seed() -> String {
    let mut rng = rand::thread_rng();
    let alphabet = SEED_ALPHABET.as_bytes();
    let mut seed = String::with_capacity(SEED_LEN);
    for _ in 0..SEED_LEN {
        let idx = rng.gen_range(0..alphabet.len());
        seed.push(alphabet[idx] as char);
    }
    seed
}
