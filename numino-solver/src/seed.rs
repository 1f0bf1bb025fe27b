use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

/// A deterministic generator seeded from a plain `u64`, so the same seed and
/// inputs always drive the solver's shuffles and tie-breaks identically.
pub fn rng_from_u64(seed: u64) -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(seed)
}
