use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

pub fn rng_from_u64(seed: u64) -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(seed)
}

/// Derives a distinct, deterministic seed for retry attempt `attempt` of a
/// base `seed`, so each retry explores a different part of the search space
/// while remaining fully reproducible.
pub fn attempt_seed(seed: u64, attempt: u32) -> u64 {
    seed ^ ((attempt as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}
