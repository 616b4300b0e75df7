//! # Per-Run Seed Derivation
//!
//! Every Monte-Carlo run owns an isolated RNG. Seeds are derived by hashing
//! `(master_seed, run_index, attempt)` so that runs never share RNG state
//! and identical requests replay identically. The retry attempt counter
//! gives a panicked run a fresh seed without disturbing any other run.

use sha2::{Digest, Sha256};

/// Seed for one run attempt.
#[must_use]
pub fn run_seed(master_seed: u64, run_index: u32, attempt: u32) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(master_seed.to_le_bytes());
    hasher.update(run_index.to_le_bytes());
    hasher.update(attempt.to_le_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}
