//! # Request Fingerprint
//!
//! Deterministic digest of `(graph snapshot version, request parameters)`.
//! Equal fingerprints mean "identical work": the coordinator deduplicates
//! on it and the engine derives its master RNG seed from it, which is what
//! makes identical requests reproduce identical aggregates.
//!
//! Canonicalization: the request is serialized to JSON with
//! `initial_failures` sorted, so listing the same failure set in a
//! different order fingerprints identically.

use serde::Serialize;
use sha2::{Digest, Sha256};
use shared_types::SimulationRequest;
use std::fmt;

/// 32-byte request digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Computes the fingerprint for a request against a snapshot version.
    #[must_use]
    pub fn compute(snapshot_version: u64, request: &SimulationRequest) -> Self {
        let mut canonical = request.clone();
        canonical.event.initial_failures.sort();

        let mut hasher = Sha256::new();
        hasher.update(snapshot_version.to_le_bytes());
        // In-memory serialization of a plain struct cannot fail.
        if let Ok(bytes) = serde_json::to_vec(&canonical) {
            hasher.update(&bytes);
        }
        let digest = hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// Master RNG seed for the engine: the first eight digest bytes.
    #[must_use]
    pub fn master_seed(&self) -> u64 {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.0[..8]);
        u64::from_le_bytes(bytes)
    }

    /// Lowercase hex rendering, used in bus events and logs.
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}
