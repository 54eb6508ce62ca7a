//! Stable hashing helpers
//!
//! Hashes produced here must be identical across compilations and platforms,
//! because they key entries of the persistent effect cache.

use sha2::{Digest, Sha256};

/// Stable 64-bit hash of a textual identity (first 8 bytes of SHA-256)
pub fn stable_hash(text: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}

/// Incremental SHA-256 hasher producing a hex content hash
#[derive(Default)]
pub struct ContentHasher {
    hasher: Sha256,
}

impl ContentHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_str(&mut self, text: &str) {
        // Length prefix keeps "ab"+"c" distinct from "a"+"bc"
        self.hasher.update((text.len() as u64).to_be_bytes());
        self.hasher.update(text.as_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.hasher.update(value.to_be_bytes());
    }

    pub fn write_tag(&mut self, tag: u8) {
        self.hasher.update([tag]);
    }

    pub fn finish(self) -> String {
        format!("{:x}", self.hasher.finalize())
    }
}
