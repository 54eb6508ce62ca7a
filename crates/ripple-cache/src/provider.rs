//! Cache provider trait

use crate::{CacheEntry, Result};

/// Pluggable store of cached method effects, keyed by the signature hash
/// of the method key
pub trait EffectCache: Send + Sync {
    /// Get the entry stored under a signature hash
    fn lookup(&self, signature_hash: u64) -> Result<Option<CacheEntry>>;

    /// Store an entry (insert or replace)
    fn store(&mut self, signature_hash: u64, entry: &CacheEntry) -> Result<()>;

    /// Remove an entry if present
    fn remove(&mut self, signature_hash: u64) -> Result<()>;

    /// Number of stored entries
    fn len(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Reclaim space left by replaced entries. Called once after a job
    /// has stored its results.
    fn compact(&mut self) -> Result<()> {
        Ok(())
    }
}
