//! In-memory cache implementation for testing

use crate::{CacheEntry, EffectCache, Result};
use std::collections::HashMap;

/// In-memory cache
///
/// Non-persistent; everything is lost when the cache is dropped.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCache {
    entries: HashMap<u64, CacheEntry>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EffectCache for InMemoryCache {
    fn lookup(&self, signature_hash: u64) -> Result<Option<CacheEntry>> {
        Ok(self.entries.get(&signature_hash).cloned())
    }

    fn store(&mut self, signature_hash: u64, entry: &CacheEntry) -> Result<()> {
        self.entries.insert(signature_hash, entry.clone());
        Ok(())
    }

    fn remove(&mut self, signature_hash: u64) -> Result<()> {
        self.entries.remove(&signature_hash);
        Ok(())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.entries.len())
    }
}
