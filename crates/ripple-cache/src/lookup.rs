//! Cache-backed source of external method effects

use crate::codec::{decode, SymbolIndex};
use crate::{EffectCache, CACHE_VERSION};
use ripple_effects::{ExternalEffects, ExternalLookup};
use ripple_ir::{MethodKey, Program};
use tracing::{debug, warn};

/// Resolves callees outside the program from an [`EffectCache`].
///
/// An entry is trusted only when its key, format version and content hash
/// all match what the program declares for the callee. Anything else is a
/// rejection, never a partial hit.
pub struct CachedLookup<'a> {
    cache: &'a dyn EffectCache,
    program: &'a Program,
    index: SymbolIndex,
    hits: usize,
}

impl<'a> CachedLookup<'a> {
    pub fn new(cache: &'a dyn EffectCache, program: &'a Program) -> Self {
        Self {
            cache,
            program,
            index: SymbolIndex::new(program),
            hits: 0,
        }
    }

    /// Number of lookups answered from the cache so far
    pub fn hits(&self) -> usize {
        self.hits
    }
}

impl ExternalEffects for CachedLookup<'_> {
    fn lookup(&mut self, key: &MethodKey) -> ExternalLookup {
        let entry = match self.cache.lookup(key.signature_hash()) {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                debug!(callee = %key, "cache miss");
                return ExternalLookup::Missing;
            }
            Err(e) => {
                warn!(callee = %key, error = %e, "cache read failed");
                return ExternalLookup::Rejected(format!("cache read failed: {e}"));
            }
        };

        if entry.key != *key {
            return ExternalLookup::Rejected(format!("entry belongs to {}", entry.key));
        }
        if entry.version != CACHE_VERSION {
            return ExternalLookup::Rejected(format!(
                "format version {} (expected {CACHE_VERSION})",
                entry.version
            ));
        }
        let Some(external) = self.program.external(key) else {
            return ExternalLookup::Rejected("no content hash declared".to_string());
        };
        if external.content_hash != entry.content_hash {
            return ExternalLookup::Rejected("content hash mismatch".to_string());
        }

        self.hits += 1;
        debug!(callee = %key, "cache hit");
        ExternalLookup::Found(decode(&entry.effects, &self.index))
    }
}
