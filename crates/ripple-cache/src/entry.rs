//! Serialized cache entries

use crate::codec::encode;
use ripple_effects::EffectSet;
use ripple_ir::{MethodDecl, MethodKey, Program};
use serde::{Deserialize, Serialize};

/// Format version of [`CacheEntry`]. Entries written with another version
/// are treated as misses.
pub const CACHE_VERSION: u32 = 1;

/// A stored symbol set: stable variable hashes, or every location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CachedSymbols {
    Universal,
    Hashes(Vec<u64>),
}

/// Escaping-only effects in a form that survives across compilations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedEffects {
    /// Kind bits restricted to ReadEscaping, WriteEscaping, Exception, IO
    pub kinds: u8,
    pub read_escaping: CachedSymbols,
    pub write_escaping: CachedSymbols,
}

/// One cached method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: MethodKey,
    /// Content hash of the method the effects were computed from
    pub content_hash: String,
    pub effects: CachedEffects,
    pub version: u32,
}

impl CacheEntry {
    pub fn new(key: MethodKey, content_hash: impl Into<String>, effects: CachedEffects) -> Self {
        Self {
            key,
            content_hash: content_hash.into(),
            effects,
            version: CACHE_VERSION,
        }
    }

    /// Entry for an analyzed method of `program`
    pub fn for_method(decl: &MethodDecl, effects: &EffectSet, program: &Program) -> Self {
        Self::new(
            decl.key.clone(),
            decl.content_hash(program),
            encode(effects, program),
        )
    }

    /// Key under which the entry is stored
    pub fn signature_hash(&self) -> u64 {
        self.key.signature_hash()
    }
}
