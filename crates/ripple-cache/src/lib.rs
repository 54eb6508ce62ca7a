//! ripple-cache: Persistent cache of method effects
//!
//! Stores the escaping part of each analyzed method's effects so later
//! compilations can resolve calls into already-compiled code without its
//! body:
//! - In-memory (for testing)
//! - redb (single-file embedded database)
//!
//! Entries are keyed by the stable signature hash of the method key and
//! validated against the content hash the calling program declares for the
//! callee.

mod codec;
mod entry;
mod error;
mod lookup;
mod memory;
mod provider;
mod redb_cache;

pub use codec::{array_elements_hash, decode, encode, SymbolIndex};
pub use entry::{CacheEntry, CachedEffects, CachedSymbols, CACHE_VERSION};
pub use error::{CacheError, Result};
pub use lookup::CachedLookup;
pub use memory::InMemoryCache;
pub use provider::EffectCache;
pub use redb_cache::RedbCache;
