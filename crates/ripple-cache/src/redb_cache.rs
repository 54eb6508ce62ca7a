//! redb-based persistent cache

use crate::{CacheEntry, EffectCache, Result};
use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::path::{Path, PathBuf};
use tracing::debug;

const ENTRIES_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("effect_entries");

/// Persistent cache in a single `.redb` file, with bincode-encoded entries
pub struct RedbCache {
    db: Database,
    path: PathBuf,
}

impl RedbCache {
    /// Create or open a cache at the given path
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::create(&path)?;

        let write_txn = db.begin_write()?;
        {
            write_txn.open_table(ENTRIES_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db, path })
    }

    /// Get the file path of this cache
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EffectCache for RedbCache {
    fn lookup(&self, signature_hash: u64) -> Result<Option<CacheEntry>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ENTRIES_TABLE)?;

        match table.get(signature_hash)? {
            Some(bytes) => {
                let entry: CacheEntry = bincode::deserialize(bytes.value())?;
                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }

    fn store(&mut self, signature_hash: u64, entry: &CacheEntry) -> Result<()> {
        let bytes = bincode::serialize(entry)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(ENTRIES_TABLE)?;
            table.insert(signature_hash, bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn remove(&mut self, signature_hash: u64) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(ENTRIES_TABLE)?;
            table.remove(signature_hash)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn len(&self) -> Result<usize> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ENTRIES_TABLE)?;
        Ok(table.len()? as usize)
    }

    fn compact(&mut self) -> Result<()> {
        let reclaimed = self.db.compact()?;
        debug!(path = %self.path.display(), reclaimed, "cache compacted");
        Ok(())
    }
}
