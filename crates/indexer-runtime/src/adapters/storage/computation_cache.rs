//! RocksDB-backed computation cache.
//!
//! Key layout in the `computations` column family:
//!
//! ```text
//! <key display form> 0x00 <height BE u64>
//! ```
//!
//! The display form is `{kind}/{name}@{address}{args}`, which contains no
//! NUL, so one reverse seek answers "newest entry at or below a block".

use super::db::{backend_err, HistorianDb, CF_COMPUTATIONS};
use async_trait::async_trait;
use ch_04_computation::{Computation, ComputationCache, ComputationKey};
use rocksdb::{Direction, IteratorMode};
use shared_types::{BlockHeight, StoreError};
use std::sync::Arc;

/// Persistent [`ComputationCache`] adapter.
pub struct RocksDbComputationCache {
    db: Arc<HistorianDb>,
}

fn lineage_prefix(key: &ComputationKey) -> Vec<u8> {
    let mut prefix = key.to_string().into_bytes();
    prefix.push(0);
    prefix
}

fn entry_key(key: &ComputationKey, height: BlockHeight) -> Vec<u8> {
    let mut bytes = lineage_prefix(key);
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes
}

impl RocksDbComputationCache {
    /// Creates the adapter over a shared database handle.
    pub fn new(db: Arc<HistorianDb>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ComputationCache for RocksDbComputationCache {
    async fn latest_at_or_before(
        &self,
        key: &ComputationKey,
        height: BlockHeight,
    ) -> Result<Option<Computation>, StoreError> {
        let cf = self.db.cf(CF_COMPUTATIONS)?;
        let prefix = lineage_prefix(key);
        let seek_key = entry_key(key, height);

        let mut iter = self
            .db
            .raw()
            .iterator_cf(cf, IteratorMode::From(&seek_key, Direction::Reverse));
        match iter.next() {
            Some(entry) => {
                let (stored_key, value) = entry.map_err(backend_err)?;
                if stored_key.starts_with(&prefix) {
                    let computation = serde_json::from_slice(&value)
                        .map_err(|e| StoreError::Corruption(e.to_string()))?;
                    Ok(Some(computation))
                } else {
                    Ok(None)
                }
            }
            None => Ok(None),
        }
    }

    async fn insert(&self, computation: Computation) -> Result<(), StoreError> {
        let key = entry_key(&computation.key(), computation.block.height);
        let value = serde_json::to_vec(&computation)
            .map_err(|e| StoreError::Corruption(e.to_string()))?;
        self.db
            .raw()
            .put_cf_opt(self.db.cf(CF_COMPUTATIONS)?, key, value, &self.db.write_opts())
            .map_err(backend_err)
    }
}
