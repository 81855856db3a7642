//! # In-Memory Computation Cache
//!
//! LRU-bounded implementation of the [`ComputationCache`] port. The LRU
//! evicts whole key lineages (all blocks for one logical query); within a
//! lineage, entries are an ordered map by block height so
//! `latest_at_or_before` is a range lookup. Eviction only costs a
//! recomputation, never correctness.

use crate::domain::{Computation, ComputationKey};
use crate::ports::ComputationCache;
use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use shared_types::{BlockHeight, StoreError};
use std::collections::BTreeMap;
use std::num::NonZeroUsize;

/// Default maximum number of cached query lineages.
pub const MAX_CACHED_QUERIES: usize = 10_000;

/// In-memory LRU computation cache.
pub struct InMemoryComputationCache {
    lineages: Mutex<LruCache<ComputationKey, BTreeMap<BlockHeight, Computation>>>,
}

impl InMemoryComputationCache {
    /// Creates a cache with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(MAX_CACHED_QUERIES)
    }

    /// Creates a cache bounded to `capacity` query lineages.
    pub fn with_capacity(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap();
        Self {
            lineages: Mutex::new(LruCache::new(cap)),
        }
    }

    /// Number of cached query lineages.
    pub fn len(&self) -> usize {
        self.lineages.lock().len()
    }

    /// True if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryComputationCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ComputationCache for InMemoryComputationCache {
    async fn latest_at_or_before(
        &self,
        key: &ComputationKey,
        height: BlockHeight,
    ) -> Result<Option<Computation>, StoreError> {
        let mut lineages = self.lineages.lock();
        Ok(lineages.get(key).and_then(|entries| {
            entries.range(..=height).next_back().map(|(_, c)| c.clone())
        }))
    }

    async fn insert(&self, computation: Computation) -> Result<(), StoreError> {
        let key = computation.key();
        let height = computation.block.height;
        let mut lineages = self.lineages.lock();
        match lineages.get_mut(&key) {
            Some(entries) => {
                entries.insert(height, computation);
            }
            None => {
                let mut entries = BTreeMap::new();
                entries.insert(height, computation);
                lineages.put(key, entries);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ch_03_formulas::{FormulaArgs, FormulaKind};
    use serde_json::json;
    use shared_types::Block;

    fn entry(height: u64, value: u64) -> Computation {
        Computation {
            formula_kind: FormulaKind::Wallet,
            formula_name: "balance".into(),
            address: "acct1".into(),
            args_canonical: "{}".into(),
            block: Block::new(height, height * 1000),
            value: json!(value.to_string()),
            dependent_keys: vec![],
        }
    }

    #[tokio::test]
    async fn lineage_lookup_is_by_height_range() {
        let cache = InMemoryComputationCache::new();
        cache.insert(entry(2, 100)).await.unwrap();
        cache.insert(entry(6, 200)).await.unwrap();

        let key = ComputationKey::new(
            FormulaKind::Wallet,
            "balance",
            "acct1",
            &FormulaArgs::new(),
        );
        let at_5 = cache.latest_at_or_before(&key, 5).await.unwrap().unwrap();
        assert_eq!(at_5.block.height, 2);
        let at_6 = cache.latest_at_or_before(&key, 6).await.unwrap().unwrap();
        assert_eq!(at_6.block.height, 6);
        assert!(cache.latest_at_or_before(&key, 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn capacity_evicts_whole_lineages() {
        let cache = InMemoryComputationCache::with_capacity(1);
        cache.insert(entry(1, 100)).await.unwrap();

        let mut other = entry(1, 50);
        other.address = "acct2".into();
        cache.insert(other).await.unwrap();

        assert_eq!(cache.len(), 1);
        let evicted = ComputationKey::new(
            FormulaKind::Wallet,
            "balance",
            "acct1",
            &FormulaArgs::new(),
        );
        assert!(cache.latest_at_or_before(&evicted, 9).await.unwrap().is_none());
    }
}
