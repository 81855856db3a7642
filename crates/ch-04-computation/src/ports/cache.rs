//! # Computation Cache Port (Driven Port)
//!
//! Persistence for computed results. Production: RocksDB adapter in
//! indexer-runtime. Testing: `InMemoryComputationCache`.

use crate::domain::{Computation, ComputationKey};
use async_trait::async_trait;
use shared_types::{BlockHeight, StoreError};

/// Append-only storage of computation results.
///
/// Entries are never mutated in place; a recomputation appends a new entry
/// at a later block. Concurrent inserts of the same `(key, height)` row
/// resolve to last-write-wins.
#[async_trait]
pub trait ComputationCache: Send + Sync {
    /// The newest entry for `key` computed at or before `height`.
    async fn latest_at_or_before(
        &self,
        key: &ComputationKey,
        height: BlockHeight,
    ) -> Result<Option<Computation>, StoreError>;

    /// Append an entry.
    async fn insert(&self, computation: Computation) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: ComputationCache + ?Sized> ComputationCache for std::sync::Arc<T> {
    async fn latest_at_or_before(
        &self,
        key: &ComputationKey,
        height: BlockHeight,
    ) -> Result<Option<Computation>, StoreError> {
        (**self).latest_at_or_before(key, height).await
    }

    async fn insert(&self, computation: Computation) -> Result<(), StoreError> {
        (**self).insert(computation).await
    }
}
