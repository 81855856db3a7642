//! # Event Store Port (Driven Port)
//!
//! Persistence for typed historical events. Production: RocksDB adapter in
//! indexer-runtime. Testing: `InMemoryEventStore`.

use crate::domain::{DependableEvent, DependentKeyClause};
use async_trait::async_trait;
use shared_types::{BlockHeight, StoreError};

/// Append-only historical event storage, queried by (namespace, identity,
/// remainder, height).
///
/// Writes are upserts keyed by `(identity…, block_height)`: concurrent
/// duplicate writes and replays resolve to last-write-wins on the same row.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Persist a batch of events. Returns the number of rows written.
    ///
    /// Idempotent: replaying the same batch leaves the store unchanged.
    async fn upsert(&self, events: &[DependableEvent]) -> Result<usize, StoreError>;

    /// The newest event for one entity at or before `height`.
    ///
    /// "Current" state at a block is always the max-height row at or below
    /// that block.
    async fn latest_at_or_before(
        &self,
        namespace: &str,
        identity: &str,
        remainder: &str,
        height: BlockHeight,
    ) -> Result<Option<DependableEvent>, StoreError>;

    /// Current state of every entity under one identity at `height`:
    /// the newest event per remainder (restricted to `remainder_prefix`)
    /// with height at or below `height`. Deleted entities are included;
    /// callers filter with [`DependableEvent::is_delete`].
    async fn snapshot(
        &self,
        namespace: &str,
        identity: &str,
        remainder_prefix: &str,
        height: BlockHeight,
    ) -> Result<Vec<DependableEvent>, StoreError>;

    /// Does any event matching the clauses exist with height in
    /// `(after_height, up_to_height]`?
    ///
    /// This is the cache-invalidation query: one indexed range scan per
    /// identity group, never a full namespace scan.
    async fn exists_matching(
        &self,
        namespace: &str,
        clauses: &[DependentKeyClause],
        after_height: BlockHeight,
        up_to_height: BlockHeight,
    ) -> Result<bool, StoreError>;

    /// The event immediately preceding `event` for the same entity.
    async fn previous_event(
        &self,
        event: &DependableEvent,
    ) -> Result<Option<DependableEvent>, StoreError> {
        let height = event.block_height();
        if height == 0 {
            return Ok(None);
        }
        self.latest_at_or_before(
            event.namespace(),
            &event.identity(),
            &event.remainder(),
            height - 1,
        )
        .await
    }
}

#[async_trait]
impl<T: EventStore + ?Sized> EventStore for std::sync::Arc<T> {
    async fn upsert(&self, events: &[DependableEvent]) -> Result<usize, StoreError> {
        (**self).upsert(events).await
    }

    async fn latest_at_or_before(
        &self,
        namespace: &str,
        identity: &str,
        remainder: &str,
        height: BlockHeight,
    ) -> Result<Option<DependableEvent>, StoreError> {
        (**self)
            .latest_at_or_before(namespace, identity, remainder, height)
            .await
    }

    async fn snapshot(
        &self,
        namespace: &str,
        identity: &str,
        remainder_prefix: &str,
        height: BlockHeight,
    ) -> Result<Vec<DependableEvent>, StoreError> {
        (**self)
            .snapshot(namespace, identity, remainder_prefix, height)
            .await
    }

    async fn exists_matching(
        &self,
        namespace: &str,
        clauses: &[DependentKeyClause],
        after_height: BlockHeight,
        up_to_height: BlockHeight,
    ) -> Result<bool, StoreError> {
        (**self)
            .exists_matching(namespace, clauses, after_height, up_to_height)
            .await
    }
}
