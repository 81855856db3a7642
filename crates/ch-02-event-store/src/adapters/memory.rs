//! # In-Memory Event Store
//!
//! BTreeMap-backed implementation of the [`EventStore`] port. The ordered
//! composite key `(namespace, identity, remainder, height)` gives the same
//! range-scan shape the RocksDB adapter uses, so predicate evaluation is
//! identical between test and production backends.

use crate::domain::{DependableEvent, DependentKeyClause};
use crate::ports::EventStore;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{BlockHeight, StoreError};
use std::collections::BTreeMap;

type EventKey = (String, String, String, BlockHeight);

/// In-memory append-only event store.
#[derive(Default)]
pub struct InMemoryEventStore {
    rows: RwLock<BTreeMap<EventKey, DependableEvent>>,
}

impl InMemoryEventStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of historical rows.
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    /// Returns true if no events have been persisted.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn key_for(event: &DependableEvent) -> EventKey {
        (
            event.namespace().to_string(),
            event.identity(),
            event.remainder(),
            event.block_height(),
        )
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn upsert(&self, events: &[DependableEvent]) -> Result<usize, StoreError> {
        let mut rows = self.rows.write();
        for event in events {
            rows.insert(Self::key_for(event), event.clone());
        }
        Ok(events.len())
    }

    async fn latest_at_or_before(
        &self,
        namespace: &str,
        identity: &str,
        remainder: &str,
        height: BlockHeight,
    ) -> Result<Option<DependableEvent>, StoreError> {
        let lo = (
            namespace.to_string(),
            identity.to_string(),
            remainder.to_string(),
            0,
        );
        let hi = (
            namespace.to_string(),
            identity.to_string(),
            remainder.to_string(),
            height,
        );
        Ok(self
            .rows
            .read()
            .range(lo..=hi)
            .next_back()
            .map(|(_, e)| e.clone()))
    }

    async fn snapshot(
        &self,
        namespace: &str,
        identity: &str,
        remainder_prefix: &str,
        height: BlockHeight,
    ) -> Result<Vec<DependableEvent>, StoreError> {
        let rows = self.rows.read();
        let lo = (
            namespace.to_string(),
            identity.to_string(),
            String::new(),
            0,
        );
        let mut current: BTreeMap<String, DependableEvent> = BTreeMap::new();
        for ((ns, id, remainder, h), event) in rows.range(lo..) {
            if ns != namespace || id != identity {
                break;
            }
            if !remainder.starts_with(remainder_prefix) || *h > height {
                continue;
            }
            // Ascending height within one remainder: later rows win.
            current.insert(remainder.clone(), event.clone());
        }
        Ok(current.into_values().collect())
    }

    async fn exists_matching(
        &self,
        namespace: &str,
        clauses: &[DependentKeyClause],
        after_height: BlockHeight,
        up_to_height: BlockHeight,
    ) -> Result<bool, StoreError> {
        if after_height >= up_to_height {
            return Ok(false);
        }
        let rows = self.rows.read();
        for clause in clauses {
            // One range scan per identity group; the wildcard group scans
            // the whole namespace.
            let start_identity = clause.identity.clone().unwrap_or_default();
            let lo = (
                namespace.to_string(),
                start_identity,
                String::new(),
                0,
            );
            for ((ns, identity, remainder, height), _) in rows.range(lo..) {
                if ns != namespace {
                    break;
                }
                if let Some(wanted) = &clause.identity {
                    if identity != wanted {
                        break;
                    }
                }
                if *height > after_height
                    && *height <= up_to_height
                    && clause.matches(identity, remainder)
                {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}
