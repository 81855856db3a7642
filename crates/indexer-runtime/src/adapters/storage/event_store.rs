//! RocksDB-backed historical event store.
//!
//! ## Key Layout
//!
//! `events` column family:
//!
//! ```text
//! <namespace> 0x00 <identity> 0x00 <remainder> 0x00 <height BE u64>
//! ```
//!
//! Keys sort by entity first, height last, so "newest row at or below a
//! block" is one reverse seek and identity-scoped existence checks are one
//! bounded prefix scan. Identity and remainder values never contain NUL.

use super::db::{backend_err, HistorianDb, CF_EVENTS};
use async_trait::async_trait;
use ch_02_event_store::{DependableEvent, DependentKeyClause, EventStore};
use rocksdb::{Direction, IteratorMode, WriteBatch};
use shared_types::{BlockHeight, StoreError};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Persistent [`EventStore`] adapter, shared across worker processes.
pub struct RocksDbEventStore {
    db: Arc<HistorianDb>,
}

fn entity_prefix(namespace: &str, identity: &str, remainder: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(namespace.len() + identity.len() + remainder.len() + 3);
    key.extend_from_slice(namespace.as_bytes());
    key.push(0);
    key.extend_from_slice(identity.as_bytes());
    key.push(0);
    key.extend_from_slice(remainder.as_bytes());
    key
}

fn event_key(namespace: &str, identity: &str, remainder: &str, height: BlockHeight) -> Vec<u8> {
    let mut key = entity_prefix(namespace, identity, remainder);
    key.push(0);
    key.extend_from_slice(&height.to_be_bytes());
    key
}

/// Split a stored key back into `(identity, remainder, height)`.
///
/// The namespace prefix (including its NUL) must already be stripped.
fn parse_entity_key(key: &[u8]) -> Option<(String, String, BlockHeight)> {
    let id_end = key.iter().position(|b| *b == 0)?;
    let rest = &key[id_end + 1..];
    if rest.len() < 9 || rest[rest.len() - 9] != 0 {
        return None;
    }
    let remainder = &rest[..rest.len() - 9];
    let height = u64::from_be_bytes(rest[rest.len() - 8..].try_into().ok()?);
    Some((
        String::from_utf8_lossy(&key[..id_end]).into_owned(),
        String::from_utf8_lossy(remainder).into_owned(),
        height,
    ))
}

impl RocksDbEventStore {
    /// Creates the adapter over a shared database handle.
    pub fn new(db: Arc<HistorianDb>) -> Self {
        Self { db }
    }

    fn decode(&self, bytes: &[u8]) -> Result<DependableEvent, StoreError> {
        serde_json::from_slice(bytes).map_err(|e| StoreError::Corruption(e.to_string()))
    }

    /// Scan one clause's identity shard for a hit in `(after, up_to]`.
    fn clause_hit(
        &self,
        namespace: &str,
        clause: &DependentKeyClause,
        after_height: BlockHeight,
        up_to_height: BlockHeight,
    ) -> Result<bool, StoreError> {
        let cf = self.db.cf(CF_EVENTS)?;
        let mut prefix = Vec::new();
        prefix.extend_from_slice(namespace.as_bytes());
        prefix.push(0);
        if let Some(identity) = &clause.identity {
            prefix.extend_from_slice(identity.as_bytes());
            prefix.push(0);
        }

        let ns_prefix_len = namespace.len() + 1;
        let iter = self
            .db
            .raw()
            .iterator_cf(cf, IteratorMode::From(&prefix, Direction::Forward));
        for entry in iter {
            let (key, _) = entry.map_err(backend_err)?;
            if !key.starts_with(&prefix) {
                break;
            }
            let Some((identity, remainder, height)) = parse_entity_key(&key[ns_prefix_len..])
            else {
                continue;
            };
            if height > after_height && height <= up_to_height
                && clause.matches(&identity, &remainder)
            {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[async_trait]
impl EventStore for RocksDbEventStore {
    async fn upsert(&self, events: &[DependableEvent]) -> Result<usize, StoreError> {
        let mut batch = WriteBatch::default();
        for event in events {
            let key = event_key(
                event.namespace(),
                &event.identity(),
                &event.remainder(),
                event.block_height(),
            );
            let value = serde_json::to_vec(event)
                .map_err(|e| StoreError::Corruption(e.to_string()))?;
            batch.put_cf(self.db.cf(CF_EVENTS)?, key, value);
        }
        self.db
            .raw()
            .write_opt(batch, &self.db.write_opts())
            .map_err(backend_err)?;
        Ok(events.len())
    }

    async fn latest_at_or_before(
        &self,
        namespace: &str,
        identity: &str,
        remainder: &str,
        height: BlockHeight,
    ) -> Result<Option<DependableEvent>, StoreError> {
        let cf = self.db.cf(CF_EVENTS)?;
        let mut prefix = entity_prefix(namespace, identity, remainder);
        prefix.push(0);
        let seek_key = event_key(namespace, identity, remainder, height);

        let mut iter = self
            .db
            .raw()
            .iterator_cf(cf, IteratorMode::From(&seek_key, Direction::Reverse));
        match iter.next() {
            Some(entry) => {
                let (key, value) = entry.map_err(backend_err)?;
                if key.starts_with(&prefix) {
                    Ok(Some(self.decode(&value)?))
                } else {
                    Ok(None)
                }
            }
            None => Ok(None),
        }
    }

    async fn snapshot(
        &self,
        namespace: &str,
        identity: &str,
        remainder_prefix: &str,
        height: BlockHeight,
    ) -> Result<Vec<DependableEvent>, StoreError> {
        let cf = self.db.cf(CF_EVENTS)?;
        let prefix = entity_prefix(namespace, identity, remainder_prefix);
        let ns_prefix_len = namespace.len() + 1;

        // Newest row per remainder at or below the block. Keys within one
        // remainder sort height-ascending, so later entries overwrite.
        let mut newest: BTreeMap<String, DependableEvent> = BTreeMap::new();
        let iter = self
            .db
            .raw()
            .iterator_cf(cf, IteratorMode::From(&prefix, Direction::Forward));
        for entry in iter {
            let (key, value) = entry.map_err(backend_err)?;
            if !key.starts_with(&prefix) {
                break;
            }
            let Some((_, remainder, row_height)) = parse_entity_key(&key[ns_prefix_len..]) else {
                continue;
            };
            if row_height <= height {
                newest.insert(remainder, self.decode(&value)?);
            }
        }
        Ok(newest.into_values().collect())
    }

    async fn exists_matching(
        &self,
        namespace: &str,
        clauses: &[DependentKeyClause],
        after_height: BlockHeight,
        up_to_height: BlockHeight,
    ) -> Result<bool, StoreError> {
        for clause in clauses {
            if self.clause_hit(namespace, clause, after_height, up_to_height)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::super::db::RocksDbConfig;
    use super::*;
    use ch_02_event_store::{namespace, BalanceEvent, DependentKeyMatcher};
    use shared_types::{DependentKey, U256};

    fn store() -> (tempfile::TempDir, RocksDbEventStore) {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(HistorianDb::open(RocksDbConfig::for_testing(dir.path())).unwrap());
        (dir, RocksDbEventStore::new(db))
    }

    fn balance(account: &str, denom: &str, amount: u64, height: u64) -> DependableEvent {
        DependableEvent::Balance(BalanceEvent {
            account: account.into(),
            denom: denom.into(),
            amount: U256::from(amount),
            block_height: height,
        })
    }

    #[tokio::test]
    async fn upsert_is_idempotent_and_lookups_pick_max_height() {
        let (_dir, store) = store();
        let events = vec![
            balance("acct1", "uhist", 100, 2),
            balance("acct1", "uhist", 300, 8),
        ];
        store.upsert(&events).await.unwrap();
        store.upsert(&events).await.unwrap();

        let at_5 = store
            .latest_at_or_before(namespace::BALANCE, "acct1", "uhist", 5)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(at_5.block_height(), 2);

        let at_9 = store
            .latest_at_or_before(namespace::BALANCE, "acct1", "uhist", 9)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(at_9.block_height(), 8);

        assert!(store
            .latest_at_or_before(namespace::BALANCE, "acct1", "uhist", 1)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn snapshot_returns_newest_row_per_remainder() {
        let (_dir, store) = store();
        store
            .upsert(&[
                balance("acct1", "uatom", 5, 1),
                balance("acct1", "uhist", 100, 2),
                balance("acct1", "uhist", 200, 6),
                balance("acct2", "uhist", 999, 3),
            ])
            .await
            .unwrap();

        let snap = store
            .snapshot(namespace::BALANCE, "acct1", "", 5)
            .await
            .unwrap();
        assert_eq!(snap.len(), 2);
        // Remainder-ascending: uatom then uhist, each at its newest height.
        assert_eq!(snap[0].remainder(), "uatom");
        assert_eq!(snap[1].block_height(), 2);
    }

    #[tokio::test]
    async fn exists_matching_honors_the_half_open_range() {
        let (_dir, store) = store();
        store.upsert(&[balance("acct1", "uhist", 100, 5)]).await.unwrap();

        let keys = vec![DependentKey::exact(namespace::BALANCE, &["acct1", "uhist"])];
        let clauses = DependentKeyMatcher::clauses_for(namespace::BALANCE, &keys);

        assert!(store
            .exists_matching(namespace::BALANCE, &clauses, 2, 9)
            .await
            .unwrap());
        // Height 5 is outside (5, 9] and outside (1, 4].
        assert!(!store
            .exists_matching(namespace::BALANCE, &clauses, 5, 9)
            .await
            .unwrap());
        assert!(!store
            .exists_matching(namespace::BALANCE, &clauses, 1, 4)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn wildcard_identity_scans_the_namespace() {
        let (_dir, store) = store();
        store.upsert(&[balance("acct7", "uhist", 10, 3)]).await.unwrap();

        let keys = vec![DependentKey::exact(namespace::BALANCE, &["*", "uhist"])];
        let clauses = DependentKeyMatcher::clauses_for(namespace::BALANCE, &keys);
        assert!(store
            .exists_matching(namespace::BALANCE, &clauses, 0, 9)
            .await
            .unwrap());
    }
}
