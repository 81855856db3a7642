//! RocksDB-backed ordered block log.
//!
//! Two column families hold the same blocks under different keys:
//! big-endian height and big-endian time. Big-endian keys sort
//! numerically, so every lookup is a single iterator seek.

use super::db::{backend_err, HistorianDb, CF_BLOCKS_BY_HEIGHT, CF_BLOCKS_BY_TIME};
use ch_01_block_time::BlockLog;
use rocksdb::{Direction, IteratorMode, WriteBatch};
use shared_types::{Block, BlockHeight, StoreError, TimestampMs};
use std::sync::Arc;

/// Persistent [`BlockLog`] adapter.
pub struct RocksDbBlockLog {
    db: Arc<HistorianDb>,
}

impl RocksDbBlockLog {
    /// Creates the adapter over a shared database handle.
    pub fn new(db: Arc<HistorianDb>) -> Self {
        Self { db }
    }

    fn decode(&self, bytes: &[u8]) -> Result<Block, StoreError> {
        bincode::deserialize(bytes).map_err(|e| StoreError::Corruption(e.to_string()))
    }

    fn seek(
        &self,
        cf_name: &str,
        key: u64,
        direction: Direction,
    ) -> Result<Option<Block>, StoreError> {
        let cf = self.db.cf(cf_name)?;
        let seek_key = key.to_be_bytes();
        let mut iter = self
            .db
            .raw()
            .iterator_cf(cf, IteratorMode::From(&seek_key, direction));
        match iter.next() {
            Some(entry) => {
                let (_, value) = entry.map_err(backend_err)?;
                Ok(Some(self.decode(&value)?))
            }
            None => Ok(None),
        }
    }

    fn edge(&self, mode: IteratorMode) -> Result<Option<Block>, StoreError> {
        let cf = self.db.cf(CF_BLOCKS_BY_HEIGHT)?;
        let mut iter = self.db.raw().iterator_cf(cf, mode);
        match iter.next() {
            Some(entry) => {
                let (_, value) = entry.map_err(backend_err)?;
                Ok(Some(self.decode(&value)?))
            }
            None => Ok(None),
        }
    }
}

impl BlockLog for RocksDbBlockLog {
    fn insert(&self, block: Block) -> Result<(), StoreError> {
        let encoded =
            bincode::serialize(&block).map_err(|e| StoreError::Corruption(e.to_string()))?;
        let mut batch = WriteBatch::default();
        batch.put_cf(
            self.db.cf(CF_BLOCKS_BY_HEIGHT)?,
            block.height.to_be_bytes(),
            &encoded,
        );
        batch.put_cf(
            self.db.cf(CF_BLOCKS_BY_TIME)?,
            block.time_unix_ms.to_be_bytes(),
            &encoded,
        );
        self.db
            .raw()
            .write_opt(batch, &self.db.write_opts())
            .map_err(backend_err)
    }

    fn first(&self) -> Result<Option<Block>, StoreError> {
        self.edge(IteratorMode::Start)
    }

    fn latest(&self) -> Result<Option<Block>, StoreError> {
        self.edge(IteratorMode::End)
    }

    fn at_or_before_time(&self, time_unix_ms: TimestampMs) -> Result<Option<Block>, StoreError> {
        self.seek(CF_BLOCKS_BY_TIME, time_unix_ms, Direction::Reverse)
    }

    fn at_or_after_time(&self, time_unix_ms: TimestampMs) -> Result<Option<Block>, StoreError> {
        self.seek(CF_BLOCKS_BY_TIME, time_unix_ms, Direction::Forward)
    }

    fn at_or_before_height(&self, height: BlockHeight) -> Result<Option<Block>, StoreError> {
        self.seek(CF_BLOCKS_BY_HEIGHT, height, Direction::Reverse)
    }
}

#[cfg(test)]
mod tests {
    use super::super::db::RocksDbConfig;
    use super::*;

    fn log() -> (tempfile::TempDir, RocksDbBlockLog) {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(HistorianDb::open(RocksDbConfig::for_testing(dir.path())).unwrap());
        (dir, RocksDbBlockLog::new(db))
    }

    #[test]
    fn seeks_in_both_directions() {
        let (_dir, log) = log();
        for (h, t) in [(1u64, 1000u64), (2, 2000), (3, 3000)] {
            log.insert(Block::new(h, t)).unwrap();
        }

        assert_eq!(log.first().unwrap().unwrap().height, 1);
        assert_eq!(log.latest().unwrap().unwrap().height, 3);
        assert_eq!(log.at_or_before_time(2500).unwrap().unwrap().height, 2);
        assert_eq!(log.at_or_after_time(2500).unwrap().unwrap().height, 3);
        assert_eq!(log.at_or_before_height(2).unwrap().unwrap().height, 2);
        assert!(log.at_or_before_time(500).unwrap().is_none());
        assert!(log.at_or_after_time(9999).unwrap().is_none());
    }

    #[test]
    fn empty_log_returns_nothing() {
        let (_dir, log) = log();
        assert!(log.first().unwrap().is_none());
        assert!(log.latest().unwrap().is_none());
    }
}
