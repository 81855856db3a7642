//! # In-Memory Block Log
//!
//! BTreeMap-backed implementation of the [`BlockLog`] port. Two ordered
//! maps give binary-search lookups on both axes; height and time advance
//! together, so the maps stay consistent.

use crate::ports::BlockLog;
use parking_lot::RwLock;
use shared_types::{Block, BlockHeight, StoreError, TimestampMs};
use std::collections::BTreeMap;

/// In-memory ordered block log.
#[derive(Default)]
pub struct InMemoryBlockLog {
    inner: RwLock<Maps>,
}

#[derive(Default)]
struct Maps {
    by_height: BTreeMap<BlockHeight, Block>,
    by_time: BTreeMap<TimestampMs, Block>,
}

impl InMemoryBlockLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded blocks.
    pub fn len(&self) -> usize {
        self.inner.read().by_height.len()
    }

    /// Returns true if no blocks have been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BlockLog for InMemoryBlockLog {
    fn insert(&self, block: Block) -> Result<(), StoreError> {
        let mut maps = self.inner.write();
        maps.by_height.insert(block.height, block);
        maps.by_time.insert(block.time_unix_ms, block);
        Ok(())
    }

    fn first(&self) -> Result<Option<Block>, StoreError> {
        Ok(self.inner.read().by_height.values().next().copied())
    }

    fn latest(&self) -> Result<Option<Block>, StoreError> {
        Ok(self.inner.read().by_height.values().next_back().copied())
    }

    fn at_or_before_time(&self, time_unix_ms: TimestampMs) -> Result<Option<Block>, StoreError> {
        Ok(self
            .inner
            .read()
            .by_time
            .range(..=time_unix_ms)
            .next_back()
            .map(|(_, b)| *b))
    }

    fn at_or_after_time(&self, time_unix_ms: TimestampMs) -> Result<Option<Block>, StoreError> {
        Ok(self
            .inner
            .read()
            .by_time
            .range(time_unix_ms..)
            .next()
            .map(|(_, b)| *b))
    }

    fn at_or_before_height(&self, height: BlockHeight) -> Result<Option<Block>, StoreError> {
        Ok(self
            .inner
            .read()
            .by_height
            .range(..=height)
            .next_back()
            .map(|(_, b)| *b))
    }
}
