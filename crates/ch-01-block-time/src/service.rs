//! # Block Time Index Service
//!
//! The main service implementing the [`BlockTimes`] API on top of a
//! [`BlockLog`] port. Appends enforce monotonicity; lookups clamp
//! out-of-range instants to the first/latest block.

use crate::domain::BlockTimeError;
use crate::ports::{BlockLog, BlockTimes};
use shared_types::{Block, BlockHeight, TimestampMs};
use tracing::debug;

/// Bidirectional mapping between block height and wall-clock time.
pub struct BlockTimeIndex<L: BlockLog> {
    log: L,
}

impl<L: BlockLog> BlockTimeIndex<L> {
    /// Creates a new index over the given log.
    pub fn new(log: L) -> Self {
        Self { log }
    }

    /// Record an observed block.
    ///
    /// Height and time must both advance past the current latest block.
    /// Recording an identical block again is a no-op, so replayed trace
    /// input is harmless.
    pub fn record(&self, block: Block) -> Result<(), BlockTimeError> {
        if let Some(latest) = self.log.latest()? {
            if block == latest {
                return Ok(());
            }
            if block.height <= latest.height || block.time_unix_ms < latest.time_unix_ms {
                return Err(BlockTimeError::NonMonotonic {
                    height: block.height,
                    time_unix_ms: block.time_unix_ms,
                    latest_height: latest.height,
                    latest_time_unix_ms: latest.time_unix_ms,
                });
            }
        }
        debug!(height = block.height, time_ms = block.time_unix_ms, "recording block");
        self.log.insert(block)?;
        Ok(())
    }

    /// Access the underlying log.
    pub fn log(&self) -> &L {
        &self.log
    }
}

impl<L: BlockLog> BlockTimes for BlockTimeIndex<L> {
    fn block_at_or_before(&self, time_unix_ms: TimestampMs) -> Result<Block, BlockTimeError> {
        match self.log.at_or_before_time(time_unix_ms)? {
            Some(block) => Ok(block),
            // Instant predates the chain: clamp to the first block.
            None => self.first(),
        }
    }

    fn block_at_or_after(&self, time_unix_ms: TimestampMs) -> Result<Block, BlockTimeError> {
        match self.log.at_or_after_time(time_unix_ms)? {
            Some(block) => Ok(block),
            // Instant is beyond the chain head: clamp to the latest block.
            None => self.latest(),
        }
    }

    fn block_at_or_before_height(&self, height: BlockHeight) -> Result<Block, BlockTimeError> {
        match self.log.at_or_before_height(height)? {
            Some(block) => Ok(block),
            None => self.first(),
        }
    }

    fn first(&self) -> Result<Block, BlockTimeError> {
        self.log.first()?.ok_or(BlockTimeError::Empty)
    }

    fn latest(&self) -> Result<Block, BlockTimeError> {
        self.log.latest()?.ok_or(BlockTimeError::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryBlockLog;

    fn index_with(blocks: &[(u64, u64)]) -> BlockTimeIndex<InMemoryBlockLog> {
        let index = BlockTimeIndex::new(InMemoryBlockLog::new());
        for (height, time) in blocks {
            index.record(Block::new(*height, *time)).unwrap();
        }
        index
    }

    #[test]
    fn empty_index_fails_with_not_found() {
        let index = BlockTimeIndex::new(InMemoryBlockLog::new());
        assert!(matches!(index.first(), Err(BlockTimeError::Empty)));
        assert!(matches!(index.block_at_or_before(1000), Err(BlockTimeError::Empty)));
    }

    #[test]
    fn clamps_to_first_and_latest() {
        let index = index_with(&[(1, 1000), (2, 2000), (3, 3000)]);

        // Before the chain started: first block.
        assert_eq!(index.block_at_or_before(10).unwrap().height, 1);
        // After the chain head: latest block.
        assert_eq!(index.block_at_or_after(99_999).unwrap().height, 3);
    }

    #[test]
    fn exact_and_between_lookups() {
        let index = index_with(&[(1, 1000), (2, 2000), (3, 3000)]);

        assert_eq!(index.block_at_or_before(2000).unwrap().height, 2);
        assert_eq!(index.block_at_or_before(2999).unwrap().height, 2);
        assert_eq!(index.block_at_or_after(1001).unwrap().height, 2);
        assert_eq!(index.block_at_or_before_height(2).unwrap().height, 2);
    }

    #[test]
    fn rejects_non_monotonic_appends() {
        let index = index_with(&[(5, 5000)]);

        // Height going backwards.
        assert!(matches!(
            index.record(Block::new(4, 6000)),
            Err(BlockTimeError::NonMonotonic { .. })
        ));
        // Time going backwards.
        assert!(matches!(
            index.record(Block::new(6, 4000)),
            Err(BlockTimeError::NonMonotonic { .. })
        ));
        // Identical record is idempotent.
        index.record(Block::new(5, 5000)).unwrap();
    }
}
