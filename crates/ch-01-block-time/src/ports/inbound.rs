//! # Inbound Port (Driving API)
//!
//! The query surface other subsystems use to resolve chain time. The
//! computation engine resolves time-bounded queries through this trait and
//! never sees the log storage directly.

use crate::domain::BlockTimeError;
use shared_types::{Block, BlockHeight, TimestampMs};

/// Bidirectional height/time lookups over the ordered block log.
///
/// All lookups fail with [`BlockTimeError::Empty`] only when the log holds
/// no blocks at all; out-of-range instants clamp to the first/latest block.
pub trait BlockTimes: Send + Sync {
    /// The newest block whose time is at or before `time_unix_ms`.
    ///
    /// Falls back to the first block when the instant predates the chain.
    fn block_at_or_before(&self, time_unix_ms: TimestampMs) -> Result<Block, BlockTimeError>;

    /// The oldest block whose time is at or after `time_unix_ms`.
    ///
    /// Falls back to the latest block when the instant is in the future.
    fn block_at_or_after(&self, time_unix_ms: TimestampMs) -> Result<Block, BlockTimeError>;

    /// The newest block whose height is at or before `height`.
    fn block_at_or_before_height(&self, height: BlockHeight) -> Result<Block, BlockTimeError>;

    /// The first recorded block.
    fn first(&self) -> Result<Block, BlockTimeError>;

    /// The latest recorded block.
    fn latest(&self) -> Result<Block, BlockTimeError>;
}

impl<T: BlockTimes + ?Sized> BlockTimes for std::sync::Arc<T> {
    fn block_at_or_before(&self, time_unix_ms: TimestampMs) -> Result<Block, BlockTimeError> {
        (**self).block_at_or_before(time_unix_ms)
    }

    fn block_at_or_after(&self, time_unix_ms: TimestampMs) -> Result<Block, BlockTimeError> {
        (**self).block_at_or_after(time_unix_ms)
    }

    fn block_at_or_before_height(&self, height: BlockHeight) -> Result<Block, BlockTimeError> {
        (**self).block_at_or_before_height(height)
    }

    fn first(&self) -> Result<Block, BlockTimeError> {
        (**self).first()
    }

    fn latest(&self) -> Result<Block, BlockTimeError> {
        (**self).latest()
    }
}
