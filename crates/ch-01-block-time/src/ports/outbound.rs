//! # Outbound Port (Driven Port)
//!
//! Storage required by the Block Time Index service.
//!
//! Production: RocksDB-backed log (indexer-runtime adapters).
//! Testing: `InMemoryBlockLog` (adapters/memory.rs).

use shared_types::{Block, BlockHeight, StoreError, TimestampMs};

/// An ordered, append-only log of `(height, time)` pairs.
///
/// Implementations provide range-query semantics (binary search or iterator
/// seeks); the service layers monotonicity checks and clamping on top.
/// Methods take `&self`; adapters use interior mutability so the log can be
/// shared between the ingest worker and the query path.
pub trait BlockLog: Send + Sync {
    /// Append a block. Writing the same block twice is a no-op.
    fn insert(&self, block: Block) -> Result<(), StoreError>;

    /// The lowest-height block, if any.
    fn first(&self) -> Result<Option<Block>, StoreError>;

    /// The highest-height block, if any.
    fn latest(&self) -> Result<Option<Block>, StoreError>;

    /// The newest block with time at or before `time_unix_ms`.
    fn at_or_before_time(&self, time_unix_ms: TimestampMs) -> Result<Option<Block>, StoreError>;

    /// The oldest block with time at or after `time_unix_ms`.
    fn at_or_after_time(&self, time_unix_ms: TimestampMs) -> Result<Option<Block>, StoreError>;

    /// The newest block with height at or before `height`.
    fn at_or_before_height(&self, height: BlockHeight) -> Result<Option<Block>, StoreError>;
}
