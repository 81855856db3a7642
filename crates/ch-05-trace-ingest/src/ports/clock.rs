//! # Block Time Source Port (Driven Port)
//!
//! Resolves the wall-clock time of a block height the block time index has
//! not seen yet. Production: the chain RPC connection manager in
//! indexer-runtime. Testing: a fixed-interval stub.

use async_trait::async_trait;
use shared_types::{BlockHeight, StoreError, TimestampMs};

/// Resolves block heights to wall-clock timestamps.
#[async_trait]
pub trait BlockTimeSource: Send + Sync {
    /// Wall-clock time of the block at `height`, ms since the UNIX epoch.
    async fn time_for_height(&self, height: BlockHeight) -> Result<TimestampMs, StoreError>;
}

#[async_trait]
impl<T: BlockTimeSource + ?Sized> BlockTimeSource for std::sync::Arc<T> {
    async fn time_for_height(&self, height: BlockHeight) -> Result<TimestampMs, StoreError> {
        (**self).time_for_height(height).await
    }
}
