//! Error types for the Block Time Index subsystem.

use shared_types::StoreError;
use thiserror::Error;

/// Errors that can occur in the Block Time Index.
#[derive(Debug, Clone, Error)]
pub enum BlockTimeError {
    /// The log is empty; no block can answer any lookup.
    #[error("Block time index is empty")]
    Empty,

    /// An append would break height/time monotonicity.
    #[error(
        "Non-monotonic block: height {height} at {time_unix_ms}ms does not \
         advance past height {latest_height} at {latest_time_unix_ms}ms"
    )]
    NonMonotonic {
        /// Height of the rejected block.
        height: u64,
        /// Time of the rejected block.
        time_unix_ms: u64,
        /// Height of the current latest block.
        latest_height: u64,
        /// Time of the current latest block.
        latest_time_unix_ms: u64,
    },

    /// The underlying log storage failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
