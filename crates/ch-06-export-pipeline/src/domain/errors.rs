//! Error types for the export pipeline subsystem.

use ch_05_trace_ingest::HandlerError;
use shared_types::{QueueError, StoreError};
use thiserror::Error;

/// Errors a job run can produce.
///
/// Everything here is retried within the attempt budget except
/// `UnknownHandler`, which can only mean a deployment mismatch between the
/// producing and consuming processes.
#[derive(Debug, Error)]
pub enum ExportError {
    /// A batch item names a handler this process does not know.
    #[error("Unknown handler in batch: {0}")]
    UnknownHandler(String),

    /// The handler's `process` step failed.
    #[error(transparent)]
    Handler(#[from] HandlerError),

    /// Persisting the typed events failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The durable queue failed.
    #[error(transparent)]
    Queue(#[from] QueueError),
}
