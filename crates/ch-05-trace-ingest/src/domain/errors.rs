//! Error types for the trace ingestion subsystem.
//!
//! Malformed or irrelevant trace input is NOT an error: those records are
//! dropped, counted, and logged at debug. The variants here are the
//! failures that stop the pump.

use ch_01_block_time::BlockTimeError;
use shared_types::{QueueError, StoreError};
use thiserror::Error;

/// Fatal errors of the ingest pump.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The trace stream itself failed.
    #[error("Trace stream read failed: {0}")]
    Read(#[from] std::io::Error),

    /// The durable queue rejected a flush.
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// Block time bookkeeping failed.
    #[error(transparent)]
    BlockTime(#[from] BlockTimeError),

    /// The block time source could not resolve a height.
    #[error(transparent)]
    Clock(#[from] StoreError),
}

/// Errors a handler's `process` step can produce.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// A batch item did not match the handler's own matched-data shape.
    #[error("Malformed batch item: {0}")]
    Malformed(String),
}
