//! # Error Types
//!
//! Defines error types shared across subsystems. The taxonomy:
//!
//! 1. Validation errors — surfaced immediately to the caller, never retried,
//!    never cached.
//! 2. Transient infrastructure errors — retried up to a fixed attempt budget
//!    with backoff, then dead-lettered.
//! 3. Malformed or irrelevant trace input — dropped and counted, not an error.
//! 4. Best-effort fan-out failures — logged, never propagated.

use thiserror::Error;

/// Errors from the persistent stores (block log, event store, cache).
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The requested record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A stored value could not be decoded.
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// The underlying backend failed.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// A caller-facing validation failure.
///
/// Never retried and never cached; the offending request is wrong, not the
/// system.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    /// A required formula argument was not supplied.
    #[error("Missing required argument: {0}")]
    MissingArgument(String),

    /// An argument was supplied but unusable.
    #[error("Invalid argument {name}: {reason}")]
    InvalidArgument {
        /// The argument name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A range query step must be positive.
    #[error("Invalid step {0}: step must be positive")]
    InvalidStep(i64),

    /// Range bounds are inverted.
    #[error("Invalid range: start {start} is after end {end}")]
    InvalidRange {
        /// Requested start of the range.
        start: u64,
        /// Requested end of the range.
        end: u64,
    },
}
