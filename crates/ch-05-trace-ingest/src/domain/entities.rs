//! Ingest-side domain entities.

use shared_types::{Block, TraceRecord};

/// A raw trace record annotated with its resolved block time.
///
/// Annotation happens once at ingest; every handler downstream sees the
/// same resolved block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedTrace {
    /// The raw record as it arrived on the stream.
    pub record: TraceRecord,
    /// The block the record belongs to, with wall-clock time resolved.
    pub block: Block,
}

/// Lifecycle of the ingest worker.
///
/// `Idle -> Reading -> Draining -> Closed`, strictly forward. Draining is
/// entered on stream EOF or an external close signal; Closed once the
/// inbound queue is empty and the exporter has confirmed its flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Constructed, stream not yet opened.
    Idle,
    /// Pulling records from the live stream.
    Reading,
    /// No new reads; buffered work is completing.
    Draining,
    /// Terminal. All buffered and durable work confirmed.
    Closed,
}
