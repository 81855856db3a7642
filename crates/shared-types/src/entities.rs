//! # Core Domain Entities
//!
//! Defines the core entities of the historical indexer.
//!
//! ## Clusters
//!
//! - **Chain time**: [`Block`] — the height/time pair every historical record
//!   and every query is anchored to.
//! - **Ingestion**: [`TraceRecord`] — the raw state-mutation wire format
//!   emitted by the chain node, one JSON object per line.
//! - **Export**: [`ExportBatchItem`] / [`ExportJob`] — handler outputs in
//!   flight between the ingest worker and the queue consumers.

use serde::{Deserialize, Serialize};

// Re-export U256 from primitive-types for use across all subsystems
pub use primitive_types::U256;

/// A chain account or contract address, in its bech32/hex textual form.
pub type Address = String;

/// Block height in the chain.
pub type BlockHeight = u64;

/// Wall-clock timestamp in milliseconds since the UNIX epoch.
pub type TimestampMs = u64;

/// A single point of chain time: the bidirectional (height, wall-clock) pair.
///
/// Blocks are created as trace notifications arrive, are immutable once
/// created, and are strictly monotonic in both fields across the stream.
/// At most one record exists per height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Block {
    /// Block height in the chain.
    pub height: BlockHeight,
    /// Wall-clock time of the block in milliseconds since the UNIX epoch.
    pub time_unix_ms: TimestampMs,
}

impl Block {
    /// Creates a new block record.
    pub fn new(height: BlockHeight, time_unix_ms: TimestampMs) -> Self {
        Self {
            height,
            time_unix_ms,
        }
    }
}

/// The kind of state mutation a trace record describes.
///
/// `Read` traces arrive on the stream but are never indexed; only writes and
/// deletes change history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceOperation {
    /// A state read. Dropped by the ingest worker.
    Read,
    /// A state write (key now holds `value`).
    Write,
    /// A state deletion (key no longer exists).
    Delete,
}

impl TraceOperation {
    /// Returns true if this operation mutates state and is worth indexing.
    pub fn is_mutation(&self) -> bool {
        matches!(self, TraceOperation::Write | TraceOperation::Delete)
    }
}

/// Metadata attached to a raw trace record by the emitting node.
///
/// Field names are part of the wire format and must not change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceMetadata {
    /// Height of the block this mutation belongs to.
    #[serde(rename = "blockHeight")]
    pub block_height: BlockHeight,
    /// Hash of the transaction that caused the mutation, if any.
    #[serde(rename = "txHash", skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    /// Name of the module store the key lives in (e.g. "bank", "wasm").
    #[serde(rename = "store_name", skip_serializing_if = "Option::is_none")]
    pub store_name: Option<String>,
}

/// A raw observed state mutation emitted by the chain node.
///
/// Arrives as one JSON object per line on a continuously-read stream.
/// Ephemeral: never persisted directly — only handler-derived typed events
/// are persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceRecord {
    /// What happened to the key.
    pub operation: TraceOperation,
    /// The raw store key that changed.
    pub key: String,
    /// The new value (empty for deletes).
    pub value: String,
    /// Block and transaction context.
    pub metadata: TraceMetadata,
}

impl TraceRecord {
    /// Height of the block this trace belongs to.
    pub fn block_height(&self) -> BlockHeight {
        self.metadata.block_height
    }

    /// The store this trace belongs to, if the node attached one.
    pub fn store_name(&self) -> Option<&str> {
        self.metadata.store_name.as_deref()
    }
}

/// One handler output buffered for export.
///
/// Lifetime: one durable queue job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportBatchItem {
    /// Name of the handler that matched the trace.
    pub handler_name: String,
    /// The handler's matched data, opaque to the pipeline.
    pub data: serde_json::Value,
}

impl ExportBatchItem {
    /// Creates a new batch item for the named handler.
    pub fn new(handler_name: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            handler_name: handler_name.into(),
            data,
        }
    }
}

/// A durable batch of export items, flushed as a single queue job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportJob {
    /// Unique job identifier, used for acknowledgement and dead-lettering.
    pub id: crate::queue::JobId,
    /// The buffered items, in the order they were matched.
    pub items: Vec<ExportBatchItem>,
}

impl ExportJob {
    /// Creates a job with a fresh identifier.
    pub fn new(items: Vec<ExportBatchItem>) -> Self {
        Self {
            id: crate::queue::JobId::new(),
            items,
        }
    }
}
