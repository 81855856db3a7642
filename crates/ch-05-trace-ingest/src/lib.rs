//! # Trace Ingestion Subsystem (ch-05)
//!
//! Consumes the unbounded line-delimited stream of raw state mutations the
//! chain node emits, routes each relevant record through the registered
//! trace handlers, and batches handler outputs into durable export jobs.
//!
//! ## Pipeline
//!
//! ```text
//! raw trace line -> parse/filter -> annotate with block time -> inbound
//! queue -> handler match -> BatchedExporter -> durable queue
//! ```
//!
//! ## Backpressure
//!
//! The inbound queue is deliberately unbounded: the upstream source is a
//! blocking pipe, so the producer stalls when this worker stops reading.
//! Backpressure propagates by not pulling the stream, never by rejecting
//! input.
//!
//! ## Hexagonal Architecture
//!
//! - **Domain Layer** (`domain/`): annotated traces, worker states, errors
//! - **Ports Layer** (`ports/`): `TraceHandler` contract, `BlockTimeSource`
//! - **Handlers** (`handlers/`): built-in handlers per module store
//! - **Worker / Exporter** (`worker.rs`, `exporter.rs`): the pump itself

pub mod domain;
pub mod exporter;
pub mod handlers;
pub mod ports;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use domain::{AnnotatedTrace, HandlerError, IngestError, WorkerState};
pub use exporter::{BatchedExporter, ExporterConfig};
pub use ports::{BlockTimeSource, HandlerRegistry, TraceHandler};
pub use worker::TraceIngestWorker;
