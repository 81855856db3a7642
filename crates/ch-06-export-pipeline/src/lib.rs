//! # Export Pipeline Subsystem (ch-06)
//!
//! The consumer side of the durable export queue. Competing consumer
//! processes pull batch jobs, run each handler's `process` step over its
//! grouped items, persist the resulting typed events, and fan the persisted
//! events out best-effort to the search index and webhook channels.
//!
//! ## Delivery Semantics
//!
//! - Handler persistence: at-least-once. Jobs retry up to a bounded attempt
//!   budget with backoff, under a hard wall-clock timeout; handlers are
//!   idempotent (upserts by identity + block height), so repeats are safe.
//! - Downstream fan-out: best-effort. Failures are logged and counted,
//!   never fail the originating job.
//!
//! ## Hexagonal Architecture
//!
//! - **Domain Layer** (`domain/`): errors
//! - **Ports Layer** (`ports/`): search-index and webhook fan-out traits
//! - **Adapters Layer** (`adapters/`): in-memory queue, no-op fan-out
//! - **Consumer** (`consumer.rs`): the job loop

pub mod adapters;
pub mod consumer;
pub mod domain;
pub mod ports;

pub use consumer::{ConsumerConfig, ExportQueueConsumer};
pub use domain::ExportError;
pub use ports::{FanoutError, SearchIndexUpdater, WebhookDispatcher};
