//! # Shared Types Crate
//!
//! This crate contains all domain entities shared across the Chain-Historian
//! subsystems: blocks, raw trace records, dependent keys, and the durable
//! export-queue contract.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **Append-Only History**: Entities that describe chain history are
//!   immutable once created; newer records supersede, never overwrite.
//! - **Integer Ledger Math**: All token amounts use `U256`. Floating point
//!   never appears in ledger arithmetic.

pub mod dependent_key;
pub mod entities;
pub mod errors;
pub mod queue;

pub use dependent_key::{DependentKey, WILDCARD};
pub use entities::*;
pub use errors::*;
pub use queue::{DurableQueue, JobId, QueueError};
