//! # Computation Engine Subsystem (ch-04)
//!
//! Evaluates formulas at a block or across a block/time range, with result
//! caching tied to exactly which on-chain state each evaluation read.
//!
//! ## Caching Model
//!
//! A cache entry stores the value *and* the dependent keys the formula
//! touched. A later query at block Q can reuse an entry computed at block
//! B < Q iff no event matching those keys landed in `(B, Q]` — answered by
//! the dependent-key matcher with one indexed existence query per identity
//! group. Invalidation triggers a full recomputation at Q; entries are
//! appended, never mutated, so history of results is retained alongside
//! history of state.
//!
//! ## Hexagonal Architecture
//!
//! - **Domain Layer** (`domain/`): cache entry and key, range types, errors
//! - **Ports Layer** (`ports/`): `ComputationCache` outbound trait
//! - **Adapters Layer** (`adapters/`): in-memory LRU-indexed cache
//! - **Engine** (`engine.rs`): the query surface

pub mod adapters;
pub mod domain;
pub mod engine;
pub mod ports;

pub use domain::{Computation, ComputationKey, ComputeError, RangeBounds, RangeSample};
pub use engine::ComputationEngine;
pub use ports::ComputationCache;
