//! # Dependable Event Store Subsystem (ch-02)
//!
//! The append-only historical record store. Every state change a handler
//! derives from the raw trace stream lands here as a typed
//! [`DependableEvent`], keyed by a kind-specific identity plus ascending
//! block height — one immutable row per observed change, full history
//! retained.
//!
//! ## Responsibilities
//!
//! - Define the closed set of persisted entity kinds (balances, allowances,
//!   contract state, governance proposals) and their derived dependent keys
//! - Resolve store names to entity namespaces once per trace record
//! - Turn a cached computation's recorded dependent keys into indexed
//!   existence predicates ([`DependentKeyMatcher`]) so "has anything
//!   relevant changed since block B" is one range query, not a scan
//!
//! ## Write Semantics
//!
//! Upserts are keyed by `(identity…, block_height)`: replaying a batch or
//! racing a concurrent writer resolves to last-write-wins on identical
//! rows, which is why handlers may safely repeat work after a timeout.
//!
//! ## Hexagonal Architecture
//!
//! - **Domain Layer** (`domain/`): event variants, namespaces, matcher
//! - **Ports Layer** (`ports/`): `EventStore` outbound trait
//! - **Adapters Layer** (`adapters/`): in-memory store (production RocksDB
//!   adapter lives in indexer-runtime)

pub mod adapters;
pub mod domain;
pub mod ports;

pub use domain::{
    namespace, namespace_for_store, AllowanceEvent, BalanceEvent, ContractStateEvent,
    DependableEvent, DependentKeyClause, DependentKeyMatcher, GovernanceProposalEvent,
};
pub use ports::EventStore;
