//! # Chain-Historian Indexer Runtime
//!
//! The composition root. Everything here is wiring: configuration loaded
//! from the environment, RocksDB adapters behind the subsystem ports, the
//! chain RPC connection manager, and the runtime that spawns the ingest
//! pump and the export consumer with an ordered shutdown.
//!
//! ## Modular Structure
//!
//! - `config` - `HISTORIAN_*` environment configuration
//! - `adapters/` - RocksDB implementations of the storage ports
//! - `rpc` - keyed chain RPC client pool with invalidate-and-recreate
//! - `runtime` - subsystem wiring, task spawning, diagnostic dump

pub mod adapters;
pub mod config;
pub mod rpc;
pub mod runtime;

pub use config::{load_config, HistorianConfig};
pub use runtime::HistorianRuntime;
