//! RocksDB-backed implementations of the storage ports.
//!
//! One database, one column family per concern:
//!
//! - `blocks_by_height` / `blocks_by_time` - the ordered block log
//! - `events` - typed historical events
//! - `computations` - cached computation results
//!
//! All adapters share one [`HistorianDb`] handle; the event store and the
//! computation cache are safe to share across worker processes because
//! every write is an upsert keyed by `(identity…, block_height)`.

mod block_log;
mod computation_cache;
mod db;
mod event_store;

pub use block_log::RocksDbBlockLog;
pub use computation_cache::RocksDbComputationCache;
pub use db::{HistorianDb, RocksDbConfig};
pub use event_store::RocksDbEventStore;
