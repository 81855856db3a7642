//! Port implementations backed by production infrastructure.

pub mod storage;

pub use storage::{
    HistorianDb, RocksDbBlockLog, RocksDbComputationCache, RocksDbConfig, RocksDbEventStore,
};
