//! Shared RocksDB handle and tuning.
//!
//! Tuned for an indexing workload: Snappy compression, bloom filters for
//! point reads, a shared block cache. Column families isolate the three
//! storage concerns so their compaction never interferes.

use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, Options, DB};
use shared_types::StoreError;
use std::path::{Path, PathBuf};

/// Column family for the block log, keyed by big-endian height.
pub const CF_BLOCKS_BY_HEIGHT: &str = "blocks_by_height";
/// Column family for the block log, keyed by big-endian time.
pub const CF_BLOCKS_BY_TIME: &str = "blocks_by_time";
/// Column family for typed historical events.
pub const CF_EVENTS: &str = "events";
/// Column family for cached computation results.
pub const CF_COMPUTATIONS: &str = "computations";

const COLUMN_FAMILIES: &[&str] = &[
    CF_BLOCKS_BY_HEIGHT,
    CF_BLOCKS_BY_TIME,
    CF_EVENTS,
    CF_COMPUTATIONS,
];

/// RocksDB configuration.
#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    /// Path to the database directory.
    pub path: PathBuf,
    /// Block cache size in bytes.
    pub block_cache_size: usize,
    /// Write buffer size in bytes.
    pub write_buffer_size: usize,
    /// fsync after each write.
    pub sync_writes: bool,
}

impl RocksDbConfig {
    /// Production defaults under `data_dir`.
    pub fn at(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().to_path_buf(),
            block_cache_size: 256 * 1024 * 1024,
            write_buffer_size: 64 * 1024 * 1024,
            sync_writes: true,
        }
    }

    /// Small buffers, no fsync. For tests.
    pub fn for_testing(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            block_cache_size: 8 * 1024 * 1024,
            write_buffer_size: 4 * 1024 * 1024,
            sync_writes: false,
        }
    }
}

/// The shared database handle all storage adapters borrow from.
pub struct HistorianDb {
    db: DB,
    config: RocksDbConfig,
}

impl HistorianDb {
    /// Open or create the database with all column families.
    pub fn open(config: RocksDbConfig) -> Result<Self, StoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_compression_type(rocksdb::DBCompressionType::Snappy);

        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        block_opts.set_block_cache(&rocksdb::Cache::new_lru_cache(config.block_cache_size));
        opts.set_block_based_table_factory(&block_opts);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = COLUMN_FAMILIES
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, opts.clone()))
            .collect();

        let db = DB::open_cf_descriptors(&opts, &config.path, cf_descriptors)
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(Self { db, config })
    }

    /// The raw database.
    pub fn raw(&self) -> &DB {
        &self.db
    }

    /// Look up a column family handle.
    pub fn cf(&self, name: &str) -> Result<&ColumnFamily, StoreError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Backend(format!("missing column family: {name}")))
    }

    /// Write options honoring the configured sync policy.
    pub fn write_opts(&self) -> rocksdb::WriteOptions {
        let mut opts = rocksdb::WriteOptions::default();
        opts.set_sync(self.config.sync_writes);
        opts
    }
}

/// Map a RocksDB error into the shared store error.
pub(crate) fn backend_err(e: rocksdb::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}
