//! Runtime configuration, loaded from `HISTORIAN_*` environment variables
//! layered over defaults.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `HISTORIAN_DATA_DIR` | `./data/historian` | RocksDB directory |
//! | `HISTORIAN_TRACE_SOURCE` | `./trace.pipe` | line-delimited trace stream |
//! | `HISTORIAN_RPC_ENDPOINT` | `http://localhost:26657` | chain RPC endpoint |
//! | `HISTORIAN_EXPORT_BATCH_SIZE` | `100` | exporter size threshold |
//! | `HISTORIAN_EXPORT_BATCH_AGE_MS` | `2000` | exporter age threshold |
//! | `HISTORIAN_EXPORT_CONCURRENCY` | `4` | consumer in-flight jobs |
//! | `HISTORIAN_EXPORT_ATTEMPTS` | `3` | attempts per handler group |
//! | `HISTORIAN_EXPORT_TIMEOUT_SECS` | `30` | hard per-job timeout |
//! | `HISTORIAN_GENESIS_TIME_MS` | `0` | chain genesis wall-clock time |
//! | `HISTORIAN_BLOCK_INTERVAL_MS` | `1000` | expected block interval |

use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Full runtime configuration.
#[derive(Debug, Clone)]
pub struct HistorianConfig {
    /// RocksDB data directory.
    pub data_dir: PathBuf,
    /// Path to the trace source (a blocking pipe or file).
    pub trace_source: PathBuf,
    /// Chain RPC endpoint for block time resolution.
    pub rpc_endpoint: String,
    /// Exporter flush threshold, items.
    pub export_batch_size: usize,
    /// Exporter flush threshold, age of oldest buffered item.
    pub export_batch_age: Duration,
    /// Concurrent in-flight jobs per consumer process.
    pub export_concurrency: usize,
    /// Attempts per handler group before dead-lettering.
    pub export_attempts: u32,
    /// Hard wall-clock limit per export job.
    pub export_timeout: Duration,
    /// Genesis block wall-clock time, ms since epoch.
    pub genesis_time_ms: u64,
    /// Expected block production interval, ms.
    pub block_interval_ms: u64,
}

impl Default for HistorianConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/historian"),
            trace_source: PathBuf::from("./trace.pipe"),
            rpc_endpoint: "http://localhost:26657".to_string(),
            export_batch_size: 100,
            export_batch_age: Duration::from_millis(2000),
            export_concurrency: 4,
            export_attempts: 3,
            export_timeout: Duration::from_secs(30),
            genesis_time_ms: 0,
            block_interval_ms: 1000,
        }
    }
}

fn env_parsed<T: std::str::FromStr>(name: &str, into: &mut T) {
    if let Ok(raw) = std::env::var(name) {
        match raw.parse() {
            Ok(value) => *into = value,
            Err(_) => warn!(var = name, raw, "ignoring unparseable environment override"),
        }
    }
}

/// Load configuration from the environment, layered over defaults.
pub fn load_config() -> HistorianConfig {
    let mut config = HistorianConfig::default();

    if let Ok(dir) = std::env::var("HISTORIAN_DATA_DIR") {
        config.data_dir = PathBuf::from(dir);
    }
    if let Ok(path) = std::env::var("HISTORIAN_TRACE_SOURCE") {
        config.trace_source = PathBuf::from(path);
    }
    if let Ok(endpoint) = std::env::var("HISTORIAN_RPC_ENDPOINT") {
        config.rpc_endpoint = endpoint;
    }

    env_parsed("HISTORIAN_EXPORT_BATCH_SIZE", &mut config.export_batch_size);
    env_parsed("HISTORIAN_EXPORT_CONCURRENCY", &mut config.export_concurrency);
    env_parsed("HISTORIAN_EXPORT_ATTEMPTS", &mut config.export_attempts);
    env_parsed("HISTORIAN_GENESIS_TIME_MS", &mut config.genesis_time_ms);
    env_parsed("HISTORIAN_BLOCK_INTERVAL_MS", &mut config.block_interval_ms);

    let mut age_ms = config.export_batch_age.as_millis() as u64;
    env_parsed("HISTORIAN_EXPORT_BATCH_AGE_MS", &mut age_ms);
    config.export_batch_age = Duration::from_millis(age_ms);

    let mut timeout_secs = config.export_timeout.as_secs();
    env_parsed("HISTORIAN_EXPORT_TIMEOUT_SECS", &mut timeout_secs);
    config.export_timeout = Duration::from_secs(timeout_secs);

    config
}
