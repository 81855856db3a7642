//! # Historian Telemetry
//!
//! Structured logging and Prometheus metrics for Chain-Historian.
//!
//! ## Components
//!
//! - **Logging**: `tracing` with an `EnvFilter` read from `HISTORIAN_LOG`
//! - **Metrics**: process-wide Prometheus counters and gauges — queue
//!   depths, cache hit rates, export outcomes — also rendered into the
//!   diagnostic signal dump
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `HISTORIAN_LOG` | `info` | Log level filter |

mod metrics;
mod tracing_setup;

pub use metrics::{
    gather_text, register_metrics, CACHE_HITS, CACHE_MISSES, COMPUTATIONS, EVENTS_PERSISTED,
    EXPORT_JOBS, FANOUT_FAILURES, INBOUND_QUEUE_SIZE, OUTSTANDING_JOBS, PENDING_BATCH_SIZE,
    REGISTRY, TRACES_DROPPED, TRACES_RECEIVED,
};
pub use tracing_setup::init_tracing;

use thiserror::Error;

/// Telemetry initialization errors.
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// A metric could not be registered (usually a double init).
    #[error("Failed to register metrics: {0}")]
    MetricsInit(String),

    /// The global tracing subscriber was already set.
    #[error("Failed to install tracing subscriber: {0}")]
    TracingInit(String),
}
