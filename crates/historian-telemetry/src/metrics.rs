//! Prometheus metrics for Chain-Historian subsystems.
//!
//! All metrics follow the naming convention: `ch_<subsystem>_<metric>_<unit>`.
//!
//! ## Metric Types
//!
//! - **Counter**: monotonically increasing (e.g. traces_received_total)
//! - **Gauge**: goes up and down (e.g. inbound_queue_size)

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, Gauge, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry.
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // TRACE INGESTION (ch-05)
    // =========================================================================

    /// Total raw trace records read from the stream.
    pub static ref TRACES_RECEIVED: Counter = Counter::new(
        "ch_ingest_traces_received_total",
        "Total raw trace records read from the stream"
    ).expect("metric creation failed");

    /// Dropped trace records by reason.
    pub static ref TRACES_DROPPED: CounterVec = CounterVec::new(
        Opts::new("ch_ingest_traces_dropped_total", "Dropped trace records"),
        &["reason"]  // reason: malformed/read_op/unknown_store
    ).expect("metric creation failed");

    /// Records parsed and queued but not yet drained.
    pub static ref INBOUND_QUEUE_SIZE: Gauge = Gauge::new(
        "ch_ingest_inbound_queue_size",
        "Records parsed and queued but not yet drained"
    ).expect("metric creation failed");

    /// Handler outputs buffered in the exporter, not yet flushed.
    pub static ref PENDING_BATCH_SIZE: Gauge = Gauge::new(
        "ch_export_pending_batch_size",
        "Handler outputs buffered but not yet flushed to the durable queue"
    ).expect("metric creation failed");

    // =========================================================================
    // EXPORT PIPELINE (ch-06)
    // =========================================================================

    /// Durable jobs submitted but not yet acknowledged or failed.
    pub static ref OUTSTANDING_JOBS: Gauge = Gauge::new(
        "ch_export_outstanding_jobs",
        "Durable jobs submitted but not yet acknowledged or failed"
    ).expect("metric creation failed");

    /// Export job outcomes.
    pub static ref EXPORT_JOBS: CounterVec = CounterVec::new(
        Opts::new("ch_export_jobs_total", "Export job outcomes"),
        &["outcome"]  // outcome: completed/failed/timeout
    ).expect("metric creation failed");

    /// Typed events written to the historical store.
    pub static ref EVENTS_PERSISTED: Counter = Counter::new(
        "ch_store_events_persisted_total",
        "Typed events written to the historical store"
    ).expect("metric creation failed");

    /// Best-effort fan-out failures by channel.
    pub static ref FANOUT_FAILURES: CounterVec = CounterVec::new(
        Opts::new("ch_export_fanout_failures_total", "Best-effort fan-out failures"),
        &["channel"]  // channel: search/webhook
    ).expect("metric creation failed");

    // =========================================================================
    // COMPUTATION ENGINE (ch-04)
    // =========================================================================

    /// Cached results served without recomputation.
    pub static ref CACHE_HITS: Counter = Counter::new(
        "ch_compute_cache_hits_total",
        "Cached results served without recomputation"
    ).expect("metric creation failed");

    /// Queries that required a fresh formula evaluation.
    pub static ref CACHE_MISSES: Counter = Counter::new(
        "ch_compute_cache_misses_total",
        "Queries that required a fresh formula evaluation"
    ).expect("metric creation failed");

    /// Fresh formula evaluations by kind.
    pub static ref COMPUTATIONS: CounterVec = CounterVec::new(
        Opts::new("ch_compute_evaluations_total", "Fresh formula evaluations"),
        &["kind"]  // kind: contract/wallet/generic
    ).expect("metric creation failed");
}

/// Register all metrics into the global registry.
///
/// Call once at startup; registering twice is reported, not fatal.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(TRACES_RECEIVED.clone()),
        Box::new(TRACES_DROPPED.clone()),
        Box::new(INBOUND_QUEUE_SIZE.clone()),
        Box::new(PENDING_BATCH_SIZE.clone()),
        Box::new(OUTSTANDING_JOBS.clone()),
        Box::new(EXPORT_JOBS.clone()),
        Box::new(EVENTS_PERSISTED.clone()),
        Box::new(FANOUT_FAILURES.clone()),
        Box::new(CACHE_HITS.clone()),
        Box::new(CACHE_MISSES.clone()),
        Box::new(COMPUTATIONS.clone()),
    ];
    for collector in collectors {
        REGISTRY
            .register(collector)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }
    Ok(())
}

/// Render the current metric values in Prometheus text format.
///
/// Used by the diagnostic signal dump.
pub fn gather_text() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if encoder.encode(&REGISTRY.gather(), &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
