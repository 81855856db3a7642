//! Process assembly: opens storage, wires the subsystems, owns the
//! background tasks and their shutdown order.
//!
//! ## Shutdown Order
//!
//! Ingest first, then export. The worker drains its inbound queue and
//! flushes the final partial batch before reporting closed; only then is
//! the durable queue closed, which lets the consumer finish every
//! outstanding job before stopping. Nothing observed on the stream is
//! lost on a clean shutdown. A consumer that fails to drain within a
//! fixed limit is forced out through its shutdown channel.

use crate::adapters::{
    HistorianDb, RocksDbBlockLog, RocksDbComputationCache, RocksDbConfig, RocksDbEventStore,
};
use crate::config::HistorianConfig;
use crate::rpc::{ConnectionManager, IntervalClockFactory, RpcBlockTimeSource};
use anyhow::Context;
use ch_01_block_time::BlockTimeIndex;
use ch_03_formulas::FormulaRegistry;
use ch_04_computation::ComputationEngine;
use ch_05_trace_ingest::{BatchedExporter, ExporterConfig, HandlerRegistry, TraceIngestWorker};
use ch_06_export_pipeline::adapters::{
    InMemoryDurableQueue, NoopSearchIndex, NoopWebhookDispatcher,
};
use ch_06_export_pipeline::{ConsumerConfig, ExportQueueConsumer};
use shared_types::DurableQueue;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Upper bound on the post-close export drain. Past it the consumer is
/// told to stop via its shutdown channel, abandoning undrained jobs.
const EXPORT_DRAIN_LIMIT: Duration = Duration::from_secs(60);

type Worker = TraceIngestWorker<RocksDbBlockLog, Arc<RpcBlockTimeSource>, Arc<InMemoryDurableQueue>>;
type Consumer = ExportQueueConsumer<Arc<InMemoryDurableQueue>, Arc<RocksDbEventStore>>;
type Engine = ComputationEngine<
    Arc<RocksDbComputationCache>,
    Arc<RocksDbEventStore>,
    Arc<BlockTimeIndex<RocksDbBlockLog>>,
>;

/// The assembled indexer process.
pub struct HistorianRuntime {
    config: HistorianConfig,
    queue: Arc<InMemoryDurableQueue>,
    worker: Arc<Worker>,
    consumer: Arc<Consumer>,
    engine: Engine,
    ingest_shutdown: watch::Sender<bool>,
    export_shutdown: watch::Sender<bool>,
    ingest_handle: Option<JoinHandle<()>>,
    export_handle: Option<JoinHandle<()>>,
}

impl HistorianRuntime {
    /// Open storage and wire every subsystem. Nothing runs yet.
    pub fn new(config: HistorianConfig) -> anyhow::Result<Self> {
        let db = Arc::new(
            HistorianDb::open(RocksDbConfig::at(&config.data_dir))
                .with_context(|| format!("opening database at {}", config.data_dir.display()))?,
        );

        let block_times = Arc::new(BlockTimeIndex::new(RocksDbBlockLog::new(Arc::clone(&db))));
        let events = Arc::new(RocksDbEventStore::new(Arc::clone(&db)));
        let cache = Arc::new(RocksDbComputationCache::new(Arc::clone(&db)));

        let rpc_manager = Arc::new(ConnectionManager::new(Arc::new(IntervalClockFactory::new(
            config.genesis_time_ms,
            config.block_interval_ms,
        ))));
        let clock = Arc::new(RpcBlockTimeSource::new(rpc_manager, &config.rpc_endpoint));

        let queue = Arc::new(InMemoryDurableQueue::new());
        let exporter = Arc::new(BatchedExporter::new(
            Arc::clone(&queue),
            ExporterConfig {
                max_batch_size: config.export_batch_size,
                max_batch_age: config.export_batch_age,
            },
        ));

        let worker = Arc::new(TraceIngestWorker::new(
            HandlerRegistry::with_builtins(),
            Arc::clone(&block_times),
            clock,
            exporter,
        ));

        let consumer = Arc::new(ExportQueueConsumer::new(
            Arc::clone(&queue),
            Arc::clone(&events),
            HandlerRegistry::with_builtins(),
            Arc::new(NoopSearchIndex),
            Arc::new(NoopWebhookDispatcher),
            ConsumerConfig {
                max_attempts: config.export_attempts,
                job_timeout: config.export_timeout,
                concurrency: config.export_concurrency,
                ..ConsumerConfig::default()
            },
        ));

        let engine = ComputationEngine::new(
            Arc::new(FormulaRegistry::with_builtins()),
            cache,
            events,
            block_times,
        );

        let (ingest_shutdown, _) = watch::channel(false);
        let (export_shutdown, _) = watch::channel(false);

        Ok(Self {
            config,
            queue,
            worker,
            consumer,
            engine,
            ingest_shutdown,
            export_shutdown,
            ingest_handle: None,
            export_handle: None,
        })
    }

    /// Open the trace source and start the ingest and export tasks.
    pub async fn start(&mut self) -> anyhow::Result<()> {
        let source = tokio::fs::File::open(&self.config.trace_source)
            .await
            .with_context(|| {
                format!("opening trace source {}", self.config.trace_source.display())
            })?;
        info!(
            source = %self.config.trace_source.display(),
            "starting chain historian"
        );

        let worker = Arc::clone(&self.worker);
        let ingest_rx = self.ingest_shutdown.subscribe();
        self.ingest_handle = Some(tokio::spawn(async move {
            if let Err(e) = worker.run(BufReader::new(source), ingest_rx).await {
                warn!(error = %e, "trace ingest exited with error");
            }
        }));

        let consumer = Arc::clone(&self.consumer);
        let export_rx = self.export_shutdown.subscribe();
        self.export_handle = Some(tokio::spawn(consumer.run(export_rx)));

        Ok(())
    }

    /// Stop ingest, drain in-flight work, then stop export.
    pub async fn shutdown(&mut self) {
        info!("shutting down chain historian");
        let _ = self.ingest_shutdown.send(true);
        if let Some(handle) = self.ingest_handle.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "ingest task panicked during shutdown");
            }
        }

        // The worker has flushed its final batch; closing the queue lets
        // the consumer drain to empty and stop on its own. A drain that
        // exceeds its limit is forced out through the shutdown channel.
        self.queue.close();
        if let Some(mut handle) = self.export_handle.take() {
            match tokio::time::timeout(EXPORT_DRAIN_LIMIT, &mut handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "export task panicked during shutdown"),
                Err(_) => {
                    warn!(
                        limit_secs = EXPORT_DRAIN_LIMIT.as_secs(),
                        "export drain exceeded its limit, forcing stop"
                    );
                    let _ = self.export_shutdown.send(true);
                    if let Err(e) = handle.await {
                        warn!(error = %e, "export task panicked during shutdown");
                    }
                }
            }
        }
        info!("chain historian stopped");
    }

    /// The query surface over indexed history.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Log a point-in-time snapshot of internal queue depths and memory.
    pub fn diagnostic_dump(&self) {
        let rss_kb = resident_set_kb();
        info!(
            at = %chrono::Utc::now().to_rfc3339(),
            worker_state = ?self.worker.state(),
            inbound = self.worker.inbound_len(),
            pending_batch = historian_telemetry::PENDING_BATCH_SIZE.get() as u64,
            outstanding_jobs = self.queue.outstanding(),
            rss_kb,
            "diagnostic dump"
        );
    }
}

/// Resident set size in kB from `/proc/self/status`, or 0 off Linux.
fn resident_set_kb() -> u64 {
    std::fs::read_to_string("/proc/self/status")
        .ok()
        .and_then(|status| {
            status.lines().find_map(|line| {
                line.strip_prefix("VmRSS:")?
                    .trim()
                    .split_whitespace()
                    .next()?
                    .parse()
                    .ok()
            })
        })
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ch_03_formulas::{FormulaArgs, FormulaKind};
    use ch_04_computation::RangeBounds;
    use std::io::Write;

    fn test_config(dir: &std::path::Path) -> HistorianConfig {
        HistorianConfig {
            data_dir: dir.join("db"),
            trace_source: dir.join("trace.pipe"),
            genesis_time_ms: 1_700_000_000_000,
            block_interval_ms: 1000,
            ..HistorianConfig::default()
        }
    }

    fn bank_line(account: &str, amount: u64, height: u64) -> String {
        format!(
            r#"{{"operation":"write","key":"balances/{account}/uhist","value":"{amount}","metadata":{{"blockHeight":{height},"store_name":"bank"}}}}"#
        )
    }

    #[tokio::test]
    async fn end_to_end_stream_to_query() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());

        let mut trace = std::fs::File::create(&config.trace_source).unwrap();
        writeln!(trace, "{}", bank_line("historian1abc", 100, 1)).unwrap();
        writeln!(trace, "{}", bank_line("historian1abc", 250, 3)).unwrap();
        drop(trace);

        let mut runtime = HistorianRuntime::new(config).unwrap();
        runtime.start().await.unwrap();
        runtime.shutdown().await;

        let mut args = FormulaArgs::new();
        args.insert("denom".into(), serde_json::json!("uhist"));
        let value = runtime
            .engine()
            .compute_at_height(FormulaKind::Wallet, "balance", "historian1abc", &args, 2)
            .await
            .unwrap();
        assert_eq!(value, serde_json::json!("100"));

        let samples = runtime
            .engine()
            .compute_range(
                FormulaKind::Wallet,
                "balance",
                "historian1abc",
                &args,
                RangeBounds::Blocks {
                    start: 1,
                    end: 3,
                    step: 1,
                },
            )
            .await
            .unwrap();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[2].value, serde_json::json!("250"));
    }

    #[tokio::test]
    async fn missing_trace_source_fails_startup() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let mut runtime = HistorianRuntime::new(config).unwrap();
        assert!(runtime.start().await.is_err());
    }
}
