//! Shared fixtures: a fully wired in-memory pipeline and the stubs the
//! integration flows plug into it.

use async_trait::async_trait;
use ch_01_block_time::adapters::InMemoryBlockLog;
use ch_01_block_time::BlockTimeIndex;
use ch_02_event_store::adapters::InMemoryEventStore;
use ch_02_event_store::DependableEvent;
use ch_03_formulas::FormulaRegistry;
use ch_04_computation::adapters::InMemoryComputationCache;
use ch_04_computation::ComputationEngine;
use ch_05_trace_ingest::handlers::BankBalanceHandler;
use ch_05_trace_ingest::{
    AnnotatedTrace, BatchedExporter, BlockTimeSource, ExporterConfig, HandlerError,
    HandlerRegistry, TraceHandler, TraceIngestWorker,
};
use ch_06_export_pipeline::adapters::InMemoryDurableQueue;
use ch_06_export_pipeline::{
    ConsumerConfig, ExportQueueConsumer, FanoutError, SearchIndexUpdater, WebhookDispatcher,
};
use parking_lot::Mutex;
use shared_types::{BlockHeight, DurableQueue, StoreError, TimestampMs};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Block time source where block N is minted at N seconds past epoch.
pub struct FixedIntervalClock;

#[async_trait]
impl BlockTimeSource for FixedIntervalClock {
    async fn time_for_height(&self, height: BlockHeight) -> Result<TimestampMs, StoreError> {
        Ok(height * 1000)
    }
}

/// Records every fan-out delivery as the number of events delivered.
#[derive(Default)]
pub struct RecordingFanout {
    pub deliveries: Mutex<Vec<usize>>,
}

#[async_trait]
impl SearchIndexUpdater for RecordingFanout {
    async fn update(&self, events: &[DependableEvent]) -> Result<(), FanoutError> {
        self.deliveries.lock().push(events.len());
        Ok(())
    }
}

#[async_trait]
impl WebhookDispatcher for RecordingFanout {
    async fn dispatch(&self, events: &[DependableEvent]) -> Result<(), FanoutError> {
        self.deliveries.lock().push(events.len());
        Ok(())
    }
}

/// The balance handler with a `process` step that fails a configured
/// number of times before delegating to the real parser.
pub struct FlakyBalanceHandler {
    inner: BankBalanceHandler,
    failures: AtomicUsize,
}

impl FlakyBalanceHandler {
    pub fn failing(times: usize) -> Self {
        Self {
            inner: BankBalanceHandler,
            failures: AtomicUsize::new(times),
        }
    }
}

#[async_trait]
impl TraceHandler for FlakyBalanceHandler {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn store_name(&self) -> &'static str {
        self.inner.store_name()
    }

    async fn match_trace(&self, trace: &AnnotatedTrace) -> Option<serde_json::Value> {
        self.inner.match_trace(trace).await
    }

    async fn process(
        &self,
        items: &[serde_json::Value],
    ) -> Result<Vec<DependableEvent>, HandlerError> {
        if self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(HandlerError::Malformed("transient".into()));
        }
        self.inner.process(items).await
    }
}

type Worker = TraceIngestWorker<InMemoryBlockLog, FixedIntervalClock, Arc<InMemoryDurableQueue>>;
type Consumer = ExportQueueConsumer<Arc<InMemoryDurableQueue>, Arc<InMemoryEventStore>>;
type Engine = ComputationEngine<
    InMemoryComputationCache,
    Arc<InMemoryEventStore>,
    Arc<BlockTimeIndex<InMemoryBlockLog>>,
>;

/// The full in-memory pipeline, every stage reachable from tests.
pub struct Pipeline {
    pub queue: Arc<InMemoryDurableQueue>,
    pub store: Arc<InMemoryEventStore>,
    pub fanout: Arc<RecordingFanout>,
    pub worker: Arc<Worker>,
    consumer: Arc<Consumer>,
    engine: Engine,
}

impl Pipeline {
    /// The built-in handlers on both sides.
    pub fn new() -> Self {
        Self::with_registries(HandlerRegistry::with_builtins(), HandlerRegistry::with_builtins())
    }

    /// Custom handler sets for the ingest and export sides.
    pub fn with_registries(ingest: HandlerRegistry, export: HandlerRegistry) -> Self {
        let queue = Arc::new(InMemoryDurableQueue::new());
        let store = Arc::new(InMemoryEventStore::new());
        let fanout = Arc::new(RecordingFanout::default());
        let block_times = Arc::new(BlockTimeIndex::new(InMemoryBlockLog::new()));

        let exporter = Arc::new(BatchedExporter::new(
            Arc::clone(&queue),
            ExporterConfig {
                max_batch_size: 100,
                max_batch_age: Duration::from_secs(60),
            },
        ));
        let worker = Arc::new(TraceIngestWorker::new(
            ingest,
            Arc::clone(&block_times),
            FixedIntervalClock,
            exporter,
        ));

        let consumer = Arc::new(ExportQueueConsumer::new(
            Arc::clone(&queue),
            Arc::clone(&store),
            export,
            fanout.clone() as Arc<dyn SearchIndexUpdater>,
            fanout.clone() as Arc<dyn WebhookDispatcher>,
            ConsumerConfig {
                base_backoff: Duration::from_millis(5),
                ..ConsumerConfig::default()
            },
        ));

        let engine = ComputationEngine::new(
            Arc::new(FormulaRegistry::with_builtins()),
            InMemoryComputationCache::new(),
            Arc::clone(&store),
            block_times,
        );

        Self {
            queue,
            store,
            fanout,
            worker,
            consumer,
            engine,
        }
    }

    /// Run the ingest worker over `input` until EOF.
    pub async fn ingest(&self, input: &str) {
        let (_tx, rx) = watch::channel(false);
        self.worker
            .run(tokio::io::BufReader::new(input.as_bytes()), rx)
            .await
            .expect("ingest run");
    }

    /// Settle every job currently in the queue.
    ///
    /// The queue stays open, so another ingest round can follow.
    pub async fn drain(&self) {
        while self.queue.outstanding() > 0 {
            match self.queue.next_job().await {
                Ok(Some(job)) => self.consumer.handle_job(job).await,
                _ => break,
            }
        }
    }

    /// Ingest then drain: the whole pipeline over one stream.
    pub async fn run_stream(&self, input: &str) {
        self.ingest(input).await;
        self.drain().await;
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// A `bank` store trace line carrying one balance write.
pub fn bank_line(account: &str, denom: &str, amount: u64, height: u64) -> String {
    format!(
        r#"{{"operation":"write","key":"balances/{account}/{denom}","value":"{amount}","metadata":{{"blockHeight":{height},"store_name":"bank"}}}}"#
    )
}

/// A `feegrant` store trace line carrying one allowance grant.
pub fn feegrant_line(granter: &str, grantee: &str, amount: u64, height: u64) -> String {
    format!(
        r#"{{"operation":"write","key":"{granter}/{grantee}","value":"{{\"amount\":\"{amount}\"}}","metadata":{{"blockHeight":{height},"store_name":"feegrant"}}}}"#
    )
}

/// A `wasm` store trace line carrying one contract state write.
pub fn wasm_line(contract: &str, state_key: &str, value: &str, height: u64) -> String {
    format!(
        r#"{{"operation":"write","key":"{contract}/{state_key}","value":"{value}","metadata":{{"blockHeight":{height},"store_name":"wasm"}}}}"#
    )
}
