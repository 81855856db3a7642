//! # Trace Ingest Worker
//!
//! The single cooperative pump that consumes the raw trace stream. One
//! worker per process; correctness never depends on thread parallelism,
//! only on async I/O multiplexing.
//!
//! ## Lifecycle
//!
//! `Idle -> Reading -> Draining -> Closed`. Reading pulls lines from the
//! stream; Draining is entered on EOF or the shutdown signal and completes
//! already-buffered work; Closed once the inbound queue is empty and the
//! exporter's `await_flush` has resolved.
//!
//! ## Ordering
//!
//! The inbound queue is drained strictly in arrival order, which matches
//! chain-emission order (ascending block height).

use crate::domain::{AnnotatedTrace, IngestError, WorkerState};
use crate::exporter::BatchedExporter;
use crate::ports::{BlockTimeSource, HandlerRegistry};
use ch_01_block_time::{BlockLog, BlockTimeIndex, BlockTimes};
use historian_telemetry::{INBOUND_QUEUE_SIZE, TRACES_DROPPED, TRACES_RECEIVED};
use parking_lot::Mutex;
use shared_types::{Block, BlockHeight, DurableQueue, ExportBatchItem, TimestampMs, TraceRecord};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Attempts against the block time source before a trace is dropped.
const CLOCK_ATTEMPTS: u32 = 3;
/// Base delay for the backoff between those attempts.
const CLOCK_BASE_BACKOFF: Duration = Duration::from_millis(50);

/// The live-stream consumer: parse, filter, annotate, match, export.
pub struct TraceIngestWorker<L, C, Q>
where
    L: BlockLog,
    C: BlockTimeSource,
    Q: DurableQueue,
{
    handlers: HandlerRegistry,
    block_times: Arc<BlockTimeIndex<L>>,
    clock: C,
    exporter: Arc<BatchedExporter<Q>>,
    inbound: Mutex<VecDeque<AnnotatedTrace>>,
    state: Mutex<WorkerState>,
}

impl<L, C, Q> TraceIngestWorker<L, C, Q>
where
    L: BlockLog,
    C: BlockTimeSource,
    Q: DurableQueue,
{
    /// Creates an idle worker. Nothing happens until [`Self::run`].
    pub fn new(
        handlers: HandlerRegistry,
        block_times: Arc<BlockTimeIndex<L>>,
        clock: C,
        exporter: Arc<BatchedExporter<Q>>,
    ) -> Self {
        Self {
            handlers,
            block_times,
            clock,
            exporter,
            inbound: Mutex::new(VecDeque::new()),
            state: Mutex::new(WorkerState::Idle),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WorkerState {
        *self.state.lock()
    }

    /// Records parsed and queued but not yet drained.
    pub fn inbound_len(&self) -> usize {
        self.inbound.lock().len()
    }

    /// Pump the stream until EOF or shutdown, then drain and flush.
    ///
    /// The stream is expected to be a blocking pipe: backpressure reaches
    /// the producer by this loop not pulling, never by dropping input.
    pub async fn run<R>(
        &self,
        reader: R,
        shutdown: watch::Receiver<bool>,
    ) -> Result<(), IngestError>
    where
        R: AsyncBufRead + Unpin + Send,
    {
        *self.state.lock() = WorkerState::Reading;
        info!(handlers = self.handlers.len(), "trace ingest started");

        let pumped = self.pump(reader, shutdown).await;

        // Drain and flush even when the pump stopped on an error, so
        // already-buffered work still reaches the queue.
        *self.state.lock() = WorkerState::Draining;
        info!(buffered = self.inbound_len(), "draining trace ingest");
        let drained: Result<(), IngestError> = async {
            self.drain_inbound().await?;
            self.exporter.await_flush().await?;
            Ok(())
        }
        .await;
        *self.state.lock() = WorkerState::Closed;
        info!("trace ingest closed");
        pumped.and(drained)
    }

    /// The read loop: pull lines until EOF or the shutdown signal.
    async fn pump<R>(
        &self,
        reader: R,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), IngestError>
    where
        R: AsyncBufRead + Unpin + Send,
    {
        let mut lines = reader.lines();
        let mut age_tick = tokio::time::interval(self.exporter.max_batch_age());
        age_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                line = lines.next_line() => match line? {
                    Some(line) => {
                        self.ingest_line(&line).await?;
                        self.drain_inbound().await?;
                    }
                    None => {
                        debug!("trace stream reached EOF");
                        return Ok(());
                    }
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        return Ok(());
                    }
                }
                _ = age_tick.tick() => {
                    self.exporter.flush_if_aged().await?;
                }
            }
        }
    }

    /// Parse and filter one stream line, queueing it if relevant.
    async fn ingest_line(&self, line: &str) -> Result<(), IngestError> {
        if line.trim().is_empty() {
            return Ok(());
        }
        TRACES_RECEIVED.inc();

        let record: TraceRecord = match serde_json::from_str(line) {
            Ok(record) => record,
            Err(e) => {
                TRACES_DROPPED.with_label_values(&["malformed"]).inc();
                debug!(error = %e, "dropping malformed trace line");
                return Ok(());
            }
        };

        if !record.operation.is_mutation() {
            TRACES_DROPPED.with_label_values(&["read_op"]).inc();
            return Ok(());
        }

        match record.store_name() {
            Some(store) if self.handlers.contains_store(store) => {}
            other => {
                TRACES_DROPPED.with_label_values(&["unknown_store"]).inc();
                debug!(store = other.unwrap_or("<none>"), "dropping trace for unwatched store");
                return Ok(());
            }
        }

        // A trace whose block cannot be resolved is dropped, not fatal:
        // the stream must outlive transient infrastructure failures.
        let block = match self.resolve_block(record.block_height()).await {
            Ok(block) => block,
            Err(e) => {
                TRACES_DROPPED.with_label_values(&["block_time"]).inc();
                warn!(
                    height = record.block_height(),
                    error = %e,
                    "dropping trace with unresolvable block time"
                );
                return Ok(());
            }
        };
        let mut inbound = self.inbound.lock();
        inbound.push_back(AnnotatedTrace { record, block });
        INBOUND_QUEUE_SIZE.set(inbound.len() as f64);
        Ok(())
    }

    /// Resolve a trace height to a full block, recording new heights.
    async fn resolve_block(&self, height: BlockHeight) -> Result<Block, IngestError> {
        match self.block_times.latest() {
            Ok(latest) if latest.height == height => Ok(latest),
            // Late trace for an already-indexed block.
            Ok(latest) if latest.height > height => {
                Ok(self.block_times.block_at_or_before_height(height)?)
            }
            _ => {
                let time_unix_ms = self.clock_time(height).await?;
                let block = Block::new(height, time_unix_ms);
                self.block_times.record(block)?;
                Ok(block)
            }
        }
    }

    /// Ask the block time source for a height, with bounded backoff.
    async fn clock_time(&self, height: BlockHeight) -> Result<TimestampMs, IngestError> {
        let mut attempt = 1;
        loop {
            match self.clock.time_for_height(height).await {
                Ok(time_unix_ms) => return Ok(time_unix_ms),
                Err(e) if attempt < CLOCK_ATTEMPTS => {
                    let delay = CLOCK_BASE_BACKOFF * 2u32.saturating_pow(attempt - 1);
                    warn!(
                        height,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "block time lookup failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Run every queued record through the handlers, in arrival order.
    async fn drain_inbound(&self) -> Result<(), IngestError> {
        loop {
            let trace = {
                let mut inbound = self.inbound.lock();
                let trace = inbound.pop_front();
                INBOUND_QUEUE_SIZE.set(inbound.len() as f64);
                trace
            };
            let Some(trace) = trace else {
                return Ok(());
            };

            let store = trace.record.store_name().unwrap_or_default();
            for handler in self.handlers.handlers_for_store(store) {
                if let Some(data) = handler.match_trace(&trace).await {
                    self.exporter
                        .append(ExportBatchItem::new(handler.name(), data))
                        .await?;
                }
            }
        }
    }
}
