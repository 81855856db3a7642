//! # Batched Exporter
//!
//! Buffers handler outputs and flushes them to the durable queue as single
//! jobs. A flush happens when the buffer reaches the size threshold, when
//! the oldest buffered item exceeds the age threshold, or unconditionally
//! inside [`BatchedExporter::await_flush`].
//!
//! `DurableQueue::submit` resolves only once the job is durably accepted,
//! so a completed flush IS the producer-side acknowledgement —
//! `await_flush` has nothing further to wait on once the buffer is empty.

use historian_telemetry::PENDING_BATCH_SIZE;
use parking_lot::Mutex;
use shared_types::{DurableQueue, ExportBatchItem, ExportJob, QueueError};
use std::time::{Duration, Instant};
use tracing::debug;

/// Flush thresholds for the exporter.
#[derive(Debug, Clone, Copy)]
pub struct ExporterConfig {
    /// Flush as soon as this many items are buffered.
    pub max_batch_size: usize,
    /// Flush once the oldest buffered item is this old.
    pub max_batch_age: Duration,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 100,
            max_batch_age: Duration::from_secs(2),
        }
    }
}

struct Buffer {
    items: Vec<ExportBatchItem>,
    oldest: Option<Instant>,
}

/// Accumulates handler outputs into durable export jobs.
pub struct BatchedExporter<Q: DurableQueue> {
    queue: Q,
    config: ExporterConfig,
    buffer: Mutex<Buffer>,
}

impl<Q: DurableQueue> BatchedExporter<Q> {
    /// Creates an exporter flushing into `queue`.
    pub fn new(queue: Q, config: ExporterConfig) -> Self {
        Self {
            queue,
            config,
            buffer: Mutex::new(Buffer {
                items: Vec::new(),
                oldest: None,
            }),
        }
    }

    /// The configured age threshold, for the caller's flush timer.
    pub fn max_batch_age(&self) -> Duration {
        self.config.max_batch_age
    }

    /// Number of items buffered but not yet flushed.
    pub fn pending(&self) -> usize {
        self.buffer.lock().items.len()
    }

    /// Buffer one item, flushing if the size threshold is reached.
    pub async fn append(&self, item: ExportBatchItem) -> Result<(), QueueError> {
        let flush_now = {
            let mut buffer = self.buffer.lock();
            buffer.items.push(item);
            buffer.oldest.get_or_insert_with(Instant::now);
            PENDING_BATCH_SIZE.set(buffer.items.len() as f64);
            buffer.items.len() >= self.config.max_batch_size
        };
        if flush_now {
            self.flush().await?;
        }
        Ok(())
    }

    /// Flush the buffer if the oldest item has exceeded the age threshold.
    pub async fn flush_if_aged(&self) -> Result<(), QueueError> {
        let aged = {
            let buffer = self.buffer.lock();
            matches!(buffer.oldest, Some(t) if t.elapsed() >= self.config.max_batch_age)
        };
        if aged {
            self.flush().await?;
        }
        Ok(())
    }

    /// Flush whatever is buffered as one job. A no-op on an empty buffer.
    pub async fn flush(&self) -> Result<(), QueueError> {
        let items = {
            let mut buffer = self.buffer.lock();
            buffer.oldest = None;
            PENDING_BATCH_SIZE.set(0.0);
            std::mem::take(&mut buffer.items)
        };
        if items.is_empty() {
            return Ok(());
        }
        let job = ExportJob::new(items);
        debug!(job_id = %job.id, items = job.items.len(), "flushing export batch");
        self.queue.submit(job).await
    }

    /// Flush the remaining buffer and confirm everything is durable.
    ///
    /// Resolves once the buffer is empty and every job submitted by this
    /// exporter has been accepted by the queue. Part of the shutdown path.
    pub async fn await_flush(&self) -> Result<(), QueueError> {
        self.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::CapturingQueue;
    use serde_json::json;
    use std::sync::Arc;

    fn item(n: u64) -> ExportBatchItem {
        ExportBatchItem::new("balance", json!({ "id": n.to_string() }))
    }

    #[tokio::test]
    async fn size_threshold_triggers_a_flush() {
        let queue = Arc::new(CapturingQueue::new());
        let exporter = BatchedExporter::new(
            Arc::clone(&queue),
            ExporterConfig {
                max_batch_size: 3,
                max_batch_age: Duration::from_secs(60),
            },
        );

        for n in 0..3 {
            exporter.append(item(n)).await.unwrap();
        }
        let jobs = queue.jobs();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].items.len(), 3);
        assert_eq!(exporter.pending(), 0);
    }

    #[tokio::test]
    async fn age_threshold_triggers_a_flush() {
        let queue = Arc::new(CapturingQueue::new());
        let exporter = BatchedExporter::new(
            Arc::clone(&queue),
            ExporterConfig {
                max_batch_size: 100,
                max_batch_age: Duration::from_millis(10),
            },
        );

        exporter.append(item(1)).await.unwrap();
        exporter.flush_if_aged().await.unwrap();
        assert!(queue.jobs().is_empty());

        tokio::time::sleep(Duration::from_millis(20)).await;
        exporter.flush_if_aged().await.unwrap();
        assert_eq!(queue.jobs().len(), 1);
    }

    #[tokio::test]
    async fn await_flush_drains_the_remainder() {
        let queue = Arc::new(CapturingQueue::new());
        let exporter = BatchedExporter::new(Arc::clone(&queue), ExporterConfig::default());

        exporter.append(item(1)).await.unwrap();
        exporter.append(item(2)).await.unwrap();
        exporter.await_flush().await.unwrap();

        let jobs = queue.jobs();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].items.len(), 2);

        // Empty buffer: nothing further is submitted.
        exporter.await_flush().await.unwrap();
        assert_eq!(queue.jobs().len(), 1);
    }
}
