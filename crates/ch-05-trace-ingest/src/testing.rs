//! Shared test doubles for this crate's unit tests.

use crate::ports::BlockTimeSource;
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{
    Block, BlockHeight, DurableQueue, ExportJob, JobId, QueueError, StoreError, TimestampMs,
    TraceMetadata, TraceOperation, TraceRecord,
};

use crate::domain::AnnotatedTrace;

/// Builds an annotated trace with the block time derived from the height.
pub fn annotated(
    operation: TraceOperation,
    key: &str,
    value: &str,
    store: &str,
    height: u64,
) -> AnnotatedTrace {
    AnnotatedTrace {
        record: TraceRecord {
            operation,
            key: key.to_string(),
            value: value.to_string(),
            metadata: TraceMetadata {
                block_height: height,
                tx_hash: None,
                store_name: Some(store.to_string()),
            },
        },
        block: Block::new(height, height * 1000),
    }
}

/// A queue double that records every submitted job.
#[derive(Default)]
pub struct CapturingQueue {
    jobs: Mutex<Vec<ExportJob>>,
}

impl CapturingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn jobs(&self) -> Vec<ExportJob> {
        self.jobs.lock().clone()
    }
}

#[async_trait]
impl DurableQueue for CapturingQueue {
    async fn submit(&self, job: ExportJob) -> Result<(), QueueError> {
        self.jobs.lock().push(job);
        Ok(())
    }

    async fn next_job(&self) -> Result<Option<ExportJob>, QueueError> {
        Ok(None)
    }

    async fn ack(&self, _id: JobId) -> Result<(), QueueError> {
        Ok(())
    }

    async fn fail(&self, _id: JobId, _reason: &str) -> Result<(), QueueError> {
        Ok(())
    }

    fn outstanding(&self) -> usize {
        0
    }
}

/// A block time source that derives time as `height * 1000`.
pub struct FixedIntervalClock;

#[async_trait]
impl BlockTimeSource for FixedIntervalClock {
    async fn time_for_height(&self, height: BlockHeight) -> Result<TimestampMs, StoreError> {
        Ok(height * 1000)
    }
}
