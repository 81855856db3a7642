//! # Durable Queue Contract
//!
//! The interface between the batched exporter (producer side) and the
//! export queue consumers (competing-consumer side). Multiple independent
//! worker processes may consume from the same queue; cross-batch ordering
//! is not guaranteed once a job is durable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::entities::ExportJob;

/// Unique identifier for one durable job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    /// Generates a fresh job id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors from the durable queue backend.
#[derive(Debug, Clone, Error)]
pub enum QueueError {
    /// The queue backend rejected or lost the request.
    #[error("Queue backend error: {0}")]
    Backend(String),

    /// The queue is shut down and accepts no further work.
    #[error("Queue closed")]
    Closed,
}

/// A durable job queue with competing consumers.
///
/// `submit` resolves only once the job is durably accepted — that
/// resolution is the producer-side acknowledgement `await_flush` waits on.
/// Redelivery of unacknowledged jobs is the queue's own concern; consumers
/// report terminal failure through [`DurableQueue::fail`] (dead-letter).
#[async_trait]
pub trait DurableQueue: Send + Sync {
    /// Durably enqueue a job. Resolves once the job is accepted.
    async fn submit(&self, job: ExportJob) -> Result<(), QueueError>;

    /// Receive the next job, waiting until one is available.
    ///
    /// Returns `None` once the queue is closed and drained.
    async fn next_job(&self) -> Result<Option<ExportJob>, QueueError>;

    /// Acknowledge successful processing of a job.
    async fn ack(&self, id: JobId) -> Result<(), QueueError>;

    /// Mark a job as terminally failed (dead-letter) with a reason.
    async fn fail(&self, id: JobId, reason: &str) -> Result<(), QueueError>;

    /// Number of jobs submitted but not yet acknowledged or failed.
    fn outstanding(&self) -> usize;
}

#[async_trait]
impl<T: DurableQueue + ?Sized> DurableQueue for std::sync::Arc<T> {
    async fn submit(&self, job: ExportJob) -> Result<(), QueueError> {
        (**self).submit(job).await
    }

    async fn next_job(&self) -> Result<Option<ExportJob>, QueueError> {
        (**self).next_job().await
    }

    async fn ack(&self, id: JobId) -> Result<(), QueueError> {
        (**self).ack(id).await
    }

    async fn fail(&self, id: JobId, reason: &str) -> Result<(), QueueError> {
        (**self).fail(id, reason).await
    }

    fn outstanding(&self) -> usize {
        (**self).outstanding()
    }
}
