//! # In-Memory Durable Queue
//!
//! Single-process implementation of the [`DurableQueue`] contract, used for
//! tests and standalone runs. Jobs survive only as long as the process; a
//! production deployment puts a real broker behind the same trait.

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{DurableQueue, ExportJob, JobId, QueueError};
use std::collections::VecDeque;
use tokio::sync::Notify;

struct QueueInner {
    ready: VecDeque<ExportJob>,
    outstanding: usize,
    closed: bool,
    dead_letters: Vec<(JobId, String)>,
    acked: usize,
}

/// Process-local durable queue.
pub struct InMemoryDurableQueue {
    inner: Mutex<QueueInner>,
    notify: Notify,
}

impl InMemoryDurableQueue {
    /// Creates an empty, open queue.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                ready: VecDeque::new(),
                outstanding: 0,
                closed: false,
                dead_letters: Vec::new(),
                acked: 0,
            }),
            notify: Notify::new(),
        }
    }

    /// Close the queue: no further submissions; consumers drain and stop.
    pub fn close(&self) {
        self.inner.lock().closed = true;
        self.notify.notify_waiters();
    }

    /// Jobs moved to the dead-letter state, with their failure reasons.
    pub fn dead_letters(&self) -> Vec<(JobId, String)> {
        self.inner.lock().dead_letters.clone()
    }

    /// Number of jobs acknowledged as successfully processed.
    pub fn acked(&self) -> usize {
        self.inner.lock().acked
    }
}

impl Default for InMemoryDurableQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DurableQueue for InMemoryDurableQueue {
    async fn submit(&self, job: ExportJob) -> Result<(), QueueError> {
        {
            let mut inner = self.inner.lock();
            if inner.closed {
                return Err(QueueError::Closed);
            }
            inner.ready.push_back(job);
            inner.outstanding += 1;
        }
        self.notify.notify_waiters();
        Ok(())
    }

    async fn next_job(&self) -> Result<Option<ExportJob>, QueueError> {
        loop {
            // Register for a wakeup before checking, so a submit between
            // the check and the await is not missed.
            let notified = self.notify.notified();
            {
                let mut inner = self.inner.lock();
                if let Some(job) = inner.ready.pop_front() {
                    return Ok(Some(job));
                }
                if inner.closed {
                    return Ok(None);
                }
            }
            notified.await;
        }
    }

    async fn ack(&self, _id: JobId) -> Result<(), QueueError> {
        let mut inner = self.inner.lock();
        inner.outstanding = inner.outstanding.saturating_sub(1);
        inner.acked += 1;
        Ok(())
    }

    async fn fail(&self, id: JobId, reason: &str) -> Result<(), QueueError> {
        let mut inner = self.inner.lock();
        inner.outstanding = inner.outstanding.saturating_sub(1);
        inner.dead_letters.push((id, reason.to_string()));
        Ok(())
    }

    fn outstanding(&self) -> usize {
        self.inner.lock().outstanding
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::ExportBatchItem;
    use std::sync::Arc;

    fn job() -> ExportJob {
        ExportJob::new(vec![ExportBatchItem::new("balance", serde_json::json!({}))])
    }

    #[tokio::test]
    async fn submitted_jobs_are_delivered_in_order() {
        let queue = InMemoryDurableQueue::new();
        let first = job();
        let second = job();
        queue.submit(first.clone()).await.unwrap();
        queue.submit(second.clone()).await.unwrap();

        assert_eq!(queue.next_job().await.unwrap().unwrap().id, first.id);
        assert_eq!(queue.next_job().await.unwrap().unwrap().id, second.id);
        assert_eq!(queue.outstanding(), 2);
    }

    #[tokio::test]
    async fn close_drains_then_stops_consumers() {
        let queue = Arc::new(InMemoryDurableQueue::new());
        queue.submit(job()).await.unwrap();
        queue.close();

        assert!(queue.next_job().await.unwrap().is_some());
        assert!(queue.next_job().await.unwrap().is_none());
        assert!(matches!(queue.submit(job()).await, Err(QueueError::Closed)));
    }

    #[tokio::test]
    async fn a_waiting_consumer_wakes_on_submit() {
        let queue = Arc::new(InMemoryDurableQueue::new());
        let waiter = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.next_job().await.unwrap() })
        };
        tokio::task::yield_now().await;
        queue.submit(job()).await.unwrap();
        assert!(waiter.await.unwrap().is_some());
    }

    #[tokio::test]
    async fn ack_and_fail_settle_outstanding_work() {
        let queue = InMemoryDurableQueue::new();
        let a = job();
        let b = job();
        queue.submit(a.clone()).await.unwrap();
        queue.submit(b.clone()).await.unwrap();

        queue.ack(a.id).await.unwrap();
        queue.fail(b.id, "exhausted attempts").await.unwrap();

        assert_eq!(queue.outstanding(), 0);
        assert_eq!(queue.acked(), 1);
        let dead = queue.dead_letters();
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].0, b.id);
    }
}
