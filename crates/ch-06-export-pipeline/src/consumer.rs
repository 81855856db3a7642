//! # Export Queue Consumer
//!
//! Pulls durable batch jobs, groups their items by handler, runs each
//! handler's `process` step with bounded retries, persists the typed
//! events, then fans out best-effort to search and webhooks.
//!
//! ## Failure Rules
//!
//! - Per-group retries: up to `max_attempts` with exponential backoff and
//!   jitter. Exhausting the budget dead-letters the whole job.
//! - Per-job timeout: a hard wall-clock limit for the entire job. Hitting
//!   it fails the job without aborting in-flight persistence — handlers
//!   are idempotent, so a redelivered or repeated batch is harmless.
//! - Fan-out failures are logged and counted, never fail the job.

use crate::domain::ExportError;
use crate::ports::{SearchIndexUpdater, WebhookDispatcher};
use ch_02_event_store::{DependableEvent, EventStore};
use ch_05_trace_ingest::{HandlerRegistry, TraceHandler};
use historian_telemetry::{EVENTS_PERSISTED, EXPORT_JOBS, FANOUT_FAILURES, OUTSTANDING_JOBS};
use rand::Rng;
use shared_types::{DurableQueue, ExportJob};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Tuning for one consumer process.
#[derive(Debug, Clone, Copy)]
pub struct ConsumerConfig {
    /// Attempts per handler group before the job is dead-lettered.
    pub max_attempts: u32,
    /// Hard wall-clock limit for one whole job.
    pub job_timeout: Duration,
    /// Jobs processed concurrently by this process.
    pub concurrency: usize,
    /// Base delay for exponential backoff between attempts.
    pub base_backoff: Duration,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            job_timeout: Duration::from_secs(30),
            concurrency: 4,
            base_backoff: Duration::from_millis(500),
        }
    }
}

/// One competing consumer of the durable export queue.
pub struct ExportQueueConsumer<Q, S>
where
    Q: DurableQueue,
    S: EventStore,
{
    queue: Q,
    store: S,
    handlers: HandlerRegistry,
    search: Arc<dyn SearchIndexUpdater>,
    webhooks: Arc<dyn WebhookDispatcher>,
    config: ConsumerConfig,
}

impl<Q, S> ExportQueueConsumer<Q, S>
where
    Q: DurableQueue + 'static,
    S: EventStore + 'static,
{
    /// Creates a consumer over the given ports.
    pub fn new(
        queue: Q,
        store: S,
        handlers: HandlerRegistry,
        search: Arc<dyn SearchIndexUpdater>,
        webhooks: Arc<dyn WebhookDispatcher>,
        config: ConsumerConfig,
    ) -> Self {
        Self {
            queue,
            store,
            handlers,
            search,
            webhooks,
            config,
        }
    }

    /// Consume jobs until the queue drains or shutdown is signalled.
    ///
    /// Runs up to `concurrency` jobs in flight; in-flight jobs finish
    /// before this returns.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let mut tasks: JoinSet<()> = JoinSet::new();
        info!(concurrency = self.config.concurrency, "export consumer started");

        loop {
            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                break;
            };
            tokio::select! {
                job = self.queue.next_job() => match job {
                    Ok(Some(job)) => {
                        OUTSTANDING_JOBS.set(self.queue.outstanding() as f64);
                        let consumer = Arc::clone(&self);
                        tasks.spawn(async move {
                            consumer.handle_job(job).await;
                            drop(permit);
                        });
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "durable queue receive failed");
                        break;
                    }
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
            while tasks.try_join_next().is_some() {}
        }

        while tasks.join_next().await.is_some() {}
        info!("export consumer stopped");
    }

    /// Run one job to a terminal outcome: ack, dead-letter, or timeout.
    pub async fn handle_job(&self, job: ExportJob) {
        let id = job.id;
        let items = job.items.len();
        let outcome = tokio::time::timeout(self.config.job_timeout, self.process_job(job)).await;

        let settle = match outcome {
            Ok(Ok(persisted)) => {
                debug!(job_id = %id, items, persisted, "export job completed");
                EXPORT_JOBS.with_label_values(&["completed"]).inc();
                self.queue.ack(id).await
            }
            Ok(Err(e)) => {
                warn!(job_id = %id, error = %e, "export job failed, dead-lettering");
                EXPORT_JOBS.with_label_values(&["failed"]).inc();
                self.queue.fail(id, &e.to_string()).await
            }
            Err(_) => {
                warn!(job_id = %id, timeout_secs = self.config.job_timeout.as_secs(), "export job timed out");
                EXPORT_JOBS.with_label_values(&["timeout"]).inc();
                self.queue.fail(id, "job timeout").await
            }
        };
        if let Err(e) = settle {
            warn!(job_id = %id, error = %e, "failed to settle job with the queue");
        }
        OUTSTANDING_JOBS.set(self.queue.outstanding() as f64);
    }

    /// Process and persist one job. Returns the number of events persisted.
    async fn process_job(&self, job: ExportJob) -> Result<usize, ExportError> {
        // Group by handler name, preserving first-seen order.
        let mut groups: Vec<(String, Vec<serde_json::Value>)> = Vec::new();
        for item in job.items {
            match groups.iter_mut().find(|(name, _)| *name == item.handler_name) {
                Some((_, items)) => items.push(item.data),
                None => groups.push((item.handler_name, vec![item.data])),
            }
        }

        let mut persisted: Vec<DependableEvent> = Vec::new();
        for (name, items) in &groups {
            let handler = self
                .handlers
                .by_name(name)
                .ok_or_else(|| ExportError::UnknownHandler(name.clone()))?;
            let events = self.process_group_with_retry(handler.as_ref(), items).await?;
            persisted.extend(events);
        }

        EVENTS_PERSISTED.inc_by(persisted.len() as f64);
        self.fan_out(&persisted).await;
        Ok(persisted.len())
    }

    /// One handler group: parse then persist, retried as a unit.
    ///
    /// Persistence is an upsert, so a retry after a partial write repeats
    /// rows harmlessly.
    async fn process_group_with_retry(
        &self,
        handler: &dyn TraceHandler,
        items: &[serde_json::Value],
    ) -> Result<Vec<DependableEvent>, ExportError> {
        let mut attempt = 1;
        loop {
            let result: Result<Vec<DependableEvent>, ExportError> = async {
                let events = handler.process(items).await?;
                self.store.upsert(&events).await?;
                Ok(events)
            }
            .await;

            match result {
                Ok(events) => return Ok(events),
                Err(e) if attempt < self.config.max_attempts => {
                    let delay = self.backoff_delay(attempt);
                    warn!(
                        handler = handler.name(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "handler group failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Exponential backoff with uniform jitter.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = self.config.base_backoff * 2u32.saturating_pow(attempt - 1);
        let jitter_cap = (self.config.base_backoff.as_millis() as u64 / 2).max(1);
        let jitter = rand::thread_rng().gen_range(0..jitter_cap);
        base + Duration::from_millis(jitter)
    }

    /// Best-effort delivery to the search and webhook channels.
    async fn fan_out(&self, events: &[DependableEvent]) {
        if events.is_empty() {
            return;
        }
        if let Err(e) = self.search.update(events).await {
            FANOUT_FAILURES.with_label_values(&["search"]).inc();
            warn!(error = %e, "search index update failed");
        }
        if let Err(e) = self.webhooks.dispatch(events).await {
            FANOUT_FAILURES.with_label_values(&["webhook"]).inc();
            warn!(error = %e, "webhook dispatch failed");
        }
    }
}
