//! # Downstream Fan-Out Ports (Driven Ports)
//!
//! After a job's events are durably persisted, they are forwarded to two
//! independent channels: the search-index updater and the webhook
//! dispatcher. Both are strictly best-effort — a failure is logged and
//! counted by the consumer and never fails the originating job.

use async_trait::async_trait;
use ch_02_event_store::DependableEvent;
use thiserror::Error;

/// A fan-out channel failed to deliver.
#[derive(Debug, Clone, Error)]
pub enum FanoutError {
    /// The downstream system rejected or lost the delivery.
    #[error("Fan-out delivery failed: {0}")]
    Delivery(String),
}

/// Pushes persisted events into the search index.
#[async_trait]
pub trait SearchIndexUpdater: Send + Sync {
    /// Forward a batch of freshly persisted events.
    async fn update(&self, events: &[DependableEvent]) -> Result<(), FanoutError>;
}

/// Dispatches persisted events to subscribed webhooks.
#[async_trait]
pub trait WebhookDispatcher: Send + Sync {
    /// Forward a batch of freshly persisted events.
    async fn dispatch(&self, events: &[DependableEvent]) -> Result<(), FanoutError>;
}

#[async_trait]
impl<T: SearchIndexUpdater + ?Sized> SearchIndexUpdater for std::sync::Arc<T> {
    async fn update(&self, events: &[DependableEvent]) -> Result<(), FanoutError> {
        (**self).update(events).await
    }
}

#[async_trait]
impl<T: WebhookDispatcher + ?Sized> WebhookDispatcher for std::sync::Arc<T> {
    async fn dispatch(&self, events: &[DependableEvent]) -> Result<(), FanoutError> {
        (**self).dispatch(events).await
    }
}
