//! No-op fan-out adapters for deployments without downstream systems.

use crate::ports::{FanoutError, SearchIndexUpdater, WebhookDispatcher};
use async_trait::async_trait;
use ch_02_event_store::DependableEvent;
use tracing::debug;

/// Discards search-index updates.
pub struct NoopSearchIndex;

#[async_trait]
impl SearchIndexUpdater for NoopSearchIndex {
    async fn update(&self, events: &[DependableEvent]) -> Result<(), FanoutError> {
        debug!(events = events.len(), "search index disabled, dropping update");
        Ok(())
    }
}

/// Discards webhook dispatches.
pub struct NoopWebhookDispatcher;

#[async_trait]
impl WebhookDispatcher for NoopWebhookDispatcher {
    async fn dispatch(&self, events: &[DependableEvent]) -> Result<(), FanoutError> {
        debug!(events = events.len(), "webhooks disabled, dropping dispatch");
        Ok(())
    }
}
