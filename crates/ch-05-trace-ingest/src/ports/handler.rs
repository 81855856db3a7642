//! # Trace Handler Contract (Extension Point)
//!
//! A handler declares the module store it watches, filters traces into
//! matched items on the ingest side, and later parses a batch of its own
//! items back into typed events on the consumer side.
//!
//! The two halves run in different processes: `match_trace` inside the
//! ingest pump, `process` inside an export queue consumer. Matched data
//! must therefore be self-contained JSON — it travels through the durable
//! queue between the two calls.

use crate::domain::{AnnotatedTrace, HandlerError};
use async_trait::async_trait;
use ch_02_event_store::DependableEvent;
use std::sync::Arc;

/// Filters raw traces and parses matched items into typed events.
///
/// Implementations must be idempotent in `process`: the consumer may
/// repeat a batch after a timeout, and persistence is keyed by
/// `(identity, block_height)` upserts, so repeated output must be
/// identical for identical input.
#[async_trait]
pub trait TraceHandler: Send + Sync {
    /// Unique handler name, used to group batch items.
    fn name(&self) -> &'static str;

    /// The module store this handler watches (trace `store_name`).
    fn store_name(&self) -> &'static str;

    /// Inspect one annotated trace.
    ///
    /// Returns the matched data (a JSON object carrying an `id` field plus
    /// whatever `process` needs) or `None` when the trace is not relevant.
    async fn match_trace(&self, trace: &AnnotatedTrace) -> Option<serde_json::Value>;

    /// Parse a batch of this handler's matched items into typed events.
    ///
    /// The caller persists the returned events; this step only parses.
    async fn process(
        &self,
        items: &[serde_json::Value],
    ) -> Result<Vec<DependableEvent>, HandlerError>;
}

/// The set of handlers known to one process.
///
/// Built once at startup and shared read-only between the ingest worker
/// and the queue consumer.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: Vec<Arc<dyn TraceHandler>>,
}

impl HandlerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-loaded with the built-in handlers.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::handlers::register_all(&mut registry);
        registry
    }

    /// Register a handler.
    pub fn register(&mut self, handler: Arc<dyn TraceHandler>) {
        self.handlers.push(handler);
    }

    /// True if any handler watches `store_name`.
    pub fn contains_store(&self, store_name: &str) -> bool {
        self.handlers.iter().any(|h| h.store_name() == store_name)
    }

    /// All handlers watching `store_name`.
    pub fn handlers_for_store(&self, store_name: &str) -> Vec<Arc<dyn TraceHandler>> {
        self.handlers
            .iter()
            .filter(|h| h.store_name() == store_name)
            .cloned()
            .collect()
    }

    /// The handler registered under `name`, if any.
    pub fn by_name(&self, name: &str) -> Option<Arc<dyn TraceHandler>> {
        self.handlers.iter().find(|h| h.name() == name).cloned()
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
