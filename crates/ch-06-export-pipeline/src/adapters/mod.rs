//! Adapters layer: in-memory durable queue and no-op fan-out channels.

mod fanout;
mod memory_queue;

pub use fanout::{NoopSearchIndex, NoopWebhookDispatcher};
pub use memory_queue::InMemoryDurableQueue;
