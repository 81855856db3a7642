//! Adapters layer: in-memory event store for tests and single-process runs.

mod memory;

pub use memory::InMemoryEventStore;
