//! Adapters layer: in-memory block log for tests and single-process runs.

mod memory;

pub use memory::InMemoryBlockLog;
