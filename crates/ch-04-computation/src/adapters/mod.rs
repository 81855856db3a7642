//! Adapters layer: in-memory LRU-indexed computation cache.

mod memory;

pub use memory::InMemoryComputationCache;
