//! Ports layer: the outbound cache trait.

mod cache;

pub use cache::ComputationCache;
