//! Cross-subsystem integration flows.

pub mod caching;
pub mod matcher;
pub mod pipeline;
