//! Domain layer: cache entries, range query types, and errors.

mod entities;
mod errors;

pub use entities::{Computation, ComputationKey, RangeBounds, RangeSample};
pub use errors::ComputeError;
