//! Domain layer: error types and monotonicity rules for the block log.

mod errors;

pub use errors::BlockTimeError;
