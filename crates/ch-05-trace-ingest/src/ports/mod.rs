//! Ports layer: the handler contract and the block time source.

mod clock;
mod handler;

pub use clock::BlockTimeSource;
pub use handler::{HandlerRegistry, TraceHandler};
