//! Ports layer: the inbound query API and the outbound storage trait.

mod inbound;
mod outbound;

pub use inbound::BlockTimes;
pub use outbound::BlockLog;
