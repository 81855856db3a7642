//! Ports layer: the outbound storage trait the rest of the system persists
//! and queries history through.

mod store;

pub use store::EventStore;
