//! # Block Time Index Subsystem (ch-01)
//!
//! The Block Time Index is the system's authority for translating between
//! block height and wall-clock time. Every time-bounded query resolves its
//! instants to blocks here before touching any other subsystem.
//!
//! ## Responsibilities
//!
//! - Record one `(height, time)` pair per observed block, append-only
//! - Answer `block_at_or_before(time)` / `block_at_or_after(time)` with
//!   binary-search range lookups over the ordered log
//! - Clamp out-of-range instants to the first/latest known block
//! - Reject non-monotonic appends (height and time both advance)
//!
//! ## Hexagonal Architecture
//!
//! - **Domain Layer** (`domain/`): errors and monotonicity rules
//! - **Ports Layer** (`ports/`): `BlockTimes` inbound API, `BlockLog`
//!   outbound storage trait
//! - **Adapters Layer** (`adapters/`): in-memory ordered log for tests and
//!   single-process runs (the production RocksDB adapter lives in
//!   indexer-runtime)

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use domain::BlockTimeError;
pub use ports::{BlockLog, BlockTimes};
pub use service::BlockTimeIndex;
