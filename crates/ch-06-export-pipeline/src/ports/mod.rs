//! Ports layer: best-effort downstream fan-out channels.

mod fanout;

pub use fanout::{FanoutError, SearchIndexUpdater, WebhookDispatcher};
