//! Tracing subscriber initialization.

use crate::TelemetryError;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global tracing subscriber.
///
/// The filter comes from `HISTORIAN_LOG` (same syntax as `RUST_LOG`),
/// falling back to the given default, falling back to `info`.
pub fn init_tracing(default_filter: Option<&str>) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_from_env("HISTORIAN_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_filter.unwrap_or("info")));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .try_init()
        .map_err(|e| TelemetryError::TracingInit(e.to_string()))
}
