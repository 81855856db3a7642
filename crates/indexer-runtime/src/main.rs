//! # Chain Historian
//!
//! The main entry point for the historical-state indexer. Consumes the
//! chain's trace stream, persists typed events keyed by block height, and
//! serves dependency-cached computations over that history.
//!
//! ## Startup Sequence
//!
//! 1. Initialize tracing and register metrics
//! 2. Load configuration from `HISTORIAN_*` environment variables
//! 3. Open RocksDB and wire the subsystems
//! 4. Start the ingest worker and export consumer
//! 5. Run until SIGINT/SIGTERM, then drain and stop
//!
//! SIGUSR1 logs a diagnostic snapshot of queue depths and memory without
//! interrupting ingestion.

use anyhow::Result;
use historian_telemetry::{init_tracing, register_metrics};
use indexer_runtime::{load_config, HistorianRuntime};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(None)?;
    register_metrics()?;

    let config = load_config();
    info!(?config, "configuration loaded");

    let mut runtime = HistorianRuntime::new(config)?;
    runtime.start().await?;
    info!("historian is running, press Ctrl+C to stop");

    wait_for_shutdown(&runtime).await?;
    runtime.shutdown().await;

    Ok(())
}

/// Block until SIGINT or SIGTERM, logging diagnostics on SIGUSR1.
async fn wait_for_shutdown(runtime: &HistorianRuntime) -> Result<()> {
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
    let mut sigusr1 =
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::user_defined1())?;

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                info!("received SIGINT");
                return Ok(());
            }
            _ = sigterm.recv() => {
                info!("received SIGTERM");
                return Ok(());
            }
            _ = sigusr1.recv() => {
                runtime.diagnostic_dump();
            }
        }
    }
}
