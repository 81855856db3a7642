//! Chain RPC connection management.
//!
//! Block times for heights the index has not seen yet come from the chain
//! node. Clients are pooled per endpoint; a failed client is invalidated
//! and the next caller gets a fresh connection.

use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{BlockHeight, StoreError, TimestampMs};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use ch_05_trace_ingest::BlockTimeSource;

/// One live connection to a chain node.
#[async_trait]
pub trait ChainRpcClient: Send + Sync {
    /// Wall-clock time of the block at `height`, ms since the UNIX epoch.
    async fn block_time(&self, height: BlockHeight) -> Result<TimestampMs, StoreError>;

    /// The endpoint this client is connected to.
    fn endpoint(&self) -> &str;
}

/// Builds clients for endpoints the pool has not seen.
pub trait ChainRpcFactory: Send + Sync {
    /// Connect to `endpoint` and return a ready client.
    fn connect(&self, endpoint: &str) -> Arc<dyn ChainRpcClient>;
}

/// A pool of one client per endpoint.
///
/// `client_for` returns the cached client or dials a new one. Callers that
/// observe a broken connection call `invalidate`; the pool drops the entry
/// and the next lookup reconnects.
pub struct ConnectionManager {
    factory: Arc<dyn ChainRpcFactory>,
    pool: RwLock<HashMap<String, Arc<dyn ChainRpcClient>>>,
}

impl ConnectionManager {
    /// Creates an empty pool over a client factory.
    pub fn new(factory: Arc<dyn ChainRpcFactory>) -> Self {
        Self {
            factory,
            pool: RwLock::new(HashMap::new()),
        }
    }

    /// The pooled client for `endpoint`, dialing if absent.
    pub fn client_for(&self, endpoint: &str) -> Arc<dyn ChainRpcClient> {
        if let Some(client) = self.pool.read().get(endpoint) {
            return Arc::clone(client);
        }
        let mut pool = self.pool.write();
        // A writer may have dialed while we waited for the lock.
        if let Some(client) = pool.get(endpoint) {
            return Arc::clone(client);
        }
        info!(endpoint, "dialing chain rpc endpoint");
        let client = self.factory.connect(endpoint);
        pool.insert(endpoint.to_string(), Arc::clone(&client));
        client
    }

    /// Drop the pooled client for `endpoint`.
    pub fn invalidate(&self, endpoint: &str) {
        if self.pool.write().remove(endpoint).is_some() {
            info!(endpoint, "invalidated chain rpc connection");
        }
    }

    /// Number of pooled connections.
    pub fn pooled(&self) -> usize {
        self.pool.read().len()
    }
}

/// A clock that derives block times from genesis and a fixed interval.
///
/// Stands in for a node query on chains with a steady production rate, and
/// serves as the default client until a real transport is configured.
pub struct IntervalClock {
    endpoint: String,
    genesis_time_ms: TimestampMs,
    block_interval_ms: u64,
}

impl IntervalClock {
    /// Creates the clock for one endpoint.
    pub fn new(endpoint: &str, genesis_time_ms: TimestampMs, block_interval_ms: u64) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            genesis_time_ms,
            block_interval_ms,
        }
    }
}

#[async_trait]
impl ChainRpcClient for IntervalClock {
    async fn block_time(&self, height: BlockHeight) -> Result<TimestampMs, StoreError> {
        height
            .checked_mul(self.block_interval_ms)
            .and_then(|offset| self.genesis_time_ms.checked_add(offset))
            .ok_or_else(|| {
                StoreError::Backend(format!("block time overflow at height {height}"))
            })
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Factory producing [`IntervalClock`] clients.
pub struct IntervalClockFactory {
    genesis_time_ms: TimestampMs,
    block_interval_ms: u64,
}

impl IntervalClockFactory {
    /// Creates the factory from chain timing parameters.
    pub fn new(genesis_time_ms: TimestampMs, block_interval_ms: u64) -> Self {
        Self {
            genesis_time_ms,
            block_interval_ms,
        }
    }
}

impl ChainRpcFactory for IntervalClockFactory {
    fn connect(&self, endpoint: &str) -> Arc<dyn ChainRpcClient> {
        Arc::new(IntervalClock::new(
            endpoint,
            self.genesis_time_ms,
            self.block_interval_ms,
        ))
    }
}

/// The ingest worker's [`BlockTimeSource`], backed by the connection pool.
///
/// The active endpoint can be swapped at runtime without restarting the
/// worker; in-flight lookups finish against the old client.
pub struct RpcBlockTimeSource {
    manager: Arc<ConnectionManager>,
    endpoint: RwLock<String>,
}

impl RpcBlockTimeSource {
    /// Creates the source pointed at `endpoint`.
    pub fn new(manager: Arc<ConnectionManager>, endpoint: &str) -> Self {
        Self {
            manager,
            endpoint: RwLock::new(endpoint.to_string()),
        }
    }

    /// Point subsequent lookups at a different endpoint.
    pub fn set_endpoint(&self, endpoint: &str) {
        debug!(endpoint, "switching block time endpoint");
        *self.endpoint.write() = endpoint.to_string();
    }
}

#[async_trait]
impl BlockTimeSource for RpcBlockTimeSource {
    async fn time_for_height(&self, height: BlockHeight) -> Result<TimestampMs, StoreError> {
        let endpoint = self.endpoint.read().clone();
        let client = self.manager.client_for(&endpoint);
        match client.block_time(height).await {
            Ok(time) => Ok(time),
            Err(e) => {
                self.manager.invalidate(&endpoint);
                Err(e)
            }
        }
    }
}
