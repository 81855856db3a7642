//! Wasm store handler: raw contract state writes.
//!
//! Watches keys of the form `{contract}/{state_key}` in the `wasm` store;
//! the state key may itself contain `/` separators (map entries). A delete
//! records the key as removed.

use crate::domain::{AnnotatedTrace, HandlerError};
use crate::ports::TraceHandler;
use async_trait::async_trait;
use ch_02_event_store::{ContractStateEvent, DependableEvent};
use serde::{Deserialize, Serialize};
use shared_types::TraceOperation;

/// One matched contract state write, as it travels through the queue.
#[derive(Debug, Serialize, Deserialize)]
struct ContractStateItem {
    id: String,
    contract: String,
    state_key: String,
    value: Option<String>,
    block_height: u64,
}

/// Indexes contract storage from the `wasm` store.
pub struct ContractStateHandler;

#[async_trait]
impl TraceHandler for ContractStateHandler {
    fn name(&self) -> &'static str {
        "contract"
    }

    fn store_name(&self) -> &'static str {
        "wasm"
    }

    async fn match_trace(&self, trace: &AnnotatedTrace) -> Option<serde_json::Value> {
        // Split at the first separator only: state keys keep their own.
        let (contract, state_key) = trace.record.key.split_once('/')?;
        if contract.is_empty() || state_key.is_empty() {
            return None;
        }

        let value = match trace.record.operation {
            TraceOperation::Delete => None,
            _ => Some(trace.record.value.clone()),
        };

        let item = ContractStateItem {
            id: format!("{contract}/{state_key}"),
            contract: contract.to_string(),
            state_key: state_key.to_string(),
            value,
            block_height: trace.record.block_height(),
        };
        serde_json::to_value(item).ok()
    }

    async fn process(
        &self,
        items: &[serde_json::Value],
    ) -> Result<Vec<DependableEvent>, HandlerError> {
        let mut events = Vec::with_capacity(items.len());
        for item in items {
            let item: ContractStateItem = serde_json::from_value(item.clone())
                .map_err(|e| HandlerError::Malformed(e.to_string()))?;
            events.push(DependableEvent::ContractState(ContractStateEvent {
                contract: item.contract,
                state_key: item.state_key,
                value: item.value,
                block_height: item.block_height,
            }));
        }
        Ok(events)
    }
}
