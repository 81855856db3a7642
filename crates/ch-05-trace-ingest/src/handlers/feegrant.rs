//! Feegrant store handler: fee/spend allowances between accounts.
//!
//! Watches keys of the form `{granter}/{grantee}` in the `feegrant` store.
//! The trace value is a JSON object `{"amount": "<decimal>"}`; a delete
//! marks the grant revoked.

use crate::domain::{AnnotatedTrace, HandlerError};
use crate::ports::TraceHandler;
use async_trait::async_trait;
use ch_02_event_store::{AllowanceEvent, DependableEvent};
use serde::{Deserialize, Serialize};
use shared_types::{TraceOperation, U256};

#[derive(Debug, Deserialize)]
struct GrantPayload {
    amount: String,
}

/// One matched allowance change, as it travels through the durable queue.
#[derive(Debug, Serialize, Deserialize)]
struct AllowanceItem {
    id: String,
    granter: String,
    grantee: String,
    amount: String,
    revoked: bool,
    block_height: u64,
}

/// Indexes fee allowances from the `feegrant` store.
pub struct FeeGrantHandler;

#[async_trait]
impl TraceHandler for FeeGrantHandler {
    fn name(&self) -> &'static str {
        "allowance"
    }

    fn store_name(&self) -> &'static str {
        "feegrant"
    }

    async fn match_trace(&self, trace: &AnnotatedTrace) -> Option<serde_json::Value> {
        let (granter, grantee) = trace.record.key.split_once('/')?;
        if granter.is_empty() || grantee.is_empty() {
            return None;
        }

        let (amount, revoked) = match trace.record.operation {
            TraceOperation::Delete => (U256::zero(), true),
            _ => {
                let payload: GrantPayload = serde_json::from_str(&trace.record.value).ok()?;
                (U256::from_dec_str(&payload.amount).ok()?, false)
            }
        };

        let item = AllowanceItem {
            id: format!("{granter}/{grantee}"),
            granter: granter.to_string(),
            grantee: grantee.to_string(),
            amount: amount.to_string(),
            revoked,
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
            let item: AllowanceItem = serde_json::from_value(item.clone())
                .map_err(|e| HandlerError::Malformed(e.to_string()))?;
            let amount = U256::from_dec_str(&item.amount)
                .map_err(|e| HandlerError::Malformed(e.to_string()))?;
            events.push(DependableEvent::Allowance(AllowanceEvent {
                granter: item.granter,
                grantee: item.grantee,
                amount,
                revoked: item.revoked,
                block_height: item.block_height,
            }));
        }
        Ok(events)
    }
}
