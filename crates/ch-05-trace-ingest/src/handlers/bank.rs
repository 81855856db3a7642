//! Bank store handler: token balance changes.
//!
//! Watches keys of the form `balances/{account}/{denom}` in the `bank`
//! store. The trace value is the post-change balance as a decimal string;
//! a delete means the balance dropped to zero.

use crate::domain::{AnnotatedTrace, HandlerError};
use crate::ports::TraceHandler;
use async_trait::async_trait;
use ch_02_event_store::{BalanceEvent, DependableEvent};
use serde::{Deserialize, Serialize};
use shared_types::{TraceOperation, U256};

const KEY_PREFIX: &str = "balances/";

/// One matched balance change, as it travels through the durable queue.
#[derive(Debug, Serialize, Deserialize)]
struct BalanceItem {
    id: String,
    account: String,
    denom: String,
    amount: String,
    block_height: u64,
}

/// Indexes token balances from the `bank` store.
pub struct BankBalanceHandler;

#[async_trait]
impl TraceHandler for BankBalanceHandler {
    fn name(&self) -> &'static str {
        "balance"
    }

    fn store_name(&self) -> &'static str {
        "bank"
    }

    async fn match_trace(&self, trace: &AnnotatedTrace) -> Option<serde_json::Value> {
        let rest = trace.record.key.strip_prefix(KEY_PREFIX)?;
        let (account, denom) = rest.split_once('/')?;
        if account.is_empty() || denom.is_empty() {
            return None;
        }

        let amount = match trace.record.operation {
            TraceOperation::Delete => U256::zero(),
            _ => U256::from_dec_str(&trace.record.value).ok()?,
        };

        let item = BalanceItem {
            id: format!("{account}/{denom}"),
            account: account.to_string(),
            denom: denom.to_string(),
            amount: amount.to_string(),
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
            let item: BalanceItem = serde_json::from_value(item.clone())
                .map_err(|e| HandlerError::Malformed(e.to_string()))?;
            let amount = U256::from_dec_str(&item.amount)
                .map_err(|e| HandlerError::Malformed(e.to_string()))?;
            events.push(DependableEvent::Balance(BalanceEvent {
                account: item.account,
                denom: item.denom,
                amount,
                block_height: item.block_height,
            }));
        }
        Ok(events)
    }
}
