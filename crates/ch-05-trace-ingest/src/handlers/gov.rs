//! Gov store handler: governance proposal changes.
//!
//! Watches keys of the form `proposals/{id}` in the `gov` store. The trace
//! value is the raw proposal JSON, which must carry a `status` field.
//! Proposals are never deleted on chain, so deletes do not match.

use crate::domain::{AnnotatedTrace, HandlerError};
use crate::ports::TraceHandler;
use async_trait::async_trait;
use ch_02_event_store::{DependableEvent, GovernanceProposalEvent};
use serde::{Deserialize, Serialize};
use shared_types::TraceOperation;

const KEY_PREFIX: &str = "proposals/";

/// One matched proposal change, as it travels through the durable queue.
#[derive(Debug, Serialize, Deserialize)]
struct ProposalItem {
    id: String,
    proposal_id: u64,
    status: String,
    data: String,
    block_height: u64,
}

/// Indexes governance proposals from the `gov` store.
pub struct GovProposalHandler;

#[async_trait]
impl TraceHandler for GovProposalHandler {
    fn name(&self) -> &'static str {
        "proposal"
    }

    fn store_name(&self) -> &'static str {
        "gov"
    }

    async fn match_trace(&self, trace: &AnnotatedTrace) -> Option<serde_json::Value> {
        if trace.record.operation == TraceOperation::Delete {
            return None;
        }
        let proposal_id: u64 = trace.record.key.strip_prefix(KEY_PREFIX)?.parse().ok()?;
        let payload: serde_json::Value = serde_json::from_str(&trace.record.value).ok()?;
        let status = payload.get("status")?.as_str()?.to_string();

        let item = ProposalItem {
            id: proposal_id.to_string(),
            proposal_id,
            status,
            data: trace.record.value.clone(),
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
            let item: ProposalItem = serde_json::from_value(item.clone())
                .map_err(|e| HandlerError::Malformed(e.to_string()))?;
            events.push(DependableEvent::GovernanceProposal(GovernanceProposalEvent {
                proposal_id: item.proposal_id,
                status: item.status,
                data: item.data,
                block_height: item.block_height,
            }));
        }
        Ok(events)
    }
}
