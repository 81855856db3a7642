//! Core domain entities: the closed set of persisted historical event kinds.
//!
//! Each kind owns its own keyspace in storage, keyed by a kind-specific
//! primary identity plus ascending block height. A kind's dependent key is a
//! pure function of its identity fields — two events for the same logical
//! entity always derive the same key, which is what makes cache
//! invalidation by key matching sound.

use serde::{Deserialize, Serialize};
use shared_types::{Address, BlockHeight, DependentKey, U256};

/// Entity namespaces, also the leading segment of every dependent key.
pub mod namespace {
    /// Token balances per (account, denom).
    pub const BALANCE: &str = "balance";
    /// Fee/spend allowances per (granter, grantee).
    pub const ALLOWANCE: &str = "allowance";
    /// Raw contract state writes per (contract, state key).
    pub const WASM: &str = "wasm";
    /// Governance proposals per proposal id.
    pub const GOV: &str = "gov";
}

/// Resolve a trace `store_name` to the entity namespace it feeds.
///
/// Resolved once per trace record; unknown stores are dropped upstream.
pub fn namespace_for_store(store_name: &str) -> Option<&'static str> {
    match store_name {
        "bank" => Some(namespace::BALANCE),
        "feegrant" => Some(namespace::ALLOWANCE),
        "wasm" => Some(namespace::WASM),
        "gov" => Some(namespace::GOV),
        _ => None,
    }
}

/// A token balance observed at one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceEvent {
    /// Account holding the balance.
    pub account: Address,
    /// Token denomination.
    pub denom: String,
    /// Balance after the change, in base units.
    pub amount: U256,
    /// Block the change was observed at.
    pub block_height: BlockHeight,
}

/// A fee/spend allowance between two accounts observed at one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowanceEvent {
    /// Account granting the allowance.
    pub granter: Address,
    /// Account allowed to spend.
    pub grantee: Address,
    /// Remaining allowance, in base units.
    pub amount: U256,
    /// True once the grant has been revoked or exhausted.
    pub revoked: bool,
    /// Block the change was observed at.
    pub block_height: BlockHeight,
}

/// A raw contract state write or deletion observed at one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractStateEvent {
    /// The contract whose storage changed.
    pub contract: Address,
    /// The storage key within the contract.
    pub state_key: String,
    /// The new value, or `None` for a deletion.
    pub value: Option<String>,
    /// Block the change was observed at.
    pub block_height: BlockHeight,
}

/// A governance proposal change observed at one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceProposalEvent {
    /// Chain-assigned proposal id.
    pub proposal_id: u64,
    /// Proposal status (e.g. "deposit_period", "voting_period", "passed").
    pub status: String,
    /// Raw proposal payload as stored on chain.
    pub data: String,
    /// Block the change was observed at.
    pub block_height: BlockHeight,
}

/// Any persisted entity kind the historical store understands.
///
/// Modeled as a closed tagged variant set rather than an open trait: every
/// kind the system persists is known at compile time, and dispatch happens
/// through [`namespace_for_store`] once per trace record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DependableEvent {
    /// Token balance change.
    Balance(BalanceEvent),
    /// Allowance change.
    Allowance(AllowanceEvent),
    /// Contract state write/delete.
    ContractState(ContractStateEvent),
    /// Governance proposal change.
    GovernanceProposal(GovernanceProposalEvent),
}

impl DependableEvent {
    /// The namespace this event's kind owns.
    pub fn namespace(&self) -> &'static str {
        match self {
            DependableEvent::Balance(_) => namespace::BALANCE,
            DependableEvent::Allowance(_) => namespace::ALLOWANCE,
            DependableEvent::ContractState(_) => namespace::WASM,
            DependableEvent::GovernanceProposal(_) => namespace::GOV,
        }
    }

    /// Block height the event was observed at.
    pub fn block_height(&self) -> BlockHeight {
        match self {
            DependableEvent::Balance(e) => e.block_height,
            DependableEvent::Allowance(e) => e.block_height,
            DependableEvent::ContractState(e) => e.block_height,
            DependableEvent::GovernanceProposal(e) => e.block_height,
        }
    }

    /// The primary identity value historical data is sharded by.
    pub fn identity(&self) -> String {
        match self {
            DependableEvent::Balance(e) => e.account.clone(),
            DependableEvent::Allowance(e) => e.granter.clone(),
            DependableEvent::ContractState(e) => e.contract.clone(),
            DependableEvent::GovernanceProposal(e) => e.proposal_id.to_string(),
        }
    }

    /// The key segments after the identity.
    pub fn remainder(&self) -> String {
        match self {
            DependableEvent::Balance(e) => e.denom.clone(),
            DependableEvent::Allowance(e) => e.grantee.clone(),
            DependableEvent::ContractState(e) => e.state_key.clone(),
            DependableEvent::GovernanceProposal(_) => String::new(),
        }
    }

    /// The dependent key this event invalidates.
    ///
    /// Pure function of the identity fields.
    pub fn dependent_key(&self) -> DependentKey {
        let identity = self.identity();
        let remainder = self.remainder();
        if remainder.is_empty() {
            DependentKey::exact(self.namespace(), &[&identity])
        } else {
            DependentKey::exact(self.namespace(), &[&identity, &remainder])
        }
    }

    /// True when this event removes the entity from current state.
    pub fn is_delete(&self) -> bool {
        match self {
            DependableEvent::Balance(e) => e.amount.is_zero(),
            DependableEvent::Allowance(e) => e.revoked,
            DependableEvent::ContractState(e) => e.value.is_none(),
            DependableEvent::GovernanceProposal(_) => false,
        }
    }

    /// JSON payload forwarded to downstream fan-out channels.
    pub fn payload(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
