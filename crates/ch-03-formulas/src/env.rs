//! # Formula Environment
//!
//! The read surface a formula sees. Every lookup is pinned to the
//! environment's block and recorded as a dependent key: point reads record
//! exact keys, map scans record prefix keys. The recorded set is exactly
//! what the computation cache stores next to the result.

use ch_02_event_store::{namespace, AllowanceEvent, DependableEvent, EventStore, GovernanceProposalEvent};
use parking_lot::Mutex;
use shared_types::{Block, DependentKey, StoreError, U256};

/// Dependency-recording view of historical state at one block.
pub struct FormulaEnv<'a> {
    store: &'a dyn EventStore,
    block: Block,
    recorded: Mutex<Vec<DependentKey>>,
}

impl<'a> FormulaEnv<'a> {
    /// Creates an environment reading at `block`.
    pub fn new(store: &'a dyn EventStore, block: Block) -> Self {
        Self {
            store,
            block,
            recorded: Mutex::new(Vec::new()),
        }
    }

    /// The block this evaluation is pinned to.
    pub fn block(&self) -> Block {
        self.block
    }

    /// The dependent keys recorded so far.
    pub fn recorded_keys(&self) -> Vec<DependentKey> {
        self.recorded.lock().clone()
    }

    fn record(&self, key: DependentKey) {
        let mut recorded = self.recorded.lock();
        if !recorded.contains(&key) {
            recorded.push(key);
        }
    }

    /// Balance of `denom` held by `account`, if the account has ever held it.
    pub async fn balance(
        &self,
        account: &str,
        denom: &str,
    ) -> Result<Option<U256>, StoreError> {
        self.record(DependentKey::exact(namespace::BALANCE, &[account, denom]));
        let event = self
            .store
            .latest_at_or_before(namespace::BALANCE, account, denom, self.block.height)
            .await?;
        Ok(event.and_then(|e| match e {
            DependableEvent::Balance(b) => Some(b.amount),
            _ => None,
        }))
    }

    /// All balances held by `account`, denom-ascending, zero balances omitted.
    pub async fn balances(&self, account: &str) -> Result<Vec<(String, U256)>, StoreError> {
        self.record(DependentKey::prefix(namespace::BALANCE, &[account]));
        let snapshot = self
            .store
            .snapshot(namespace::BALANCE, account, "", self.block.height)
            .await?;
        Ok(snapshot
            .into_iter()
            .filter(|e| !e.is_delete())
            .filter_map(|e| match e {
                DependableEvent::Balance(b) => Some((b.denom, b.amount)),
                _ => None,
            })
            .collect())
    }

    /// The allowance `granter` has extended to `grantee`, revocations included.
    pub async fn allowance(
        &self,
        granter: &str,
        grantee: &str,
    ) -> Result<Option<AllowanceEvent>, StoreError> {
        self.record(DependentKey::exact(
            namespace::ALLOWANCE,
            &[granter, grantee],
        ));
        let event = self
            .store
            .latest_at_or_before(namespace::ALLOWANCE, granter, grantee, self.block.height)
            .await?;
        Ok(event.and_then(|e| match e {
            DependableEvent::Allowance(a) => Some(a),
            _ => None,
        }))
    }

    /// One contract storage value, `None` if absent or deleted.
    pub async fn contract_value(
        &self,
        contract: &str,
        state_key: &str,
    ) -> Result<Option<String>, StoreError> {
        self.record(DependentKey::exact(namespace::WASM, &[contract, state_key]));
        let event = self
            .store
            .latest_at_or_before(namespace::WASM, contract, state_key, self.block.height)
            .await?;
        Ok(event.and_then(|e| match e {
            DependableEvent::ContractState(s) => s.value,
            _ => None,
        }))
    }

    /// All live contract storage entries under `key_prefix`, key-ascending.
    pub async fn contract_map(
        &self,
        contract: &str,
        key_prefix: &str,
    ) -> Result<Vec<(String, String)>, StoreError> {
        self.record(DependentKey::prefix(
            namespace::WASM,
            &[contract, key_prefix],
        ));
        let snapshot = self
            .store
            .snapshot(namespace::WASM, contract, key_prefix, self.block.height)
            .await?;
        Ok(snapshot
            .into_iter()
            .filter_map(|e| match e {
                DependableEvent::ContractState(s) => {
                    s.value.map(|value| (s.state_key, value))
                }
                _ => None,
            })
            .collect())
    }

    /// The state of a governance proposal.
    pub async fn proposal(
        &self,
        proposal_id: u64,
    ) -> Result<Option<GovernanceProposalEvent>, StoreError> {
        let id = proposal_id.to_string();
        self.record(DependentKey::exact(namespace::GOV, &[&id]));
        let event = self
            .store
            .latest_at_or_before(namespace::GOV, &id, "", self.block.height)
            .await?;
        Ok(event.and_then(|e| match e {
            DependableEvent::GovernanceProposal(p) => Some(p),
            _ => None,
        }))
    }
}
