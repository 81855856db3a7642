//! Domain layer: typed event variants, namespace registry, and the
//! dependent-key matcher.

mod entities;
mod matcher;

pub use entities::{
    namespace, namespace_for_store, AllowanceEvent, BalanceEvent, ContractStateEvent,
    DependableEvent, GovernanceProposalEvent,
};
pub use matcher::{DependentKeyClause, DependentKeyMatcher};
