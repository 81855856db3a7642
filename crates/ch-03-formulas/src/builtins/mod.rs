//! Built-in formulas.
//!
//! The interesting business formulas live outside this repository and are
//! registered by the host; these built-ins cover the common ledger queries
//! and give the engine something real to evaluate in tests.

mod contract;
mod gov;
mod wallet;

pub use contract::{ItemFormula, MapFormula};
pub use gov::ProposalStatusFormula;
pub use wallet::{AllowanceFormula, BalanceFormula, BalancesFormula};

use crate::registry::{FormulaKind, FormulaRegistry};
use std::sync::Arc;

/// Register every built-in formula.
pub fn register_all(registry: &mut FormulaRegistry) {
    registry.register(FormulaKind::Wallet, "balance", Arc::new(BalanceFormula));
    registry.register(FormulaKind::Wallet, "balances", Arc::new(BalancesFormula));
    registry.register(FormulaKind::Wallet, "allowance", Arc::new(AllowanceFormula));
    registry.register(FormulaKind::Contract, "item", Arc::new(ItemFormula));
    registry.register(FormulaKind::Contract, "map", Arc::new(MapFormula));
    registry.register(
        FormulaKind::Generic,
        "proposalStatus",
        Arc::new(ProposalStatusFormula),
    );
}
