//! Built-in trace handlers, one per watched module store.
//!
//! | handler     | store      | persists              |
//! |-------------|------------|-----------------------|
//! | `balance`   | `bank`     | token balances        |
//! | `allowance` | `feegrant` | fee/spend allowances  |
//! | `contract`  | `wasm`     | contract state writes |
//! | `proposal`  | `gov`      | governance proposals  |

mod bank;
mod feegrant;
mod gov;
mod wasm;

pub use bank::BankBalanceHandler;
pub use feegrant::FeeGrantHandler;
pub use gov::GovProposalHandler;
pub use wasm::ContractStateHandler;

use crate::ports::HandlerRegistry;
use std::sync::Arc;

/// Register every built-in handler.
pub fn register_all(registry: &mut HandlerRegistry) {
    registry.register(Arc::new(BankBalanceHandler));
    registry.register(Arc::new(FeeGrantHandler));
    registry.register(Arc::new(ContractStateHandler));
    registry.register(Arc::new(GovProposalHandler));
}
