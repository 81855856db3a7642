//! Wallet formulas: ledger queries keyed by an account address.
//!
//! Amounts are emitted as decimal strings. JSON numbers are doubles and
//! would silently lose precision above 2^53; ledger math stays in U256.

use crate::docs::{require_str, validate_args, ArgSpec, FormulaDocs};
use crate::env::FormulaEnv;
use crate::formula::{Formula, FormulaArgs, FormulaError};
use async_trait::async_trait;
use serde_json::{json, Value};
use shared_types::U256;

/// `wallet/balance` — one denomination's balance for the address.
pub struct BalanceFormula;

#[async_trait]
impl Formula for BalanceFormula {
    fn docs(&self) -> FormulaDocs {
        FormulaDocs {
            description: "Balance of one denomination held by the wallet",
            args: &[ArgSpec {
                name: "denom",
                required: true,
                schema: "string",
            }],
        }
    }

    async fn compute(
        &self,
        env: &FormulaEnv<'_>,
        address: &str,
        args: &FormulaArgs,
    ) -> Result<Value, FormulaError> {
        validate_args(&self.docs(), args)?;
        let denom = require_str(args, "denom")?;
        let amount = env.balance(address, denom).await?.unwrap_or_else(U256::zero);
        Ok(json!(amount.to_string()))
    }
}

/// `wallet/balances` — every denomination the wallet currently holds.
pub struct BalancesFormula;

#[async_trait]
impl Formula for BalancesFormula {
    fn docs(&self) -> FormulaDocs {
        FormulaDocs {
            description: "All balances held by the wallet, keyed by denom",
            args: &[],
        }
    }

    async fn compute(
        &self,
        env: &FormulaEnv<'_>,
        address: &str,
        _args: &FormulaArgs,
    ) -> Result<Value, FormulaError> {
        let balances = env.balances(address).await?;
        let mut object = serde_json::Map::new();
        for (denom, amount) in balances {
            object.insert(denom, json!(amount.to_string()));
        }
        Ok(Value::Object(object))
    }
}

/// `wallet/allowance` — the remaining allowance this wallet has granted.
pub struct AllowanceFormula;

#[async_trait]
impl Formula for AllowanceFormula {
    fn docs(&self) -> FormulaDocs {
        FormulaDocs {
            description: "Remaining allowance granted by the wallet to a grantee",
            args: &[ArgSpec {
                name: "grantee",
                required: true,
                schema: "string",
            }],
        }
    }

    async fn compute(
        &self,
        env: &FormulaEnv<'_>,
        address: &str,
        args: &FormulaArgs,
    ) -> Result<Value, FormulaError> {
        validate_args(&self.docs(), args)?;
        let grantee = require_str(args, "grantee")?;
        let amount = match env.allowance(address, grantee).await? {
            Some(grant) if !grant.revoked => grant.amount,
            _ => U256::zero(),
        };
        Ok(json!(amount.to_string()))
    }
}
