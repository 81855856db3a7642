//! Governance formulas.

use crate::docs::{require_u64, validate_args, ArgSpec, FormulaDocs};
use crate::env::FormulaEnv;
use crate::formula::{Formula, FormulaArgs, FormulaError};
use async_trait::async_trait;
use serde_json::{json, Value};

/// `generic/proposalStatus` — status of one governance proposal.
pub struct ProposalStatusFormula;

#[async_trait]
impl Formula for ProposalStatusFormula {
    fn docs(&self) -> FormulaDocs {
        FormulaDocs {
            description: "Current status of a governance proposal",
            args: &[ArgSpec {
                name: "id",
                required: true,
                schema: "u64",
            }],
        }
    }

    async fn compute(
        &self,
        env: &FormulaEnv<'_>,
        _address: &str,
        args: &FormulaArgs,
    ) -> Result<Value, FormulaError> {
        validate_args(&self.docs(), args)?;
        let id = require_u64(args, "id")?;
        Ok(match env.proposal(id).await? {
            Some(proposal) => json!(proposal.status),
            None => Value::Null,
        })
    }
}
