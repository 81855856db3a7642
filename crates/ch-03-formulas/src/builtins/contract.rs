//! Contract formulas: raw state queries keyed by a contract address.

use crate::docs::{require_str, validate_args, ArgSpec, FormulaDocs};
use crate::env::FormulaEnv;
use crate::formula::{Formula, FormulaArgs, FormulaError};
use async_trait::async_trait;
use serde_json::{json, Value};

/// `contract/item` — one storage value.
pub struct ItemFormula;

#[async_trait]
impl Formula for ItemFormula {
    fn docs(&self) -> FormulaDocs {
        FormulaDocs {
            description: "One raw storage value of the contract",
            args: &[ArgSpec {
                name: "key",
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
        let key = require_str(args, "key")?;
        Ok(match env.contract_value(address, key).await? {
            Some(value) => json!(value),
            None => Value::Null,
        })
    }
}

/// `contract/map` — all live storage entries under a key prefix.
pub struct MapFormula;

#[async_trait]
impl Formula for MapFormula {
    fn docs(&self) -> FormulaDocs {
        FormulaDocs {
            description: "All live storage entries of the contract under a key prefix",
            args: &[ArgSpec {
                name: "prefix",
                required: false,
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
        let prefix = args
            .get("prefix")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        let entries = env.contract_map(address, prefix).await?;
        let mut object = serde_json::Map::new();
        for (key, value) in entries {
            object.insert(key, json!(value));
        }
        Ok(Value::Object(object))
    }
}
