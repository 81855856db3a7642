//! Cache entries and range query types.

use ch_03_formulas::{FormulaArgs, FormulaKind};
use serde::{Deserialize, Serialize};
use shared_types::{Block, BlockHeight, DependentKey, TimestampMs};

/// The logical identity of a query, independent of block.
///
/// Arguments are canonicalized to their sorted-key JSON encoding so the
/// same logical query always hits the same cache lineage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComputationKey {
    /// Formula kind.
    pub kind: FormulaKind,
    /// Formula name.
    pub name: String,
    /// Subject address ("" for generic formulas).
    pub address: String,
    /// Canonical JSON encoding of the arguments.
    pub args_canonical: String,
}

impl ComputationKey {
    /// Builds the key for one query.
    pub fn new(kind: FormulaKind, name: &str, address: &str, args: &FormulaArgs) -> Self {
        // serde_json maps iterate in sorted key order, so this encoding is
        // canonical without extra work.
        let args_canonical =
            serde_json::to_string(args).unwrap_or_else(|_| String::from("{}"));
        Self {
            kind,
            name: name.to_string(),
            address: address.to_string(),
            args_canonical,
        }
    }
}

impl std::fmt::Display for ComputationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}@{}{}",
            self.kind, self.name, self.address, self.args_canonical
        )
    }
}

/// A stored result of one formula evaluation.
///
/// Read-mostly and never mutated; a newer entry at a later block supersedes
/// an older one for the same [`ComputationKey`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Computation {
    /// Formula kind.
    pub formula_kind: FormulaKind,
    /// Formula name.
    pub formula_name: String,
    /// Subject address.
    pub address: String,
    /// Canonical argument encoding.
    pub args_canonical: String,
    /// Block the value was computed at.
    pub block: Block,
    /// The computed value.
    pub value: serde_json::Value,
    /// Every dependent key the formula touched while computing.
    pub dependent_keys: Vec<DependentKey>,
}

impl Computation {
    /// The cache key this entry belongs to.
    pub fn key(&self) -> ComputationKey {
        ComputationKey {
            kind: self.formula_kind,
            name: self.formula_name.clone(),
            address: self.address.clone(),
            args_canonical: self.args_canonical.clone(),
        }
    }
}

/// Bounds for a range computation.
///
/// Steps are signed on the wire so a negative step can be rejected as a
/// validation error rather than silently wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RangeBounds {
    /// Step by block height.
    Blocks {
        /// First height sampled.
        start: BlockHeight,
        /// Last height sampled (inclusive).
        end: BlockHeight,
        /// Height increment between samples.
        step: i64,
    },
    /// Step by wall-clock time.
    Times {
        /// First instant sampled, ms since epoch.
        start: TimestampMs,
        /// Last instant sampled (inclusive), ms since epoch.
        end: TimestampMs,
        /// Time increment between samples, ms.
        step: i64,
    },
}

/// One sample of a range computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeSample {
    /// Height of the block the sample resolved to.
    pub block_height: BlockHeight,
    /// Time of that block, ms since epoch.
    pub block_time_unix_ms: TimestampMs,
    /// The computed value at that block.
    pub value: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn args_canonicalization_is_order_insensitive() {
        let mut a = FormulaArgs::new();
        a.insert("b".into(), json!(1));
        a.insert("a".into(), json!(2));

        let mut b = FormulaArgs::new();
        b.insert("a".into(), json!(2));
        b.insert("b".into(), json!(1));

        let ka = ComputationKey::new(FormulaKind::Wallet, "balance", "addr", &a);
        let kb = ComputationKey::new(FormulaKind::Wallet, "balance", "addr", &b);
        assert_eq!(ka, kb);
    }
}
