//! # Formula Registry
//!
//! Static lookup of named formulas by `(kind, name)`. Built once at startup;
//! resolution is a read-only map lookup on the query path.

use crate::builtins;
use crate::formula::Formula;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// The subject kind a formula computes over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormulaKind {
    /// Formulas over a contract address.
    Contract,
    /// Formulas over a wallet address.
    Wallet,
    /// Chain-wide formulas with no subject address.
    Generic,
}

impl std::fmt::Display for FormulaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FormulaKind::Contract => "contract",
            FormulaKind::Wallet => "wallet",
            FormulaKind::Generic => "generic",
        };
        write!(f, "{s}")
    }
}

/// Static lookup of named pure computation functions.
#[derive(Default)]
pub struct FormulaRegistry {
    formulas: HashMap<(FormulaKind, String), Arc<dyn Formula>>,
}

impl FormulaRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-loaded with the built-in formulas.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtins::register_all(&mut registry);
        registry
    }

    /// Register a formula under `(kind, name)`. Re-registering replaces.
    pub fn register(
        &mut self,
        kind: FormulaKind,
        name: impl Into<String>,
        formula: Arc<dyn Formula>,
    ) {
        self.formulas.insert((kind, name.into()), formula);
    }

    /// Look up a formula. `None` means the `(kind, name)` pair is unknown.
    pub fn get(&self, kind: FormulaKind, name: &str) -> Option<Arc<dyn Formula>> {
        self.formulas.get(&(kind, name.to_string())).cloned()
    }

    /// All registered `(kind, name)` pairs, for diagnostics.
    pub fn names(&self) -> Vec<(FormulaKind, String)> {
        let mut names: Vec<_> = self.formulas.keys().cloned().collect();
        names.sort_by(|a, b| (a.0.to_string(), &a.1).cmp(&(b.0.to_string(), &b.1)));
        names
    }

    /// Number of registered formulas.
    pub fn len(&self) -> usize {
        self.formulas.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.formulas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_registered() {
        let registry = FormulaRegistry::with_builtins();
        assert!(registry.get(FormulaKind::Wallet, "balance").is_some());
        assert!(registry.get(FormulaKind::Wallet, "nope").is_none());
        assert!(!registry.is_empty());
    }

    #[test]
    fn kinds_do_not_collide() {
        let registry = FormulaRegistry::with_builtins();
        // "item" is a contract formula; the wallet namespace must not see it.
        assert!(registry.get(FormulaKind::Contract, "item").is_some());
        assert!(registry.get(FormulaKind::Wallet, "item").is_none());
    }
}
