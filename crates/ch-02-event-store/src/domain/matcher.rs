//! # Dependent Key Matcher
//!
//! Turns the dependent keys recorded by a cached computation into existence
//! predicates the event store can answer with indexed range scans.
//!
//! Historical data is sharded by a primary identity (account, granter,
//! contract). Grouping keys by that identity lets the store answer "has
//! anything relevant changed" with one indexed query per group instead of a
//! full namespace scan.

use shared_types::dependent_key::{SEPARATOR, WILDCARD};
use shared_types::DependentKey;

/// One per-identity existence predicate.
///
/// Matches an event when its identity equals `identity` (or `identity` is
/// `None`, the wildcard group) and its remainder is in `exact` or starts
/// with one of `prefixes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependentKeyClause {
    /// Identity equality, or `None` to match any identity.
    pub identity: Option<String>,
    /// Exact remainder matches.
    pub exact: Vec<String>,
    /// Prefix (LIKE-style) remainder matches.
    pub prefixes: Vec<String>,
}

impl DependentKeyClause {
    /// Does an event with this identity and remainder satisfy the clause?
    pub fn matches(&self, identity: &str, remainder: &str) -> bool {
        if let Some(wanted) = &self.identity {
            if wanted != identity {
                return false;
            }
        }
        self.exact.iter().any(|e| e == remainder)
            || self.prefixes.iter().any(|p| remainder.starts_with(p.as_str()))
    }
}

/// Builds existence predicates from a set of recorded dependent keys.
pub struct DependentKeyMatcher;

impl DependentKeyMatcher {
    /// Group keys sharing `namespace` into per-identity clauses.
    ///
    /// Keys from other namespaces are ignored. The first segment after the
    /// namespace is the identity; a wildcard identity joins the
    /// any-identity group. Remainders containing a wildcard, and keys
    /// flagged `prefix`, become prefix predicates truncated at the first
    /// wildcard — a superset of the literal wildcard match, so invalidation
    /// is conservative, never stale.
    pub fn clauses_for(namespace: &str, keys: &[DependentKey]) -> Vec<DependentKeyClause> {
        let mut clauses: Vec<DependentKeyClause> = Vec::new();

        for key in keys {
            if key.namespace() != namespace {
                continue;
            }
            let segments = key.segments();
            let (identity, remainder) = match segments.split_first() {
                Some((first, rest)) => {
                    let identity = if *first == WILDCARD {
                        None
                    } else {
                        Some((*first).to_string())
                    };
                    (identity, rest.join(&SEPARATOR.to_string()))
                }
                // Bare namespace key: any identity, any remainder.
                None => (None, String::new()),
            };

            let clause = match clauses.iter_mut().find(|c| c.identity == identity) {
                Some(existing) => existing,
                None => {
                    clauses.push(DependentKeyClause {
                        identity,
                        exact: Vec::new(),
                        prefixes: Vec::new(),
                    });
                    clauses.last_mut().unwrap()
                }
            };

            if key.prefix || remainder.contains(WILDCARD) {
                let prefix = remainder
                    .find(WILDCARD)
                    .map(|idx| remainder[..idx].to_string())
                    .unwrap_or(remainder);
                if !clause.prefixes.contains(&prefix) {
                    clause.prefixes.push(prefix);
                }
            } else if !clause.exact.contains(&remainder) {
                clause.exact.push(remainder);
            }
        }

        clauses
    }

    /// Convenience: does any clause match the given event coordinates?
    pub fn any_match(
        clauses: &[DependentKeyClause],
        identity: &str,
        remainder: &str,
    ) -> bool {
        clauses.iter().any(|c| c.matches(identity, remainder))
    }
}
