//! # Dependent Keys
//!
//! A dependent key is a structured identifier of the state a computation
//! read, used for cache invalidation. Textual format:
//!
//! ```text
//! <namespace>:<segment>:<segment>...
//! ```
//!
//! A segment may be the wildcard `*`. A `prefix` flag marks whether trailing
//! segments are a prefix match (LIKE-style) or exact.

use serde::{Deserialize, Serialize};

/// The wildcard segment: matches any single segment value.
pub const WILDCARD: &str = "*";

/// Separator between segments in the textual form.
pub const SEPARATOR: char = ':';

/// A structured identifier of one piece of on-chain state.
///
/// Produced by entity records (each persisted event derives its key purely
/// from its identity fields) and recorded by the formula environment for
/// every state read a computation performs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependentKey {
    /// The full textual key, namespace included.
    pub key: String,
    /// When true, trailing segments are a prefix match rather than exact.
    pub prefix: bool,
}

impl DependentKey {
    /// An exact-match key from a namespace and segments.
    pub fn exact(namespace: &str, segments: &[&str]) -> Self {
        Self {
            key: Self::join(namespace, segments),
            prefix: false,
        }
    }

    /// A prefix-match key from a namespace and leading segments.
    pub fn prefix(namespace: &str, segments: &[&str]) -> Self {
        Self {
            key: Self::join(namespace, segments),
            prefix: true,
        }
    }

    fn join(namespace: &str, segments: &[&str]) -> String {
        let mut key = String::from(namespace);
        for segment in segments {
            key.push(SEPARATOR);
            key.push_str(segment);
        }
        key
    }

    /// The namespace (text before the first separator).
    ///
    /// A key with no separator is all namespace.
    pub fn namespace(&self) -> &str {
        match self.key.find(SEPARATOR) {
            Some(idx) => &self.key[..idx],
            None => &self.key,
        }
    }

    /// Everything after the namespace, or empty if there is none.
    pub fn remainder(&self) -> &str {
        match self.key.find(SEPARATOR) {
            Some(idx) => &self.key[idx + 1..],
            None => "",
        }
    }

    /// The segments after the namespace.
    pub fn segments(&self) -> Vec<&str> {
        let remainder = self.remainder();
        if remainder.is_empty() {
            Vec::new()
        } else {
            remainder.split(SEPARATOR).collect()
        }
    }

    /// Returns true if any segment is the wildcard.
    pub fn has_wildcard(&self) -> bool {
        self.segments().iter().any(|s| *s == WILDCARD)
    }
}

impl std::fmt::Display for DependentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.prefix {
            write!(f, "{}%", self.key)
        } else {
            write!(f, "{}", self.key)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_key_format() {
        let key = DependentKey::exact("balance", &["historian1abc", "uhist"]);
        assert_eq!(key.key, "balance:historian1abc:uhist");
        assert_eq!(key.namespace(), "balance");
        assert_eq!(key.remainder(), "historian1abc:uhist");
        assert_eq!(key.segments(), vec!["historian1abc", "uhist"]);
        assert!(!key.prefix);
        assert!(!key.has_wildcard());
    }

    #[test]
    fn wildcard_detection() {
        let key = DependentKey::exact("allowance", &[WILDCARD, "grantee1"]);
        assert!(key.has_wildcard());
        assert_eq!(key.segments()[0], WILDCARD);
    }

    #[test]
    fn namespace_only_key() {
        let key = DependentKey::prefix("gov", &[]);
        assert_eq!(key.namespace(), "gov");
        assert_eq!(key.remainder(), "");
        assert!(key.segments().is_empty());
    }
}
