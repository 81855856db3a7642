//! Formula documentation metadata and argument validation.

use crate::formula::FormulaArgs;
use shared_types::ValidationError;

/// One declared formula argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgSpec {
    /// Argument name as it appears in the request object.
    pub name: &'static str,
    /// Whether the argument must be present and non-null.
    pub required: bool,
    /// Human-readable type hint (e.g. "string", "u64").
    pub schema: &'static str,
}

/// Description and argument list for one formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormulaDocs {
    /// What the formula computes.
    pub description: &'static str,
    /// Declared arguments.
    pub args: &'static [ArgSpec],
}

/// Check the supplied arguments against the declaration.
///
/// Runs before the formula body; a missing required argument is a caller
/// error and never reaches the formula.
pub fn validate_args(docs: &FormulaDocs, args: &FormulaArgs) -> Result<(), ValidationError> {
    for spec in docs.args {
        if !spec.required {
            continue;
        }
        match args.get(spec.name) {
            None | Some(serde_json::Value::Null) => {
                return Err(ValidationError::MissingArgument(spec.name.to_string()));
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// Fetch a required string argument.
pub fn require_str<'a>(args: &'a FormulaArgs, name: &str) -> Result<&'a str, ValidationError> {
    match args.get(name) {
        Some(serde_json::Value::String(s)) => Ok(s),
        Some(_) => Err(ValidationError::InvalidArgument {
            name: name.to_string(),
            reason: "expected a string".to_string(),
        }),
        None => Err(ValidationError::MissingArgument(name.to_string())),
    }
}

/// Fetch a required unsigned integer argument.
pub fn require_u64(args: &FormulaArgs, name: &str) -> Result<u64, ValidationError> {
    match args.get(name) {
        Some(value) => value.as_u64().ok_or_else(|| ValidationError::InvalidArgument {
            name: name.to_string(),
            reason: "expected an unsigned integer".to_string(),
        }),
        None => Err(ValidationError::MissingArgument(name.to_string())),
    }
}
