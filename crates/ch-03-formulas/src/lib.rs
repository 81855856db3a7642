//! # Formula Subsystem (ch-03)
//!
//! Formulas are named pure functions over historical chain state: given an
//! address, arguments, and a block, a formula reads state through the
//! [`FormulaEnv`] and produces a JSON value. Every read the environment
//! serves is recorded as a dependent key, which is how the computation
//! engine later knows exactly which state the result depended on.
//!
//! ## Contract
//!
//! - Formulas are identified by `(kind, name)` and looked up in the static
//!   [`FormulaRegistry`].
//! - A formula must be pure: same state, same arguments, same value.
//! - Argument requirements are declared in [`FormulaDocs`] and validated
//!   before the formula body runs.

pub mod builtins;
pub mod docs;
pub mod env;
pub mod formula;
pub mod registry;

pub use docs::{validate_args, ArgSpec, FormulaDocs};
pub use env::FormulaEnv;
pub use formula::{Formula, FormulaArgs, FormulaError};
pub use registry::{FormulaKind, FormulaRegistry};
