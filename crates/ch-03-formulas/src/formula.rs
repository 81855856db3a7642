//! The formula contract and its error type.

use crate::docs::FormulaDocs;
use crate::env::FormulaEnv;
use async_trait::async_trait;
use shared_types::{StoreError, ValidationError};
use thiserror::Error;

/// Formula arguments: a JSON object, canonically ordered by key.
pub type FormulaArgs = serde_json::Map<String, serde_json::Value>;

/// Errors a formula evaluation can produce.
#[derive(Debug, Error)]
pub enum FormulaError {
    /// Caller error: bad or missing arguments. Surfaced unchanged, never
    /// retried, never cached.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The historical store failed underneath the formula.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The formula body itself failed. Not cached.
    #[error("Formula failed: {0}")]
    Internal(String),
}

/// A named pure function over historical chain state.
///
/// The environment pins the block the formula evaluates at and records a
/// dependent key for every state read it serves.
#[async_trait]
pub trait Formula: Send + Sync {
    /// Description and argument requirements.
    fn docs(&self) -> FormulaDocs;

    /// Evaluate at the environment's block.
    ///
    /// `address` is the subject entity (wallet or contract); generic
    /// formulas ignore it.
    async fn compute(
        &self,
        env: &FormulaEnv<'_>,
        address: &str,
        args: &FormulaArgs,
    ) -> Result<serde_json::Value, FormulaError>;
}
