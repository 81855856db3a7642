//! Error types for the Computation Engine subsystem.

use ch_01_block_time::BlockTimeError;
use ch_03_formulas::{FormulaError, FormulaKind};
use shared_types::{StoreError, ValidationError};
use thiserror::Error;

/// Errors a point or range computation can produce.
#[derive(Debug, Error)]
pub enum ComputeError {
    /// No formula registered under `(kind, name)`.
    #[error("Unknown formula: {kind}/{name}")]
    UnknownFormula {
        /// Requested formula kind.
        kind: FormulaKind,
        /// Requested formula name.
        name: String,
    },

    /// Caller error. Surfaced immediately, never retried, never cached.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Time bounds could not be resolved to blocks.
    #[error(transparent)]
    BlockTime(#[from] BlockTimeError),

    /// The cache or event store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The formula body failed. Not cached.
    #[error("Formula execution failed: {0}")]
    Formula(String),
}

impl From<FormulaError> for ComputeError {
    fn from(err: FormulaError) -> Self {
        match err {
            FormulaError::Validation(e) => ComputeError::Validation(e),
            FormulaError::Store(e) => ComputeError::Store(e),
            FormulaError::Internal(msg) => ComputeError::Formula(msg),
        }
    }
}

impl ComputeError {
    /// True for caller errors (taxonomy class 1): bad request, not system
    /// failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ComputeError::UnknownFormula { .. } | ComputeError::Validation(_)
        )
    }
}
