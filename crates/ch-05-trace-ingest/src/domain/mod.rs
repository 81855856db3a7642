//! Domain layer: annotated traces, worker lifecycle states, and errors.

mod entities;
mod errors;

pub use entities::{AnnotatedTrace, WorkerState};
pub use errors::{HandlerError, IngestError};
