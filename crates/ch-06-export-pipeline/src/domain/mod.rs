//! Domain layer: export pipeline errors.

mod errors;

pub use errors::ExportError;
