//! Export error types

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::events::EventError;

/// Errors that can occur while exporting annotated data
#[derive(Error, Debug)]
pub enum ExportError {
    /// Export was requested before any files were loaded
    #[error("catalog is empty; nothing to export")]
    EmptyCatalog,

    /// Catalog lookup or file decoding failed
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Reading the event list failed
    #[error("event store error: {0}")]
    Event(#[from] EventError),

    /// Output I/O failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Structural CSV read or write failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias for export operations
pub type ExportResult<T> = Result<T, ExportError>;
