//! Chart sampler error types

use thiserror::Error;

use crate::catalog::CatalogError;

/// Errors that can occur while sampling a file for charting
#[derive(Error, Debug)]
pub enum ChartError {
    /// Encoding detection or file lookup failed
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// I/O failed mid-stream
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Structural CSV read failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias for chart operations
pub type ChartResult<T> = Result<T, ChartError>;
