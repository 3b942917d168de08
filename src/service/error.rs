//! Service error types
//!
//! One wrapper over the component taxonomies, so a hosting shell (CLI,
//! HTTP layer) matches on a single type when mapping to exit codes or
//! status codes.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::chart::ChartError;
use crate::events::EventError;
use crate::export::ExportError;

/// Errors surfaced by the annotation service facade
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Catalog scan or lookup error
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Event validation, lookup, or persistence error
    #[error("event error: {0}")]
    Event(#[from] EventError),

    /// Export error
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// Chart sampling error
    #[error("chart error: {0}")]
    Chart(#[from] ChartError),

    /// Startup directory creation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServiceError {
    /// Whether the error reflects bad input rather than a broken system
    ///
    /// Hosting shells map recoverable errors to 4xx-style responses and
    /// everything else to failures.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ServiceError::Catalog(CatalogError::NotFound(_))
                | ServiceError::Event(EventError::Validation(_))
                | ServiceError::Event(EventError::NotFound(_))
        )
    }
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
