//! Catalog error types
//!
//! Defines all errors that can occur while scanning and resolving data files.

use thiserror::Error;

/// Errors that can occur in the file catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No candidate encoding could read the file
    #[error("no candidate encoding can read {file}: {detail}")]
    Encoding { file: String, detail: String },

    /// Requested file is not part of the catalog
    #[error("file not found in catalog: {0}")]
    NotFound(String),

    /// The configured file-name pattern does not compile
    #[error("invalid file pattern {pattern:?}: {error}")]
    Pattern { pattern: String, error: String },
}

/// Result type alias for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CatalogError::NotFound("Rec1901010000.csv".to_string());
        assert_eq!(
            err.to_string(),
            "file not found in catalog: Rec1901010000.csv"
        );

        let err = CatalogError::Encoding {
            file: "Rec1901010000.csv".to_string(),
            detail: "invalid byte sequence".to_string(),
        };
        assert!(err.to_string().contains("Rec1901010000.csv"));
    }
}
