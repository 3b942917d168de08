//! Outward-facing data shapes
//!
//! What a hosting shell shows an operator, as opposed to the internal
//! catalog records.

use serde::Serialize;

use crate::catalog::DataFile;

/// One catalog file as listed to the operator
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FileSummary {
    pub name: String,
    pub row_count: u64,
    /// Relative path of the pre-rendered chart for this file
    pub chart_reference: String,
}

impl From<&DataFile> for FileSummary {
    fn from(file: &DataFile) -> Self {
        Self {
            name: file.name.clone(),
            row_count: file.row_count,
            chart_reference: file.chart_reference.clone(),
        }
    }
}
