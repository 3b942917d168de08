//! The ordered file catalog
//!
//! Scans the data directory, orders files by name (the names embed the
//! recording time, so filename order is chronological order), and captures
//! per-file metadata: row count, text encoding, and the chart reference an
//! external renderer fills in.

use std::collections::HashMap;
use std::path::Path;

use regex::Regex;

use crate::catalog::encoding;
use crate::catalog::error::{CatalogError, CatalogResult};
use crate::catalog::types::{parse_recorded_at, DataFile};
use crate::config::{CatalogConfig, ChartConfig};

/// Ordered index of the data files under the configured directory
///
/// Built once at startup; reloading means constructing a fresh catalog.
#[derive(Debug, Default)]
pub struct FileCatalog {
    files: Vec<DataFile>,
    by_name: HashMap<String, usize>,
}

impl FileCatalog {
    /// Scan the data directory and build the ordered index
    ///
    /// File names matching the configured pattern are sorted ascending and
    /// assigned ordinals 0..n-1. Each file gets its encoding probed and its
    /// data rows counted in one streaming pass. A missing data directory
    /// yields an empty catalog rather than an error.
    pub fn load(config: &CatalogConfig, chart: &ChartConfig) -> CatalogResult<Self> {
        let pattern = Regex::new(&config.file_pattern).map_err(|e| CatalogError::Pattern {
            pattern: config.file_pattern.clone(),
            error: e.to_string(),
        })?;

        if !config.data_dir.is_dir() {
            tracing::warn!(dir = %config.data_dir.display(), "data directory missing, catalog is empty");
            return Ok(Self::default());
        }

        let mut names: Vec<String> = Vec::new();
        for entry in std::fs::read_dir(&config.data_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if pattern.is_match(&name) {
                names.push(name);
            }
        }
        names.sort();

        let mut files = Vec::with_capacity(names.len());
        let mut by_name = HashMap::with_capacity(names.len());

        for (ordinal, name) in names.into_iter().enumerate() {
            let path = config.data_dir.join(&name);
            let file_encoding = encoding::detect(&path)?;
            let row_count = encoding::count_data_rows(&path)?;
            let recorded_at = parse_recorded_at(&name);

            let stem = name.strip_suffix(".csv").unwrap_or(&name);
            let chart_reference = match &chart.chart_subdir {
                Some(sub) => format!("{}/{}.png", sub, stem),
                None => format!("{}.png", stem),
            };
            let chart_absolute = chart.chart_dir.join(&chart_reference);
            let chart_path = chart_absolute.is_file().then_some(chart_absolute);

            tracing::debug!(
                file = %name,
                ordinal,
                rows = row_count,
                encoding = %file_encoding,
                "catalog scanned file"
            );

            by_name.insert(name.clone(), ordinal);
            files.push(DataFile {
                name,
                path,
                ordinal,
                row_count,
                encoding: file_encoding,
                recorded_at,
                chart_reference,
                chart_path,
            });
        }

        let catalog = Self { files, by_name };
        catalog.warn_on_misordered_timestamps();
        tracing::info!(files = catalog.len(), "catalog loaded");
        Ok(catalog)
    }

    /// Look up a file by name
    pub fn get(&self, name: &str) -> Option<&DataFile> {
        self.by_name.get(name).map(|&idx| &self.files[idx])
    }

    /// Look up a file by name, failing if it is not in the catalog
    pub fn resolve(&self, name: &str) -> CatalogResult<&DataFile> {
        self.get(name)
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))
    }

    /// All files in chronological order
    pub fn files(&self) -> &[DataFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Catalog order is filename order; the names are supposed to embed
    /// fixed-width timestamps, so the parsed times must ascend too. A
    /// mismatch means a misnamed file that would silently export in the
    /// wrong position.
    fn warn_on_misordered_timestamps(&self) {
        for pair in self.files.windows(2) {
            if let (Some(earlier), Some(later)) = (pair[0].recorded_at, pair[1].recorded_at) {
                if later < earlier {
                    tracing::warn!(
                        first = %pair[0].name,
                        second = %pair[1].name,
                        "filename order disagrees with embedded timestamps"
                    );
                }
            }
        }
    }
}

/// Convenience for tests and tools that scan an ad-hoc directory
pub fn scan_directory(data_dir: &Path) -> CatalogResult<FileCatalog> {
    let config = CatalogConfig {
        data_dir: data_dir.to_path_buf(),
        ..CatalogConfig::default()
    };
    FileCatalog::load(&config, &ChartConfig::default())
}
