//! Core types for the file catalog
//!
//! - `DataFile`: metadata for one log file in chronological order
//! - `FileEncoding`: the text encodings sensor loggers produce

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Text encodings encountered in the field
///
/// Legacy rig loggers write GBK; newer exports are UTF-8, sometimes with a
/// BOM. `Latin1` is the read-side fallback that accepts any byte sequence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FileEncoding {
    #[serde(rename = "gbk")]
    Gbk,
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "utf-8-sig")]
    Utf8Sig,
    #[serde(rename = "latin-1")]
    Latin1,
}

impl FileEncoding {
    /// Canonical label, as stored in metadata and logs
    pub fn label(&self) -> &'static str {
        match self {
            FileEncoding::Gbk => "gbk",
            FileEncoding::Utf8 => "utf-8",
            FileEncoding::Utf8Sig => "utf-8-sig",
            FileEncoding::Latin1 => "latin-1",
        }
    }
}

impl std::fmt::Display for FileEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Metadata for one data file in the catalog
///
/// Immutable after the catalog scan; a reload rebuilds the whole set.
#[derive(Debug, Clone, PartialEq)]
pub struct DataFile {
    /// File name, e.g. `Rec1901010000.csv`
    pub name: String,
    /// Absolute or scan-relative path on disk
    pub path: PathBuf,
    /// Zero-based position in chronological (filename-sort) order
    pub ordinal: usize,
    /// Number of data rows, header excluded
    pub row_count: u64,
    /// Detected text encoding
    pub encoding: FileEncoding,
    /// Recording start time parsed from the file name, when it conforms
    pub recorded_at: Option<NaiveDateTime>,
    /// Relative path of the pre-rendered chart for this file
    pub chart_reference: String,
    /// Absolute chart path, present only if the chart exists on disk
    pub chart_path: Option<PathBuf>,
}

impl DataFile {
    /// File name without the `.csv` suffix
    pub fn stem(&self) -> &str {
        self.name.strip_suffix(".csv").unwrap_or(&self.name)
    }
}

/// Parse the recording timestamp embedded in a conforming file name
///
/// Logger files are named `Rec<yyMMddHHmm>.csv`; anything else yields None.
pub fn parse_recorded_at(name: &str) -> Option<NaiveDateTime> {
    let stem = name.strip_suffix(".csv")?;
    let digits = stem.strip_prefix("Rec")?;
    if digits.len() != 10 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDateTime::parse_from_str(digits, "%y%m%d%H%M").ok()
}
