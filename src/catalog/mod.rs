//! File catalog
//!
//! The ordered index of sensor log files: chronological ordering derived
//! from file names, per-file row counts, and text encoding detection.

mod encoding;
mod error;
mod index;
mod types;

pub use encoding::{
    count_data_rows, decoding_reader, detect, read_to_string, DETECTION_ORDER, READ_ORDER,
};
pub use error::{CatalogError, CatalogResult};
pub use index::{scan_directory, FileCatalog};
pub use types::{parse_recorded_at, DataFile, FileEncoding};
