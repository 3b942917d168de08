//! Annotated data export
//!
//! Turns sparse cross-file events into per-row flags and writes annotated
//! copies plus flag-filtered subsets, one set per touched file.

mod engine;
mod error;

pub use engine::ExportEngine;
pub use error::{ExportError, ExportResult};
