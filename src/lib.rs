//! # Wellmark
//!
//! Drilling-log annotation service: an ordered catalog of large sensor CSV
//! files, validated cross-file event marking, annotated exports, and
//! bounded-memory chart sampling.
//!
//! ## Features
//!
//! - **Ordered catalog**: filename-sorted chronological index with per-file
//!   row counts and text-encoding detection (GBK field loggers included)
//! - **Event annotations**: overflow / lost regions spanning file
//!   boundaries, validated against the catalog and persisted atomically
//! - **Annotated export**: per-row flag merge plus flag-filtered subsets,
//!   one set per touched file
//! - **Chart sampling**: streaming, budget-limited series extraction from
//!   files too large to load
//!
//! ## Modules
//!
//! - [`catalog`]: the ordered file index
//! - [`events`]: the validated, persisted event store
//! - [`export`]: the annotated-data export engine
//! - [`chart`]: the streaming chart sampler
//! - [`service`]: the facade a hosting shell talks to
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wellmark::{AnnotationService, Config};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = AnnotationService::new(Config::load_default())?;
//!
//!     for file in service.list_files() {
//!         println!("{} ({} rows)", file.name, file.row_count);
//!     }
//!
//!     let event = service.add_event(
//!         "overflow",
//!         "Rec1901010000.csv",
//!         120,
//!         "Rec1901010100.csv",
//!         80,
//!     )?;
//!     println!("marked {}", event.id);
//!
//!     let written = service.export(None)?;
//!     println!("exported {} files", written.len());
//!
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod chart;
pub mod config;
pub mod events;
pub mod export;
pub mod service;

// Re-export top-level types for convenience
pub use catalog::{CatalogError, DataFile, FileCatalog, FileEncoding};

pub use events::{EventAnnotation, EventError, EventKind, EventStore};

pub use export::{ExportEngine, ExportError};

pub use chart::{ChartError, ChartSample, ChartSampler, SamplePoint, SamplerConfig};

pub use service::{AnnotationService, FileSummary, ServiceError, ServiceResult};

pub use config::{Config, ConfigError};
