//! Annotation service
//!
//! Wires the catalog, event store, export engine, and chart sampler into
//! the one object a hosting shell talks to. The methods here are the whole
//! outward contract; HTTP routing, templating, and image rendering live
//! with the host.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::catalog::FileCatalog;
use crate::chart::{ChartSample, ChartSampler, SamplerConfig};
use crate::config::Config;
use crate::events::{EventAnnotation, EventKind, EventStore};
use crate::export::ExportEngine;
use crate::service::dto::FileSummary;
use crate::service::error::ServiceResult;

/// Facade over the annotation core
pub struct AnnotationService {
    config: Config,
    catalog: Arc<FileCatalog>,
    store: Arc<EventStore>,
    exporter: ExportEngine,
    sampler: ChartSampler,
}

impl AnnotationService {
    /// Build the service: create working directories, scan the catalog,
    /// and load the persisted event snapshot
    pub fn new(config: Config) -> ServiceResult<Self> {
        fs::create_dir_all(&config.chart.chart_dir)?;
        if let Some(sub) = &config.chart.chart_subdir {
            fs::create_dir_all(config.chart.chart_dir.join(sub))?;
        }
        if let Some(parent) = config.events.snapshot_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let catalog = Arc::new(FileCatalog::load(&config.catalog, &config.chart)?);
        let store = Arc::new(EventStore::open(
            config.events.snapshot_path.clone(),
            catalog.clone(),
        )?);
        let exporter = ExportEngine::new(catalog.clone(), store.clone());
        let sampler = ChartSampler::new(SamplerConfig {
            sample_points: config.chart.sample_points,
            chunk_size: config.chart.chunk_size,
        });

        Ok(Self {
            config,
            catalog,
            store,
            exporter,
            sampler,
        })
    }

    /// All catalog files in chronological order
    pub fn list_files(&self) -> Vec<FileSummary> {
        self.catalog.files().iter().map(FileSummary::from).collect()
    }

    /// All events in insertion order
    pub fn list_events(&self) -> ServiceResult<Vec<EventAnnotation>> {
        Ok(self.store.list()?)
    }

    /// Add an event; the kind arrives as text from the operator
    pub fn add_event(
        &self,
        kind: &str,
        start_file: &str,
        start_row: u64,
        end_file: &str,
        end_row: u64,
    ) -> ServiceResult<EventAnnotation> {
        let kind: EventKind = kind.parse()?;
        Ok(self
            .store
            .add(kind, start_file, start_row, end_file, end_row)?)
    }

    /// Delete an event by id
    pub fn delete_event(&self, id: &str) -> ServiceResult<()> {
        Ok(self.store.remove(id)?)
    }

    /// Change an event's kind
    pub fn update_event_kind(&self, id: &str, kind: &str) -> ServiceResult<EventAnnotation> {
        let kind: EventKind = kind.parse()?;
        Ok(self.store.update_kind(id, kind)?)
    }

    /// Export annotated and filtered copies of every touched file
    ///
    /// Defaults to the configured output directory.
    pub fn export(&self, output_dir: Option<&Path>) -> ServiceResult<Vec<PathBuf>> {
        let dir = output_dir.unwrap_or(&self.config.export.output_dir);
        Ok(self.exporter.export(dir)?)
    }

    /// Sample one catalog file for charting
    ///
    /// The configured budget and chunk size apply unless overridden per call.
    pub fn sample_chart(
        &self,
        file_name: &str,
        sample_points: Option<usize>,
        chunk_size: Option<usize>,
    ) -> ServiceResult<ChartSample> {
        let file = self.catalog.resolve(file_name)?;
        let sampler = ChartSampler::new(SamplerConfig {
            sample_points: sample_points.unwrap_or(self.config.chart.sample_points),
            chunk_size: chunk_size.unwrap_or(self.config.chart.chunk_size),
        });
        Ok(sampler.sample(&file.path)?)
    }

    /// Sample every catalog file on a worker pool
    pub fn sample_all(&self) -> Vec<(String, ServiceResult<ChartSample>)> {
        self.sampler
            .sample_catalog(&self.catalog)
            .into_iter()
            .map(|(name, result)| (name, result.map_err(Into::into)))
            .collect()
    }

    pub fn catalog(&self) -> &FileCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
