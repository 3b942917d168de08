//! Streaming chart sampler
//!
//! Produces a small, ordered, representative series from a file with
//! potentially millions of rows, without ever materializing the file. Two
//! knobs bound the work: `sample_points` caps the output size and
//! `chunk_size` caps how many rows sit in memory at once.
//!
//! The sample budget is spent front-to-back: each chunk contributes an
//! evenly spaced slice of its rows until the budget fills, after which
//! later chunks are still read (the total row count must stay accurate)
//! but emit nothing. Renderers rely on this exact ordering, so it must not
//! be swapped for a globally uniform sampler.

use std::path::Path;

use csv::StringRecord;
use rayon::prelude::*;

use crate::catalog::{self, FileCatalog, FileEncoding};
use crate::chart::columns::{self, MAX_SERIES};
use crate::chart::error::ChartResult;

/// Tuning for the sampler
#[derive(Debug, Clone, Copy)]
pub struct SamplerConfig {
    /// Maximum rows emitted into one sample
    pub sample_points: usize,
    /// Rows read per streaming pass
    pub chunk_size: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            sample_points: 5000,
            chunk_size: 20000,
        }
    }
}

/// One sampled row: its absolute 1-indexed position and the selected
/// column values (`NaN` where a value was missing or non-numeric)
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SamplePoint {
    pub row_number: u64,
    pub values: Vec<f64>,
}

/// Result of sampling one file
#[derive(Debug, Clone, serde::Serialize)]
pub struct ChartSample {
    /// Authoritative data-row count for the whole file
    pub total_rows: u64,
    /// Columns the values are drawn from; empty for a no-data result
    pub columns_used: Vec<String>,
    /// Encoding the file was read with
    pub encoding: FileEncoding,
    /// Sampled rows, strictly increasing by `row_number`
    pub points: Vec<SamplePoint>,
}

impl ChartSample {
    /// True when the file yielded nothing plottable
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Bounded-memory sampler over catalog files
#[derive(Debug, Clone, Copy, Default)]
pub struct ChartSampler {
    config: SamplerConfig,
}

impl ChartSampler {
    pub fn new(config: SamplerConfig) -> Self {
        Self { config }
    }

    /// Sample one file
    pub fn sample(&self, path: &Path) -> ChartResult<ChartSample> {
        let encoding = catalog::detect(path)?;
        let mut selected = columns::select_columns(path, encoding)?;
        if selected.is_empty() {
            selected = self.first_chunk_fallback(path, encoding)?;
        }
        self.sample_streaming(path, encoding, &selected)
    }

    /// Sample every catalog file on a worker pool
    ///
    /// Per-file failures are logged and returned alongside the successes so
    /// one unreadable file does not sink the batch.
    pub fn sample_catalog(&self, catalog: &FileCatalog) -> Vec<(String, ChartResult<ChartSample>)> {
        catalog
            .files()
            .par_iter()
            .map(|file| {
                let result = self.sample(&file.path);
                if let Err(err) = &result {
                    tracing::warn!(file = %file.name, error = %err, "chart sampling failed");
                }
                (file.name.clone(), result)
            })
            .collect()
    }

    /// Last-resort column selection: the first chunk's numeric columns, or
    /// failing that its first three raw columns regardless of type
    fn first_chunk_fallback(
        &self,
        path: &Path,
        encoding: FileEncoding,
    ) -> ChartResult<Vec<String>> {
        let reader = catalog::decoding_reader(path, encoding)?;
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();

        let mut chunk = Vec::new();
        for result in csv_reader.records().take(self.config.chunk_size) {
            chunk.push(result?);
        }

        let numeric = columns::numeric_columns(&headers, &chunk);
        if !numeric.is_empty() {
            return Ok(numeric.into_iter().take(MAX_SERIES).collect());
        }
        Ok(headers.iter().take(MAX_SERIES).map(String::from).collect())
    }

    fn sample_streaming(
        &self,
        path: &Path,
        encoding: FileEncoding,
        selected: &[String],
    ) -> ChartResult<ChartSample> {
        let reader = catalog::decoding_reader(path, encoding)?;
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let col_indices: Vec<Option<usize>> = selected
            .iter()
            .map(|name| headers.iter().position(|h| h == name))
            .collect();

        let mut points: Vec<SamplePoint> = Vec::new();
        let mut total_rows: u64 = 0;
        let mut offset: u64 = 0;
        let mut sampled: usize = 0;

        let mut records = csv_reader.into_records();
        let mut chunk: Vec<StringRecord> = Vec::with_capacity(self.config.chunk_size);

        loop {
            chunk.clear();
            while chunk.len() < self.config.chunk_size {
                match records.next() {
                    Some(record) => chunk.push(record?),
                    None => break,
                }
            }
            if chunk.is_empty() {
                break;
            }
            let chunk_len = chunk.len();
            total_rows += chunk_len as u64;

            // Column types are judged per chunk; a column that goes
            // non-numeric mid-file drops to NaN for that stretch only
            let numeric: Vec<bool> = col_indices
                .iter()
                .map(|ci| ci.map_or(false, |idx| column_is_numeric(&chunk, idx)))
                .collect();

            if numeric.iter().any(|&n| n) && sampled < self.config.sample_points {
                let remaining = self.config.sample_points - sampled;
                let take = chunk_len.min(remaining);
                for local in spread_indices(chunk_len, take) {
                    let row = &chunk[local];
                    let values = col_indices
                        .iter()
                        .zip(&numeric)
                        .map(|(ci, &is_num)| {
                            if !is_num {
                                return f64::NAN;
                            }
                            ci.and_then(|idx| row.get(idx))
                                .map(str::trim)
                                .filter(|v| !v.is_empty())
                                .and_then(|v| v.parse().ok())
                                .unwrap_or(f64::NAN)
                        })
                        .collect();
                    points.push(SamplePoint {
                        row_number: offset + local as u64 + 1,
                        values,
                    });
                }
                sampled += take;
            }

            offset += chunk_len as u64;
        }

        let columns_used = if points.is_empty() {
            Vec::new()
        } else {
            selected.to_vec()
        };

        tracing::debug!(
            file = %path.display(),
            total_rows,
            sampled = points.len(),
            "chart sample built"
        );

        Ok(ChartSample {
            total_rows,
            columns_used,
            encoding,
            points,
        })
    }
}

fn column_is_numeric(chunk: &[StringRecord], idx: usize) -> bool {
    let mut saw_value = false;
    for row in chunk {
        if let Some(value) = row.get(idx) {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            if value.parse::<f64>().is_err() {
                return false;
            }
            saw_value = true;
        }
    }
    saw_value
}

/// `take` indices evenly spaced over `0..len`, first and last included
/// when `take >= 2`
fn spread_indices(len: usize, take: usize) -> Vec<usize> {
    if len == 0 || take == 0 {
        return Vec::new();
    }
    if take == 1 {
        return vec![0];
    }
    let last = (len - 1) as f64;
    (0..take)
        .map(|k| (last * k as f64 / (take - 1) as f64) as usize)
        .collect()
}
