//! Export engine
//!
//! Expands the sparse event list into per-file row ranges, merges them into
//! per-row `overflow` / `lost` flags, and writes the annotated copies and
//! flag-filtered subsets.
//!
//! Everything is re-derived from the catalog and event store at call time;
//! there is no cache, and repeated exports overwrite prior outputs.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use csv::StringRecord;

use crate::catalog::{self, DataFile, FileCatalog};
use crate::events::{EventAnnotation, EventKind, EventStore, FileRowRange};
use crate::export::error::{ExportError, ExportResult};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Writes annotated and filtered copies of every file touched by events
pub struct ExportEngine {
    catalog: Arc<FileCatalog>,
    store: Arc<EventStore>,
}

impl ExportEngine {
    pub fn new(catalog: Arc<FileCatalog>, store: Arc<EventStore>) -> Self {
        Self { catalog, store }
    }

    /// Export all annotated files into `output_dir`, returning written paths
    ///
    /// The event list is snapshotted under the store lock up front; the file
    /// I/O below runs without holding it, so annotation edits racing an
    /// export only affect later exports.
    pub fn export(&self, output_dir: &Path) -> ExportResult<Vec<PathBuf>> {
        if self.catalog.is_empty() {
            return Err(ExportError::EmptyCatalog);
        }
        let events = self.store.list()?;
        let ranges_by_file = self.expand_events(&events);

        let overflow_dir = output_dir.join(EventKind::Overflow.as_str());
        let lost_dir = output_dir.join(EventKind::Lost.as_str());
        fs::create_dir_all(output_dir)?;
        fs::create_dir_all(&overflow_dir)?;
        fs::create_dir_all(&lost_dir)?;

        let mut written = Vec::new();
        for info in self.catalog.files() {
            let Some(ranges) = ranges_by_file.get(&info.name) else {
                continue;
            };
            written.extend(self.export_file(info, ranges, output_dir, &overflow_dir, &lost_dir)?);
        }

        tracing::info!(files = written.len(), dir = %output_dir.display(), "export finished");
        Ok(written)
    }

    /// Expand events into per-file row ranges
    ///
    /// A file strictly between an event's endpoints gets its full row span;
    /// the endpoint files get the event's own rows on their respective side.
    fn expand_events(&self, events: &[EventAnnotation]) -> HashMap<String, Vec<FileRowRange>> {
        let files = self.catalog.files();
        let mut by_file: HashMap<String, Vec<FileRowRange>> = HashMap::new();

        for event in events {
            let (Some(start), Some(end)) = (
                self.catalog.get(&event.start_file),
                self.catalog.get(&event.end_file),
            ) else {
                // Stale snapshot entries for files no longer on disk
                tracing::warn!(event = %event.id, "skipping event whose files left the catalog");
                continue;
            };
            if start.ordinal > end.ordinal {
                // Only reachable through a hand-edited snapshot
                tracing::warn!(event = %event.id, "skipping event with inverted file span");
                continue;
            }

            for info in &files[start.ordinal..=end.ordinal] {
                let start_row = if info.ordinal == start.ordinal {
                    event.start_row
                } else {
                    1
                };
                let end_row = if info.ordinal == end.ordinal {
                    event.end_row
                } else {
                    info.row_count
                };

                by_file.entry(info.name.clone()).or_default().push(FileRowRange {
                    kind: event.kind,
                    start_row,
                    end_row,
                });
            }
        }

        by_file
    }

    fn export_file(
        &self,
        info: &DataFile,
        ranges: &[FileRowRange],
        output_dir: &Path,
        overflow_dir: &Path,
        lost_dir: &Path,
    ) -> ExportResult<Vec<PathBuf>> {
        let (text, _) = catalog::read_to_string(&info.path)?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());
        let headers = reader.headers()?.clone();
        let records: Vec<StringRecord> = reader.records().collect::<Result<_, _>>()?;
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let rows = records.len() as u64;

        let mut overflow = vec![false; records.len()];
        let mut lost = vec![false; records.len()];
        let mut touched = false;

        for range in ranges {
            let start_row = range.start_row.max(1);
            let end_row = range.end_row.min(rows);
            if start_row > end_row {
                continue;
            }
            touched = true;
            let flags = match range.kind {
                EventKind::Overflow => &mut overflow,
                EventKind::Lost => &mut lost,
            };
            for flag in &mut flags[(start_row - 1) as usize..end_row as usize] {
                *flag = true;
            }
        }

        // Every range fell outside the data after clipping
        if !touched {
            return Ok(Vec::new());
        }

        let mut written = Vec::new();

        let annotated = output_dir.join(format!("{}_annotated.csv", info.stem()));
        write_flagged(&annotated, &headers, &records, &overflow, &lost, None)?;
        written.push(annotated);

        if overflow.iter().any(|&f| f) {
            let path = overflow_dir.join(format!("{}_overflow.csv", info.stem()));
            write_flagged(&path, &headers, &records, &overflow, &lost, Some(&overflow))?;
            written.push(path);
        }
        if lost.iter().any(|&f| f) {
            let path = lost_dir.join(format!("{}_lost.csv", info.stem()));
            write_flagged(&path, &headers, &records, &overflow, &lost, Some(&lost))?;
            written.push(path);
        }

        Ok(written)
    }
}

/// Write a copy of the file with `overflow` / `lost` columns appended
///
/// Rows are filtered by `mask` when given. Output is UTF-8 with a BOM so
/// spreadsheet tools reopen the Chinese channel headers correctly.
fn write_flagged(
    path: &Path,
    headers: &StringRecord,
    records: &[StringRecord],
    overflow: &[bool],
    lost: &[bool],
    mask: Option<&[bool]>,
) -> ExportResult<()> {
    let mut file = BufWriter::new(File::create(path)?);
    file.write_all(UTF8_BOM)?;

    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(file);

    let mut header_row = headers.clone();
    header_row.push_field(EventKind::Overflow.as_str());
    header_row.push_field(EventKind::Lost.as_str());
    writer.write_record(&header_row)?;

    for (idx, record) in records.iter().enumerate() {
        if let Some(mask) = mask {
            if !mask[idx] {
                continue;
            }
        }
        let mut row = record.clone();
        row.push_field(if overflow[idx] { "1" } else { "0" });
        row.push_field(if lost[idx] { "1" } else { "0" });
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::scan_directory;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    struct Fixture {
        _dir: TempDir,
        catalog: Arc<FileCatalog>,
        store: Arc<EventStore>,
        output: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = tempdir().unwrap();
        let csv_dir = dir.path().join("csv");
        fs::create_dir_all(&csv_dir).unwrap();
        fs::write(
            csv_dir.join("Rec1901010000.csv"),
            "depth,pressure\n100,10\n110,11\n120,12\n",
        )
        .unwrap();
        fs::write(
            csv_dir.join("Rec1901010100.csv"),
            "depth,pressure\n130,13\n140,14\n150,15\n",
        )
        .unwrap();

        let catalog = Arc::new(scan_directory(&csv_dir).unwrap());
        let store = Arc::new(
            EventStore::open(dir.path().join("marked/events.json"), catalog.clone()).unwrap(),
        );
        let output = dir.path().join("exported");
        Fixture {
            _dir: dir,
            catalog,
            store,
            output,
        }
    }

    fn read_column(path: &Path, column: &str) -> Vec<String> {
        // Outputs are utf-8-sig; strip the BOM before parsing
        let bytes = fs::read(path).unwrap();
        let text = crate::catalog::FileEncoding::Utf8Sig
            .decode_strict(&bytes)
            .unwrap()
            .into_owned();
        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let idx = reader
            .headers()
            .unwrap()
            .iter()
            .position(|h| h == column)
            .unwrap();
        reader
            .records()
            .map(|r| r.unwrap()[idx].to_string())
            .collect()
    }

    #[test]
    fn test_cross_file_overflow_export() {
        let f = fixture();
        f.store
            .add(EventKind::Overflow, "Rec1901010000.csv", 2, "Rec1901010100.csv", 2)
            .unwrap();

        let engine = ExportEngine::new(f.catalog.clone(), f.store.clone());
        let written = engine.export(&f.output).unwrap();

        let expected: Vec<PathBuf> = vec![
            f.output.join("Rec1901010000_annotated.csv"),
            f.output.join("overflow/Rec1901010000_overflow.csv"),
            f.output.join("Rec1901010100_annotated.csv"),
            f.output.join("overflow/Rec1901010100_overflow.csv"),
        ];
        assert_eq!(written, expected);

        assert_eq!(
            read_column(&f.output.join("Rec1901010000_annotated.csv"), "overflow"),
            ["0", "1", "1"]
        );
        assert_eq!(
            read_column(&f.output.join("Rec1901010100_annotated.csv"), "overflow"),
            ["1", "1", "0"]
        );

        // Filtered subsets contain exactly the flagged rows
        assert_eq!(
            read_column(
                &f.output.join("overflow/Rec1901010000_overflow.csv"),
                "overflow"
            ),
            ["1", "1"]
        );
        assert_eq!(
            read_column(
                &f.output.join("overflow/Rec1901010100_overflow.csv"),
                "depth"
            ),
            ["130", "140"]
        );
    }

    #[test]
    fn test_untouched_file_gets_no_output() {
        let f = fixture();
        f.store
            .add(EventKind::Lost, "Rec1901010000.csv", 1, "Rec1901010000.csv", 2)
            .unwrap();

        let engine = ExportEngine::new(f.catalog.clone(), f.store.clone());
        let written = engine.export(&f.output).unwrap();

        assert_eq!(
            written,
            vec![
                f.output.join("Rec1901010000_annotated.csv"),
                f.output.join("lost/Rec1901010000_lost.csv"),
            ]
        );
        assert!(!f.output.join("Rec1901010100_annotated.csv").exists());
    }

    #[test]
    fn test_overlapping_events_or_combine() {
        let f = fixture();
        f.store
            .add(EventKind::Overflow, "Rec1901010000.csv", 1, "Rec1901010000.csv", 2)
            .unwrap();
        f.store
            .add(EventKind::Overflow, "Rec1901010000.csv", 2, "Rec1901010000.csv", 3)
            .unwrap();
        f.store
            .add(EventKind::Lost, "Rec1901010000.csv", 2, "Rec1901010000.csv", 2)
            .unwrap();

        let engine = ExportEngine::new(f.catalog.clone(), f.store.clone());
        engine.export(&f.output).unwrap();

        let annotated = f.output.join("Rec1901010000_annotated.csv");
        assert_eq!(read_column(&annotated, "overflow"), ["1", "1", "1"]);
        assert_eq!(read_column(&annotated, "lost"), ["0", "1", "0"]);
    }

    #[test]
    fn test_empty_catalog_export_fails() {
        let dir = tempdir().unwrap();
        let csv_dir = dir.path().join("csv");
        fs::create_dir_all(&csv_dir).unwrap();

        let catalog = Arc::new(scan_directory(&csv_dir).unwrap());
        let store = Arc::new(
            EventStore::open(dir.path().join("events.json"), catalog.clone()).unwrap(),
        );
        let engine = ExportEngine::new(catalog, store);

        let err = engine.export(&dir.path().join("out")).unwrap_err();
        assert!(matches!(err, ExportError::EmptyCatalog));
    }

    #[test]
    fn test_no_events_writes_nothing() {
        let f = fixture();
        let engine = ExportEngine::new(f.catalog.clone(), f.store.clone());
        let written = engine.export(&f.output).unwrap();
        assert!(written.is_empty());
    }

    #[test]
    fn test_annotated_output_starts_with_bom() {
        let f = fixture();
        f.store
            .add(EventKind::Overflow, "Rec1901010000.csv", 1, "Rec1901010000.csv", 1)
            .unwrap();

        let engine = ExportEngine::new(f.catalog.clone(), f.store.clone());
        engine.export(&f.output).unwrap();

        let bytes = fs::read(f.output.join("Rec1901010000_annotated.csv")).unwrap();
        assert_eq!(&bytes[..3], UTF8_BOM);
    }

    #[test]
    fn test_interior_file_gets_full_span() {
        let dir = tempdir().unwrap();
        let csv_dir = dir.path().join("csv");
        fs::create_dir_all(&csv_dir).unwrap();
        for (name, rows) in [
            ("Rec1901010000.csv", 2),
            ("Rec1901010100.csv", 3),
            ("Rec1901010200.csv", 2),
        ] {
            let mut body = String::from("v\n");
            for i in 0..rows {
                body.push_str(&format!("{}\n", i));
            }
            fs::write(csv_dir.join(name), body).unwrap();
        }

        let catalog = Arc::new(scan_directory(&csv_dir).unwrap());
        let store = Arc::new(
            EventStore::open(dir.path().join("events.json"), catalog.clone()).unwrap(),
        );
        store
            .add(EventKind::Lost, "Rec1901010000.csv", 2, "Rec1901010200.csv", 1)
            .unwrap();

        let engine = ExportEngine::new(catalog, store);
        let output = dir.path().join("out");
        engine.export(&output).unwrap();

        // Middle file is flagged end to end
        assert_eq!(
            read_column(&output.join("Rec1901010100_annotated.csv"), "lost"),
            ["1", "1", "1"]
        );
        assert_eq!(
            read_column(&output.join("Rec1901010000_annotated.csv"), "lost"),
            ["0", "1"]
        );
        assert_eq!(
            read_column(&output.join("Rec1901010200_annotated.csv"), "lost"),
            ["1", "0"]
        );
    }
}
