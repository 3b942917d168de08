//! Event store
//!
//! Holds the ordered list of event annotations, validates mutations against
//! the file catalog, and persists the full list as a JSON-array snapshot on
//! every change.
//!
//! All operations serialize behind one coarse mutex: validation, mutation,
//! and the snapshot rewrite happen inside the critical section, so every
//! mutation is a consistent read-modify-write and two concurrent callers
//! can never interleave partial snapshot writes.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

use crate::catalog::FileCatalog;
use crate::events::error::{EventError, EventResult};
use crate::events::types::{EventAnnotation, EventKind};

/// Validated, persisted store of event annotations
#[derive(Debug)]
pub struct EventStore {
    catalog: Arc<FileCatalog>,
    snapshot_path: PathBuf,
    events: Mutex<Vec<EventAnnotation>>,
}

impl EventStore {
    /// Open the store, loading the persisted snapshot if one exists
    ///
    /// An absent snapshot file means an empty list. A snapshot that exists
    /// but does not parse is fatal: refusing to start beats silently
    /// discarding an operator's annotations.
    pub fn open(snapshot_path: impl Into<PathBuf>, catalog: Arc<FileCatalog>) -> EventResult<Self> {
        let snapshot_path = snapshot_path.into();
        let events = Self::load_snapshot(&snapshot_path)?;

        for event in &events {
            for file in [&event.start_file, &event.end_file] {
                if catalog.get(file).is_none() {
                    tracing::warn!(
                        event = %event.id,
                        file = %file,
                        "persisted event references a file missing from the catalog"
                    );
                }
            }
        }

        tracing::info!(events = events.len(), "event store loaded");
        Ok(Self {
            catalog,
            snapshot_path,
            events: Mutex::new(events),
        })
    }

    fn load_snapshot(path: &Path) -> EventResult<Vec<EventAnnotation>> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn lock(&self) -> EventResult<MutexGuard<'_, Vec<EventAnnotation>>> {
        self.events.lock().map_err(|_| EventError::Lock)
    }

    /// Add a new event, validate it, persist, and return the stored record
    pub fn add(
        &self,
        kind: EventKind,
        start_file: &str,
        start_row: u64,
        end_file: &str,
        end_row: u64,
    ) -> EventResult<EventAnnotation> {
        let mut events = self.lock()?;
        self.validate(start_file, start_row, end_file, end_row)?;

        let event = EventAnnotation {
            id: Uuid::new_v4().simple().to_string(),
            kind,
            start_file: start_file.to_string(),
            start_row,
            end_file: end_file.to_string(),
            end_row,
        };

        let mut next = events.clone();
        next.push(event.clone());
        self.persist(&next)?;
        *events = next;

        tracing::info!(event = %event.id, kind = %event.kind, "event added");
        Ok(event)
    }

    /// Remove the event with the given id
    pub fn remove(&self, id: &str) -> EventResult<()> {
        let mut events = self.lock()?;
        if !events.iter().any(|e| e.id == id) {
            return Err(EventError::NotFound(id.to_string()));
        }

        let next: Vec<EventAnnotation> = events.iter().filter(|e| e.id != id).cloned().collect();
        self.persist(&next)?;
        *events = next;

        tracing::info!(event = %id, "event removed");
        Ok(())
    }

    /// Change the kind of an existing event
    pub fn update_kind(&self, id: &str, kind: EventKind) -> EventResult<EventAnnotation> {
        let mut events = self.lock()?;
        let idx = events
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| EventError::NotFound(id.to_string()))?;

        let mut next = events.clone();
        next[idx].kind = kind;
        let updated = next[idx].clone();
        self.persist(&next)?;
        *events = next;

        tracing::info!(event = %id, kind = %kind, "event kind updated");
        Ok(updated)
    }

    /// Snapshot of all events in insertion order
    pub fn list(&self) -> EventResult<Vec<EventAnnotation>> {
        Ok(self.lock()?.clone())
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check an event span against the catalog; error names the first
    /// violated rule
    fn validate(
        &self,
        start_file: &str,
        start_row: u64,
        end_file: &str,
        end_row: u64,
    ) -> EventResult<()> {
        let start_info = self.catalog.get(start_file).ok_or_else(|| {
            EventError::Validation(format!("start file {} is not in the catalog", start_file))
        })?;
        let end_info = self.catalog.get(end_file).ok_or_else(|| {
            EventError::Validation(format!("end file {} is not in the catalog", end_file))
        })?;

        if start_row < 1 || start_row > start_info.row_count {
            return Err(EventError::Validation(format!(
                "start row must be between 1 and {}",
                start_info.row_count
            )));
        }
        if end_row < 1 || end_row > end_info.row_count {
            return Err(EventError::Validation(format!(
                "end row must be between 1 and {}",
                end_info.row_count
            )));
        }

        if start_info.ordinal > end_info.ordinal
            || (start_info.ordinal == end_info.ordinal && start_row > end_row)
        {
            return Err(EventError::Validation(
                "event span must run from earlier to later with ascending rows".to_string(),
            ));
        }

        Ok(())
    }

    /// Rewrite the snapshot via a temp file and atomic rename
    ///
    /// The in-memory list is committed by the caller only after this
    /// returns, so a failed write leaves memory and disk consistent on the
    /// previous state, and a crash mid-write leaves the old snapshot intact.
    fn persist(&self, events: &[EventAnnotation]) -> EventResult<()> {
        if let Some(parent) = self.snapshot_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(events)?;
        let temp_path = self.snapshot_path.with_extension("json.tmp");

        let mut file = File::create(&temp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp_path, &self.snapshot_path)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::scan_directory;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn fixture() -> (TempDir, Arc<FileCatalog>, PathBuf) {
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
        let snapshot = dir.path().join("marked").join("events.json");
        (dir, catalog, snapshot)
    }

    #[test]
    fn test_add_and_list() {
        let (_dir, catalog, snapshot) = fixture();
        let store = EventStore::open(&snapshot, catalog).unwrap();

        let event = store
            .add(EventKind::Overflow, "Rec1901010000.csv", 2, "Rec1901010100.csv", 2)
            .unwrap();

        assert_eq!(event.id.len(), 32);
        let listed = store.list().unwrap();
        assert_eq!(listed, vec![event]);
    }

    #[test]
    fn test_add_rejects_unknown_files() {
        let (_dir, catalog, snapshot) = fixture();
        let store = EventStore::open(&snapshot, catalog).unwrap();

        let err = store
            .add(EventKind::Lost, "Rec9999999999.csv", 1, "Rec1901010000.csv", 1)
            .unwrap_err();
        assert!(matches!(err, EventError::Validation(_)));
        assert!(err.to_string().contains("start file"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_rejects_out_of_range_rows() {
        let (_dir, catalog, snapshot) = fixture();
        let store = EventStore::open(&snapshot, catalog).unwrap();

        for (start_row, end_row) in [(0, 1), (4, 4), (1, 0), (1, 4)] {
            let err = store
                .add(
                    EventKind::Lost,
                    "Rec1901010000.csv",
                    start_row,
                    "Rec1901010000.csv",
                    end_row,
                )
                .unwrap_err();
            assert!(matches!(err, EventError::Validation(_)), "rows {start_row}..{end_row}");
        }
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_rejects_backwards_spans() {
        let (_dir, catalog, snapshot) = fixture();
        let store = EventStore::open(&snapshot, catalog).unwrap();

        // later file to earlier file
        let err = store
            .add(EventKind::Lost, "Rec1901010100.csv", 2, "Rec1901010000.csv", 2)
            .unwrap_err();
        assert!(matches!(err, EventError::Validation(_)));

        // same file, descending rows
        let err = store
            .add(EventKind::Lost, "Rec1901010000.csv", 3, "Rec1901010000.csv", 1)
            .unwrap_err();
        assert!(matches!(err, EventError::Validation(_)));

        // single-row span is valid
        store
            .add(EventKind::Lost, "Rec1901010000.csv", 2, "Rec1901010000.csv", 2)
            .unwrap();
    }

    #[test]
    fn test_remove_unknown_id_leaves_list_unchanged() {
        let (_dir, catalog, snapshot) = fixture();
        let store = EventStore::open(&snapshot, catalog).unwrap();
        store
            .add(EventKind::Overflow, "Rec1901010000.csv", 1, "Rec1901010000.csv", 2)
            .unwrap();

        let err = store.remove("no-such-id").unwrap_err();
        assert!(matches!(err, EventError::NotFound(_)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_update_kind() {
        let (_dir, catalog, snapshot) = fixture();
        let store = EventStore::open(&snapshot, catalog).unwrap();
        let event = store
            .add(EventKind::Overflow, "Rec1901010000.csv", 1, "Rec1901010000.csv", 1)
            .unwrap();

        let updated = store.update_kind(&event.id, EventKind::Lost).unwrap();
        assert_eq!(updated.kind, EventKind::Lost);
        assert_eq!(store.list().unwrap()[0].kind, EventKind::Lost);

        let err = store.update_kind("missing", EventKind::Lost).unwrap_err();
        assert!(matches!(err, EventError::NotFound(_)));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let (_dir, catalog, snapshot) = fixture();

        let first;
        let second;
        {
            let store = EventStore::open(&snapshot, catalog.clone()).unwrap();
            first = store
                .add(EventKind::Overflow, "Rec1901010000.csv", 2, "Rec1901010100.csv", 2)
                .unwrap();
            second = store
                .add(EventKind::Lost, "Rec1901010100.csv", 1, "Rec1901010100.csv", 3)
                .unwrap();
        }

        let reloaded = EventStore::open(&snapshot, catalog).unwrap();
        assert_eq!(reloaded.list().unwrap(), vec![first, second]);
    }

    #[test]
    fn test_persist_leaves_no_temp_file() {
        let (_dir, catalog, snapshot) = fixture();
        let store = EventStore::open(&snapshot, catalog).unwrap();
        store
            .add(EventKind::Overflow, "Rec1901010000.csv", 1, "Rec1901010000.csv", 1)
            .unwrap();

        assert!(snapshot.exists());
        assert!(!snapshot.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_corrupt_snapshot_is_fatal() {
        let (_dir, catalog, snapshot) = fixture();
        fs::create_dir_all(snapshot.parent().unwrap()).unwrap();
        fs::write(&snapshot, "{not json").unwrap();

        let err = EventStore::open(&snapshot, catalog).unwrap_err();
        assert!(matches!(err, EventError::Serialization(_)));
    }

    #[test]
    fn test_missing_snapshot_is_empty() {
        let (_dir, catalog, snapshot) = fixture();
        let store = EventStore::open(&snapshot, catalog).unwrap();
        assert!(store.is_empty());
    }
}
