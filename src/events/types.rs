//! Core types for event annotations
//!
//! - `EventKind`: the two kinds of marked region an operator records
//! - `EventAnnotation`: a persisted marked span, possibly crossing files
//! - `FileRowRange`: the per-file expansion used during export

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::events::error::EventError;

/// Kind of a marked region
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Mud overflow at the wellhead
    Overflow,
    /// Lost circulation downhole
    Lost,
}

impl EventKind {
    /// All kinds, for iteration
    pub fn all() -> &'static [EventKind] {
        &[EventKind::Overflow, EventKind::Lost]
    }

    /// Canonical name, also used as the export column header
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Overflow => "overflow",
            EventKind::Lost => "lost",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "overflow" => Ok(EventKind::Overflow),
            "lost" => Ok(EventKind::Lost),
            other => Err(EventError::Validation(format!(
                "event kind must be overflow or lost, got {:?}",
                other
            ))),
        }
    }
}

/// A marked span of rows, of a given kind, potentially crossing file
/// boundaries
///
/// Rows are 1-indexed and inclusive at both ends. The span runs from
/// (`start_file`, `start_row`) to (`end_file`, `end_row`) in catalog order.
/// Serialized with the `event_type` field name the snapshot format uses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventAnnotation {
    /// Opaque unique token, stable once assigned
    pub id: String,
    #[serde(rename = "event_type")]
    pub kind: EventKind,
    pub start_file: String,
    pub start_row: u64,
    pub end_file: String,
    pub end_row: u64,
}

/// A file-local, inclusive, 1-indexed row span derived from an event
///
/// Derived during export only, never persisted. Files strictly between an
/// event's endpoints get the file's full row span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileRowRange {
    pub kind: EventKind,
    pub start_row: u64,
    pub end_row: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse() {
        assert_eq!("overflow".parse::<EventKind>().unwrap(), EventKind::Overflow);
        assert_eq!("lost".parse::<EventKind>().unwrap(), EventKind::Lost);
        assert!("spill".parse::<EventKind>().is_err());
        assert!("Overflow".parse::<EventKind>().is_err());
    }

    #[test]
    fn test_annotation_snapshot_field_names() {
        let event = EventAnnotation {
            id: "deadbeef".to_string(),
            kind: EventKind::Lost,
            start_file: "Rec1901010000.csv".to_string(),
            start_row: 2,
            end_file: "Rec1901010100.csv".to_string(),
            end_row: 5,
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "lost");
        assert_eq!(json["start_row"], 2);

        let back: EventAnnotation = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
