//! Chart column selection
//!
//! Picks up to three series to plot for a file. Known rig channels win; for
//! files without them, a bounded prefix of the data decides which columns
//! are numeric.

use std::path::Path;

use csv::StringRecord;

use crate::catalog::{self, FileEncoding};
use crate::chart::error::ChartResult;

/// Canonical rig channels, in preference order
pub const PREFERRED_COLUMNS: &[&str] = &[
    "钻头深度(m)",
    "立压log(MPa)",
    "泵冲1(spm)",
    "泵冲2(spm)",
    "泵冲3(spm)",
    "入口流量(L/s)",
    "FDT101(L/s)",
];

/// Maximum number of series per chart
pub const MAX_SERIES: usize = 3;

/// Rows inspected when deciding whether a column is numeric
pub const TYPE_PROBE_ROWS: usize = 2000;

/// Select chart columns for a file
///
/// Preferred channels present in the header win, in preference order.
/// Otherwise the first [`TYPE_PROBE_ROWS`] rows classify columns and the
/// first numeric ones are taken in header order. Returns an empty list when
/// neither yields anything; the sampler then falls back to its first chunk.
pub fn select_columns(path: &Path, encoding: FileEncoding) -> ChartResult<Vec<String>> {
    let reader = catalog::decoding_reader(path, encoding)?;
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let preferred: Vec<String> = PREFERRED_COLUMNS
        .iter()
        .filter(|wanted| headers.iter().any(|h| h == **wanted))
        .take(MAX_SERIES)
        .map(|c| c.to_string())
        .collect();
    if !preferred.is_empty() {
        return Ok(preferred);
    }

    let mut probe = Vec::new();
    for result in csv_reader.records().take(TYPE_PROBE_ROWS) {
        probe.push(result?);
    }

    Ok(numeric_columns(&headers, &probe)
        .into_iter()
        .take(MAX_SERIES)
        .collect())
}

/// Columns whose non-empty values all parse as numbers
///
/// A column must have at least one value in `rows` to qualify; an
/// all-empty column says nothing about its type.
pub(crate) fn numeric_columns(headers: &StringRecord, rows: &[StringRecord]) -> Vec<String> {
    headers
        .iter()
        .enumerate()
        .filter_map(|(idx, name)| {
            let mut saw_value = false;
            for row in rows {
                if let Some(value) = row.get(idx) {
                    let value = value.trim();
                    if value.is_empty() {
                        continue;
                    }
                    if value.parse::<f64>().is_err() {
                        return None;
                    }
                    saw_value = true;
                }
            }
            saw_value.then(|| name.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_csv(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_preferred_columns_win() {
        let dir = tempdir().unwrap();
        let path = write_csv(
            &dir,
            "rig.csv",
            "时间,立压log(MPa),钻头深度(m),备注\n1,10.0,100,ok\n",
        );
        let cols = select_columns(&path, FileEncoding::Utf8).unwrap();
        // Preference order, not header order
        assert_eq!(cols, ["钻头深度(m)", "立压log(MPa)"]);
    }

    #[test]
    fn test_preferred_capped_at_three() {
        let dir = tempdir().unwrap();
        let path = write_csv(
            &dir,
            "rig.csv",
            "钻头深度(m),立压log(MPa),泵冲1(spm),泵冲2(spm)\n1,2,3,4\n",
        );
        let cols = select_columns(&path, FileEncoding::Utf8).unwrap();
        assert_eq!(cols.len(), MAX_SERIES);
        assert_eq!(cols[2], "泵冲1(spm)");
    }

    #[test]
    fn test_numeric_fallback() {
        let dir = tempdir().unwrap();
        let path = write_csv(
            &dir,
            "generic.csv",
            "label,a,b,c\nx,1,2.5,notes\ny,2,,more\nz,3,4.5,\n",
        );
        let cols = select_columns(&path, FileEncoding::Utf8).unwrap();
        assert_eq!(cols, ["a", "b"]);
    }

    #[test]
    fn test_no_candidates() {
        let dir = tempdir().unwrap();
        let path = write_csv(&dir, "text.csv", "label,note\nx,hello\ny,world\n");
        let cols = select_columns(&path, FileEncoding::Utf8).unwrap();
        assert!(cols.is_empty());
    }

    #[test]
    fn test_all_empty_column_is_not_numeric() {
        let dir = tempdir().unwrap();
        let path = write_csv(&dir, "gaps.csv", "a,b\n,1\n,2\n");
        let cols = select_columns(&path, FileEncoding::Utf8).unwrap();
        assert_eq!(cols, ["b"]);
    }
}
