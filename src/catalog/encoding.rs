//! Text encoding detection and decoding for sensor log files
//!
//! Rig loggers in the field write GBK; newer tool exports are UTF-8 with or
//! without a BOM. Detection probes the header line only, in the order the
//! logs are most likely to appear; full reads at export time use a separate
//! ladder whose last rung accepts any byte sequence.

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use encoding_rs_io::DecodeReaderBytesBuilder;

use crate::catalog::error::{CatalogError, CatalogResult};
use crate::catalog::types::FileEncoding;

/// Probe order for catalog scans (header-only parse, first success wins)
pub const DETECTION_ORDER: &[FileEncoding] =
    &[FileEncoding::Gbk, FileEncoding::Utf8, FileEncoding::Utf8Sig];

/// Fallback ladder for full-file reads at export time
///
/// `latin-1` maps every byte, so the ladder as a whole cannot fail.
pub const READ_ORDER: &[FileEncoding] =
    &[FileEncoding::Utf8, FileEncoding::Gbk, FileEncoding::Latin1];

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

impl FileEncoding {
    fn encoding(&self) -> &'static encoding_rs::Encoding {
        match self {
            FileEncoding::Gbk => encoding_rs::GBK,
            FileEncoding::Utf8 | FileEncoding::Utf8Sig => encoding_rs::UTF_8,
            FileEncoding::Latin1 => encoding_rs::WINDOWS_1252,
        }
    }

    /// Decode without replacement; `None` when any byte sequence is malformed
    pub fn decode_strict<'a>(&self, bytes: &'a [u8]) -> Option<Cow<'a, str>> {
        let bytes = match self {
            FileEncoding::Utf8Sig => bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes),
            _ => bytes,
        };
        self.encoding()
            .decode_without_bom_handling_and_without_replacement(bytes)
    }
}

/// Detect the encoding of a file by parsing its header line only
///
/// Tries each candidate in [`DETECTION_ORDER`]; the first that decodes the
/// header wins. If none does, the error names the file and the candidates
/// that were tried.
pub fn detect(path: &Path) -> CatalogResult<FileEncoding> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut header = Vec::new();
    reader.read_until(b'\n', &mut header)?;

    let mut last_failure = String::new();
    for candidate in DETECTION_ORDER {
        if candidate.decode_strict(&header).is_some() {
            return Ok(*candidate);
        }
        last_failure = format!("{} cannot decode the header line", candidate.label());
    }

    Err(CatalogError::Encoding {
        file: file_name(path),
        detail: last_failure,
    })
}

/// Read a whole file, trying each encoding in [`READ_ORDER`]
///
/// Returns the decoded text together with the encoding that accepted it.
pub fn read_to_string(path: &Path) -> CatalogResult<(String, FileEncoding)> {
    let bytes = std::fs::read(path)?;

    for candidate in READ_ORDER {
        if let Some(text) = candidate.decode_strict(&bytes) {
            return Ok((text.into_owned(), *candidate));
        }
    }

    Err(CatalogError::Encoding {
        file: file_name(path),
        detail: "every candidate encoding rejected the file body".to_string(),
    })
}

/// Open a streaming reader that decodes `encoding` on the fly
///
/// Malformed sequences are replaced rather than failing the stream; chart
/// sampling is best-effort over the bytes it can read.
pub fn decoding_reader(path: &Path, encoding: FileEncoding) -> CatalogResult<impl Read> {
    let file = File::open(path)?;
    Ok(DecodeReaderBytesBuilder::new()
        .encoding(Some(encoding.encoding()))
        .build(file))
}

/// Count data rows with a single streaming byte pass
///
/// Counts line terminators without decoding, subtracts the header line, and
/// floors at zero. Tolerant of bytes no candidate encoding accepts.
pub fn count_data_rows(path: &Path) -> CatalogResult<u64> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut buf = [0u8; 64 * 1024];
    let mut newlines: u64 = 0;
    let mut last_byte: Option<u8> = None;

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        newlines += buf[..n].iter().filter(|&&b| b == b'\n').count() as u64;
        last_byte = Some(buf[n - 1]);
    }

    let mut lines = newlines;
    if matches!(last_byte, Some(b) if b != b'\n') {
        lines += 1;
    }
    Ok(lines.saturating_sub(1))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
