//! Content type detection from byte signatures.
//!
//! Only a bounded prefix of the file is read. File names and extensions are
//! never consulted.

use std::fs::File;
use std::io;
use std::io::Read;
use std::path::Path;

use crate::types::ContentType;
use crate::types::DetectedType;
use crate::types::SpreadsheetKind;

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const XLS_MIME: &str = "application/vnd.ms-excel";
const ODS_MIME: &str = "application/vnd.oasis.opendocument.spreadsheet";
const TEXT_MIME: &str = "text/plain";

/// Member-name prefix of OOXML workbook parts.
const XLSX_PART_PREFIX: &[u8] = b"xl/";

const LOCAL_HEADER_SIG: &[u8] = b"PK\x03\x04";
const LOCAL_HEADER_LEN: usize = 30;

/// Detects the content type of the file at `path`.
///
/// Reads at most `prefix_len` bytes. Returns `Ok(None)` when no signature
/// matches; callers treat that as a rejection, not a fault.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
///
/// # Examples
///
/// ```no_run
/// use intake_core::formats::detect::detect_path;
///
/// # fn main() -> std::io::Result<()> {
/// if let Some(detected) = detect_path("upload.bin".as_ref(), 8192)? {
///     println!("{} ({})", detected.content_type, detected.mime);
/// }
/// # Ok(())
/// # }
/// ```
pub fn detect_path(path: &Path, prefix_len: usize) -> io::Result<Option<DetectedType>> {
    let file = File::open(path)?;
    let mut prefix = Vec::with_capacity(prefix_len);
    file.take(prefix_len as u64).read_to_end(&mut prefix)?;
    Ok(detect_bytes(&prefix))
}

/// Detects the content type of a byte prefix.
///
/// Empty input is classified as text.
#[must_use]
pub fn detect_bytes(prefix: &[u8]) -> Option<DetectedType> {
    if prefix.is_empty() {
        return Some(DetectedType::heuristic(ContentType::Text, TEXT_MIME));
    }

    if let Some(kind) = infer::get(prefix) {
        return classify_mime(kind.mime_type(), prefix);
    }

    looks_like_text(prefix).then(|| DetectedType::heuristic(ContentType::Text, TEXT_MIME))
}

fn classify_mime(mime: &'static str, prefix: &[u8]) -> Option<DetectedType> {
    let detected = match mime {
        "application/pdf" => DetectedType::signature(ContentType::Pdf, mime),
        "application/zip" => refine_zip(prefix),
        XLSX_MIME => {
            DetectedType::signature(ContentType::Spreadsheet(SpreadsheetKind::Xlsx), mime)
        }
        XLS_MIME => DetectedType::signature(ContentType::Spreadsheet(SpreadsheetKind::Xls), mime),
        ODS_MIME => DetectedType::signature(ContentType::Spreadsheet(SpreadsheetKind::Ods), mime),
        // Markup and scripts carry a signature but are still text, provided
        // the bytes really decode.
        _ if mime.starts_with("text/") => {
            if !looks_like_text(prefix) {
                return None;
            }
            DetectedType::signature(ContentType::Text, mime)
        }
        _ => DetectedType::signature(ContentType::Other, mime),
    };
    Some(detected)
}

/// Generic zips whose local headers name workbook parts are workbooks.
fn refine_zip(prefix: &[u8]) -> DetectedType {
    let is_workbook =
        local_header_names(prefix).any(|name| name.starts_with(XLSX_PART_PREFIX));

    if is_workbook {
        DetectedType::heuristic(ContentType::Spreadsheet(SpreadsheetKind::Xlsx), XLSX_MIME)
    } else {
        DetectedType::signature(ContentType::Zip, "application/zip")
    }
}

/// UTF-8/ASCII heuristic.
///
/// The prefix must decode as UTF-8 (a character split by the prefix boundary
/// is tolerated), contain no NUL byte and be at most 5% control characters.
fn looks_like_text(prefix: &[u8]) -> bool {
    if prefix.contains(&0) {
        return false;
    }

    let text = match std::str::from_utf8(prefix) {
        Ok(text) => text,
        Err(err) if err.error_len().is_none() => {
            match std::str::from_utf8(&prefix[..err.valid_up_to()]) {
                Ok(text) => text,
                Err(_) => return false,
            }
        }
        Err(_) => return false,
    };

    let mut total = 0usize;
    let mut control = 0usize;
    for c in text.chars() {
        total += 1;
        if c.is_control() && !matches!(c, '\n' | '\r' | '\t' | '\u{c}') {
            control += 1;
        }
    }

    control * 20 <= total
}

/// Names from the chain of local file headers that fits inside `prefix`.
///
/// Walking stops at the first header that is cut off, or whose sizes are
/// deferred to a data descriptor; member data is never scanned, so names
/// inside stored nested archives do not leak out.
fn local_header_names(prefix: &[u8]) -> impl Iterator<Item = &[u8]> {
    let mut offset = 0usize;
    std::iter::from_fn(move || {
        let header = prefix.get(offset..offset.checked_add(LOCAL_HEADER_LEN)?)?;
        if !header.starts_with(LOCAL_HEADER_SIG) {
            return None;
        }
        let compressed = u32::from_le_bytes([header[18], header[19], header[20], header[21]]);
        let name_len = usize::from(u16::from_le_bytes([header[26], header[27]]));
        let extra_len = usize::from(u16::from_le_bytes([header[28], header[29]]));

        let name_start = offset + LOCAL_HEADER_LEN;
        let name = prefix.get(name_start..name_start + name_len)?;
        offset = (name_start + name_len + extra_len).checked_add(usize::try_from(compressed).ok()?)?;
        Some(name)
    })
}
