//! PDF encryption probe.

use std::fs::File;
use std::io;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::path::Path;

use lopdf::Document;

use super::ProtectionStatus;

/// Bytes scanned at each end of the file when the document does not parse.
const MARKER_WINDOW: u64 = 64 * 1024;

const ENCRYPT_KEY: &[u8] = b"/Encrypt";
const TRAILER_KEYWORD: &[u8] = b"trailer";

/// Probes a PDF for encryption.
///
/// The parsed trailer decides: an encrypted document references an
/// `/Encrypt` dictionary there (lopdf folds cross-reference stream
/// dictionaries into the trailer). Only when the document does not parse are
/// the raw `trailer` dictionaries in the head and tail windows inspected, so
/// `/Encrypt` appearing in page text or a string never counts.
pub fn probe(path: &Path) -> ProtectionStatus {
    let parse_error = match Document::load(path) {
        Ok(doc) if doc.trailer.has(b"Encrypt") => {
            return ProtectionStatus::Protected {
                reason: "trailer references an /Encrypt dictionary".to_string(),
            };
        }
        Ok(_) => return ProtectionStatus::Unprotected,
        Err(e) => e,
    };

    match scan_trailers(path) {
        Ok(true) => ProtectionStatus::Protected {
            reason: format!("trailer declares an /Encrypt dictionary ({parse_error})"),
        },
        Ok(false) => ProtectionStatus::Indeterminate {
            reason: format!("document does not parse: {parse_error}"),
        },
        Err(e) => ProtectionStatus::Indeterminate {
            reason: format!("cannot read document: {e}"),
        },
    }
}

/// Looks for `/Encrypt` inside `trailer` dictionaries in the first and last
/// [`MARKER_WINDOW`] bytes.
fn scan_trailers(path: &Path) -> io::Result<bool> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();

    let mut window = Vec::new();
    (&mut file).take(MARKER_WINDOW).read_to_end(&mut window)?;
    if trailer_declares_encrypt(&window) {
        return Ok(true);
    }

    if len > MARKER_WINDOW {
        // Overlap the head window so a trailer straddling the boundary is
        // still seen whole.
        let tail_start = len
            .saturating_sub(MARKER_WINDOW)
            .max(MARKER_WINDOW.saturating_sub(1024));
        file.seek(SeekFrom::Start(tail_start))?;
        window.clear();
        file.take(MARKER_WINDOW).read_to_end(&mut window)?;
        return Ok(trailer_declares_encrypt(&window));
    }

    Ok(false)
}

/// `true` if any `trailer << ... >>` dictionary in `haystack` has an
/// `/Encrypt` key.
fn trailer_declares_encrypt(haystack: &[u8]) -> bool {
    let mut rest = haystack;
    while let Some(at) = find(rest, TRAILER_KEYWORD) {
        rest = &rest[at + TRAILER_KEYWORD.len()..];
        if trailer_dictionary(rest).is_some_and(has_encrypt_key) {
            return true;
        }
    }
    false
}

/// The `<< ... >>` dictionary that follows a `trailer` keyword, with nested
/// dictionaries included. `None` if it is missing or cut off.
fn trailer_dictionary(after_keyword: &[u8]) -> Option<&[u8]> {
    let start = after_keyword
        .iter()
        .position(|b| !b.is_ascii_whitespace())?;
    let dict = &after_keyword[start..];
    if !dict.starts_with(b"<<") {
        return None;
    }

    let mut depth = 0usize;
    let mut i = 0;
    while i + 1 < dict.len() {
        match &dict[i..i + 2] {
            b"<<" => {
                depth += 1;
                i += 2;
            }
            b">>" => {
                depth -= 1;
                i += 2;
                if depth == 0 {
                    return Some(&dict[..i]);
                }
            }
            _ => i += 1,
        }
    }
    None
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// `/Encrypt` as a whole name; `/EncryptMetadata` and friends do not count.
fn has_encrypt_key(haystack: &[u8]) -> bool {
    haystack
        .windows(ENCRYPT_KEY.len())
        .enumerate()
        .any(|(i, window)| {
            window == ENCRYPT_KEY
                && haystack
                    .get(i + ENCRYPT_KEY.len())
                    .is_none_or(|next| !next.is_ascii_alphanumeric())
        })
}
