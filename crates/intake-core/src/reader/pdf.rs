//! PDF text reader.

use std::path::Path;

use lopdf::Document;

use super::ContentSample;
use super::Unreadable;
use crate::AdmissionConfig;
use crate::types::ContentType;

/// Extracts text from the leading pages of a PDF.
///
/// Pages that fail to extract are skipped; the document is unreadable only
/// when every sampled page fails.
pub fn sample(path: &Path, config: &AdmissionConfig) -> Result<ContentSample, Unreadable> {
    let doc = Document::load(path)
        .map_err(|e| Unreadable::new(format!("document does not parse: {e}")))?;

    if doc.trailer.has(b"Encrypt") {
        return Err(Unreadable::new("document is encrypted"));
    }

    let pages: Vec<u32> = doc
        .get_pages()
        .keys()
        .copied()
        .take(config.max_pdf_pages)
        .collect();
    if pages.is_empty() {
        return Err(Unreadable::new("document has no pages"));
    }

    let mut text = String::new();
    let mut failures = 0usize;
    for &page in &pages {
        match doc.extract_text(&[page]) {
            Ok(page_text) => text.push_str(&page_text),
            Err(e) => {
                tracing::debug!(path = %path.display(), page, error = %e, "page text extraction failed");
                failures += 1;
            }
        }
        // One byte past the limit is enough to know the sample is truncated
        if text.len() > config.max_sample_length {
            break;
        }
    }

    if failures == pages.len() {
        return Err(Unreadable::new(format!(
            "no text could be extracted from the first {} page(s)",
            pages.len()
        )));
    }

    Ok(ContentSample::from_text(
        &text,
        ContentType::Pdf,
        config.max_sample_length,
    ))
}
