//! Plain text reader.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::ContentSample;
use super::Unreadable;
use crate::AdmissionConfig;
use crate::types::ContentType;

/// Decodes the whole file as strict UTF-8.
///
/// Reading is capped at the single-file limit; a file that grew past it
/// since the size check is unreadable.
pub fn sample(path: &Path, config: &AdmissionConfig) -> Result<ContentSample, Unreadable> {
    let file =
        File::open(path).map_err(|e| Unreadable::new(format!("cannot open file: {e}")))?;

    let mut bytes = Vec::new();
    file.take(config.max_file_size.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(|e| Unreadable::new(format!("read failed: {e}")))?;

    if bytes.len() as u64 > config.max_file_size {
        return Err(Unreadable::new("file grew past the size limit while reading"));
    }

    let text = String::from_utf8(bytes).map_err(|e| {
        Unreadable::new(format!(
            "invalid UTF-8 at byte {}",
            e.utf8_error().valid_up_to()
        ))
    })?;

    Ok(ContentSample::from_text(
        &text,
        ContentType::Text,
        config.max_sample_length,
    ))
}
