//! Content readers: bounded decoded samples per content type.
//!
//! A reader either produces a [`ContentSample`] or explains why the content
//! cannot be decoded. Readers only run after the size, type and protection
//! checks have passed.

pub mod pdf;
pub mod spreadsheet;
pub mod text;

use thiserror::Error;

use crate::AdmissionConfig;
use crate::types::CandidateFile;
use crate::types::ContentType;
use crate::types::DetectedType;

/// Bounded decoded text from a candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentSample {
    /// Decoded text, at most `max_sample_length` bytes.
    pub text: String,
    /// Type the sample was decoded as.
    pub format: ContentType,
    /// `true` when more text was available than the sample holds.
    pub truncated: bool,
}

impl ContentSample {
    /// Builds a sample from decoded text, cutting it to `max_len` bytes on a
    /// character boundary.
    ///
    /// # Examples
    ///
    /// ```
    /// use intake_core::ContentType;
    /// use intake_core::reader::ContentSample;
    ///
    /// let sample = ContentSample::from_text("héllo", ContentType::Text, 2);
    /// assert_eq!(sample.text, "h");
    /// assert!(sample.truncated);
    /// ```
    #[must_use]
    pub fn from_text(text: &str, format: ContentType, max_len: usize) -> Self {
        let cut = floor_char_boundary(text, max_len);
        Self {
            text: text[..cut].to_string(),
            format,
            truncated: cut < text.len(),
        }
    }
}

/// Content could not be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct Unreadable {
    /// What went wrong.
    pub reason: String,
}

impl Unreadable {
    /// Creates an error with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// The type has no reader.
    #[must_use]
    pub fn unsupported(detected: &DetectedType) -> Self {
        Self::new(format!("unsupported type {}", detected.mime))
    }
}

/// Extracts a bounded sample from the candidate.
///
/// # Errors
///
/// Returns `Unreadable` if the content does not decode, or the type has no
/// reader.
pub fn sample(
    candidate: &CandidateFile,
    detected: &DetectedType,
    config: &AdmissionConfig,
) -> Result<ContentSample, Unreadable> {
    match detected.content_type {
        ContentType::Text => text::sample(&candidate.path, config),
        ContentType::Pdf => pdf::sample(&candidate.path, config),
        ContentType::Spreadsheet(_) => {
            spreadsheet::sample(&candidate.path, detected.content_type, config)
        }
        ContentType::Zip | ContentType::Other => Err(Unreadable::unsupported(detected)),
    }
}

/// Largest index `<= max` that lies on a character boundary of `text`.
fn floor_char_boundary(text: &str, max: usize) -> usize {
    if max >= text.len() {
        return text.len();
    }
    let mut cut = max;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    cut
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::CandidateId;
    use std::path::Path;

    #[test]
    fn test_sample_fits() {
        let sample = ContentSample::from_text("short", ContentType::Text, 100);
        assert_eq!(sample.text, "short");
        assert!(!sample.truncated);
    }

    #[test]
    fn test_sample_exact_length_not_truncated() {
        let sample = ContentSample::from_text("abcde", ContentType::Text, 5);
        assert_eq!(sample.text, "abcde");
        assert!(!sample.truncated);
    }

    #[test]
    fn test_sample_cut_on_char_boundary() {
        // '世' is three bytes
        let sample = ContentSample::from_text("a世界", ContentType::Text, 3);
        assert_eq!(sample.text, "a");
        assert!(sample.truncated);

        let sample = ContentSample::from_text("a世界", ContentType::Text, 4);
        assert_eq!(sample.text, "a世");
    }

    #[test]
    fn test_unsupported_types() {
        let candidate = CandidateFile::top_level(CandidateId(0), Path::new("x"), 0);
        let detected = DetectedType::signature(ContentType::Other, "image/png");
        let err = sample(&candidate, &detected, &AdmissionConfig::default()).unwrap_err();
        assert!(err.reason.contains("unsupported type"));
        assert!(err.reason.contains("image/png"));
    }
}
