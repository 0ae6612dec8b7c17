//! Closed set of content types and their pipeline capabilities.

use std::fmt;

/// Spreadsheet container flavours recognised by the sniffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpreadsheetKind {
    /// Office Open XML workbook (zip container).
    Xlsx,
    /// Legacy BIFF workbook (OLE compound file).
    Xls,
    /// OpenDocument spreadsheet (zip container).
    Ods,
}

/// Content type of a candidate, derived from its bytes only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// UTF-8 or ASCII text.
    Text,
    /// PDF document.
    Pdf,
    /// Spreadsheet workbook.
    Spreadsheet(SpreadsheetKind),
    /// Zip archive.
    Zip,
    /// Recognised signature without a reader (images, executables, ...).
    Other,
}

/// What the pipeline may do with a content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// A protection probe exists for this type.
    pub can_probe_protection: bool,
    /// A content reader exists for this type.
    pub can_sample: bool,
    /// The type is a container whose members are admitted individually.
    pub can_expand: bool,
}

impl ContentType {
    /// Capability table entry for this type.
    ///
    /// # Examples
    ///
    /// ```
    /// use intake_core::ContentType;
    ///
    /// let caps = ContentType::Zip.capabilities();
    /// assert!(caps.can_expand);
    /// assert!(!caps.can_sample);
    /// ```
    #[must_use]
    pub const fn capabilities(self) -> Capabilities {
        match self {
            Self::Text | Self::Spreadsheet(_) => Capabilities {
                can_probe_protection: false,
                can_sample: true,
                can_expand: false,
            },
            Self::Pdf => Capabilities {
                can_probe_protection: true,
                can_sample: true,
                can_expand: false,
            },
            Self::Zip => Capabilities {
                can_probe_protection: true,
                can_sample: false,
                can_expand: true,
            },
            Self::Other => Capabilities {
                can_probe_protection: false,
                can_sample: false,
                can_expand: false,
            },
        }
    }

    /// Canonical short tag used in reports.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Pdf => "pdf",
            Self::Spreadsheet(SpreadsheetKind::Xlsx) => "xlsx",
            Self::Spreadsheet(SpreadsheetKind::Xls) => "xls",
            Self::Spreadsheet(SpreadsheetKind::Ods) => "ods",
            Self::Zip => "zip",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Outcome of a successful sniff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectedType {
    /// Canonical content type.
    pub content_type: ContentType,
    /// MIME type reported for the content.
    pub mime: &'static str,
    /// `true` when a binary signature matched, `false` when the type comes
    /// from a heuristic (text classification, zip member-name hints).
    pub confident: bool,
}

impl DetectedType {
    /// A type established by a magic-number match.
    #[must_use]
    pub const fn signature(content_type: ContentType, mime: &'static str) -> Self {
        Self {
            content_type,
            mime,
            confident: true,
        }
    }

    /// A type established by heuristics.
    #[must_use]
    pub const fn heuristic(content_type: ContentType, mime: &'static str) -> Self {
        Self {
            content_type,
            mime,
            confident: false,
        }
    }

    /// Shorthand for `self.content_type.capabilities()`.
    #[must_use]
    pub const fn capabilities(&self) -> Capabilities {
        self.content_type.capabilities()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_type_has_exactly_one_terminal_path() {
        for ty in [
            ContentType::Text,
            ContentType::Pdf,
            ContentType::Spreadsheet(SpreadsheetKind::Xlsx),
            ContentType::Spreadsheet(SpreadsheetKind::Xls),
            ContentType::Spreadsheet(SpreadsheetKind::Ods),
            ContentType::Zip,
        ] {
            let caps = ty.capabilities();
            assert!(
                caps.can_sample ^ caps.can_expand,
                "{ty} should either be sampled or expanded"
            );
        }
    }

    #[test]
    fn test_other_has_no_capabilities() {
        let caps = ContentType::Other.capabilities();
        assert!(!caps.can_probe_protection);
        assert!(!caps.can_sample);
        assert!(!caps.can_expand);
    }

    #[test]
    fn test_tags() {
        assert_eq!(ContentType::Pdf.tag(), "pdf");
        assert_eq!(
            ContentType::Spreadsheet(SpreadsheetKind::Ods).to_string(),
            "ods"
        );
    }

    #[test]
    fn test_detected_type_confidence() {
        assert!(DetectedType::signature(ContentType::Pdf, "application/pdf").confident);
        assert!(!DetectedType::heuristic(ContentType::Text, "text/plain").confident);
    }
}
