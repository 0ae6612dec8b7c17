//! Content type detection and archive expanders.

pub mod detect;
pub mod traits;
pub mod zip;

// Re-export main types for convenience
pub use detect::detect_bytes;
pub use detect::detect_path;
pub use traits::ArchiveExpander;
pub use traits::Expansion;
pub use traits::MemberOutcome;
pub use zip::ZipExpander;
