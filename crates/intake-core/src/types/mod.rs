//! Core data types shared by the pipeline stages.
//!
//! Content types form a closed set with a capability table, so stages ask
//! "can this be sampled?" instead of comparing MIME strings.

pub mod candidate;
pub mod content_type;

pub use candidate::CandidateFile;
pub use candidate::CandidateId;
pub use candidate::Origin;
pub use content_type::Capabilities;
pub use content_type::ContentType;
pub use content_type::DetectedType;
pub use content_type::SpreadsheetKind;
