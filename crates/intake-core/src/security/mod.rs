//! Security guards applied at every admission point.

pub mod path;
pub mod size;

// Re-export public types and functions
pub use path::MemberPath;
pub use path::UnsafeMemberPath;
pub use size::ExpansionBudget;
pub use size::check;
pub use size::check_file_size;
