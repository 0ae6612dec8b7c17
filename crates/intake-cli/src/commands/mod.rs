//! Subcommand implementations.

pub mod check;
pub mod completion;
pub mod sniff;
