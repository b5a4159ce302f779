//! CLI command implementations.
//!
//! Commands orchestrate the library components to perform user tasks.

pub mod run;

// Re-export main command functions
pub use run::{execute_run, validate_args, RunArgs};
