//! User interface module - terminal output.
//!
//! All user-facing text goes through [formatter]; diagnostics go through
//! `tracing` instead.

pub mod formatter;

// Re-export formatter functions for convenience
pub use formatter::{
    display_boundary_warning, display_diff, display_error, display_filepaths, display_outcome,
    display_status, display_success, display_version_change,
};
