//! CLI interface and argument parsing
//!
//! This module handles the launcher's reserved flags and drives the
//! locate, build and run sequence.

pub mod app;

// Re-export main types
pub use app::*;
