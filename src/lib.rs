//! Bolt - a task runner whose tasks are plain Rust functions
//!
//! A Boltfile is Rust source. Bolt discovers its documented functions,
//! rewrites them into tasks, compiles the result with `rustc` and runs it,
//! caching the compiled program until the Boltfile changes.

// Public modules
pub mod build;
pub mod cli;
pub mod config;
pub mod error;
pub mod runner;
pub mod runtime;
pub mod transpile;
pub mod ui;

// Re-export commonly used types
pub use error::{BoltError, Result};

/// Current version of Bolt
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
