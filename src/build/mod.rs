//! Build cache and compiler driver

pub mod cache;
pub mod compiler;

pub use cache::{cache_key, default_cache_root, should_reuse, BuildCache};
pub use compiler::{compile_diagnostic, Compiler};
