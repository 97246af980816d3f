//! Configuration and Boltfile discovery
//!
//! This module locates the Boltfile, parses the optional `Bolt.yml` next to
//! it and resolves the settings used to build the generated program.

pub mod interpolate;
pub mod parse;
pub mod schema;
pub mod types;

// Re-export main types
pub use parse::*;
pub use schema::*;
pub use types::*;
