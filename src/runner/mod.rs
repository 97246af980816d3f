//! Execution of compiled Boltfile programs

pub mod launch;

pub use launch::{launch, PROGRAM_NAME};
