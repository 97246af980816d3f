//! Error types for Bolt

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Bolt operations
pub type Result<T> = std::result::Result<T, BoltError>;

/// Main error type for Bolt
#[derive(Error, Debug)]
pub enum BoltError {
    /// The Boltfile could not be located
    #[error("Couldn't find {name} (searched: {searched})")]
    Locate { name: String, searched: String },

    /// The Boltfile is not valid Rust
    #[error("{0}")]
    Parse(#[from] ParseError),

    /// The Boltfile parsed but declares no tasks
    #[error("No tasks were found in {}", .0.display())]
    NoTasks(PathBuf),

    /// The generated program failed to compile
    #[error("{0}")]
    Compile(#[from] CompileError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Malformed launcher flags
    #[error("{0}")]
    Cli(#[from] clap::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// YAML parsing errors
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// A single positioned parser diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}: {}", self.file, self.line, self.column, self.message)
    }
}

/// Boltfile parse failure, one diagnostic per underlying parser error
#[derive(Debug)]
pub struct ParseError {
    pub diagnostics: Vec<Diagnostic>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self.diagnostics.iter().map(|d| d.to_string()).collect();
        f.write_str(&lines.join("\n"))
    }
}

impl std::error::Error for ParseError {}

/// Host compiler failure
#[derive(Error, Debug)]
#[error("{message}")]
pub struct CompileError {
    pub message: String,
}

/// Configuration parsing and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to read config file '{path}': {error}")]
    Read { path: PathBuf, error: String },

    #[error("Variable '{0}' is not defined")]
    UndefinedVariable(String),

    #[error("Recursive interpolation detected")]
    RecursiveInterpolation,
}

/// Specialized result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
