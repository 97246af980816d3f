//! Console output for the launcher
//!
//! All diagnostics go to stderr so that the standard output of the launcher
//! stays reserved for the generated program.

use colored::Colorize;

/// Verbosity levels for output; `--bolt-verbose` selects `Verbose`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Normal,
    Verbose,
}

/// Levelled console printer
#[derive(Debug, Clone, Copy)]
pub struct Printer {
    pub verbosity: Verbosity,
}

impl Printer {
    pub fn new(verbosity: Verbosity) -> Self {
        Printer { verbosity }
    }

    pub fn is_verbose(&self) -> bool {
        self.verbosity >= Verbosity::Verbose
    }

    /// Print info message
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "[INFO]".green(), message);
    }

    /// Print warning message
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "[WARN]".yellow(), message);
    }

    /// Print error message; multi-line messages keep their layout
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "[ERROR]".red().bold(), message);
    }

    /// Print debug message (only in verbose mode)
    pub fn debug(&self, message: &str) {
        if self.is_verbose() {
            eprintln!("{} {}", "[DEBUG]".dimmed(), message);
        }
    }
}

impl Default for Printer {
    fn default() -> Self {
        Printer::new(Verbosity::Normal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert!(Verbosity::Verbose > Verbosity::Normal);
        assert!(Printer::new(Verbosity::Verbose).is_verbose());
        assert!(!Printer::new(Verbosity::Normal).is_verbose());
    }

    #[test]
    fn test_default_printer() {
        assert_eq!(Printer::default().verbosity, Verbosity::Normal);
        assert!(!Printer::default().is_verbose());
    }
}
