//! Boltfile to Rust program translation
//!
//! [`transpile`] parses the Boltfile, discovers its tasks and rewrites the
//! syntax tree; [`codegen::generate`] then renders the final program.

pub mod codegen;
pub mod extract;
pub mod rewrite;

pub use codegen::{generate, write_generated, GENERATED_FILE_NAME};
pub use extract::{Extraction, Task, INITIALIZER_NAMES};

use crate::error::ParseError;
use syn::File;

/// A rewritten Boltfile together with what was discovered in it
#[derive(Debug, Clone)]
pub struct Transpiled {
    /// The rewritten syntax tree
    pub file: File,

    /// Tasks in declaration order
    pub tasks: Vec<Task>,

    /// Name of the initializer function, if any
    pub init: Option<String>,

    /// Tasks dropped in favour of an earlier one with the same ID
    pub duplicates: Vec<Task>,
}

impl Transpiled {
    pub fn has_init(&self) -> bool {
        self.init.is_some()
    }
}

/// Parse, classify and rewrite Boltfile source
pub fn transpile(source: &str, filename: &str) -> Result<Transpiled, ParseError> {
    let mut file = extract::parse_boltfile(source, filename)?;
    let extraction = extract::extract(&file);
    rewrite::rewrite(&mut file, &extraction);

    Ok(Transpiled {
        file,
        tasks: extraction.tasks,
        init: extraction.init,
        duplicates: extraction.duplicates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transpile_reports_tasks_and_initializer() {
        let transpiled = transpile(
            r#"
fn onload() {
    ctx.host = "example.com";
}

/// deploy: Ships it
fn ship() {}

/// deploy: Ships it again
fn ship_again() {}
"#,
            "Boltfile",
        )
        .unwrap();

        assert!(transpiled.has_init());
        assert_eq!(transpiled.tasks.len(), 1);
        assert_eq!(transpiled.tasks[0].id, "deploy");
        assert_eq!(transpiled.duplicates[0].function, "ship_again");
    }

    #[test]
    fn test_transpile_without_tasks() {
        let transpiled = transpile("fn helper() {}\n", "Boltfile").unwrap();
        assert!(transpiled.tasks.is_empty());
        assert!(!transpiled.has_init());
    }

    #[test]
    fn test_transpile_parse_error() {
        let err = transpile("fn (", "Boltfile.rs").unwrap_err();
        assert!(err.to_string().starts_with("Boltfile.rs:"));
    }
}
