//! Boltfile parsing and task discovery
//!
//! A top-level function is a task when it carries a non-empty doc comment.
//! The first word of the comment may name the task explicitly (`build: ...`);
//! otherwise the function name is used. Functions named `onload` or `init`
//! are initializers and never tasks.

use crate::error::{Diagnostic, ParseError};
use crate::runtime::ident::normalize_id;
use std::collections::HashSet;
use syn::ext::IdentExt;
use syn::{AttrStyle, Attribute, Expr, ExprLit, File, Item, Lit, Meta};

/// Function names reserved for the initializer
pub const INITIALIZER_NAMES: &[&str] = &["onload", "init"];

/// A task discovered in the Boltfile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Normalized task ID
    pub id: String,

    /// Description shown in the task listing
    pub doc: String,

    /// Name of the bound function, as written in the Boltfile
    pub function: String,
}

/// Result of classifying the Boltfile's top-level functions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Tasks in declaration order
    pub tasks: Vec<Task>,

    /// The initializer invoked before dispatch
    pub init: Option<String>,

    /// Tasks dropped because an earlier task already claimed their ID
    pub duplicates: Vec<Task>,

    /// Every function that receives the context parameter
    pub context_fns: Vec<String>,
}

/// Parse Boltfile source, reporting every parser error with its position
pub fn parse_boltfile(source: &str, filename: &str) -> Result<File, ParseError> {
    syn::parse_file(source).map_err(|err| ParseError {
        diagnostics: err
            .into_iter()
            .map(|e| {
                let start = e.span().start();
                Diagnostic {
                    file: filename.to_string(),
                    line: start.line,
                    column: start.column + 1,
                    message: e.to_string(),
                }
            })
            .collect(),
    })
}

/// Classify the top-level functions of a parsed Boltfile
pub fn extract(file: &File) -> Extraction {
    let mut extraction = Extraction::default();
    let mut seen = HashSet::new();

    for item in &file.items {
        let func = match item {
            Item::Fn(func) => func,
            _ => continue,
        };

        let function = func.sig.ident.to_string();
        let name = func.sig.ident.unraw().to_string();

        if INITIALIZER_NAMES.contains(&name.as_str()) {
            if extraction.init.is_none() {
                extraction.init = Some(function.clone());
            }
            extraction.context_fns.push(function);
            continue;
        }

        let doc = doc_text(&func.attrs);
        if doc.is_empty() {
            continue;
        }

        let (explicit_id, description) = split_doc(&doc);
        let id = explicit_id
            .map(normalize_id)
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| normalize_id(&name));

        let task = Task {
            id,
            doc: description.to_string(),
            function: function.clone(),
        };

        if seen.insert(task.id.clone()) {
            extraction.tasks.push(task);
        } else {
            extraction.duplicates.push(task);
        }
        extraction.context_fns.push(function);
    }

    extraction
}

/// Collect the text of outer doc comments, trimmed
pub fn doc_text(attrs: &[Attribute]) -> String {
    let mut lines = Vec::new();

    for attr in attrs {
        if attr.style != AttrStyle::Outer || !attr.path().is_ident("doc") {
            continue;
        }
        let value = match &attr.meta {
            Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(ExprLit {
                    lit: Lit::Str(s), ..
                }) => s.value(),
                _ => continue,
            },
            _ => continue,
        };
        for line in value.lines() {
            let line = line.strip_prefix(' ').unwrap_or(line);
            lines.push(line.trim_end().to_string());
        }
    }

    lines.join("\n").trim().to_string()
}

/// Split a trimmed doc comment into an optional explicit ID and description
pub fn split_doc(doc: &str) -> (Option<&str>, &str) {
    let (first, rest) = match doc.find(char::is_whitespace) {
        Some(idx) => (&doc[..idx], doc[idx..].trim_start()),
        None => (doc, ""),
    };

    match first.strip_suffix(':') {
        Some(id) if first.len() >= 2 => (Some(id), rest),
        _ => (None, doc),
    }
}
