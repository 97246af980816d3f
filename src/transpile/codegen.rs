//! Generated program assembly
//!
//! The rewritten Boltfile is printed with `prettyplease`, followed by a
//! synthesized `fn main` and the embedded `mod bolt` support module whose
//! sources are the files under `src/runtime`.

use crate::transpile::extract::Task;
use crate::transpile::Transpiled;
use proc_macro2::Span;
use quote::quote;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use syn::{parse_quote, Ident, Item, ItemFn};

/// File name of the generated source inside the build directory
pub const GENERATED_FILE_NAME: &str = "boltfile.rs";

const COMMAND_SOURCE: &str = include_str!("../runtime/command.rs");
const CONTEXT_SOURCE: &str = include_str!("../runtime/context.rs");
const IDENT_SOURCE: &str = include_str!("../runtime/ident.rs");
const REGISTRY_SOURCE: &str = include_str!("../runtime/registry.rs");

/// Re-exports of the support module; kept in step with `runtime/mod.rs`
const SUPPORT_EXPORTS: &str = "pub use command::Response;
pub use context::{quote, Context, EnvFlag, Settings};
pub use ident::normalize_id;
pub use registry::{run_init, Registry, TaskOutcome};

pub mod prelude {
    pub use super::{quote, Context, EnvFlag, Response, Settings};
}
";

/// Render the complete generated program
pub fn generate(transpiled: &Transpiled) -> String {
    let mut file = transpiled.file.clone();
    file.items.push(Item::Fn(entry_point(
        &transpiled.tasks,
        transpiled.init.as_deref(),
    )));

    let mut out = prettyplease::unparse(&file);
    out.push_str(&support_module());
    out
}

/// Build the `fn main` that registers every task and dispatches
pub fn entry_point(tasks: &[Task], init: Option<&str>) -> ItemFn {
    let registrations = tasks.iter().map(|task| {
        let id = &task.id;
        let doc = &task.doc;
        let func = function_ident(&task.function);
        quote! { registry.register(#id, #doc, #func); }
    });

    let init_call = init.map(|name| {
        let func = function_ident(name);
        quote! { bolt::run_init(&mut ctx, #func); }
    });

    parse_quote! {
        fn main() {
            let mut registry = bolt::Registry::new();
            #(#registrations)*
            let mut ctx = bolt::Context::new();
            #init_call
            registry.main(&mut ctx);
        }
    }
}

fn function_ident(name: &str) -> Ident {
    match name.strip_prefix("r#") {
        Some(raw) => Ident::new_raw(raw, Span::call_site()),
        None => Ident::new(name, Span::call_site()),
    }
}

/// The runtime sources wrapped as `mod bolt`
pub fn support_module() -> String {
    let mut out = String::from("\n#[allow(dead_code, unused_imports, unused_variables)]\nmod bolt {\n");

    for (name, source) in [
        ("command", COMMAND_SOURCE),
        ("context", CONTEXT_SOURCE),
        ("ident", IDENT_SOURCE),
        ("registry", REGISTRY_SOURCE),
    ] {
        out.push_str(&format!("pub mod {} {{\n{}}}\n\n", name, source));
    }

    out.push_str(SUPPORT_EXPORTS);
    out.push_str("}\n");
    out
}

/// Write the generated program into `dir`, returning its path
pub fn write_generated(dir: &Path, source: &str) -> io::Result<PathBuf> {
    let path = dir.join(GENERATED_FILE_NAME);
    fs::write(&path, source)?;
    Ok(path)
}
