//! Host compiler driver

use crate::config::BuildSettings;
use crate::error::CompileError;
use std::path::Path;
use std::process::{Command as StdCommand, Stdio};

/// Crate name given to every generated program
pub const CRATE_NAME: &str = "boltfile";

/// Compiles generated sources with `rustc`
#[derive(Debug, Clone)]
pub struct Compiler {
    program: String,
    edition: String,
    flags: Vec<String>,
}

impl Compiler {
    pub fn new(settings: &BuildSettings) -> Self {
        Compiler {
            program: settings.rustc.clone(),
            edition: settings.edition.clone(),
            flags: settings.rustc_flags.clone(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments passed to the compiler for `source`, writing to `output`
    pub fn args(&self, source: &Path, output: &Path) -> Vec<String> {
        let mut args = vec![
            "--edition".to_string(),
            self.edition.clone(),
            "--crate-name".to_string(),
            CRATE_NAME.to_string(),
        ];
        args.extend(self.flags.iter().cloned());
        args.push("-o".to_string());
        args.push(output.display().to_string());
        args.push(
            source
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| source.display().to_string()),
        );
        args
    }

    /// Compile `source` into `output`, running in the source's directory.
    /// `boltfile_name` is only used to word the failure message.
    pub fn compile(&self, source: &Path, output: &Path, boltfile_name: &str) -> Result<(), CompileError> {
        let mut command = StdCommand::new(&self.program);
        command.args(self.args(source, output));
        if let Some(dir) = source.parent() {
            command.current_dir(dir);
        }
        command.stdin(Stdio::null());

        let generated = source.display().to_string();
        let output = command.output().map_err(|e| CompileError {
            message: compile_diagnostic(&generated, boltfile_name, "", "", &e.to_string()),
        })?;

        if output.status.success() {
            return Ok(());
        }

        Err(CompileError {
            message: compile_diagnostic(
                &generated,
                boltfile_name,
                &String::from_utf8_lossy(&output.stdout),
                &String::from_utf8_lossy(&output.stderr),
                &output.status.to_string(),
            ),
        })
    }
}

/// Word a compiler failure
///
/// The compiler's stderr is preferred; otherwise its stdout minus the first
/// (banner) line; otherwise `raw`, the spawn or exit error.
pub fn compile_diagnostic(
    generated: &str,
    boltfile_name: &str,
    stdout: &str,
    stderr: &str,
    raw: &str,
) -> String {
    let mut message = format!("compiling {} generated from {}", generated, boltfile_name);

    let stderr = stderr.trim();
    if !stderr.is_empty() {
        message.push('\n');
        message.push_str(stderr);
    } else if !stdout.is_empty() {
        match stdout.split_once('\n') {
            Some((_, rest)) => {
                message.push_str("\n\n");
                message.push_str(rest.trim());
                message.push('\n');
            }
            None => {
                message.push('\n');
                message.push_str(stdout.trim());
            }
        }
    } else {
        message.push('\n');
        message.push_str(raw);
    }

    message
}
