//! Running the compiled program
//!
//! The artifact runs in the Boltfile's directory with the arguments that were
//! not claimed by the launcher. Its output goes straight to the console.

use crate::error::Result;
use std::path::Path;
use std::process::{Command as StdCommand, Stdio};

/// Name the compiled program sees as its `argv[0]`
pub const PROGRAM_NAME: &str = "bolt";

/// Run `artifact` in `dir` and map its status to the launcher's exit code
pub fn launch(artifact: &Path, dir: &Path, args: &[String]) -> Result<i32> {
    let mut command = StdCommand::new(artifact);
    command
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.arg0(PROGRAM_NAME);
    }

    let status = command.status()?;
    Ok(if status.success() { 0 } else { 1 })
}
