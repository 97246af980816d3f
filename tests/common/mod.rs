//! Common test utilities

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// A scratch project with its own build cache
pub struct Project {
    pub dir: TempDir,
    pub cache: TempDir,
}

impl Project {
    /// Path of a file inside the project
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, content).unwrap();
        path
    }

    /// The `bolt` binary, run inside the project with an isolated cache
    pub fn bolt(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("bolt"));
        cmd.current_dir(self.dir.path())
            .env("BOLT_CACHE_DIR", self.cache.path())
            .env("NO_COLOR", "1")
            .env_remove("BOLT_RUSTC")
            .env_remove("BOLT_VERBOSE");
        cmd
    }
}

/// Create a project containing a Boltfile
pub fn create_project(boltfile: &str) -> Project {
    create_project_with_name("Boltfile", boltfile)
}

/// Create a project whose Boltfile has a custom name
pub fn create_project_with_name(name: &str, boltfile: &str) -> Project {
    let project = Project {
        dir: TempDir::new().unwrap(),
        cache: TempDir::new().unwrap(),
    };
    project.write(name, boltfile);
    project
}

/// A Boltfile exercising tasks, the initializer and context sugar
pub const SAMPLE_BOLTFILE: &str = r#"
fn onload() {
    ctx.greeting = "hi";
}

/// Says hello
fn hello() {
    println!("hello from bolt");
}

/// show-setting: Shows a setting made by the initializer
fn show() {
    println!("greeting={}", ctx.greeting);
}

/// Prints its arguments
fn greet() {
    println!("args={}", ctx.args().join(","));
}

/// Sets and reads an environment variable
fn EnvTask() {
    ctx.BOLT_TEST_VALUE = "42";
    println!("value={}", ctx.BOLT_TEST_VALUE);
}

/// Fails on purpose
fn fail() -> Result<(), String> {
    Err("boom".to_string())
}

fn helper() -> u32 {
    1
}
"#;
