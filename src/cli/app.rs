//! Main CLI application
//!
//! The launcher claims a handful of reserved flags from anywhere on the
//! command line and forwards everything else to the compiled Boltfile
//! program, which does its own task dispatch.

use crate::build::{default_cache_root, should_reuse, BuildCache, Compiler};
use crate::config::{load_config, locate_boltfile, validate_config, BuildSettings, Config};
use crate::error::{BoltError, Result};
use crate::runner::launch;
use crate::transpile::{generate, transpile, write_generated};
use crate::ui::{Printer, Verbosity};
use clap::builder::FalseyValueParser;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Environment variable that turns on debug logging
pub const BOLT_VERBOSE_ENV: &str = "BOLT_VERBOSE";

/// Flags that take a value
const VALUE_FLAGS: &[&str] = &["--boltfile", "--gen"];

/// Flags that stand alone
const SWITCH_FLAGS: &[&str] = &["--recompile", "--bolt-verbose"];

/// Parsed launcher arguments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchArgs {
    /// `--boltfile`: path or name of the Boltfile
    pub boltfile: Option<String>,

    /// `--gen`: absolute path to compile to, without running
    pub gen: Option<PathBuf>,

    /// `--recompile`: ignore the cached build
    pub recompile: bool,

    /// `--bolt-verbose` or `BOLT_VERBOSE`
    pub verbose: bool,

    /// Arguments passed through to the compiled program
    pub forwarded: Vec<String>,
}

impl LaunchArgs {
    pub fn verbosity(&self) -> Verbosity {
        if self.verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }
}

/// Run the launcher with the process arguments, returning the exit code
pub fn run() -> Result<i32> {
    let args: Vec<String> = env::args().collect();
    let launch_args = parse_launch_args(&args)?;
    let printer = Printer::new(launch_args.verbosity());

    execute(&launch_args, &printer)
}

/// Locate, build if needed, then run or save the Boltfile program
pub fn execute(launch_args: &LaunchArgs, printer: &Printer) -> Result<i32> {
    let boltfile = locate_boltfile(launch_args.boltfile.as_deref())?;
    let boltdir = boltfile
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    printer.debug(&format!("Using {}", boltfile.display()));

    let settings = load_settings(&boltdir, printer)?;
    let cache_root = match &settings.cache_dir {
        Some(dir) => absolutize(dir)?,
        None => default_cache_root(),
    };
    let cache = BuildCache::for_boltfile(&boltfile, &cache_root);

    let fresh = cache.is_fresh(&boltfile)?;
    if should_reuse(fresh, launch_args.recompile, launch_args.gen.is_some()) {
        printer.debug(&format!("Running cached build {}", cache.artifact.display()));
        return launch(&cache.artifact, &boltdir, &launch_args.forwarded);
    }

    let output = launch_args
        .gen
        .clone()
        .unwrap_or_else(|| cache.artifact.clone());
    build(&boltfile, &cache, &output, &settings, printer)?;

    if let Some(gen) = &launch_args.gen {
        printer.info(&format!(
            "{} successfully compiled to {}",
            file_name(&boltfile),
            gen.display()
        ));
        return Ok(0);
    }

    launch(&cache.artifact, &boltdir, &launch_args.forwarded)
}

/// Transpile and compile the Boltfile into `output`
fn build(
    boltfile: &Path,
    cache: &BuildCache,
    output: &Path,
    settings: &BuildSettings,
    printer: &Printer,
) -> Result<()> {
    let name = file_name(boltfile);
    let source = fs::read_to_string(boltfile)?;

    let transpiled = transpile(&source, &name)?;
    if transpiled.tasks.is_empty() {
        return Err(BoltError::NoTasks(boltfile.to_path_buf()));
    }
    for duplicate in &transpiled.duplicates {
        printer.warn(&format!(
            "Task '{}' defined by {} is ignored: the ID is already taken",
            duplicate.id, duplicate.function
        ));
    }

    cache.ensure_dir()?;
    let generated = write_generated(&cache.dir, &generate(&transpiled))?;

    let compiler = Compiler::new(settings);
    printer.debug(&format!(
        "Compiling: {} {}",
        compiler.program(),
        compiler.args(&generated, output).join(" ")
    ));
    compiler.compile(&generated, output, &name)?;

    Ok(())
}

/// Read, validate and resolve the optional configuration file in `dir`
fn load_settings(dir: &Path, printer: &Printer) -> Result<BuildSettings> {
    let config = match load_config(dir)? {
        Some((config, path)) => {
            printer.debug(&format!("Loaded configuration from {}", path.display()));
            config
        }
        None => Config::default(),
    };

    validate_config(&config)?;
    Ok(config.resolve()?)
}

/// Split the command line into launcher flags and forwarded arguments, then
/// parse the launcher flags
pub fn parse_launch_args(args: &[String]) -> Result<LaunchArgs> {
    let (reserved, forwarded) = extract_reserved_args(args);
    let matches = build_command().try_get_matches_from(reserved)?;

    let gen = match matches.get_one::<PathBuf>("gen") {
        Some(path) => Some(absolutize(path)?),
        None => None,
    };

    Ok(LaunchArgs {
        boltfile: matches.get_one::<String>("boltfile").cloned(),
        gen,
        recompile: matches.get_flag("recompile"),
        verbose: get_verbose(&matches),
        forwarded,
    })
}

/// Extract reserved flags before clap parsing.
///
/// A value flag in last position has no value and is forwarded untouched.
fn extract_reserved_args(args: &[String]) -> (Vec<String>, Vec<String>) {
    let program = args.first().cloned().unwrap_or_else(|| "bolt".to_string());
    let mut reserved = vec![program];
    let mut forwarded = Vec::new();

    let mut iter = args.iter().skip(1).peekable();
    while let Some(arg) = iter.next() {
        if VALUE_FLAGS.contains(&arg.as_str()) {
            if let Some(value) = iter.next() {
                reserved.push(arg.clone());
                reserved.push(value.clone());
                continue;
            }
        } else if SWITCH_FLAGS.contains(&arg.as_str()) {
            reserved.push(arg.clone());
            continue;
        }
        forwarded.push(arg.clone());
    }

    (reserved, forwarded)
}

/// Build the clap command for the reserved flags
fn build_command() -> Command {
    Command::new("bolt")
        .version(env!("CARGO_PKG_VERSION"))
        .disable_help_flag(true)
        .disable_version_flag(true)
        .arg(
            Arg::new("boltfile")
                .long("boltfile")
                .value_name("PATH")
                .allow_hyphen_values(true)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("gen")
                .long("gen")
                .value_name("PATH")
                .allow_hyphen_values(true)
                .value_parser(value_parser!(PathBuf))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("recompile")
                .long("recompile")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("bolt-verbose")
                .env(BOLT_VERBOSE_ENV)
                .value_parser(FalseyValueParser::new())
                .action(ArgAction::SetTrue),
        )
}

fn get_verbose(matches: &ArgMatches) -> bool {
    matches.get_flag("verbose")
}

fn absolutize(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(env::current_dir()?.join(path))
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
