//! Task registry and dispatcher
//!
//! The generated entry point registers every task from the Boltfile into a
//! [`Registry`] and hands control to [`Registry::main`], which either lists
//! the available tasks or runs the one named on the command line.

use super::context::Context;
use super::ident::normalize_id;
use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::process;

/// Columns between the longest task ID and the descriptions in a listing
const LISTING_GUTTER: usize = 4;

/// Runtime flag accepted anywhere on the command line
const NO_CONSOLE_LOG: &str = "--no-console-log";

const USAGE: &str = "Usage: bolt <task> [task-args...] [options]

Options:
    --boltfile PATH     use the Boltfile at the given path
    --gen PATH          save the generated executable at the given path
    --recompile         recompile the generated executable instead of using cached builds
    --bolt-verbose      print what bolt is doing
    --no-console-log    disable logging to the console
    --completions       print completion words and exit
    -h, --help          show this help and exit
";

/// Values a task function may return
pub trait TaskOutcome {
    /// Process exit code for this outcome
    fn exit_code(self) -> i32;
}

impl TaskOutcome for () {
    fn exit_code(self) -> i32 {
        0
    }
}

impl<T, E: fmt::Display> TaskOutcome for Result<T, E> {
    fn exit_code(self) -> i32 {
        match self {
            Ok(_) => 0,
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        }
    }
}

/// A registered task
pub struct Task {
    pub doc: String,
    func: Box<dyn Fn(&mut Context) -> i32>,
}

impl Task {
    /// Invoke the bound function, returning its exit code
    pub fn call(&self, ctx: &mut Context) -> i32 {
        (self.func)(ctx)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").field("doc", &self.doc).finish()
    }
}

/// Mapping from normalized task ID to task
#[derive(Debug, Default)]
pub struct Registry {
    tasks: BTreeMap<String, Task>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    /// Register `func` under the normalized form of `id`; a later
    /// registration with the same ID replaces an earlier one
    pub fn register<F, R>(&mut self, id: &str, doc: &str, func: F)
    where
        F: Fn(&mut Context) -> R + 'static,
        R: TaskOutcome,
    {
        let task = Task {
            doc: doc.to_string(),
            func: Box::new(move |ctx: &mut Context| func(ctx).exit_code()),
        };
        self.tasks.insert(normalize_id(id), task);
    }

    /// Look up a task by raw command-line text
    pub fn get(&self, name: &str) -> Option<&Task> {
        self.tasks.get(&normalize_id(name))
    }

    /// Registered IDs in sorted order
    pub fn keys(&self) -> Vec<String> {
        self.tasks.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Render the task listing, sorted by ID with aligned descriptions
    pub fn listing(&self) -> String {
        let longest = self.tasks.keys().map(|k| k.chars().count()).max();
        let width = longest.unwrap_or(0) + LISTING_GUTTER;

        let mut out = String::from("Available tasks:\n\n");
        for (id, task) in &self.tasks {
            out.push_str(&format!("    {:<width$}{}\n", id, task.doc, width = width));
        }
        out.push('\n');
        out
    }

    /// Dispatch on `args` (program name first) and return the exit code
    pub fn run(&self, ctx: &mut Context, args: &[String]) -> i32 {
        let mut rest = Vec::new();
        for arg in args.iter().skip(1) {
            if arg == NO_CONSOLE_LOG {
                ctx.set_console_log(false);
            } else {
                rest.push(arg);
            }
        }

        let mut rest = rest.into_iter();
        let mut task_name = None;

        for arg in rest.by_ref() {
            match arg.as_str() {
                "-h" | "--help" => {
                    print!("{}\n{}", USAGE, self.listing());
                    return 0;
                }
                "--completions" => {
                    for word in ctx.completions().iter().chain(self.tasks.keys()) {
                        println!("{}", word);
                    }
                    return 0;
                }
                opt if opt.starts_with('-') && opt.len() > 1 => {
                    println!("Unknown option: {}", opt);
                    return 1;
                }
                name => {
                    task_name = Some(name);
                    break;
                }
            }
        }

        let name = match task_name {
            Some(name) => name,
            None => {
                print!("{}", self.listing());
                return 0;
            }
        };

        match self.get(name) {
            Some(task) => {
                ctx.set_args(rest.cloned().collect());
                task.call(ctx)
            }
            None => {
                print!("Task not found:\n\n\t{}\n\n", name);
                1
            }
        }
    }

    /// Dispatch on the process arguments and exit
    pub fn main(&self, ctx: &mut Context) -> ! {
        let args: Vec<String> = env::args().collect();
        process::exit(self.run(ctx, &args))
    }
}

/// Run the initializer, exiting the process if it reports a failure
pub fn run_init<F, R>(ctx: &mut Context, init: F)
where
    F: FnOnce(&mut Context) -> R,
    R: TaskOutcome,
{
    let code = init(ctx).exit_code();
    if code != 0 {
        process::exit(code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn noop(_ctx: &mut Context) {}

    #[test]
    fn test_register_normalizes_ids() {
        let mut registry = Registry::new();
        registry.register("BuildProject", "Builds the project", noop);

        assert_eq!(registry.keys(), vec!["build-project".to_string()]);
        assert!(registry.get("build_project").is_some());
        assert!(registry.get("BuildProject").is_some());
    }

    #[test]
    fn test_last_registration_wins() {
        let mut registry = Registry::new();
        registry.register("build", "first", noop);
        registry.register("build", "second", noop);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("build").unwrap().doc, "second");
    }

    #[test]
    fn test_listing_is_sorted_and_aligned() {
        let mut registry = Registry::new();
        registry.register("deploy", "Deploys the app", noop);
        registry.register("build", "Builds the project", noop);

        let expected = "Available tasks:\n\n    \
                        build     Builds the project\n    \
                        deploy    Deploys the app\n\n";
        assert_eq!(registry.listing(), expected);
    }

    #[test]
    fn test_listing_aligns_non_ascii_ids() {
        let mut registry = Registry::new();
        registry.register("größe", "Measures", noop);
        registry.register("ab", "Short", noop);

        let expected = "Available tasks:\n\n    \
                        ab       Short\n    \
                        größe    Measures\n\n";
        assert_eq!(registry.listing(), expected);
    }

    #[test]
    fn test_run_without_task_lists() {
        let registry = Registry::new();
        let mut ctx = Context::new();
        assert_eq!(registry.run(&mut ctx, &args(&["bolt"])), 0);
    }

    #[test]
    fn test_run_unknown_task() {
        let mut registry = Registry::new();
        registry.register("build", "Builds", noop);

        let mut ctx = Context::new();
        assert_eq!(registry.run(&mut ctx, &args(&["bolt", "frobnicate"])), 1);
    }

    #[test]
    fn test_run_invokes_task_once_with_shared_context() {
        let calls = Rc::new(Cell::new(0));
        let seen = calls.clone();

        let mut registry = Registry::new();
        registry.register("greet", "Greets", move |ctx: &mut Context| {
            seen.set(seen.get() + 1);
            ctx.set("greeted", "yes");
        });

        let mut ctx = Context::new();
        let code = registry.run(&mut ctx, &args(&["bolt", "Greet", "extra", "--flag"]));

        assert_eq!(code, 0);
        assert_eq!(calls.get(), 1);
        assert_eq!(ctx.get("greeted"), "yes");
        assert_eq!(ctx.args(), &args(&["extra", "--flag"])[..]);
    }

    #[test]
    fn test_failing_task_sets_exit_code() {
        let mut registry = Registry::new();
        registry.register("fail", "Fails", |_ctx: &mut Context| -> Result<(), String> {
            Err("boom".to_string())
        });

        let mut ctx = Context::new();
        assert_eq!(registry.run(&mut ctx, &args(&["bolt", "fail"])), 1);
    }

    #[test]
    fn test_leading_options() {
        let mut registry = Registry::new();
        registry.register("build", "Builds", noop);

        let mut ctx = Context::new();
        assert_eq!(
            registry.run(&mut ctx, &args(&["bolt", "--no-console-log", "build"])),
            0
        );
        assert_eq!(registry.run(&mut ctx, &args(&["bolt", "--bogus"])), 1);
        assert_eq!(registry.run(&mut ctx, &args(&["bolt", "--help"])), 0);
        assert_eq!(registry.run(&mut ctx, &args(&["bolt", "--completions"])), 0);
    }

    #[test]
    fn test_no_console_log_is_accepted_anywhere() {
        let mut registry = Registry::new();
        registry.register("build", "Builds", noop);

        let mut ctx = Context::new();
        assert!(ctx.console_log());
        let code = registry.run(&mut ctx, &args(&["bolt", "build", "x", "--no-console-log", "y"]));

        assert_eq!(code, 0);
        assert!(!ctx.console_log());
        assert_eq!(ctx.args(), &args(&["x", "y"])[..]);
    }

    #[test]
    fn test_task_outcome_codes() {
        assert_eq!(().exit_code(), 0);
        assert_eq!(Ok::<u8, String>(3).exit_code(), 0);
        assert_eq!(Err::<(), _>("bad").exit_code(), 1);
    }
}
