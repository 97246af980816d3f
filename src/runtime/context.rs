//! Execution context shared by every task
//!
//! A single [`Context`] is created by the generated entry point and handed to
//! the initializer and to the dispatched task. It carries settings, the
//! environment exported to commands, and the command helpers.

use super::command::{shell_quote, Invocation, Response};
use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Settings mapping
pub type Settings = BTreeMap<String, String>;

/// Options accepted by [`Context::setenv_with`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvFlag {
    /// Drop every previously set environment entry first
    Reset,
}

/// Modifiers consumed by the next command
#[derive(Debug, Clone, Default)]
struct Pending {
    dir: Option<PathBuf>,
    no_print: bool,
    timeout: Option<Duration>,
}

/// Per-invocation task context
#[derive(Debug, Clone)]
pub struct Context {
    settings: Settings,
    env: BTreeMap<String, String>,
    completions: Vec<String>,
    args: Vec<String>,
    console_log: bool,
    working_dir: Option<PathBuf>,
    pending: Pending,
}

impl Context {
    /// Create an empty context
    pub fn new() -> Self {
        Context {
            settings: Settings::new(),
            env: BTreeMap::new(),
            completions: Vec::new(),
            args: Vec::new(),
            console_log: true,
            working_dir: None,
            pending: Pending::default(),
        }
    }

    /// Get a setting, or the empty string when unset
    pub fn get(&self, key: &str) -> String {
        self.settings.get(key).cloned().unwrap_or_default()
    }

    /// Set a setting
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.settings.insert(key.into(), value.into());
        self
    }

    /// Get an environment value: the context's own entries first, then the
    /// process environment
    pub fn getenv(&self, key: &str) -> String {
        match self.env.get(key) {
            Some(value) => value.clone(),
            None => env::var(key).unwrap_or_default(),
        }
    }

    /// Set an environment value exported to every later command
    pub fn setenv(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.setenv_with(key, value, &[])
    }

    pub fn setenv_with(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
        opts: &[EnvFlag],
    ) -> &mut Self {
        if opts.contains(&EnvFlag::Reset) {
            self.env.clear();
        }
        self.env.insert(key.into(), value.into());
        self
    }

    /// Select settings by key; an empty selection returns every setting
    pub fn get_settings(&self, keys: &[&str]) -> Settings {
        if keys.is_empty() {
            return self.settings.clone();
        }
        keys.iter()
            .filter_map(|key| {
                self.settings
                    .get(*key)
                    .map(|value| (key.to_string(), value.clone()))
            })
            .collect()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Extra words offered for shell completion
    pub fn autocomplete<I, S>(&mut self, opts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.completions = opts.into_iter().map(Into::into).collect();
    }

    pub fn completions(&self) -> &[String] {
        &self.completions
    }

    /// Arguments following the task name on the command line
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub(super) fn set_args(&mut self, args: Vec<String>) {
        self.args = args;
    }

    /// Whether commands echo themselves and their output to the console
    pub fn console_log(&self) -> bool {
        self.console_log
    }

    pub(super) fn set_console_log(&mut self, enabled: bool) {
        self.console_log = enabled;
    }

    /// Expand `#{key}` and `#{key|q}` placeholders with settings values
    pub fn format(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("#{") {
            out.push_str(&rest[..start]);
            rest = &rest[start..];

            let end = match rest.find('}') {
                Some(end) => end,
                None => break,
            };

            let placeholder = &rest[2..end];
            match placeholder.strip_suffix("|q") {
                Some(key) if !key.is_empty() => out.push_str(&quote(&self.get(key))),
                _ => out.push_str(&self.get(placeholder)),
            }
            rest = &rest[end + 1..];
        }

        out.push_str(rest);
        out
    }

    /// Change the working directory of every later command
    pub fn chdir(&mut self, path: impl Into<PathBuf>) {
        self.working_dir = Some(path.into());
    }

    /// Run the next command in `path`
    pub fn dir(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.pending.dir = Some(path.into());
        self
    }

    /// Do not relay the next command's output
    pub fn no_print(&mut self) -> &mut Self {
        self.pending.no_print = true;
        self
    }

    /// Kill the next command once `duration` elapses
    pub fn timeout(&mut self, duration: Duration) -> &mut Self {
        self.pending.timeout = Some(duration);
        self
    }

    /// Print a message while console logging is enabled
    pub fn log(&self, msg: &str) {
        if self.console_log {
            eprintln!("[LOG] {}", msg);
        }
    }

    /// Run a command on the local machine
    pub fn local(&mut self, cmd: &str) -> Response {
        self.execute(cmd, Invocation::shell(cmd), false)
    }

    /// Run a command on the `host` setting over ssh, or locally when unset
    pub fn run(&mut self, cmd: &str) -> Response {
        match self.remote_argv(cmd) {
            Some(argv) => self.execute(cmd, Invocation::new(argv), true),
            None => self.local(cmd),
        }
    }

    /// Run a command through sudo
    pub fn sudo(&mut self, cmd: &str) -> Response {
        let wrapped = format!("sudo -- sh -c {}", shell_quote(cmd));
        self.run(&wrapped)
    }

    /// Pipe a script into `sh -s`
    pub fn run_script(&mut self, script: &str) -> Response {
        let remote = self.remote_argv("sh -s");
        let is_remote = remote.is_some();
        let argv = remote.unwrap_or_else(|| vec!["sh".to_string(), "-s".to_string()]);
        let mut inv = Invocation::new(argv);
        inv.stdin = Some(script.to_string());
        self.execute("<script>", inv, is_remote)
    }

    fn remote_argv(&self, cmd: &str) -> Option<Vec<String>> {
        let host = self.settings.get("host").filter(|h| !h.is_empty())?;
        let target = match self.settings.get("user").filter(|u| !u.is_empty()) {
            Some(user) => format!("{}@{}", user, host),
            None => host.clone(),
        };

        let mut argv = vec!["ssh".to_string()];
        if let Some(port) = self.settings.get("port").filter(|p| !p.is_empty()) {
            argv.push("-p".to_string());
            argv.push(port.clone());
        }
        argv.push(target);
        argv.push("--".to_string());

        let mut remote = String::new();
        if let Some(dir) = self.pending.dir.as_ref().or(self.working_dir.as_ref()) {
            remote.push_str(&format!("cd {} && ", shell_quote(&dir.to_string_lossy())));
        }
        for (key, value) in &self.env {
            remote.push_str(&format!("{}={} ", key, shell_quote(value)));
        }
        remote.push_str(cmd);
        argv.push(remote);

        Some(argv)
    }

    /// Apply pending modifiers and run; remote invocations already carry
    /// their directory in the remote command line
    fn execute(&mut self, echo: &str, mut inv: Invocation, remote: bool) -> Response {
        let pending = std::mem::take(&mut self.pending);

        if !remote {
            inv.dir = pending.dir.or_else(|| self.working_dir.clone());
        }
        inv.env = self.env.clone();
        inv.print = !pending.no_print;
        inv.timeout = pending.timeout;

        if inv.print && self.console_log {
            eprintln!("[RUN] {}", echo);
        }

        inv.execute()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

/// Wrap `s` in double quotes, escaping embedded double quotes
pub fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_new() {
        let ctx = Context::new();
        assert!(ctx.settings().is_empty());
        assert!(ctx.completions().is_empty());
        assert!(ctx.args().is_empty());
        assert_eq!(ctx.get("missing"), "");
    }

    #[test]
    fn test_set_and_get() {
        let mut ctx = Context::new();
        ctx.set("name", "bolt").set("port", String::from("22"));
        assert_eq!(ctx.get("name"), "bolt");
        assert_eq!(ctx.get("port"), "22");
    }

    #[test]
    fn test_getenv_prefers_context_env() {
        env::set_var("BOLT_CTX_TEST_VAR", "process");
        let mut ctx = Context::new();
        assert_eq!(ctx.getenv("BOLT_CTX_TEST_VAR"), "process");

        ctx.setenv("BOLT_CTX_TEST_VAR", "context");
        assert_eq!(ctx.getenv("BOLT_CTX_TEST_VAR"), "context");
        env::remove_var("BOLT_CTX_TEST_VAR");
    }

    #[test]
    fn test_setenv_reset() {
        let mut ctx = Context::new();
        ctx.setenv("A_BOLT_VAR", "1");
        ctx.setenv_with("B_BOLT_VAR", "2", &[EnvFlag::Reset]);
        assert_eq!(ctx.getenv("A_BOLT_VAR"), "");
        assert_eq!(ctx.getenv("B_BOLT_VAR"), "2");
    }

    #[test]
    fn test_get_settings_selection() {
        let mut ctx = Context::new();
        ctx.set("host", "example.com").set("user", "admin");

        let selected = ctx.get_settings(&["host", "missing"]);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected.get("host"), Some(&"example.com".to_string()));
        assert_eq!(ctx.get_settings(&[]).len(), 2);
    }

    #[test]
    fn test_format_substitutes_settings() {
        let mut ctx = Context::new();
        ctx.set("name", "world");
        assert_eq!(ctx.format("hello #{name}!"), "hello world!");
        assert_eq!(ctx.format("#{missing}x"), "x");
    }

    #[test]
    fn test_format_quoted() {
        let mut ctx = Context::new();
        ctx.set("name", "a\"b");
        assert_eq!(ctx.format("hi #{name|q}"), "hi \"a\\\"b\"");
    }

    #[test]
    fn test_format_unterminated_placeholder() {
        let mut ctx = Context::new();
        ctx.set("a", "1");
        assert_eq!(ctx.format("#{a} and #{b"), "1 and #{b");
    }

    #[test]
    fn test_format_mixed() {
        let mut ctx = Context::new();
        ctx.set("moo", "x");
        ctx.set("blah", r#"foo" bar\""#);
        assert_eq!(
            ctx.format("foo bar '#{host}' ho ho #{blah|q} #{moo}"),
            r#"foo bar '' ho ho "foo\" bar\\"" x"#
        );
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("plain"), "\"plain\"");
        assert_eq!(quote("say \"hi\""), "\"say \\\"hi\\\"\"");
    }

    #[test]
    fn test_local_command_uses_env_and_pending_options() {
        let mut ctx = Context::new();
        ctx.set_console_log(false);
        ctx.setenv("BOLT_LOCAL_TEST", "exported");

        let response = ctx.no_print().local("echo $BOLT_LOCAL_TEST");
        assert!(response.success);
        assert_eq!(response.stdout_str(), "exported\n");
    }

    #[test]
    fn test_pending_options_are_one_shot() {
        let mut ctx = Context::new();
        ctx.set_console_log(false);

        let response = ctx
            .no_print()
            .timeout(Duration::from_millis(50))
            .local("exec sleep 5");
        assert!(response.timeout);

        let response = ctx.no_print().local("true");
        assert!(response.success);
        assert!(!response.timeout);
    }

    #[test]
    fn test_run_without_host_is_local() {
        let mut ctx = Context::new();
        ctx.set_console_log(false);

        let response = ctx.no_print().run("echo local");
        assert!(response.success);
        assert_eq!(response.stdout_str(), "local\n");
    }

    #[test]
    fn test_remote_argv() {
        let mut ctx = Context::new();
        ctx.set("host", "example.com").set("user", "deploy").set("port", "2222");
        ctx.chdir("/srv/app");

        let argv = ctx.remote_argv("ls").unwrap();
        assert_eq!(
            argv,
            vec![
                "ssh".to_string(),
                "-p".to_string(),
                "2222".to_string(),
                "deploy@example.com".to_string(),
                "--".to_string(),
                "cd '/srv/app' && ls".to_string(),
            ]
        );
    }

    #[test]
    fn test_run_script() {
        let mut ctx = Context::new();
        ctx.set_console_log(false);

        let response = ctx.no_print().run_script("x=3\necho $x\n");
        assert!(response.success);
        assert_eq!(response.stdout_str(), "3\n");
    }
}
