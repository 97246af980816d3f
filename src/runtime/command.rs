//! Command execution
//!
//! This module runs shell commands on behalf of tasks and captures their
//! output into a [`Response`].

use std::collections::BTreeMap;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command as StdCommand, ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Interval between exit checks while a command runs under a timeout
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How long output readers may keep running after a timed-out command is killed
const READER_GRACE: Duration = Duration::from_millis(500);

/// Captured outcome of a command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub success: bool,
    pub timeout: bool,
}

impl Response {
    /// Standard output as (lossy) UTF-8
    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Standard error as (lossy) UTF-8
    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    fn failed(error: io::Error) -> Self {
        Response {
            stderr: error.to_string().into_bytes(),
            ..Response::default()
        }
    }
}

/// A fully resolved command, ready to spawn
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Program and arguments
    pub argv: Vec<String>,

    /// Text fed to the child's standard input
    pub stdin: Option<String>,

    /// Working directory
    pub dir: Option<PathBuf>,

    /// Extra environment variables
    pub env: BTreeMap<String, String>,

    /// Relay captured output to the console
    pub print: bool,

    pub timeout: Option<Duration>,
}

impl Invocation {
    /// Create an invocation running `cmd` through `sh -c`
    pub fn shell(cmd: &str) -> Self {
        Invocation::new(vec!["sh".to_string(), "-c".to_string(), cmd.to_string()])
    }

    pub fn new(argv: Vec<String>) -> Self {
        Invocation {
            argv,
            stdin: None,
            dir: None,
            env: BTreeMap::new(),
            print: true,
            timeout: None,
        }
    }

    /// Spawn the command and wait for it, capturing its output
    pub fn execute(&self) -> Response {
        let (program, args) = match self.argv.split_first() {
            Some(split) => split,
            None => {
                return Response::failed(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "empty command",
                ))
            }
        };

        let mut command = StdCommand::new(program);
        command.args(args);

        if let Some(dir) = &self.dir {
            command.current_dir(dir);
        }

        for (key, value) in &self.env {
            command.env(key, value);
        }

        command.stdin(if self.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());

        // A timed command leads its own process group so the whole group
        // can be killed at the deadline.
        let group = self.timeout.is_some();
        #[cfg(unix)]
        {
            if group {
                use std::os::unix::process::CommandExt;
                command.process_group(0);
            }
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => return Response::failed(e),
        };

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());
        if let (Some(input), Some(pipe)) = (&self.stdin, child.stdin.take()) {
            feed(pipe, input.clone());
        }

        let response = match wait_with_timeout(&mut child, self.timeout, group) {
            Ok((status, timeout)) => Response {
                stdout: collect(stdout, timeout),
                stderr: collect(stderr, timeout),
                success: status.success() && !timeout,
                timeout,
            },
            Err(e) => Response::failed(e),
        };

        if self.print {
            let _ = io::stdout().write_all(&response.stdout);
            let _ = io::stderr().write_all(&response.stderr);
        }

        response
    }
}

/// Wait for the child, killing it once `timeout` elapses. Returns the exit
/// status and whether the deadline was hit.
fn wait_with_timeout(
    child: &mut Child,
    timeout: Option<Duration>,
    group: bool,
) -> io::Result<(ExitStatus, bool)> {
    let deadline = match timeout {
        Some(timeout) => Instant::now() + timeout,
        None => return Ok((child.wait()?, false)),
    };

    loop {
        if let Some(status) = child.try_wait()? {
            return Ok((status, false));
        }
        if Instant::now() >= deadline {
            terminate(child, group);
            return Ok((child.wait()?, true));
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Kill the child, and its process group when it leads one
fn terminate(child: &mut Child, group: bool) {
    #[cfg(unix)]
    {
        if group {
            let pgid = format!("-{}", child.id());
            let _ = StdCommand::new("kill")
                .args(["-s", "KILL", "--", pgid.as_str()])
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status();
        }
    }
    #[cfg(not(unix))]
    let _ = group;

    let _ = child.kill();
}

/// Join a reader thread. After a timeout the reader may be stuck behind a
/// process that escaped the kill, so it only gets a short grace period.
fn collect(reader: Reader, timed_out: bool) -> Vec<u8> {
    if timed_out {
        let grace = Instant::now() + READER_GRACE;
        while !reader.handle.is_finished() && Instant::now() < grace {
            thread::sleep(POLL_INTERVAL);
        }
        if !reader.handle.is_finished() {
            return reader.take_partial();
        }
    }
    reader.handle.join().unwrap_or_default()
}

/// Feed `input` to the child from its own thread, so that a child writing
/// more than a pipe buffer before reading all of its input cannot deadlock
fn feed(mut pipe: ChildStdin, input: String) {
    thread::spawn(move || {
        // A child that exits without reading its input closes the pipe early.
        let _ = pipe.write_all(input.as_bytes());
    });
}

/// A thread reading one of the child's output pipes
struct Reader {
    handle: thread::JoinHandle<Vec<u8>>,
    partial: Arc<Mutex<Vec<u8>>>,
}

impl Reader {
    fn take_partial(&self) -> Vec<u8> {
        match self.partial.lock() {
            Ok(mut buf) => std::mem::take(&mut *buf),
            Err(_) => Vec::new(),
        }
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Reader {
    let partial = Arc::new(Mutex::new(Vec::new()));
    let shared = Arc::clone(&partial);
    let handle = thread::spawn(move || {
        let mut chunk = [0u8; 8192];
        if let Some(mut pipe) = pipe {
            loop {
                match pipe.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => match shared.lock() {
                        Ok(mut buf) => buf.extend_from_slice(&chunk[..n]),
                        Err(_) => break,
                    },
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(_) => break,
                }
            }
        }
        match shared.lock() {
            Ok(mut buf) => std::mem::take(&mut *buf),
            Err(_) => Vec::new(),
        }
    });
    Reader { handle, partial }
}

/// Quote `s` for safe use as a single POSIX shell word
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet(cmd: &str) -> Invocation {
        let mut inv = Invocation::shell(cmd);
        inv.print = false;
        inv
    }

    #[test]
    fn test_execute_simple_command() {
        let response = quiet("echo test").execute();
        assert!(response.success);
        assert!(!response.timeout);
        assert_eq!(response.stdout_str(), "test\n");
    }

    #[test]
    fn test_execute_captures_stderr() {
        let response = quiet("echo oops >&2").execute();
        assert!(response.success);
        assert!(response.stdout.is_empty());
        assert_eq!(response.stderr_str(), "oops\n");
    }

    #[test]
    fn test_execute_failing_command() {
        let response = quiet("false").execute();
        assert!(!response.success);
        assert!(!response.timeout);
    }

    #[test]
    fn test_execute_with_env_and_dir() {
        let temp_dir = std::env::temp_dir();
        let mut inv = quiet("echo $BOLT_TEST_VALUE; pwd");
        inv.env.insert("BOLT_TEST_VALUE".to_string(), "hello".to_string());
        inv.dir = Some(temp_dir.clone());

        let response = inv.execute();
        let out = response.stdout_str();
        let mut lines = out.lines();
        assert_eq!(lines.next(), Some("hello"));
        let pwd = PathBuf::from(lines.next().unwrap());
        assert_eq!(
            pwd.canonicalize().unwrap(),
            temp_dir.canonicalize().unwrap()
        );
    }

    #[test]
    fn test_execute_with_stdin() {
        let mut inv = Invocation::new(vec!["sh".to_string(), "-s".to_string()]);
        inv.print = false;
        inv.stdin = Some("echo from-script\n".to_string());

        let response = inv.execute();
        assert!(response.success);
        assert_eq!(response.stdout_str(), "from-script\n");
    }

    #[test]
    fn test_execute_timeout_kills_command() {
        let mut inv = quiet("exec sleep 5");
        inv.timeout = Some(Duration::from_millis(100));

        let started = Instant::now();
        let response = inv.execute();
        assert!(response.timeout);
        assert!(!response.success);
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_execute_timeout_kills_background_children() {
        // `sh` forks `sleep`, which inherits the output pipes
        let mut inv = quiet("sleep 4; true");
        inv.timeout = Some(Duration::from_millis(200));

        let started = Instant::now();
        let response = inv.execute();
        assert!(response.timeout);
        assert!(!response.success);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_execute_large_script_with_large_output() {
        let mut script = String::from("head -c 300000 /dev/zero\n");
        for _ in 0..2000 {
            script.push('#');
            script.push_str(&"x".repeat(99));
            script.push('\n');
        }

        let mut inv = Invocation::new(vec!["sh".to_string(), "-s".to_string()]);
        inv.print = false;
        inv.stdin = Some(script);
        inv.timeout = Some(Duration::from_secs(20));

        let response = inv.execute();
        assert!(!response.timeout);
        assert!(response.success);
        assert_eq!(response.stdout.len(), 300000);
    }

    #[test]
    fn test_execute_missing_program() {
        let mut inv = Invocation::new(vec!["bolt-definitely-missing-program".to_string()]);
        inv.print = false;

        let response = inv.execute();
        assert!(!response.success);
        assert!(!response.stderr.is_empty());
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("ls"), "'ls'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }
}
