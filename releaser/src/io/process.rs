//! External process execution.
//!
//! [`ProcessRunner`] is the only way the release pipeline reaches the
//! version-control tool. [`SystemRunner`] spawns real processes; tests use
//! `test_support::ScriptedRunner`, which records invocations instead.

use std::io::{ErrorKind, Read, Write};
use std::path::Path;
use std::process::{ChildStdin, Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, anyhow};
use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

use crate::error::{ReleaseError, Result};

/// Default bound on captured stdout/stderr kept in memory per stream.
pub const DEFAULT_OUTPUT_LIMIT_BYTES: usize = 1_000_000;

/// Runs one external command to completion in a working directory.
pub trait ProcessRunner {
    /// Returns captured stdout on a zero exit status.
    ///
    /// Launch failures, non-zero exits, and timeouts are all reported as
    /// [`ReleaseError::ExternalTool`].
    fn run(&self, program: &str, args: &[&str], workdir: &Path) -> Result<String>;
}

impl<R: ProcessRunner + ?Sized> ProcessRunner for &R {
    fn run(&self, program: &str, args: &[&str], workdir: &Path) -> Result<String> {
        (**self).run(program, args, workdir)
    }
}

/// Spawns real child processes.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    timeout: Option<Duration>,
    output_limit_bytes: usize,
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self {
            timeout: None,
            output_limit_bytes: DEFAULT_OUTPUT_LIMIT_BYTES,
        }
    }
}

impl SystemRunner {
    /// `timeout: None` waits for the child indefinitely.
    pub fn new(timeout: Option<Duration>, output_limit_bytes: usize) -> Self {
        Self {
            timeout,
            output_limit_bytes,
        }
    }
}

impl ProcessRunner for SystemRunner {
    #[instrument(skip_all, fields(program = %program, workdir = %workdir.display()))]
    fn run(&self, program: &str, args: &[&str], workdir: &Path) -> Result<String> {
        let command_line = render_command(program, args);
        let failure = |message: String| ReleaseError::ExternalTool {
            command: command_line.clone(),
            workdir: workdir.to_path_buf(),
            message,
        };

        let mut cmd = Command::new(program);
        cmd.args(args).current_dir(workdir);
        let output = run_command(cmd, None, self.timeout, self.output_limit_bytes)
            .map_err(|err| failure(format!("{err:#}")))?;

        if output.timed_out {
            return Err(failure(format!(
                "timed out after {}s",
                self.timeout.map(|t| t.as_secs()).unwrap_or_default()
            )));
        }
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            let message = if stderr.is_empty() {
                format!("exited with status {:?}", output.status.code())
            } else {
                format!("exited with status {:?}: {stderr}", output.status.code())
            };
            return Err(failure(message));
        }
        debug!(command = %command_line, "command succeeded");
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Render `program args...` for error messages and logs.
pub fn render_command(program: &str, args: &[&str]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        if arg.is_empty() || arg.contains(char::is_whitespace) {
            line.push_str(&format!("{arg:?}"));
        } else {
            line.push_str(arg);
        }
    }
    line
}

/// Captured child process output.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub stdout_truncated: usize,
    pub stderr_truncated: usize,
    pub timed_out: bool,
}

/// Run a command, optionally feeding stdin and enforcing a timeout, and capture
/// stdout/stderr without risking pipe deadlocks.
///
/// Output is read concurrently while the child runs. `output_limit_bytes` bounds the amount of
/// stdout/stderr stored in memory (bytes beyond this are discarded while still draining the pipe).
#[instrument(skip_all, fields(timeout_secs = timeout.map(|t| t.as_secs()), output_limit_bytes))]
pub fn run_command(
    mut cmd: Command,
    stdin: Option<&[u8]>,
    timeout: Option<Duration>,
    output_limit_bytes: usize,
) -> anyhow::Result<CommandOutput> {
    if stdin.is_some() {
        cmd.stdin(Stdio::piped());
    } else {
        cmd.stdin(Stdio::null());
    }
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

    debug!("spawning child process");
    let mut child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => {
            error!(err = %e, "failed to spawn command");
            return Err(e).context("spawn command");
        }
    };

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;

    let stdout_handle = thread::spawn(move || read_stream_limited(stdout, output_limit_bytes));
    let stderr_handle = thread::spawn(move || read_stream_limited(stderr, output_limit_bytes));

    // The timeout must still apply while stdin is being written.
    let stdin_handle = match (stdin, child.stdin.take()) {
        (Some(input), Some(child_stdin)) => {
            let input = input.to_vec();
            Some(thread::spawn(move || write_stdin(child_stdin, &input)))
        }
        _ => None,
    };

    let mut timed_out = false;
    let status = match timeout {
        None => child.wait().context("wait for command")?,
        Some(limit) => match child.wait_timeout(limit).context("wait for command")? {
            Some(status) => status,
            None => {
                warn!(timeout_secs = limit.as_secs(), "command timed out, killing");
                timed_out = true;
                child.kill().context("kill command")?;
                child.wait().context("wait command after kill")?
            }
        },
    };

    if let Some(handle) = stdin_handle {
        match handle.join() {
            Ok(Ok(())) => {}
            Ok(Err(e)) if e.kind() == ErrorKind::BrokenPipe => {
                debug!("child closed stdin before reading all input");
            }
            Ok(Err(e)) => warn!(err = %e, "failed to write stdin"),
            Err(_) => warn!("stdin writer thread panicked"),
        }
    }

    let (stdout, stdout_truncated) = join_output(stdout_handle).context("join stdout")?;
    let (stderr, stderr_truncated) = join_output(stderr_handle).context("join stderr")?;

    if stdout_truncated > 0 || stderr_truncated > 0 {
        warn!(stdout_truncated, stderr_truncated, "output truncated");
    }

    debug!(exit_code = ?status.code(), timed_out, "command finished");
    Ok(CommandOutput {
        status,
        stdout,
        stderr,
        stdout_truncated,
        stderr_truncated,
        timed_out,
    })
}

/// Dropping `child_stdin` on return closes the pipe so the child sees EOF.
fn write_stdin(mut child_stdin: ChildStdin, input: &[u8]) -> std::io::Result<()> {
    child_stdin.write_all(input)?;
    child_stdin.flush()
}

fn join_output(
    handle: thread::JoinHandle<anyhow::Result<(Vec<u8>, usize)>>,
) -> anyhow::Result<(Vec<u8>, usize)> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(anyhow!("output reader thread panicked")),
    }
}

fn read_stream_limited<R: Read>(mut reader: R, limit: usize) -> anyhow::Result<(Vec<u8>, usize)> {
    let mut buf = Vec::new();
    let mut truncated = 0usize;
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).context("read output")?;
        if n == 0 {
            break;
        }
        let remaining = limit.saturating_sub(buf.len());
        if remaining > 0 {
            let keep = n.min(remaining);
            buf.extend_from_slice(&chunk[..keep]);
            truncated += n.saturating_sub(keep);
        } else {
            truncated += n;
        }
    }

    Ok((buf, truncated))
}
