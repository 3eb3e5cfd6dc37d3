//! Helpers for running child processes with timeouts and bounded output.

use std::ffi::OsString;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, info, instrument, warn};
use wait_timeout::ChildExt;

/// A fully described child process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub cwd: PathBuf,
    pub envs: Vec<(OsString, OsString)>,
    pub env_removes: Vec<OsString>,
}

impl CommandSpec {
    pub fn new(program: impl Into<OsString>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
            envs: Vec::new(),
            env_removes: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn env_remove(mut self, key: impl Into<OsString>) -> Self {
        self.env_removes.push(key.into());
        self
    }

    /// Shell-like rendering for logs and dry-run output.
    pub fn display(&self) -> String {
        std::iter::once(&self.program)
            .chain(&self.args)
            .map(|part| part.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).current_dir(&self.cwd);
        for key in &self.env_removes {
            cmd.env_remove(key);
        }
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }
        cmd
    }
}

/// Captured child process output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    /// Exit code; `None` when killed by a signal.
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub stdout_truncated: usize,
    pub stderr_truncated: usize,
    pub timed_out: bool,
}

impl CapturedOutput {
    pub fn success(&self) -> bool {
        !self.timed_out && self.code == Some(0)
    }

    /// Last `max_bytes` of stderr (lossy UTF-8), for error messages.
    pub fn stderr_tail(&self, max_bytes: usize) -> String {
        let start = self.stderr.len().saturating_sub(max_bytes);
        String::from_utf8_lossy(&self.stderr[start..])
            .trim()
            .to_string()
    }
}

/// Seam between orchestration and real process execution.
pub trait CommandRunner {
    /// Run to completion with captured, bounded output.
    fn capture(
        &self,
        spec: &CommandSpec,
        timeout: Duration,
        output_limit_bytes: usize,
    ) -> Result<CapturedOutput>;

    /// Run attached to the terminal and return the exit code.
    fn interactive(&self, spec: &CommandSpec) -> Result<Option<i32>>;
}

/// Runs commands as real child processes.
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn capture(
        &self,
        spec: &CommandSpec,
        timeout: Duration,
        output_limit_bytes: usize,
    ) -> Result<CapturedOutput> {
        debug!(command = %spec.display(), cwd = %spec.cwd.display(), "running captured command");
        run_command_with_timeout(spec.to_command(), timeout, output_limit_bytes)
            .with_context(|| format!("run {}", spec.display()))
    }

    fn interactive(&self, spec: &CommandSpec) -> Result<Option<i32>> {
        run_command_interactive(spec.to_command())
            .with_context(|| format!("run {}", spec.display()))
    }
}

/// Run a command with a timeout and capture stdout/stderr without risking pipe deadlocks.
///
/// Output is read concurrently while the child runs. `output_limit_bytes` bounds the amount of
/// stdout/stderr stored in memory (bytes beyond this are discarded while still draining the pipe).
#[instrument(skip_all, fields(timeout_secs = timeout.as_secs(), output_limit_bytes))]
pub fn run_command_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    output_limit_bytes: usize,
) -> Result<CapturedOutput> {
    cmd.stdin(Stdio::null());
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

    let mut timed_out = false;
    let status = match child.wait_timeout(timeout).context("wait for command")? {
        Some(status) => status,
        None => {
            warn!(
                timeout_secs = timeout.as_secs(),
                "command timed out, killing"
            );
            timed_out = true;
            child.kill().context("kill command")?;
            child.wait().context("wait command after kill")?
        }
    };

    let (stdout, stdout_truncated) = join_output(stdout_handle).context("join stdout")?;
    let (stderr, stderr_truncated) = join_output(stderr_handle).context("join stderr")?;

    if stdout_truncated > 0 || stderr_truncated > 0 {
        warn!(stdout_truncated, stderr_truncated, "output truncated");
    }

    debug!(exit_code = ?status.code(), timed_out, "command finished");
    Ok(CapturedOutput {
        code: status.code(),
        stdout,
        stderr,
        stdout_truncated,
        stderr_truncated,
        timed_out,
    })
}

/// Run a command with inherited stdio and wait for it to exit.
#[instrument(skip_all)]
pub fn run_command_interactive(mut cmd: Command) -> Result<Option<i32>> {
    info!("starting interactive child process");
    let status = cmd.status().context("spawn command")?;
    debug!(exit_code = ?status.code(), "interactive command finished");
    Ok(status.code())
}

fn join_output(handle: thread::JoinHandle<Result<(Vec<u8>, usize)>>) -> Result<(Vec<u8>, usize)> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(anyhow!("output reader thread panicked")),
    }
}

fn read_stream_limited<R: Read>(mut reader: R, limit: usize) -> Result<(Vec<u8>, usize)> {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_stream_limited_truncates_beyond_limit() {
        let data = vec![b'x'; 20_000];
        let (kept, truncated) = read_stream_limited(data.as_slice(), 100).expect("read");
        assert_eq!(kept.len(), 100);
        assert_eq!(truncated, 19_900);
    }

    #[test]
    fn spec_display_joins_program_and_args() {
        let spec = CommandSpec::new("python3", "/proj").arg("-m").arg("venv").arg("venv");
        assert_eq!(spec.display(), "python3 -m venv venv");
    }

    #[test]
    fn stderr_tail_keeps_the_end() {
        let out = CapturedOutput {
            stderr: b"first line\nERROR: no matching distribution\n".to_vec(),
            ..CapturedOutput::default()
        };
        assert_eq!(out.stderr_tail(32), "ERROR: no matching distribution");
    }

    #[test]
    fn success_requires_zero_exit_and_no_timeout() {
        let ok = CapturedOutput {
            code: Some(0),
            ..CapturedOutput::default()
        };
        let timed_out = CapturedOutput {
            code: Some(0),
            timed_out: true,
            ..CapturedOutput::default()
        };
        assert!(ok.success());
        assert!(!timed_out.success());
        assert!(!CapturedOutput::default().success());
    }

    #[cfg(unix)]
    #[test]
    fn captures_exit_code_and_output() {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("echo out; echo err >&2; exit 3");
        let out = run_command_with_timeout(cmd, Duration::from_secs(10), 1024).expect("run");
        assert_eq!(out.code, Some(3));
        assert_eq!(out.stdout, b"out\n");
        assert_eq!(out.stderr, b"err\n");
        assert!(!out.timed_out);
    }

    #[cfg(unix)]
    #[test]
    fn kills_command_on_timeout() {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("exec sleep 5");
        let out = run_command_with_timeout(cmd, Duration::from_millis(100), 1024).expect("run");
        assert!(out.timed_out);
        assert!(!out.success());
    }
}
