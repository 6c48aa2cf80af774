//! Child process lifecycle management.

use std::process::{ExitStatus, Stdio};

use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStderr, ChildStdout, Command};

use super::env::EnvOverlay;
use crate::error::SubprocessError;

/// A spawned child process with piped standard output and standard error.
///
/// Both pipes are created before the child starts, so no output can be lost.
/// The parent holds only the read ends; they are released when taken by a
/// consumer or at the latest by [`close`](Self::close).
///
/// The handle exclusively owns the child's pid and streams. Dropping the
/// handle without closing it kills the child, so a process cannot outlive
/// the scope that spawned it.
#[derive(Debug)]
pub struct Process {
    pid: u32,
    command: String,
    child: Child,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
    exit_code: Option<i32>,
}

impl Process {
    /// Spawn a new child process.
    ///
    /// `args[0]` is the executable path or name, the remaining elements are
    /// passed as arguments. `env` is layered onto the inherited environment.
    ///
    /// # Errors
    ///
    /// [`SubprocessError::EmptyCommand`] if `args` is empty,
    /// [`SubprocessError::Spawn`] if pipe or process creation fails or the
    /// executable cannot be launched.
    pub fn spawn(args: &[String], env: &EnvOverlay) -> Result<Self, SubprocessError> {
        let (program, program_args) = args.split_first().ok_or(SubprocessError::EmptyCommand)?;
        let command_line = args.join(" ");

        let mut command = Command::new(program);
        command
            .args(program_args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if !env.is_empty() {
            command.env_clear();
            command.envs(env.resolved());
        }

        let mut child = command.spawn().map_err(|source| SubprocessError::Spawn {
            command: command_line.clone(),
            source,
        })?;

        let pid = child.id().ok_or_else(|| SubprocessError::Spawn {
            command: command_line.clone(),
            source: std::io::Error::other("child exited before its pid could be read"),
        })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        Ok(Self {
            pid,
            command: command_line,
            child,
            stdout,
            stderr,
            exit_code: None,
        })
    }

    /// Process identifier, stable for the lifetime of this handle
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Take ownership of the child's standard output stream.
    ///
    /// Yields the stream at most once; subsequent calls return `None`.
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.stdout.take()
    }

    /// Take ownership of the child's standard error stream.
    ///
    /// Yields the stream at most once; subsequent calls return `None`.
    pub fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.stderr.take()
    }

    /// Wait for the child to terminate and return its exit code.
    ///
    /// Releases both pipe read ends before waiting, so a child blocked
    /// writing into a full pipe can still terminate. Idempotent: repeated
    /// calls return the cached exit code without waiting again.
    ///
    /// A child terminated by a signal reports the signal number as its exit
    /// code, indistinguishable from a genuine exit code of equal value.
    pub async fn close(&mut self) -> Result<i32, SubprocessError> {
        if let Some(code) = self.exit_code {
            return Ok(code);
        }

        self.stdout.take();
        self.stderr.take();

        let status = self.child.wait().await.map_err(|e| SubprocessError::Wait {
            pid: self.pid,
            reason: e.to_string(),
        })?;

        let code = decode_exit_status(self.pid, status)?;
        self.exit_code = Some(code);
        Ok(code)
    }

    /// Deliver `signal` to the child, then reap it.
    ///
    /// The decoded exit status is cached, so a later [`close`](Self::close)
    /// returns it without waiting on the already-reaped pid.
    #[cfg(unix)]
    pub async fn kill(&mut self, signal: nix::sys::signal::Signal) -> Result<(), SubprocessError> {
        nix::sys::signal::kill(nix::unistd::Pid::from_raw(self.pid as i32), signal).map_err(
            |errno| SubprocessError::Kill {
                pid: self.pid,
                reason: errno.to_string(),
            },
        )?;

        self.stdout.take();
        self.stderr.take();

        let status = self.child.wait().await.map_err(|e| SubprocessError::Kill {
            pid: self.pid,
            reason: format!("failed to reap killed child: {e}"),
        })?;

        self.exit_code = Some(decode_exit_status(self.pid, status)?);
        Ok(())
    }

    /// Non-blocking liveness check.
    ///
    /// If the child has meanwhile exited, performs the same stream release
    /// and status caching as [`close`](Self::close) and returns `false`;
    /// otherwise returns `true` without blocking.
    pub fn is_running(&mut self) -> Result<bool, SubprocessError> {
        if self.exit_code.is_some() {
            return Ok(false);
        }

        match self.child.try_wait() {
            Ok(None) => Ok(true),
            Ok(Some(status)) => {
                self.stdout.take();
                self.stderr.take();
                self.exit_code = Some(decode_exit_status(self.pid, status)?);
                Ok(false)
            }
            Err(e) => Err(SubprocessError::Wait {
                pid: self.pid,
                reason: e.to_string(),
            }),
        }
    }

    /// Run the child to completion and return its full standard output text.
    ///
    /// Standard error is captured in a background task while standard output
    /// is drained in the foreground, so neither stream can fill its pipe
    /// buffer and block the child.
    ///
    /// # Errors
    ///
    /// [`SubprocessError::NonZeroExit`] carrying the exit code and the
    /// captured standard error text if the child exits nonzero.
    pub async fn check_output(mut self) -> Result<String, SubprocessError> {
        let stderr_task = self.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut captured = Vec::new();
                let _ = stderr.read_to_end(&mut captured).await;
                String::from_utf8_lossy(&captured).into_owned()
            })
        });

        let mut stdout_text = String::new();
        if let Some(mut stdout) = self.stdout.take() {
            let mut captured = Vec::new();
            let _ = stdout.read_to_end(&mut captured).await;
            stdout_text = String::from_utf8_lossy(&captured).into_owned();
        }

        let code = self.close().await?;

        let stderr_text = match stderr_task {
            Some(handle) => handle.await.unwrap_or_default(),
            None => String::new(),
        };

        if code != 0 {
            return Err(SubprocessError::NonZeroExit {
                command: self.command.clone(),
                code,
                stderr: stderr_text,
            });
        }

        Ok(stdout_text)
    }
}

/// Decode a wait status into an exit code.
///
/// Exactly one of exited-normally or terminated-by-signal must hold; any
/// other state is an internal invariant violation.
fn decode_exit_status(pid: u32, status: ExitStatus) -> Result<i32, SubprocessError> {
    if let Some(code) = status.code() {
        return Ok(code);
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;

        if let Some(signal) = status.signal() {
            return Ok(signal);
        }
    }

    Err(SubprocessError::Wait {
        pid,
        reason: format!("child reported an unrecognized exit status: {status:?}"),
    })
}
