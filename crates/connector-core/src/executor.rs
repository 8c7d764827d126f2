//! Direct execution of accepted mount commands.
//!
//! The first token is the program and the rest are passed as literal
//! arguments. No shell is involved, so metacharacters reach the program
//! untouched.

use std::future::Future;
use std::process::{ExitStatus, Stdio};

use thiserror::Error;

/// Failure to run a command or a nonzero exit.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The command had no program token.
    #[error("failed to run cmd: empty command")]
    Empty,

    /// The program could not be started.
    #[error("failed to run cmd: {args:?}, with error: {source}")]
    Spawn {
        /// Full argument list.
        args: Vec<String>,
        /// Underlying spawn error.
        source: std::io::Error,
    },

    /// The program ran and exited unsuccessfully.
    #[error("failed to run cmd: {args:?}, with out: {output:?}, with error: {status}")]
    Exited {
        /// Full argument list.
        args: Vec<String>,
        /// Captured stdout followed by stderr.
        output: String,
        /// Exit status of the program.
        status: ExitStatus,
    },
}

/// Runs accepted commands on behalf of the daemon.
///
/// The daemon holds one runner for its whole lifetime and shares it across
/// connection handlers.
pub trait CommandRunner: Send + Sync + 'static {
    /// Runs `args` and returns its captured output.
    ///
    /// # Errors
    ///
    /// Returns an [`ExecError`] if the program cannot be started or exits
    /// with a failure status.
    fn run(&self, args: &[String]) -> impl Future<Output = Result<String, ExecError>> + Send;
}

/// Runner that spawns the command as a child process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, args: &[String]) -> impl Future<Output = Result<String, ExecError>> + Send {
        run_command(args)
    }
}

/// Spawns `args[0]` with `args[1..]` and waits for it to finish.
///
/// Returns stdout followed by stderr.
///
/// # Errors
///
/// Returns an [`ExecError`] if `args` is empty, the program cannot be
/// spawned, or it exits with a failure status.
pub async fn run_command(args: &[String]) -> Result<String, ExecError> {
    let (program, rest) = args.split_first().ok_or(ExecError::Empty)?;
    tracing::info!(cmd = ?args, "running command");

    let output = tokio::process::Command::new(program)
        .args(rest)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| ExecError::Spawn {
            args: args.to_vec(),
            source: e,
        })?;

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    if output.status.success() {
        Ok(combined)
    } else {
        Err(ExecError::Exited {
            args: args.to_vec(),
            output: combined,
            status: output.status,
        })
    }
}
