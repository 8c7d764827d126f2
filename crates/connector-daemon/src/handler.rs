//! Per-connection request handling.
//!
//! A connection carries exactly one request and receives exactly one
//! response:
//!
//! 1. Read a single payload of at most [`MAX_REQUEST_BYTES`] bytes.
//! 2. Split it on NUL into the command tokens and re-split those on
//!    whitespace.
//! 3. Validate. A rejected command is answered with `Fail: <reason>` and is
//!    never executed.
//! 4. Execute and answer `Success:<output>` or `Fail: <detail>`.

use std::fmt;
use std::time::Duration;

use connector_common::constants::{FAIL_PREFIX, MAX_REQUEST_BYTES, SUCCESS_PREFIX};
use connector_common::types::MountCommand;
use connector_core::executor::CommandRunner;
use connector_core::validator;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Transport failure that abandons a connection without a response.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The client sent nothing before the read timeout.
    #[error("no request received within {0:?}")]
    ReadTimeout(Duration),

    /// Reading the request failed.
    #[error("read failed: {0}")]
    Read(#[source] std::io::Error),

    /// Writing the response failed.
    #[error("write failed: {0}")]
    Write(#[source] std::io::Error),
}

/// Reply sent back to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// The command ran; carries its output.
    Success(String),
    /// The command was rejected or failed; carries the reason.
    Fail(String),
}

impl Response {
    /// Returns `true` for [`Response::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success(output) => write!(f, "{SUCCESS_PREFIX}{output}"),
            Self::Fail(reason) => write!(f, "{FAIL_PREFIX}{reason}"),
        }
    }
}

/// Validates `command` and, if accepted, runs it with `runner`.
///
/// The whitespace-normalized command is both validated and executed, so
/// the runner never sees an argument the grammar did not check.
pub async fn respond<R: CommandRunner>(command: &MountCommand, runner: &R) -> Response {
    let command = command.normalized();
    if let Err(rejection) = validator::validate(&command) {
        tracing::info!(reason = %rejection, "mount command rejected");
        return Response::Fail(rejection.to_string());
    }

    match runner.run(command.tokens()).await {
        Ok(output) => {
            tracing::info!(output = %output, "mount command succeeded");
            Response::Success(output)
        }
        Err(e) => {
            tracing::error!(error = %e, "mount command failed");
            Response::Fail(format!("{command}, error: {e}"))
        }
    }
}

/// Serves a single request on `stream`.
///
/// # Errors
///
/// Returns a [`HandlerError`] if the request cannot be read in time or the
/// response cannot be written.
pub async fn handle_connection<S, R>(
    mut stream: S,
    runner: &R,
    read_timeout: Duration,
) -> Result<Response, HandlerError>
where
    S: AsyncRead + AsyncWrite + Unpin,
    R: CommandRunner,
{
    let mut buf = vec![0_u8; MAX_REQUEST_BYTES + 1];
    let read = tokio::time::timeout(read_timeout, stream.read(&mut buf))
        .await
        .map_err(|_| HandlerError::ReadTimeout(read_timeout))?
        .map_err(HandlerError::Read)?;

    let response = if read > MAX_REQUEST_BYTES {
        tracing::warn!(limit = MAX_REQUEST_BYTES, "request too large");
        Response::Fail(format!("request exceeds {MAX_REQUEST_BYTES} bytes"))
    } else {
        let command = MountCommand::from_wire(&buf[..read]);
        tracing::info!(args = ?command.tokens(), "received mount command");
        respond(&command, runner).await
    };

    stream
        .write_all(response.to_string().as_bytes())
        .await
        .map_err(HandlerError::Write)?;
    stream.flush().await.map_err(HandlerError::Write)?;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::sync::Mutex;

    use connector_core::executor::ExecError;

    use super::*;

    /// Records every command it is asked to run.
    #[derive(Default)]
    struct RecordingRunner {
        calls: Mutex<Vec<Vec<String>>>,
        fail: bool,
    }

    impl CommandRunner for RecordingRunner {
        fn run(&self, args: &[String]) -> impl Future<Output = Result<String, ExecError>> + Send {
            self.calls.lock().unwrap().push(args.to_vec());
            let result = if self.fail {
                Err(ExecError::Empty)
            } else {
                Ok("mounted".to_owned())
            };
            std::future::ready(result)
        }
    }

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn wire(tokens: &[&str]) -> Vec<u8> {
        MountCommand::new(tokens.iter().copied()).to_wire()
    }

    async fn exchange(payload: &[u8], runner: &RecordingRunner) -> (Response, String) {
        let (mut client, server) = tokio::io::duplex(8192);
        client.write_all(payload).await.unwrap();

        let response = handle_connection(server, runner, TIMEOUT).await.unwrap();
        let mut reply = String::new();
        let _ = client.read_to_string(&mut reply).await.unwrap();
        (response, reply)
    }

    #[tokio::test]
    async fn accepted_command_is_executed() {
        let dir = tempfile::tempdir().unwrap();
        let mnt = dir.path().to_str().unwrap();
        let runner = RecordingRunner::default();

        let payload = wire(&["ossfs", mnt, "-ourl=oss.example.com", "-o", "allow_other"]);
        let (response, reply) = exchange(&payload, &runner).await;

        assert!(response.is_success());
        assert_eq!(reply, "Success:mounted");
        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0][0], "ossfs");
        assert_eq!(calls[0].len(), 5);
    }

    #[tokio::test]
    async fn rejected_command_is_never_executed() {
        let runner = RecordingRunner::default();
        let payload = wire(&[
            "ossfs",
            "/mnt/no-such-pv1",
            "-ourl=oss.example.com",
            "-o",
            "allow_other",
        ]);
        let (response, reply) = exchange(&payload, &runner).await;

        assert!(!response.is_success());
        assert_eq!(reply, "Fail: Oss Options: mountpoint not exist /mnt/no-such-pv1");
        assert!(runner.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn option_hidden_inside_a_token_is_never_executed() {
        let dir = tempfile::tempdir().unwrap();
        let mnt = dir.path().to_str().unwrap();
        let runner = RecordingRunner::default();

        let command = MountCommand::new([
            "ossfs",
            mnt,
            "-ourl=oss.example.com",
            "-o",
            "allow_other -o",
            "--injected-flag",
            "-o",
            "ro -o",
            "/etc/extra-positional",
        ]);
        let response = respond(&command, &runner).await;

        assert!(!response.is_success(), "got: {response}");
        assert!(response.to_string().contains("--injected-flag"), "got: {response}");
        assert!(runner.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn runner_receives_the_validated_words() {
        let dir = tempfile::tempdir().unwrap();
        let mnt = dir.path().to_str().unwrap();
        let runner = RecordingRunner::default();

        let command = MountCommand::new([" ossfs", mnt, "-ourl=oss.example.com", "-o  allow_other"]);
        let response = respond(&command, &runner).await;

        assert!(response.is_success(), "got: {response}");
        let calls = runner.calls.lock().unwrap();
        assert_eq!(
            calls[0],
            ["ossfs", mnt, "-ourl=oss.example.com", "-o", "allow_other"]
        );
    }

    #[tokio::test]
    async fn execution_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mnt = dir.path().to_str().unwrap();
        let runner = RecordingRunner {
            fail: true,
            ..RecordingRunner::default()
        };

        let payload = wire(&["ossfs", mnt, "-ourl=oss.example.com", "-s"]);
        let (_, reply) = exchange(&payload, &runner).await;

        assert!(reply.starts_with("Fail: ossfs "), "got: {reply}");
        assert!(reply.contains(", error: failed to run cmd"), "got: {reply}");
    }

    #[tokio::test]
    async fn oversized_request_is_refused() {
        let runner = RecordingRunner::default();
        let payload = vec![b'a'; MAX_REQUEST_BYTES + 100];
        let (_, reply) = exchange(&payload, &runner).await;

        assert_eq!(reply, "Fail: request exceeds 2048 bytes");
        assert!(runner.calls.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn silent_client_times_out() {
        let runner = RecordingRunner::default();
        let (_client, server) = tokio::io::duplex(64);

        let err = handle_connection(server, &runner, TIMEOUT).await.unwrap_err();
        assert!(matches!(err, HandlerError::ReadTimeout(_)), "got: {err}");
    }

    #[test]
    fn response_wire_format() {
        assert_eq!(Response::Success("ok".into()).to_string(), "Success:ok");
        assert_eq!(Response::Fail("nope".into()).to_string(), "Fail: nope");
    }
}
