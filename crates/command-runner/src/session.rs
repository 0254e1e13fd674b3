//! One spawn-drain-wait cycle

use async_process::{Child, Stdio};
use chrono::Utc;
use futures_lite::future;
use futures_lite::io::AsyncRead;
use serde::Serialize;
use std::io;
use std::time::Instant;
use tracing::debug;

use crate::command::Invocation;
use crate::drain::{Drained, StreamDrainer};
use crate::error::{Error, Result};
use crate::event::{LogSource, OutputObserver};
use crate::process::ExitStatus;
use crate::result::{Diagnostic, DiagnosticKind, ExecutionResult, StreamCapture};

/// Where a runner is in its current cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Nothing has run since construction or the last reset
    Idle,
    /// The child is being created
    Spawning,
    /// The child could not be created; terminal
    SpawnFailed,
    /// The child exists and its pipes are wired
    Running,
    /// Both streams are being read while waiting for exit
    Draining,
    /// The run finished; terminal
    Completed(Completion),
}

/// How a completed run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Completion {
    /// Exited with code 0
    Success,
    /// Exited with a non-zero code, or a stream or wait fault occurred
    Failure,
    /// Killed by a signal or crashed
    AbnormalExit,
}

/// Owns the child and both drainers for the length of one run
pub(crate) struct ProcessSession<'a> {
    command_text: &'a str,
    observer: &'a dyn OutputObserver,
    state: RunState,
}

impl<'a> ProcessSession<'a> {
    pub(crate) fn new(command_text: &'a str, observer: &'a dyn OutputObserver) -> Self {
        Self {
            command_text,
            observer,
            state: RunState::Idle,
        }
    }

    /// Execute the command and return its result with the terminal state.
    ///
    /// Every pipe is closed and the child reaped before this returns.
    pub(crate) async fn run(mut self) -> (ExecutionResult, RunState) {
        let Some(invocation) = Invocation::parse(self.command_text) else {
            self.transition(RunState::SpawnFailed);
            let diagnostic =
                Diagnostic::new(DiagnosticKind::EmptyCommand, Error::EmptyCommand.to_string());
            return (
                ExecutionResult::not_started(self.command_text.to_string(), diagnostic),
                self.state,
            );
        };

        self.transition(RunState::Spawning);
        let started_at = Utc::now();
        let clock = Instant::now();

        let mut child = match spawn(&invocation) {
            Ok(child) => child,
            Err(e) => {
                debug!("spawn failed: {}", e);
                self.transition(RunState::SpawnFailed);
                return (
                    ExecutionResult::spawn_failed(self.command_text, e.to_string()),
                    self.state,
                );
            }
        };
        self.transition(RunState::Running);
        debug!(pid = child.id(), "spawned: {}", self.command_text);

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        self.transition(RunState::Draining);
        let observer = self.observer;
        let ((out, err), waited) = future::zip(
            future::zip(
                drain_stream(stdout, LogSource::Stdout, observer),
                drain_stream(stderr, LogSource::Stderr, observer),
            ),
            child.status(),
        )
        .await;

        let mut diagnostics = stream_diagnostics(&out, &err);

        let status = match waited {
            Ok(status) => Some(ExitStatus::from(status)),
            Err(e) => {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::WaitFailed,
                    format!("failed to wait for process: {}", e),
                ));
                None
            }
        };

        let mut completion = Completion::Failure;
        if let Some(status) = status {
            if !status.exited_normally() {
                completion = Completion::AbnormalExit;
                let how = status
                    .signal_name()
                    .map(|name| format!(" (terminated by {})", name))
                    .unwrap_or_default();
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::AbnormalTermination {
                        signal: status.signal,
                    },
                    format!("command sub process did not exit normally{}", how),
                ));
            }
        }

        let result = ExecutionResult::assemble(
            self.command_text.to_string(),
            out.capture,
            err.capture,
            status,
            diagnostics,
            started_at,
            clock.elapsed(),
        );
        if result.succeeded() {
            completion = Completion::Success;
        }

        debug!(
            exit_code = result.exit_code(),
            succeeded = result.succeeded(),
            elapsed_ms = result.elapsed().as_millis() as u64,
            "finished: {}",
            self.command_text
        );
        self.transition(RunState::Completed(completion));
        (result, self.state)
    }

    fn transition(&mut self, next: RunState) {
        debug!(from = ?self.state, to = ?next, "run state");
        self.state = next;
    }
}

fn spawn(invocation: &Invocation) -> Result<Child> {
    let mut cmd = invocation.prepare();

    // Input is never fed; output is always captured
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd.kill_on_drop(true);

    debug!(
        program = invocation.program(),
        shell = invocation.uses_shell(),
        "spawning"
    );

    cmd.spawn()
        .map_err(|e| Error::spawn_failed(format!("{}: {}", invocation.program(), e)))
}

fn stream_diagnostics(out: &Drained, err: &Drained) -> Vec<Diagnostic> {
    [(LogSource::Stdout, out), (LogSource::Stderr, err)]
        .into_iter()
        .filter_map(|(source, drained)| {
            drained.error.as_ref().map(|e| {
                Diagnostic::new(
                    DiagnosticKind::StreamReadFailed { stream: source },
                    format!("failed reading {}: {}", source, e),
                )
            })
        })
        .collect()
}

async fn drain_stream<R>(
    stream: Option<R>,
    source: LogSource,
    observer: &dyn OutputObserver,
) -> Drained
where
    R: AsyncRead + Unpin,
{
    match stream {
        Some(stream) => StreamDrainer::new(stream, source).drain(observer).await,
        None => Drained {
            capture: StreamCapture {
                truncated: true,
                ..StreamCapture::default()
            },
            error: Some(io::Error::other(format!("{} was not captured", source))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drain::FailingReader;
    use crate::event::NoOpObserver;
    use futures_lite::io::Cursor;

    #[test]
    fn test_missing_pipe_is_a_truncated_capture() {
        futures::executor::block_on(async {
            let missing: Option<Cursor<Vec<u8>>> = None;
            let drained = drain_stream(missing, LogSource::Stdout, &NoOpObserver).await;

            assert!(drained.capture.truncated);
            assert_eq!(drained.capture.text, "");
            let error = drained.error.expect("missing pipe should be reported");
            assert!(error.to_string().contains("stdout was not captured"));
        });
    }

    #[test]
    fn test_read_failure_becomes_diagnostic() {
        futures::executor::block_on(async {
            let out = drain_stream(
                Some(Cursor::new(b"fine\n".to_vec())),
                LogSource::Stdout,
                &NoOpObserver,
            )
            .await;
            let err = drain_stream(
                Some(FailingReader::new(b"partial")),
                LogSource::Stderr,
                &NoOpObserver,
            )
            .await;

            let diagnostics = stream_diagnostics(&out, &err);
            assert_eq!(diagnostics.len(), 1);
            assert_eq!(
                diagnostics[0].kind,
                DiagnosticKind::StreamReadFailed {
                    stream: LogSource::Stderr
                }
            );
            assert!(diagnostics[0].message.starts_with("failed reading stderr: "));

            let result = ExecutionResult::assemble(
                "cmd".to_string(),
                out.capture,
                err.capture,
                Some(ExitStatus::exited(0)),
                diagnostics,
                Utc::now(),
                std::time::Duration::ZERO,
            );
            assert_eq!(result.exit_code(), 0);
            assert!(!result.succeeded());
            assert!(result.capture(LogSource::Stderr).truncated);
            assert!(result.child_stderr().starts_with("partial"));
        });
    }

    #[test]
    fn test_clean_drains_have_no_diagnostics() {
        futures::executor::block_on(async {
            let empty = || Some(Cursor::new(Vec::new()));
            let out = drain_stream(empty(), LogSource::Stdout, &NoOpObserver).await;
            let err = drain_stream(empty(), LogSource::Stderr, &NoOpObserver).await;
            assert!(stream_diagnostics(&out, &err).is_empty());
        });
    }
}
