//! The record of one command invocation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::event::LogSource;
use crate::process::{ExitStatus, SENTINEL_EXIT_CODE};

/// Prefix of every diagnostic line the runner adds to stderr.
pub const DIAGNOSTIC_PREFIX: &str = "command-runner: ";

/// What went wrong inside the runner, as opposed to inside the child
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// There was no command text to run
    EmptyCommand,
    /// The child process could not be created
    SpawnFailed,
    /// Reading one of the child's streams failed before it closed
    StreamReadFailed {
        /// The stream that failed
        stream: LogSource,
    },
    /// Waiting for the child's exit status failed
    WaitFailed,
    /// The child was killed or crashed instead of exiting
    AbnormalTermination {
        /// The terminating signal, when known
        signal: Option<i32>,
    },
}

/// A runner-generated note attached to a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The kind of fault
    pub kind: DiagnosticKind,
    /// Description of the fault
    pub message: String,
}

impl Diagnostic {
    /// Create a new diagnostic
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The line this diagnostic contributes to the captured stderr
    pub fn line(&self) -> String {
        format!("{}{}\n", DIAGNOSTIC_PREFIX, self.message)
    }
}

/// Everything read from one stream
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StreamCapture {
    /// Concatenation of all lines, terminators kept
    pub text: String,
    /// Number of lines read
    pub lines: usize,
    /// True when a read error stopped the drain before end of stream
    pub truncated: bool,
}

/// Outcome of one command invocation.
///
/// Built once per run and never modified afterwards. When the runner itself
/// hit a fault, each [`Diagnostic`] is recorded and also rendered as a line at
/// the end of [`stderr`](Self::stderr), after everything the child wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    command_text: String,
    stdout: StreamCapture,
    stderr: StreamCapture,
    #[serde(skip)]
    child_stderr_len: usize,
    status: Option<ExitStatus>,
    exit_code: i32,
    succeeded: bool,
    diagnostics: Vec<Diagnostic>,
    started_at: DateTime<Utc>,
    elapsed: Duration,
}

impl ExecutionResult {
    pub(crate) fn assemble(
        command_text: String,
        stdout: StreamCapture,
        mut stderr: StreamCapture,
        status: Option<ExitStatus>,
        diagnostics: Vec<Diagnostic>,
        started_at: DateTime<Utc>,
        elapsed: Duration,
    ) -> Self {
        let child_stderr_len = stderr.text.len();
        if !diagnostics.is_empty() && !stderr.text.is_empty() && !stderr.text.ends_with('\n') {
            stderr.text.push('\n');
        }
        for diagnostic in &diagnostics {
            stderr.text.push_str(&diagnostic.line());
        }

        let exit_code = status
            .and_then(|status| status.code)
            .unwrap_or(SENTINEL_EXIT_CODE);
        let succeeded = diagnostics.is_empty() && status.is_some_and(|status| status.success());

        Self {
            command_text,
            stdout,
            stderr,
            child_stderr_len,
            status,
            exit_code,
            succeeded,
            diagnostics,
            started_at,
            elapsed,
        }
    }

    /// A result for a child that exited normally with the given output.
    ///
    /// Useful for [`Shell`](crate::Shell) implementations that do not spawn
    /// anything, such as test doubles.
    pub fn from_output(
        command_text: impl Into<String>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
        exit_code: i32,
    ) -> Self {
        Self::assemble(
            command_text.into(),
            capture(stdout.into()),
            capture(stderr.into()),
            Some(ExitStatus::exited(exit_code)),
            Vec::new(),
            Utc::now(),
            Duration::ZERO,
        )
    }

    /// A result for a command whose process could not be created
    pub fn spawn_failed(command_text: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::not_started(
            command_text.into(),
            Diagnostic::new(DiagnosticKind::SpawnFailed, reason),
        )
    }

    pub(crate) fn not_started(command_text: String, diagnostic: Diagnostic) -> Self {
        Self::assemble(
            command_text,
            StreamCapture::default(),
            StreamCapture::default(),
            None,
            vec![diagnostic],
            Utc::now(),
            Duration::ZERO,
        )
    }

    /// The command text that was attempted
    pub fn command_text(&self) -> &str {
        &self.command_text
    }

    /// Everything the child wrote to stdout
    pub fn stdout(&self) -> &str {
        &self.stdout.text
    }

    /// Everything the child wrote to stderr, followed by any diagnostic lines
    pub fn stderr(&self) -> &str {
        &self.stderr.text
    }

    /// Only what the child itself wrote to stderr
    pub fn child_stderr(&self) -> &str {
        &self.stderr.text[..self.child_stderr_len]
    }

    /// Capture details for one stream
    pub fn capture(&self, source: LogSource) -> &StreamCapture {
        match source {
            LogSource::Stdout => &self.stdout,
            LogSource::Stderr => &self.stderr,
        }
    }

    /// The exit code, or [`SENTINEL_EXIT_CODE`] when it is unknown
    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    /// The raw exit status, `None` when the child never ran or was not reaped
    pub fn status(&self) -> Option<ExitStatus> {
        self.status
    }

    /// True iff the child exited normally with code 0 and nothing went wrong
    /// in the runner
    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    /// Runner faults, in the order they were detected
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// True when a diagnostic of the given kind was recorded
    pub fn has_diagnostic(&self, kind: &DiagnosticKind) -> bool {
        self.diagnostics.iter().any(|d| &d.kind == kind)
    }

    /// The captured stdout if the run succeeded, otherwise
    /// [`Error::CommandFailed`] carrying the command text and stderr
    pub fn output_or_fail(&self) -> Result<&str> {
        if self.succeeded {
            return Ok(&self.stdout.text);
        }
        Err(Error::CommandFailed {
            command: self.command_text.clone(),
            stderr: self.stderr.text.clone(),
            exit_code: self.exit_code,
        })
    }

    /// When the run started
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// How long the run took, spawn to reap
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

fn capture(text: String) -> StreamCapture {
    StreamCapture {
        lines: text.lines().count(),
        text,
        truncated: false,
    }
}
