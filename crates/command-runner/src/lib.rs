//! Runtime-agnostic subprocess runner
//!
//! This crate launches one external command at a time, reads its stdout and
//! stderr concurrently until both close, waits for it to exit, and hands back
//! an [`ExecutionResult`] with everything it captured.
//!
//! Faults inside the runner (the program cannot be spawned, a pipe read fails,
//! the child is killed by a signal) never surface as errors from
//! [`CommandRunner::run`]. They are recorded as tagged [`Diagnostic`]s on the
//! result, which is then unsuccessful. Only the explicit "or fail" wrappers
//! return [`Error`].

#![warn(missing_docs)]

pub mod command;
mod drain;
pub mod error;
pub mod event;
pub mod log;
pub mod process;
pub mod result;
pub mod runner;
mod session;

pub use command::{quote, CommandSpec, Invocation};
pub use error::{Error, Result};
pub use event::{LogSource, NoOpObserver, OutputObserver, TracingObserver};
pub use log::{RunLog, TracingRunLog};
pub use process::{ExitStatus, SENTINEL_EXIT_CODE};
pub use result::{Diagnostic, DiagnosticKind, ExecutionResult, StreamCapture, DIAGNOSTIC_PREFIX};
pub use runner::{CommandRunner, Shell};
pub use session::{Completion, RunState};
