//! Error types for command execution

use thiserror::Error;

/// Unified error type for the runner.
///
/// A plain `run` never returns one of these: spawn and I/O faults are recorded
/// as diagnostics on the [`ExecutionResult`](crate::ExecutionResult). Only the
/// "or fail" convenience wrappers and the session internals produce them.
#[derive(Error, Debug)]
pub enum Error {
    /// The command ran but did not succeed
    #[error("command failure: {command}\n{stderr}")]
    CommandFailed {
        /// The command text that was attempted
        command: String,
        /// Everything captured on stderr, engine diagnostics included
        stderr: String,
        /// The exit code, or the sentinel when none was available
        exit_code: i32,
    },

    /// A result was requested before anything was run
    #[error("no command has been run yet")]
    NotRun,

    /// The command text was empty
    #[error("nothing to run: the command text is empty")]
    EmptyCommand,

    /// Failed to spawn a process
    #[error("failed to spawn process: {reason}")]
    SpawnFailed {
        /// The reason for the spawn failure
        reason: String,
    },
}

impl Error {
    /// Create a spawn failed error
    pub fn spawn_failed(reason: impl Into<String>) -> Self {
        Self::SpawnFailed {
            reason: reason.into(),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
