//! Live output observation

use serde::{Deserialize, Serialize};
use std::fmt;

/// Source of a captured line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSource {
    /// Standard output
    Stdout,
    /// Standard error
    Stderr,
}

impl fmt::Display for LogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogSource::Stdout => f.write_str("stdout"),
            LogSource::Stderr => f.write_str("stderr"),
        }
    }
}

/// Sees every line as a drainer reads it, before the run completes.
///
/// Both streams are drained concurrently, so calls for stdout and stderr
/// interleave in no particular order. The line still carries its terminator
/// when the child wrote one.
pub trait OutputObserver: Send + Sync {
    /// Called once per captured line
    fn on_line(&self, source: LogSource, line: &str);
}

/// An observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl OutputObserver for NoOpObserver {
    fn on_line(&self, _source: LogSource, _line: &str) {}
}

/// Forwards each line to `tracing` at debug level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl OutputObserver for TracingObserver {
    fn on_line(&self, source: LogSource, line: &str) {
        tracing::debug!(stream = %source, "{}", line.trim_end_matches(['\r', '\n']));
    }
}

impl<F> OutputObserver for F
where
    F: Fn(LogSource, &str) + Send + Sync,
{
    fn on_line(&self, source: LogSource, line: &str) {
        self(source, line)
    }
}
