//! Reporting a run to an external logger

use tracing::info;

use crate::result::ExecutionResult;

/// The three calls a runner makes when reporting a run.
///
/// Implement this to route run reports into whatever log a program already
/// has. The runner writes a fixed sequence: the echoed command via
/// [`start_message`](Self::start_message), one
/// [`continue_message`](Self::continue_message) saying how it went, then one
/// [`indented_line`](Self::indented_line) per output line.
pub trait RunLog {
    /// Begin a new message
    fn start_message(&mut self, message: &str);

    /// Continue the current message
    fn continue_message(&mut self, message: &str);

    /// An indented detail line under the current message
    fn indented_line(&mut self, line: &str);
}

/// A [`RunLog`] that emits `tracing` events at info level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingRunLog;

impl RunLog for TracingRunLog {
    fn start_message(&mut self, message: &str) {
        info!("{}", message);
    }

    fn continue_message(&mut self, message: &str) {
        info!("  {}", message);
    }

    fn indented_line(&mut self, line: &str) {
        info!("    {}", line);
    }
}

pub(crate) fn report_command(log: &mut dyn RunLog, command_text: &str) {
    log.start_message(&format!("> {}", command_text));
}

pub(crate) fn report_outcome(log: &mut dyn RunLog, result: &ExecutionResult) {
    let (heading, text) = if result.succeeded() {
        ("Success.  STDOUT is:", result.stdout())
    } else {
        ("Failed!  STDERR is:", result.stderr())
    };

    log.continue_message(heading);
    if text.is_empty() {
        log.indented_line("empty.");
        return;
    }
    for line in text.lines() {
        log.indented_line(line);
    }
}
