use anyhow::{bail, Result};
use command_runner::{CommandRunner, RunLog, TracingObserver, TracingRunLog};
use std::io::{self, Write};

/// A [`RunLog`] that writes the run report to a terminal or any other writer
pub struct ConsoleLog<W: Write> {
    out: W,
}

impl ConsoleLog<io::Stdout> {
    /// Report to stdout
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleLog<W> {
    /// Report to `out`
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

// Write errors on the report are not worth failing the command for.
impl<W: Write> RunLog for ConsoleLog<W> {
    fn start_message(&mut self, message: &str) {
        let _ = writeln!(self.out, "{}", message);
    }

    fn continue_message(&mut self, message: &str) {
        let _ = writeln!(self.out, "  {}", message);
    }

    fn indented_line(&mut self, line: &str) {
        let _ = writeln!(self.out, "    {}", line);
    }
}

/// Where `boxcat run` sends its report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    /// The report layout on stdout
    Console,
    /// The report as log events on stderr
    Log,
    /// The full result as JSON on stdout
    Json,
}

pub async fn run(command: Vec<String>, stream: bool, report: Report) -> Result<()> {
    let mut runner = CommandRunner::with_command(command.join(" "));
    if stream {
        runner = runner.with_observer(TracingObserver);
    }

    let result = match report {
        Report::Console => runner.run_logged(&mut ConsoleLog::stdout()).await,
        Report::Log => runner.run_logged(&mut TracingRunLog).await,
        Report::Json => {
            let result = runner.run().await;
            println!("{}", serde_json::to_string_pretty(result)?);
            result
        }
    };

    if !result.succeeded() {
        bail!("Command failed with exit status {}", result.exit_code());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_log_layout() {
        let mut buf = Vec::new();
        let mut log = ConsoleLog::new(&mut buf);
        log.start_message("> ls");
        log.continue_message("Success.  STDOUT is:");
        log.indented_line("Cargo.toml");
        drop(log);

        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "> ls\n  Success.  STDOUT is:\n    Cargo.toml\n");
    }
}
