//! The public runner facade

use async_trait::async_trait;
use std::fmt;

use crate::command::CommandSpec;
use crate::error::{Error, Result};
use crate::event::{NoOpObserver, OutputObserver};
use crate::log::{self, RunLog};
use crate::process::SENTINEL_EXIT_CODE;
use crate::result::ExecutionResult;
use crate::session::{ProcessSession, RunState};

/// Builds, runs and inspects one command at a time.
///
/// A runner is reusable: [`set`](Self::set) or [`reset`](Self::reset) clears
/// the previous result, and each run installs a fresh [`ExecutionResult`].
/// Runs on one instance are sequential; use one runner per concurrent command.
///
/// ```no_run
/// use command_runner::CommandRunner;
///
/// # futures_lite::future::block_on(async {
/// let mut runner = CommandRunner::new();
/// runner.set("git ").append("status");
/// if runner.run().await.succeeded() {
///     println!("{}", runner.stdout());
/// }
/// # });
/// ```
pub struct CommandRunner {
    spec: CommandSpec,
    result: Option<ExecutionResult>,
    state: RunState,
    observer: Box<dyn OutputObserver>,
}

impl CommandRunner {
    /// Create a runner with an empty command
    pub fn new() -> Self {
        Self {
            spec: CommandSpec::new(),
            result: None,
            state: RunState::Idle,
            observer: Box::new(NoOpObserver),
        }
    }

    /// Create a runner seeded with a command
    pub fn with_command(text: impl Into<String>) -> Self {
        let mut runner = Self::new();
        runner.spec = CommandSpec::with_text(text);
        runner
    }

    /// Install an observer that sees output lines as they are read
    pub fn with_observer<O: OutputObserver + 'static>(mut self, observer: O) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Clear the command text and any previous result
    pub fn reset(&mut self) -> &mut Self {
        self.spec.clear();
        self.clear_result();
        self
    }

    /// Clear the previous result and replace the command text
    pub fn set(&mut self, text: impl AsRef<str>) -> &mut Self {
        self.spec.set(text);
        self.clear_result();
        self
    }

    /// Append text to the command
    pub fn append(&mut self, text: impl AsRef<str>) -> &mut Self {
        self.spec.append(text);
        self
    }

    /// The command being built
    pub fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    /// Run the current command
    pub async fn run(&mut self) -> &ExecutionResult {
        self.clear_result();
        let (result, state) = ProcessSession::new(self.spec.as_str(), self.observer.as_ref())
            .run()
            .await;
        self.state = state;
        self.result.insert(result)
    }

    /// Replace the command text, then run it
    pub async fn run_command(&mut self, text: impl AsRef<str>) -> &ExecutionResult {
        self.set(text);
        self.run().await
    }

    /// Run the current command and return its stdout, failing with
    /// [`Error::CommandFailed`] when it did not succeed
    pub async fn run_or_fail(&mut self) -> Result<String> {
        self.run().await.output_or_fail().map(str::to_string)
    }

    /// Run the current command, reporting it to `log`
    pub async fn run_logged(&mut self, log: &mut dyn RunLog) -> &ExecutionResult {
        log::report_command(log, self.spec.as_str());
        let result = self.run().await;
        log::report_outcome(log, result);
        result
    }

    /// Stdout of the latest run if it succeeded.
    ///
    /// Unlike [`run_or_fail`](Self::run_or_fail) this does not run anything.
    pub fn output_or_fail(&self) -> Result<&str> {
        self.result.as_ref().ok_or(Error::NotRun)?.output_or_fail()
    }

    /// The latest result, if a run happened since the last reset
    pub fn result(&self) -> Option<&ExecutionResult> {
        self.result.as_ref()
    }

    /// Where this runner is in its cycle
    pub fn state(&self) -> RunState {
        self.state
    }

    /// The command text
    pub fn command_text(&self) -> &str {
        self.spec.as_str()
    }

    /// Whether the latest run succeeded; false before any run
    pub fn succeeded(&self) -> bool {
        self.result.as_ref().is_some_and(ExecutionResult::succeeded)
    }

    /// Stdout of the latest run
    pub fn stdout(&self) -> &str {
        self.result.as_ref().map_or("", ExecutionResult::stdout)
    }

    /// Stderr of the latest run
    pub fn stderr(&self) -> &str {
        self.result.as_ref().map_or("", ExecutionResult::stderr)
    }

    /// Exit code of the latest run, the sentinel before any run
    pub fn exit_code(&self) -> i32 {
        self.result
            .as_ref()
            .map_or(SENTINEL_EXIT_CODE, ExecutionResult::exit_code)
    }

    fn clear_result(&mut self) {
        self.result = None;
        self.state = RunState::Idle;
    }
}

impl Default for CommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CommandRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRunner")
            .field("spec", &self.spec)
            .field("state", &self.state)
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}

/// Something that can execute command lines.
///
/// [`CommandRunner`] is the real implementation. Code that only needs "run
/// this and give me the outcome" should take a `Shell` so it can be driven
/// by a scripted double.
#[async_trait]
pub trait Shell: Send {
    /// Run a command line to completion
    async fn execute(&mut self, command: &str) -> ExecutionResult;

    /// Run a command line and return its stdout, or fail with
    /// [`Error::CommandFailed`]
    async fn execute_or_fail(&mut self, command: &str) -> Result<String> {
        let result = self.execute(command).await;
        result.output_or_fail().map(str::to_string)
    }
}

#[async_trait]
impl Shell for CommandRunner {
    async fn execute(&mut self, command: &str) -> ExecutionResult {
        self.run_command(command).await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_runner_defaults() {
        let runner = CommandRunner::new();
        assert_eq!(runner.command_text(), "");
        assert_eq!(runner.state(), RunState::Idle);
        assert!(!runner.succeeded());
        assert_eq!(runner.exit_code(), SENTINEL_EXIT_CODE);
        assert_eq!(runner.stdout(), "");
        assert!(runner.result().is_none());
        assert!(matches!(runner.output_or_fail(), Err(Error::NotRun)));
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut runner = CommandRunner::with_command("echo x");
        runner.reset().reset();
        assert_eq!(runner.command_text(), "");
        assert_eq!(runner.state(), RunState::Idle);
    }

    #[test]
    fn test_set_and_append_build_command() {
        let mut runner = CommandRunner::new();
        runner.set("scp -Bqv ").append("a ").append("b");
        assert_eq!(runner.command_text(), "scp -Bqv a b");
        assert_eq!(runner.spec().to_string(), "scp -Bqv a b");
    }

    #[smol_potat::test]
    async fn test_empty_command_is_not_spawned() {
        let mut runner = CommandRunner::new();
        let result = runner.run().await;

        assert!(!result.succeeded());
        assert_eq!(result.exit_code(), SENTINEL_EXIT_CODE);
        assert!(result.has_diagnostic(&crate::DiagnosticKind::EmptyCommand));
        assert_eq!(runner.state(), RunState::SpawnFailed);
    }

    #[smol_potat::test]
    async fn test_set_clears_previous_result() {
        let mut runner = CommandRunner::new();
        runner.run_command("echo first").await;
        assert!(runner.result().is_some());

        runner.set("echo second");
        assert!(runner.result().is_none());
        assert_eq!(runner.state(), RunState::Idle);
    }
}
