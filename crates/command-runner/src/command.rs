//! Command text and how it is handed to the host

use async_process::Command as AsyncCommand;
use std::fmt;

/// Characters that make a command line need the host interpreter.
const SHELL_METACHARACTERS: &[char] = &[
    '*', '?', '{', '}', '[', ']', '<', '>', '(', ')', '~', '&', '|', '\\', '$', ';', '\'', '`',
    '"', '\n', '#',
];

/// Leading words that only mean something to a shell.
const SHELL_WORDS: &[&str] = &[
    "!", ".", ":", "break", "case", "cd", "continue", "do", "done", "elif", "else", "esac",
    "eval", "exec", "exit", "export", "fi", "for", "if", "in", "readonly", "return", "set",
    "shift", "then", "trap", "unset", "until", "while",
];

/// The command line a runner will execute.
///
/// This is a plain text buffer. Nothing here parses or validates shell syntax;
/// the text reaches the host interpreter verbatim, so callers that splice in
/// untrusted values must escape them (see [`quote`]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSpec {
    text: String,
}

impl CommandSpec {
    /// Create an empty command
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a command seeded with the given text
    pub fn with_text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Clear the command text
    pub fn clear(&mut self) -> &mut Self {
        self.text.clear();
        self
    }

    /// Replace the command text
    pub fn set(&mut self, text: impl AsRef<str>) -> &mut Self {
        self.text.clear();
        self.text.push_str(text.as_ref());
        self
    }

    /// Append text to the command
    pub fn append(&mut self, text: impl AsRef<str>) -> &mut Self {
        self.text.push_str(text.as_ref());
        self
    }

    /// Get the command text
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for CommandSpec {
    fn from(text: &str) -> Self {
        Self::with_text(text)
    }
}

impl From<String> for CommandSpec {
    fn from(text: String) -> Self {
        Self { text }
    }
}

/// How a command line reaches the operating system.
///
/// Simple lines (words only) are executed directly, so a missing executable
/// is reported as a spawn failure. Anything using shell syntax goes through
/// the host interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Execute the program directly with whitespace-separated arguments
    Direct {
        /// The program to execute
        program: String,
        /// The arguments to pass to the program
        args: Vec<String>,
    },
    /// Hand the whole line to the host interpreter
    Shell {
        /// The full command line
        line: String,
    },
}

impl Invocation {
    /// Classify a command line, returning `None` when it is blank
    pub fn parse(text: &str) -> Option<Self> {
        let mut words = text.split_whitespace();
        let first = words.next()?;

        if needs_shell(text, first) {
            return Some(Invocation::Shell {
                line: text.to_string(),
            });
        }

        Some(Invocation::Direct {
            program: first.to_string(),
            args: words.map(str::to_string).collect(),
        })
    }

    /// True when the line goes through the host interpreter
    pub fn uses_shell(&self) -> bool {
        matches!(self, Invocation::Shell { .. })
    }

    /// Name of the program that will be spawned
    pub fn program(&self) -> &str {
        match self {
            Invocation::Direct { program, .. } => program,
            Invocation::Shell { .. } => shell_program(),
        }
    }

    /// Prepare this invocation for execution as an `async_process::Command`
    pub fn prepare(&self) -> AsyncCommand {
        match self {
            Invocation::Direct { program, args } => {
                let mut cmd = AsyncCommand::new(program);
                cmd.args(args);
                cmd
            }
            Invocation::Shell { line } => {
                let mut cmd = AsyncCommand::new(shell_program());
                cmd.arg(shell_flag()).arg(line);
                cmd
            }
        }
    }
}

fn needs_shell(text: &str, first_word: &str) -> bool {
    text.contains(SHELL_METACHARACTERS)
        || first_word.contains('=')
        || SHELL_WORDS.contains(&first_word)
}

#[cfg(unix)]
fn shell_program() -> &'static str {
    "/bin/sh"
}

#[cfg(unix)]
fn shell_flag() -> &'static str {
    "-c"
}

#[cfg(windows)]
fn shell_program() -> &'static str {
    "cmd"
}

#[cfg(windows)]
fn shell_flag() -> &'static str {
    "/C"
}

/// Quote a single argument for a POSIX shell.
///
/// Words made only of safe characters are returned unchanged; everything else
/// is wrapped in single quotes with embedded quotes escaped.
pub fn quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./,:@%+".contains(c));
    if safe {
        return arg.to_string();
    }
    format!("'{}'", arg.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_append_chains() {
        let mut spec = CommandSpec::new();
        spec.append("echo ").append("chained");
        assert_eq!(spec.as_str(), "echo chained");
    }

    #[test]
    fn test_spec_set_replaces_text() {
        let mut spec = CommandSpec::with_text("ls -la");
        spec.set("pwd");
        assert_eq!(spec.as_str(), "pwd");
        spec.clear();
        assert_eq!(spec.as_str(), "");
        assert_eq!(spec.to_string(), "");
    }

    #[test]
    fn test_blank_text_has_no_invocation() {
        assert_eq!(Invocation::parse(""), None);
        assert_eq!(Invocation::parse("   \t "), None);
    }

    #[test]
    fn test_simple_line_is_direct() {
        let inv = Invocation::parse("echo  hello   world").unwrap();
        assert_eq!(
            inv,
            Invocation::Direct {
                program: "echo".to_string(),
                args: vec!["hello".to_string(), "world".to_string()],
            }
        );
        assert!(!inv.uses_shell());
        assert_eq!(inv.program(), "echo");
    }

    #[test]
    fn test_shell_syntax_uses_interpreter() {
        for line in [
            "echo err-line >&2; exit 2",
            "ls | wc -l",
            "echo $HOME",
            "ssh host 'mkdir -p /tmp/x'",
            "FOO=bar env",
            "exit 3",
            "cd /tmp",
        ] {
            let inv = Invocation::parse(line).unwrap();
            assert!(inv.uses_shell(), "expected shell for {line:?}");
        }
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("plain/path-1.box"), "plain/path-1.box");
        assert_eq!(quote("with space"), "'with space'");
        assert_eq!(quote("it's"), r"'it'\''s'");
        assert_eq!(quote(""), "''");
    }
}
