//! Turning `git status` text into a status value

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static BRANCH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(?:# )?On branch (\S+)").expect("valid regex"));
static DETACHED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^HEAD detached (?:at|from) (\S+)").expect("valid regex"));
static UP_TO_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Your branch is up[ -]to[ -]date with '([^']+)'").expect("valid regex")
});
static AHEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Your branch is ahead of '([^']+)' by (\d+) commits?").expect("valid regex")
});
static BEHIND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Your branch is behind '([^']+)' by (\d+) commits?").expect("valid regex")
});
static DIVERGED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"Your branch and '([^']+)' have diverged,\s+and have (\d+) and (\d+) different commits? each",
    )
    .expect("valid regex")
});
static CLEAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"nothing to commit,? \(?working (?:tree|directory) clean\)?").expect("valid regex")
});

/// What `git status` says about a working copy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepoStatus {
    /// Current branch, or the commit HEAD is detached at
    pub branch: Option<String>,
    /// HEAD is not on a branch
    pub detached: bool,
    /// Upstream branch, when the status mentions one
    pub upstream: Option<String>,
    /// Nothing to commit
    pub clean: bool,
    /// Commits not yet pushed to the upstream
    pub ahead: u32,
    /// Upstream commits not yet merged
    pub behind: u32,
}

impl RepoStatus {
    /// Has local commits the upstream lacks
    pub fn is_ahead(&self) -> bool {
        self.ahead > 0
    }

    /// Lacks commits the upstream has
    pub fn is_behind(&self) -> bool {
        self.behind > 0
    }

    /// Both ahead and behind
    pub fn is_diverged(&self) -> bool {
        self.is_ahead() && self.is_behind()
    }

    /// Clean and level with a known upstream
    pub fn is_current(&self) -> bool {
        self.clean && self.upstream.is_some() && self.ahead == 0 && self.behind == 0
    }
}

/// Derives a [`RepoStatus`] from captured command output.
///
/// The text formats of version control tools drift between releases, so this
/// sits behind a trait and can be swapped without touching the runner.
pub trait StatusClassifier: Send + Sync {
    /// Classify the stdout of a status command
    fn classify(&self, status_text: &str) -> RepoStatus;
}

/// Matches the English long-format output of `git status`
#[derive(Debug, Clone, Copy, Default)]
pub struct GitStatusClassifier;

impl StatusClassifier for GitStatusClassifier {
    fn classify(&self, status_text: &str) -> RepoStatus {
        let mut status = RepoStatus {
            clean: CLEAN.is_match(status_text),
            ..RepoStatus::default()
        };

        if let Some(caps) = BRANCH.captures(status_text) {
            status.branch = Some(caps[1].to_string());
        } else if let Some(caps) = DETACHED.captures(status_text) {
            status.branch = Some(caps[1].to_string());
            status.detached = true;
        }

        if let Some(caps) = UP_TO_DATE.captures(status_text) {
            status.upstream = Some(caps[1].to_string());
        } else if let Some(caps) = AHEAD.captures(status_text) {
            status.upstream = Some(caps[1].to_string());
            status.ahead = count(&caps[2]);
        } else if let Some(caps) = BEHIND.captures(status_text) {
            status.upstream = Some(caps[1].to_string());
            status.behind = count(&caps[2]);
        } else if let Some(caps) = DIVERGED.captures(status_text) {
            status.upstream = Some(caps[1].to_string());
            status.ahead = count(&caps[2]);
            status.behind = count(&caps[3]);
        }

        status
    }
}

fn count(digits: &str) -> u32 {
    digits.parse().unwrap_or(u32::MAX)
}
