//! A named repository and its local working copy

use command_runner::{quote, Shell};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::classifier::{GitStatusClassifier, RepoStatus, StatusClassifier};
use crate::error::{RepoError, Result};

/// A repository known by name, with its clone URL and local directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRepo {
    /// Short name used on the command line
    pub name: String,
    /// Where the working copy lives
    pub local_dir: PathBuf,
    /// Where to clone from
    pub url: String,
}

impl ProjectRepo {
    /// Create a new repository description
    pub fn new(
        name: impl Into<String>,
        local_dir: impl Into<PathBuf>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            local_dir: local_dir.into(),
            url: url.into(),
        }
    }

    /// True when the local directory holds a git working copy
    pub fn exists_locally(&self) -> bool {
        self.local_dir.join(".git").exists()
    }

    /// Command line that prints the working copy status.
    ///
    /// The locale is pinned so the classifier sees the English phrasing.
    pub fn status_command(&self) -> String {
        format!("LC_ALL=C git -C {} status", path_arg(&self.local_dir))
    }

    /// Command line that clones the repository into its local directory
    pub fn clone_command(&self) -> String {
        format!("git clone {} {}", quote(&self.url), path_arg(&self.local_dir))
    }

    /// Command line that fetches from all remotes
    pub fn fetch_command(&self) -> String {
        format!("git -C {} fetch --all --quiet", path_arg(&self.local_dir))
    }

    /// Inspect the working copy with the stock git classifier
    pub async fn status<S: Shell + ?Sized>(&self, shell: &mut S) -> Result<RepoStatus> {
        self.status_with(shell, &GitStatusClassifier).await
    }

    /// Inspect the working copy with the given classifier
    pub async fn status_with<S, C>(&self, shell: &mut S, classifier: &C) -> Result<RepoStatus>
    where
        S: Shell + ?Sized,
        C: StatusClassifier + ?Sized,
    {
        self.require_clone()?;
        let stdout = shell.execute_or_fail(&self.status_command()).await?;
        let status = classifier.classify(&stdout);
        debug!(repo = %self.name, ?status, "classified status");
        Ok(status)
    }

    /// Clone the repository; fails if a working copy is already there
    pub async fn clone_repo<S: Shell + ?Sized>(&self, shell: &mut S) -> Result<()> {
        if self.exists_locally() {
            return Err(RepoError::AlreadyCloned {
                name: self.name.clone(),
                path: self.local_dir.clone(),
            });
        }
        info!("Cloning {} into {}", self.url, self.local_dir.display());
        shell.execute_or_fail(&self.clone_command()).await?;
        Ok(())
    }

    /// Fetch from all remotes so ahead/behind counts are fresh
    pub async fn fetch<S: Shell + ?Sized>(&self, shell: &mut S) -> Result<()> {
        self.require_clone()?;
        info!("Fetching {}", self.name);
        shell.execute_or_fail(&self.fetch_command()).await?;
        Ok(())
    }

    fn require_clone(&self) -> Result<()> {
        if self.exists_locally() {
            return Ok(());
        }
        Err(RepoError::NotCloned {
            name: self.name.clone(),
            path: self.local_dir.clone(),
        })
    }
}

fn path_arg(path: &Path) -> String {
    quote(&path.to_string_lossy())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_quote_paths() {
        let repo = ProjectRepo::new("tools", "/src/my tools", "git@example.com:me/tools.git");
        assert_eq!(repo.status_command(), "LC_ALL=C git -C '/src/my tools' status");
        assert_eq!(
            repo.clone_command(),
            "git clone git@example.com:me/tools.git '/src/my tools'"
        );
        assert_eq!(repo.fetch_command(), "git -C '/src/my tools' fetch --all --quiet");
    }

    #[test]
    fn test_missing_working_copy() {
        let repo = ProjectRepo::new("ghost", "/definitely/not/here", "x");
        assert!(!repo.exists_locally());
        assert!(matches!(repo.require_clone(), Err(RepoError::NotCloned { .. })));
    }
}
