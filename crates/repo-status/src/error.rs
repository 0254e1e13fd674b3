//! Error types for repository inspection

use std::path::PathBuf;
use thiserror::Error;

/// Errors from repository operations
#[derive(Error, Debug)]
pub enum RepoError {
    /// The working copy does not exist yet
    #[error("repository '{name}' is not cloned at {}", path.display())]
    NotCloned {
        /// Repository name
        name: String,
        /// Where the working copy was expected
        path: PathBuf,
    },

    /// The target directory already holds a working copy
    #[error("repository '{name}' already exists at {}", path.display())]
    AlreadyCloned {
        /// Repository name
        name: String,
        /// The existing working copy
        path: PathBuf,
    },

    /// A git command did not succeed
    #[error(transparent)]
    Command(#[from] command_runner::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, RepoError>;
