//! Repository status inspection
//!
//! Runs `git` through a [`command_runner::Shell`] and classifies the captured
//! text into a [`RepoStatus`]. The classification lives behind
//! [`StatusClassifier`] so it can be replaced independently of the runner.

#![warn(missing_docs)]

pub mod classifier;
pub mod error;
pub mod repo;

pub use classifier::{GitStatusClassifier, RepoStatus, StatusClassifier};
pub use error::{RepoError, Result};
pub use repo::ProjectRepo;
