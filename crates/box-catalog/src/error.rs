//! Error types for catalog operations

use thiserror::Error;

/// Errors from catalog operations
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The catalog server name did not resolve
    #[error("invalid server domain name: {domain}")]
    InvalidServer {
        /// The domain that failed the check
        domain: String,
    },

    /// A remote command (ssh or scp) did not succeed
    #[error("remote command failed with exit status {exit_code}: {command}\n{stderr}")]
    RemoteCommand {
        /// The command line that was run
        command: String,
        /// Its exit code
        exit_code: i32,
        /// Its captured stderr
        stderr: String,
    },

    /// The operation needs catalog metadata that has not been loaded
    #[error("no metadata loaded for box '{box_name}'")]
    NoMetadata {
        /// The box in question
        box_name: String,
    },

    /// The version is already in the catalog
    #[error("version {version} already exists")]
    VersionExists {
        /// The duplicate version
        version: String,
    },

    /// The version provider has no local box file to upload
    #[error("no local box file given for version {version}")]
    MissingBoxfile {
        /// The version being published
        version: String,
    },

    /// A local helper command failed
    #[error(transparent)]
    Command(#[from] command_runner::Error),

    /// The metadata document could not be read or written
    #[error("invalid catalog metadata: {0}")]
    Metadata(#[from] serde_json::Error),

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, CatalogError>;
