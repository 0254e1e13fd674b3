//! One box file for one version and provider

use command_runner::{quote, Shell};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{CatalogError, Result};

/// Checksum algorithm used for box files
pub const CHECKSUM_TYPE: &str = "sha1";

/// A version/provider pair and the box file that backs it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionProvider {
    /// Version string
    pub version: String,
    /// Provider name
    pub provider: String,
    /// Checksum algorithm
    pub checksum_type: String,
    /// Checksum of the box file, empty until known
    pub checksum: String,
    /// Box file path relative to the boxes directory on the server
    pub boxfile_relative_path: String,
    /// Box file on this machine, for uploads
    pub boxfile_local_path: Option<PathBuf>,
}

impl VersionProvider {
    /// A version provider with the default box file location.
    ///
    /// Box files live in the box's own directory and are named after the
    /// last segment of the box name, e.g. `team/mint17/mint17_1.0.0_virtualbox.box`.
    pub fn new(box_name: &str, version: impl Into<String>, provider: impl Into<String>) -> Self {
        let version = version.into();
        let provider = provider.into();
        let short_name = box_name.rsplit('/').next().unwrap_or(box_name);
        let boxfile_relative_path =
            format!("{}/{}_{}_{}.box", box_name, short_name, version, provider);
        Self {
            version,
            provider,
            checksum_type: CHECKSUM_TYPE.to_string(),
            checksum: String::new(),
            boxfile_relative_path,
            boxfile_local_path: None,
        }
    }

    /// Set a known checksum
    pub fn with_checksum(
        mut self,
        checksum_type: impl Into<String>,
        checksum: impl Into<String>,
    ) -> Self {
        self.checksum_type = checksum_type.into();
        self.checksum = checksum.into();
        self
    }

    /// Set the local box file to upload
    pub fn with_boxfile(mut self, path: impl Into<PathBuf>) -> Self {
        self.boxfile_local_path = Some(path.into());
        self
    }

    /// Command line that checksums a local file
    pub fn checksum_command(path: &Path) -> String {
        format!("sha1sum {}", quote(&path.to_string_lossy()))
    }

    /// Compute the checksum of the local box file with `sha1sum`
    pub async fn checksum_from_file<S: Shell + ?Sized>(&mut self, shell: &mut S) -> Result<&str> {
        let path = self
            .boxfile_local_path
            .as_deref()
            .ok_or_else(|| CatalogError::MissingBoxfile {
                version: self.version.clone(),
            })?;
        let stdout = shell.execute_or_fail(&Self::checksum_command(path)).await?;
        let digest = stdout.split_whitespace().next().unwrap_or_default();
        debug!(path = %path.display(), digest, "checksummed box file");
        self.checksum_type = CHECKSUM_TYPE.to_string();
        self.checksum = digest.to_string();
        Ok(&self.checksum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_boxfile_path() {
        let vp = VersionProvider::new("team/mint17", "1.0.0", "virtualbox");
        assert_eq!(vp.boxfile_relative_path, "team/mint17/mint17_1.0.0_virtualbox.box");
        assert_eq!(vp.checksum_type, "sha1");
        assert!(vp.checksum.is_empty());

        let flat = VersionProvider::new("mint17", "1.0.0", "libvirt");
        assert_eq!(flat.boxfile_relative_path, "mint17/mint17_1.0.0_libvirt.box");
    }

    #[test]
    fn test_checksum_command_quotes_path() {
        assert_eq!(
            VersionProvider::checksum_command(Path::new("/tmp/my box.box")),
            "sha1sum '/tmp/my box.box'"
        );
    }
}
