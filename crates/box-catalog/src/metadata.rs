//! The box metadata document Vagrant reads from the catalog

use serde::{Deserialize, Serialize};

/// Catalog metadata for one box
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogMetadata {
    /// Box name, e.g. `team/mint17`
    pub name: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Published versions, in publication order
    #[serde(default)]
    pub versions: Vec<BoxVersion>,
}

/// One published version of a box
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxVersion {
    /// Version string, `major.minor.patch`
    pub version: String,
    /// Box files available for this version
    #[serde(default)]
    pub providers: Vec<ProviderEntry>,
}

/// A box file for one provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEntry {
    /// Provider name, e.g. `virtualbox`
    pub name: String,
    /// Where Vagrant downloads the box file
    pub url: String,
    /// Checksum algorithm, e.g. `sha1`
    pub checksum_type: String,
    /// Checksum of the box file
    pub checksum: String,
}

impl CatalogMetadata {
    /// Metadata for a box with no versions yet
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            versions: Vec::new(),
        }
    }

    /// Find a version by its exact string
    pub fn find_version(&self, version: &str) -> Option<&BoxVersion> {
        self.versions.iter().find(|v| v.version == version)
    }

    /// The version with the highest numeric value.
    ///
    /// Among versions with equal value the one published last wins.
    pub fn latest_version(&self) -> Option<&BoxVersion> {
        self.versions.iter().max_by_key(|v| v.numeric_version())
    }
}

impl BoxVersion {
    /// The version as one sortable number
    pub fn numeric_version(&self) -> u64 {
        numeric_version(&self.version)
    }

    /// The entry for a provider; the last one wins if it is listed twice
    pub fn provider(&self, name: &str) -> Option<&ProviderEntry> {
        self.providers.iter().filter(|p| p.name == name).last()
    }
}

/// Collapse `major.minor.patch` into `major * 1_000_000 + minor * 1_000 + patch`.
///
/// Missing components count as zero, and each component is read from its
/// leading digits only, so `1.2` and `1.2.0-beta` both sort as `1.2.0`.
pub fn numeric_version(version: &str) -> u64 {
    let mut parts = version.split('.').map(leading_number);
    let major = parts.next().unwrap_or(0);
    let minor = parts.next().unwrap_or(0);
    let patch = parts.next().unwrap_or(0);
    major
        .saturating_mul(1_000_000)
        .saturating_add(minor.saturating_mul(1_000))
        .saturating_add(patch)
}

fn leading_number(part: &str) -> u64 {
    let digits = part.trim().bytes().take_while(u8::is_ascii_digit).count();
    part.trim()[..digits].parse().unwrap_or(0)
}
