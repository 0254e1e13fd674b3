//! A box in a remote catalog, managed with host, ssh, and scp

use command_runner::{quote, ExecutionResult, Shell};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{CatalogError, Result};
use crate::metadata::{BoxVersion, CatalogMetadata, ProviderEntry};
use crate::server::{CatalogServer, METADATA_FILE};
use crate::version_provider::VersionProvider;

/// One box in a catalog server, with its metadata once loaded.
///
/// Every remote interaction goes through the [`Shell`] the catalog was
/// connected with, so tests can stand in for the server.
pub struct BoxCatalog<S> {
    shell: S,
    server: CatalogServer,
    box_name: String,
    description: String,
    metadata: Option<CatalogMetadata>,
    valid_server: bool,
}

impl<S: Shell> BoxCatalog<S> {
    /// Check the server and load the box's metadata if it is in the catalog.
    ///
    /// A server that does not resolve leaves the catalog unusable; every
    /// remote operation then fails with [`CatalogError::InvalidServer`].
    pub async fn connect(shell: S, server: CatalogServer, box_name: impl Into<String>) -> Self {
        let mut catalog = Self {
            shell,
            server,
            box_name: box_name.into(),
            description: String::new(),
            metadata: None,
            valid_server: false,
        };

        catalog.valid_server = catalog.check_server().await;
        if !catalog.valid_server {
            warn!("Invalid server domain name: {}", catalog.server.domain);
            return catalog;
        }

        match catalog.exists_in_catalog().await {
            Ok(true) => {
                if let Err(e) = catalog.refresh_metadata().await {
                    warn!("Could not load metadata for {}: {}", catalog.box_name, e);
                }
            }
            Ok(false) => debug!(box_name = %catalog.box_name, "box not in catalog"),
            Err(e) => warn!("Could not check catalog for {}: {}", catalog.box_name, e),
        }
        catalog
    }

    async fn check_server(&mut self) -> bool {
        let command = format!("host {}", quote(&self.server.domain));
        self.shell.execute(&command).await.succeeded()
    }

    /// True when the box already has metadata on the server
    pub async fn exists_in_catalog(&mut self) -> Result<bool> {
        self.require_valid_server()?;
        let test = format!(
            "if [ -f {} ]; then echo \"TRUE\"; else echo \"FALSE\"; fi;",
            quote(&self.server.metadata_path(&self.box_name))
        );
        let command = self.ssh_command("-q", &test);
        let result = self.remote(&command).await?;
        Ok(result.stdout().trim() == "TRUE")
    }

    /// Download the metadata document and replace the loaded copy
    pub async fn refresh_metadata(&mut self) -> Result<&CatalogMetadata> {
        self.require_valid_server()?;
        self.metadata = None;

        let scratch = tempfile::tempdir()?;
        let local = scratch.path().join(METADATA_FILE);
        let remote = self.remote_spec(&self.server.metadata_path(&self.box_name));
        let command = format!("scp -Bqv {} {}", remote, local_arg(&local));
        self.remote(&command).await?;

        let text = fs::read_to_string(&local)?;
        let metadata: CatalogMetadata = serde_json::from_str(&text)?;
        debug!(box_name = %self.box_name, versions = metadata.versions.len(), "metadata refreshed");
        Ok(&*self.metadata.insert(metadata))
    }

    /// Upload the loaded metadata over the server's copy, then re-read it
    pub async fn replace_metadata(&mut self) -> Result<()> {
        self.require_valid_server()?;
        let metadata = self.loaded_metadata()?.clone();
        self.publish_metadata(&metadata).await
    }

    // The loaded copy only changes by re-reading the server after an upload
    async fn publish_metadata(&mut self, metadata: &CatalogMetadata) -> Result<()> {
        let scratch = tempfile::tempdir()?;
        let local = scratch.path().join(METADATA_FILE);
        fs::write(&local, serde_json::to_string_pretty(metadata)?)?;

        let remote = self.remote_spec(&self.server.metadata_path(&self.box_name));
        let command = format!("scp -Bqv {} {}", local_arg(&local), remote);
        self.remote(&command).await?;

        self.refresh_metadata().await?;
        Ok(())
    }

    /// Create the box directory on the server and publish empty metadata
    pub async fn add_box_to_catalog(&mut self) -> Result<()> {
        self.require_valid_server()?;
        let mkdir = format!("mkdir -p {}", quote(&self.server.box_dir(&self.box_name)));
        let command = self.ssh_command("", &mkdir);
        self.remote(&command).await?;

        let metadata = CatalogMetadata::new(self.box_name.clone(), self.description.clone());
        info!("Adding {} to the catalog", self.box_name);
        if let Ok(yaml) = serde_yaml::to_string(&metadata) {
            debug!("metadata:\n{}", yaml);
        }
        self.publish_metadata(&metadata).await
    }

    /// Delete the box directory, box files included, from the server
    pub async fn remove_box_from_catalog(&mut self) -> Result<()> {
        self.require_valid_server()?;
        let rm = format!("rm -rf {}", quote(&self.server.box_dir(&self.box_name)));
        let command = self.ssh_command("", &rm);
        info!("Removing {} from the catalog", self.box_name);
        self.remote(&command).await?;
        self.metadata = None;
        Ok(())
    }

    /// The newest version that has a box file for `provider`
    pub fn latest_version_provider(&self, provider: &str) -> Option<VersionProvider> {
        let metadata = self.metadata.as_ref()?;
        let (version, entry) = metadata
            .versions
            .iter()
            .filter_map(|v| v.provider(provider).map(|entry| (v, entry)))
            .max_by_key(|(v, _)| v.numeric_version())?;

        let mut vp = VersionProvider::new(&self.box_name, version.version.clone(), provider)
            .with_checksum(entry.checksum_type.clone(), entry.checksum.clone());
        let base = format!("{}/", self.server.base_url());
        if let Some(relative) = entry.url.strip_prefix(&base) {
            vp.boxfile_relative_path = relative.to_string();
        }
        Some(vp)
    }

    /// Publish a new version: record it in the metadata, then upload its box file
    pub async fn add_version_provider(&mut self, vp: &VersionProvider) -> Result<()> {
        self.require_valid_server()?;
        let boxfile = vp
            .boxfile_local_path
            .clone()
            .ok_or_else(|| CatalogError::MissingBoxfile {
                version: vp.version.clone(),
            })?;
        let url = self.server.file_url(&vp.boxfile_relative_path);
        let mut updated = self.loaded_metadata()?.clone();
        if updated.find_version(&vp.version).is_some() {
            return Err(CatalogError::VersionExists {
                version: vp.version.clone(),
            });
        }

        updated.versions.push(BoxVersion {
            version: vp.version.clone(),
            providers: vec![ProviderEntry {
                name: vp.provider.clone(),
                url,
                checksum_type: vp.checksum_type.clone(),
                checksum: vp.checksum.clone(),
            }],
        });
        self.publish_metadata(&updated).await?;

        let remote_path = format!(
            "{}/{}",
            self.server.boxes_dir.trim_end_matches('/'),
            vp.boxfile_relative_path
        );
        let remote = self.remote_spec(&remote_path);
        let command = format!("scp -Bqv {} {}", local_arg(&boxfile), remote);
        info!("Uploading {} to {}", boxfile.display(), remote_path);
        self.remote(&command).await?;
        Ok(())
    }

    /// Box name
    pub fn box_name(&self) -> &str {
        &self.box_name
    }

    /// Description used when the box is added
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Set the description used when the box is added
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// The server this catalog talks to
    pub fn server(&self) -> &CatalogServer {
        &self.server
    }

    /// Whether the server name resolved at connect time
    pub fn is_server_valid(&self) -> bool {
        self.valid_server
    }

    /// The loaded metadata, if any
    pub fn metadata(&self) -> Option<&CatalogMetadata> {
        self.metadata.as_ref()
    }

    /// Box name as recorded in the metadata
    pub fn name_from_metadata(&self) -> Option<&str> {
        self.metadata.as_ref().map(|m| m.name.as_str())
    }

    /// Description as recorded in the metadata
    pub fn description_from_metadata(&self) -> Option<&str> {
        self.metadata.as_ref().map(|m| m.description.as_str())
    }

    /// URL to give `vagrant box add`
    pub fn box_url(&self) -> String {
        self.server.metadata_url(&self.box_name)
    }

    /// The shell remote commands run through
    pub fn shell(&self) -> &S {
        &self.shell
    }

    /// Mutable access to the shell remote commands run through
    pub fn shell_mut(&mut self) -> &mut S {
        &mut self.shell
    }

    fn loaded_metadata(&self) -> Result<&CatalogMetadata> {
        self.metadata.as_ref().ok_or_else(|| CatalogError::NoMetadata {
            box_name: self.box_name.clone(),
        })
    }

    fn require_valid_server(&self) -> Result<()> {
        if self.valid_server {
            Ok(())
        } else {
            Err(CatalogError::InvalidServer {
                domain: self.server.domain.clone(),
            })
        }
    }

    fn ssh_command(&self, flags: &str, remote_command: &str) -> String {
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!("{} ", flags)
        };
        format!("ssh {}{} {}", flags, quote(&self.server.login()), quote(remote_command))
    }

    fn remote_spec(&self, path: &str) -> String {
        quote(&format!("{}:{}", self.server.login(), path))
    }

    async fn remote(&mut self, command: &str) -> Result<ExecutionResult> {
        let result = self.shell.execute(command).await;
        if result.succeeded() {
            return Ok(result);
        }
        warn!(
            "Remote command failed with exit status {}: {}",
            result.exit_code(),
            command
        );
        Err(CatalogError::RemoteCommand {
            command: command.to_string(),
            exit_code: result.exit_code(),
            stderr: result.stderr().to_string(),
        })
    }
}

fn local_arg(path: &Path) -> String {
    quote(&path.to_string_lossy())
}

impl<S> fmt::Display for BoxCatalog<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "box:         {}", self.box_name)?;
        writeln!(f, "server:      {}", self.server.login())?;
        writeln!(f, "valid:       {}", self.valid_server)?;
        writeln!(f, "url:         {}", self.server.metadata_url(&self.box_name))?;
        match &self.metadata {
            Some(metadata) => {
                let yaml = serde_yaml::to_string(metadata).map_err(|_| fmt::Error)?;
                writeln!(f, "metadata:")?;
                for line in yaml.lines() {
                    writeln!(f, "  {}", line)?;
                }
                Ok(())
            }
            None => writeln!(f, "metadata:    none"),
        }
    }
}
