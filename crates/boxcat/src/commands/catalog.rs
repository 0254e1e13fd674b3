use anyhow::{bail, Result};
use box_catalog::{BoxCatalog, VersionProvider, CHECKSUM_TYPE};
use clap::Subcommand;
use command_runner::CommandRunner;
use std::path::{Path, PathBuf};
use tracing::info;

use super::load_config;

#[derive(Subcommand)]
pub enum CatalogCommands {
    /// Show the box's catalog entry and metadata
    Info,

    /// Add the box to the catalog with no versions
    Add {
        /// Box description
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Remove the box and all of its box files from the catalog
    Remove,

    /// Show the newest version available for a provider
    Latest {
        /// Provider name, e.g. virtualbox
        provider: String,
    },

    /// Publish a box file as a new version
    Publish {
        /// Version, major.minor.patch
        version: String,
        /// Provider name, e.g. virtualbox
        provider: String,
        /// Box file to upload
        boxfile: PathBuf,
        /// Known sha1 checksum; computed from the box file when omitted
        #[arg(long)]
        checksum: Option<String>,
    },
}

pub async fn run(config_path: &Path, box_name: &str, command: CatalogCommands) -> Result<()> {
    let config = load_config(config_path)?;
    let server = config.server()?.clone();
    let mut catalog = BoxCatalog::connect(CommandRunner::new(), server, box_name).await;
    if !catalog.is_server_valid() {
        bail!("Cannot reach catalog server {}", catalog.server().domain);
    }

    match command {
        CatalogCommands::Info => {
            print!("{}", catalog);
        }
        CatalogCommands::Add { description } => {
            if catalog.metadata().is_some() {
                bail!("Box {} is already in the catalog", box_name);
            }
            catalog.set_description(description);
            catalog.add_box_to_catalog().await?;
            println!("Added {}", box_name);
            println!("  vagrant box add {}", catalog.box_url());
        }
        CatalogCommands::Remove => {
            if !catalog.exists_in_catalog().await? {
                bail!("Box {} is not in the catalog", box_name);
            }
            catalog.remove_box_from_catalog().await?;
            println!("Removed {}", box_name);
        }
        CatalogCommands::Latest { provider } => {
            let Some(latest) = catalog.latest_version_provider(&provider) else {
                bail!("No {} version of {} in the catalog", provider, box_name);
            };
            println!(
                "{} {} {}:{}",
                latest.version,
                catalog.server().file_url(&latest.boxfile_relative_path),
                latest.checksum_type,
                latest.checksum
            );
        }
        CatalogCommands::Publish {
            version,
            provider,
            boxfile,
            checksum,
        } => {
            if catalog.metadata().is_none() {
                bail!("Box {} is not in the catalog; add it first", box_name);
            }
            if !boxfile.is_file() {
                bail!("Box file {} does not exist", boxfile.display());
            }

            let mut vp = VersionProvider::new(box_name, version, provider).with_boxfile(&boxfile);
            match checksum {
                Some(checksum) => vp = vp.with_checksum(CHECKSUM_TYPE, checksum),
                None => {
                    let digest = vp.checksum_from_file(&mut CommandRunner::new()).await?;
                    info!("Computed checksum {}", digest);
                }
            }
            catalog.add_version_provider(&vp).await?;
            println!("Published {} {} {}", box_name, vp.version, vp.provider);
        }
    }

    Ok(())
}
