pub mod catalog;
pub mod repo;
pub mod run;

use anyhow::{Context, Result};
use std::path::Path;

use crate::config::{self, Config};

/// Load the configuration file, naming it in any error
pub fn load_config(path: &Path) -> Result<Config> {
    config::parse_file(path).with_context(|| format!("Failed to load {}", path.display()))
}
