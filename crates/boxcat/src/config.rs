//! `boxcat.yaml` parsing with environment variable substitution

use box_catalog::CatalogServer;
use regex::Regex;
use repo_status::ProjectRepo;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

static VAR_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid regex"));

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse YAML
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// Environment variable not found
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    /// Repository name not in the configuration
    #[error("Repository '{0}' not found")]
    RepoNotFound(String),

    /// A catalog command was given a configuration without a server
    #[error("No catalog server configured")]
    NoServer,
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Configuration format version
    pub version: String,
    /// Catalog server, needed by the catalog commands
    #[serde(default)]
    pub server: Option<CatalogServer>,
    /// Repositories the repo commands work on
    #[serde(default)]
    pub repos: Vec<ProjectRepo>,
}

impl Config {
    /// The configured catalog server
    pub fn server(&self) -> Result<&CatalogServer> {
        self.server.as_ref().ok_or(ConfigError::NoServer)
    }

    /// Look up a repository by name
    pub fn repo(&self, name: &str) -> Result<&ProjectRepo> {
        self.repos
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| ConfigError::RepoNotFound(name.to_string()))
    }

    /// One named repository, or all of them
    pub fn select_repos(&self, name: Option<&str>) -> Result<Vec<&ProjectRepo>> {
        match name {
            Some(name) => Ok(vec![self.repo(name)?]),
            None => Ok(self.repos.iter().collect()),
        }
    }
}

/// Parse a YAML configuration file
pub fn parse_file(path: impl AsRef<Path>) -> Result<Config> {
    let content = std::fs::read_to_string(path)?;
    parse_str(&content)
}

/// Parse YAML configuration from a string, substituting from the environment
pub fn parse_str(content: &str) -> Result<Config> {
    parse_str_with(content, |name| std::env::var(name).ok())
}

/// Parse YAML configuration, resolving `${VAR}` references with `lookup`
pub fn parse_str_with<F>(content: &str, lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let content = substitute_vars_with(content, lookup)?;
    let mut config: Config = serde_yaml::from_str(&content)?;
    validate_config(&config)?;
    for repo in &mut config.repos {
        repo.local_dir = expand_home(&repo.local_dir);
    }
    Ok(config)
}

fn validate_config(config: &Config) -> Result<()> {
    if config.version != "1.0" {
        return Err(ConfigError::ValidationError(format!(
            "Unsupported version: {}, expected 1.0",
            config.version
        )));
    }

    if let Some(server) = &config.server {
        if server.domain.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Server domain must not be empty".to_string(),
            ));
        }
        if server.user.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Server user must not be empty".to_string(),
            ));
        }
    }

    let mut seen = HashSet::new();
    for repo in &config.repos {
        if repo.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Repository name must not be empty".to_string(),
            ));
        }
        if !seen.insert(repo.name.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Repository '{}' is defined more than once",
                repo.name
            )));
        }
    }

    Ok(())
}

/// Replace `${VAR}` and `${VAR:-default}` references.
///
/// Every unresolved name is reported, not just the first.
pub fn substitute_vars_with<F>(input: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut missing = Vec::new();
    let output = VAR_REF.replace_all(input, |caps: &regex::Captures<'_>| {
        let expr = &caps[1];
        let (name, default) = match expr.split_once(":-") {
            Some((name, default)) => (name, Some(default)),
            None => (expr, None),
        };
        match lookup(name).or_else(|| default.map(str::to_string)) {
            Some(value) => value,
            None => {
                missing.push(name.to_string());
                String::new()
            }
        }
    });

    if !missing.is_empty() {
        return Err(ConfigError::EnvVarNotFound(missing.join(", ")));
    }
    Ok(output.into_owned())
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_in(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    const FULL: &str = r#"
version: "1.0"
server:
  domain: ${BOX_DOMAIN}
  user: ${BOX_USER:-vagrant}
repos:
  - name: tools
    local_dir: /src/tools
    url: git@example.com:me/tools.git
  - name: docs
    local_dir: /src/docs
    url: https://example.com/docs.git
"#;

    #[test]
    fn test_parse_full_config() {
        let lookup = lookup_in(&[("BOX_DOMAIN", "boxes.example.com")]);
        let config = parse_str_with(FULL, lookup).unwrap();

        let server = config.server().unwrap();
        assert_eq!(server.domain, "boxes.example.com");
        assert_eq!(server.user, "vagrant");
        assert_eq!(server.boxes_dir, box_catalog::DEFAULT_BOXES_DIR);
        assert_eq!(config.repos.len(), 2);
        assert_eq!(config.repo("docs").unwrap().url, "https://example.com/docs.git");
    }

    #[test]
    fn test_parse_minimal_config() {
        let config = parse_str_with("version: \"1.0\"\n", lookup_in(&[])).unwrap();
        assert!(config.repos.is_empty());
        assert!(matches!(config.server(), Err(ConfigError::NoServer)));
    }

    #[test]
    fn test_missing_vars_are_all_reported() {
        let err =
            substitute_vars_with("${ONE} and ${TWO} and ${THREE:-3}", lookup_in(&[])).unwrap_err();
        match err {
            ConfigError::EnvVarNotFound(names) => assert_eq!(names, "ONE, TWO"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_var_default_and_override() {
        let lookup = lookup_in(&[("SET", "real")]);
        assert_eq!(
            substitute_vars_with("${SET:-fallback}/${UNSET:-fallback}", lookup).unwrap(),
            "real/fallback"
        );
    }

    #[test]
    fn test_unsupported_version() {
        let err = parse_str_with("version: \"2.0\"\n", lookup_in(&[])).unwrap_err();
        assert!(err.to_string().contains("Unsupported version: 2.0"));
    }

    #[test]
    fn test_duplicate_repo_names() {
        let yaml = r#"
version: "1.0"
repos:
  - { name: a, local_dir: /a, url: x }
  - { name: a, local_dir: /b, url: y }
"#;
        let err = parse_str_with(yaml, lookup_in(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(msg) if msg.contains("more than once")));
    }

    #[test]
    fn test_empty_server_domain() {
        let yaml = "version: \"1.0\"\nserver:\n  domain: \"\"\n  user: vagrant\n";
        assert!(matches!(
            parse_str_with(yaml, lookup_in(&[])),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_select_repos() {
        let config = parse_str_with(FULL, lookup_in(&[("BOX_DOMAIN", "h")])).unwrap();
        assert_eq!(config.select_repos(None).unwrap().len(), 2);
        assert_eq!(config.select_repos(Some("tools")).unwrap()[0].name, "tools");
        assert!(matches!(
            config.select_repos(Some("nope")),
            Err(ConfigError::RepoNotFound(_))
        ));
    }

    #[test]
    fn test_home_expansion() {
        let Some(home) = dirs::home_dir() else {
            println!("Skipping test - no home directory");
            return;
        };
        assert_eq!(expand_home(Path::new("~/src/tools")), home.join("src/tools"));
        assert_eq!(expand_home(Path::new("/abs/path")), PathBuf::from("/abs/path"));
    }
}
