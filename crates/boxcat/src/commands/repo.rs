use anyhow::{bail, Result};
use clap::Subcommand;
use command_runner::CommandRunner;
use repo_status::RepoStatus;
use std::path::Path;
use tracing::error;

use super::load_config;

#[derive(Subcommand)]
pub enum RepoCommands {
    /// Show the working copy status of one or all repositories
    Status {
        /// Repository name (empty means all)
        name: Option<String>,
    },

    /// Clone a repository into its local directory
    Clone {
        /// Repository name
        name: String,
    },

    /// Fetch from all remotes
    Fetch {
        /// Repository name (empty means all)
        name: Option<String>,
    },
}

pub async fn run(config_path: &Path, command: RepoCommands) -> Result<()> {
    let config = load_config(config_path)?;
    let mut shell = CommandRunner::new();

    match command {
        RepoCommands::Status { name } => {
            let repos = config.select_repos(name.as_deref())?;
            if repos.is_empty() {
                println!("No repositories configured");
                return Ok(());
            }

            let mut failures = 0;
            for repo in repos {
                if !repo.exists_locally() {
                    println!("{:<20} not cloned ({})", repo.name, repo.local_dir.display());
                    continue;
                }
                match repo.status(&mut shell).await {
                    Ok(status) => println!("{:<20} {}", repo.name, describe(&status)),
                    Err(e) => {
                        error!("{}: {}", repo.name, e);
                        println!("{:<20} error", repo.name);
                        failures += 1;
                    }
                }
            }
            if failures > 0 {
                bail!("{} repositories could not be inspected", failures);
            }
        }
        RepoCommands::Clone { name } => {
            let repo = config.repo(&name)?;
            repo.clone_repo(&mut shell).await?;
            println!("Cloned {} into {}", repo.name, repo.local_dir.display());
        }
        RepoCommands::Fetch { name } => {
            for repo in config.select_repos(name.as_deref())? {
                if !repo.exists_locally() {
                    println!("Skipping {}: not cloned", repo.name);
                    continue;
                }
                repo.fetch(&mut shell).await?;
                println!("Fetched {}", repo.name);
            }
        }
    }

    Ok(())
}

/// One-line summary of a status, e.g. `main [origin/main] clean, ahead 2`
pub fn describe(status: &RepoStatus) -> String {
    let mut parts = Vec::new();
    let mut head = match (&status.branch, status.detached) {
        (Some(branch), false) => branch.clone(),
        (Some(commit), true) => format!("detached at {}", commit),
        (None, _) => "unknown branch".to_string(),
    };
    if let Some(upstream) = &status.upstream {
        head.push_str(&format!(" [{}]", upstream));
    }

    parts.push(if status.clean { "clean" } else { "modified" }.to_string());
    if status.is_ahead() {
        parts.push(format!("ahead {}", status.ahead));
    }
    if status.is_behind() {
        parts.push(format!("behind {}", status.behind));
    }
    if status.is_current() {
        parts.push("up to date".to_string());
    }

    format!("{} {}", head, parts.join(", "))
}
