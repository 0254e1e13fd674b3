use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;
mod logging;

use commands::catalog::CatalogCommands;
use commands::repo::RepoCommands;
use commands::run::Report;

#[derive(Parser)]
#[command(name = "boxcat")]
#[command(about = "Run commands, check repositories, and manage a Vagrant box catalog")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, default_value = "boxcat.yaml")]
    config: PathBuf,

    /// Log debug detail to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a command line and report its output
    Run {
        /// Log each output line as it arrives
        #[arg(long)]
        stream: bool,

        /// Print the full result as JSON instead of the report
        #[arg(long, conflicts_with = "log")]
        json: bool,

        /// Send the report to the log on stderr instead of stdout
        #[arg(long)]
        log: bool,

        /// Command line to run
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Inspect and update configured repositories
    Repo {
        #[command(subcommand)]
        command: RepoCommands,
    },

    /// Manage a box in the catalog
    Catalog {
        /// Box name, e.g. team/mint17
        #[arg(short = 'b', long = "box")]
        box_name: String,

        #[command(subcommand)]
        command: CatalogCommands,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let streaming = matches!(cli.command, Commands::Run { stream: true, .. });
    logging::init(cli.verbose || streaming);

    smol::block_on(async move {
        match cli.command {
            Commands::Run {
                stream,
                json,
                log,
                command,
            } => {
                let report = if json {
                    Report::Json
                } else if log {
                    Report::Log
                } else {
                    Report::Console
                };
                commands::run::run(command, stream, report).await
            }
            Commands::Repo { command } => commands::repo::run(&cli.config, command).await,
            Commands::Catalog { box_name, command } => {
                commands::catalog::run(&cli.config, &box_name, command).await
            }
        }
    })
}
