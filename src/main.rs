use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fluxdigest::config::DigestConfig;
use fluxdigest::digest::GroupingStrategy;
use fluxdigest::{cli, scheduler};

#[derive(Parser)]
#[command(
    name = "fluxdigest",
    version,
    about = "Scheduled digests of unread Miniflux entries"
)]
struct Cli {
    /// Config file (defaults to ~/.fluxdigest/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the digest scheduler, archive cleanup and archive server
    Serve,
    /// Run one digest batch now and exit
    Run,
    /// Delete archived digests past the retention window
    Cleanup {
        /// List what would be deleted without touching disk
        #[arg(long)]
        dry_run: bool,
    },
    /// Show what is in the archive
    Status,
    /// Print the rendered digest for one category without archiving it
    Preview {
        /// Category ID
        #[arg(long)]
        category: i64,
        /// Override the configured grouping strategy (day, feed or ai)
        #[arg(long)]
        group_by: Option<GroupingStrategy>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => DigestConfig::load_from(path)?,
        None => DigestConfig::load()?,
    };

    // Log to stderr so `preview` output on stdout stays clean HTML.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => {
            scheduler::serve(config).await?;
        }
        Command::Run => {
            cli::run_once(&config).await?;
        }
        Command::Cleanup { dry_run } => {
            cli::cleanup(&config, dry_run)?;
        }
        Command::Status => {
            cli::status(&config)?;
        }
        Command::Preview { category, group_by } => {
            cli::preview(&config, category, group_by).await?;
        }
    }

    Ok(())
}
