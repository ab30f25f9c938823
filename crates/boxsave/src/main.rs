//! Box Save - publish box images to a box server and prune old versions

use anyhow::{Result, bail};
use boxsave_client::{ArtifactIdentity, Cleaner, CleanupReport, ServerConfig, Uploader};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;
mod ui;

use config::Config;
use ui::ConsoleUi;

/// Box Save - publish box images to a box server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/boxsave.toml")]
    config: String,

    /// Box server base URL
    #[arg(long, env = "BOX_SERVER_URL")]
    server_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a box file as a new version, then prune old versions
    Push {
        /// Box name, namespaces separated by underscores (e.g. org_base_box)
        #[arg(long)]
        name: String,

        /// Provider the box was built for (e.g. virtualbox, vmware_fusion)
        #[arg(long)]
        provider: String,

        /// Version label to publish
        #[arg(long)]
        version: String,

        /// Box file to upload
        #[arg(long)]
        file: PathBuf,

        /// Number of most recent versions to keep after the upload
        #[arg(long)]
        keep: Option<usize>,
    },

    /// Delete all but the most recent versions of a box
    Clean {
        /// Box name, namespaces separated by underscores
        #[arg(long)]
        name: String,

        /// Number of most recent versions to keep
        #[arg(long)]
        keep: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration
    let config = Config::load(&args.config)?;

    // Initialize logging
    init_logging(&config.logging.level);

    // Resolve the box server, CLI/env URL first
    let server = config.server_config(args.server_url.as_deref());
    let ui = Arc::new(ConsoleUi);

    match args.command {
        Command::Push {
            name,
            provider,
            version,
            file,
            keep,
        } => {
            let artifact = ArtifactIdentity::new(name, provider);
            let uploader = Uploader::new(server.clone(), ui.clone());
            // Upload the box file
            let provider = uploader.send(&artifact, &file, &version).await?;
            println!("Published {} {} for provider {}", artifact.name, version, provider);

            // Prune old versions if a retention count is set
            if let Some(keep) = keep.or(config.cleanup.keep) {
                run_cleanup(server, ui, &artifact, keep).await?;
            } else {
                debug!("No retention count configured, skipping cleanup");
            }
        }
        Command::Clean { name, keep } => {
            let Some(keep) = keep.or(config.cleanup.keep) else {
                bail!("No retention count given; pass --keep or set [cleanup].keep");
            };
            let artifact = ArtifactIdentity::new(name, String::new());
            run_cleanup(server, ui, &artifact, keep).await?;
        }
    }

    Ok(())
}

async fn run_cleanup(
    server: ServerConfig,
    ui: Arc<ConsoleUi>,
    artifact: &ArtifactIdentity,
    keep: usize,
) -> Result<()> {
    let cleaner = Cleaner::new(server, ui);
    let report = cleaner.clean(artifact, keep).await?;
    print_report(&report);

    if !report.failed.is_empty() {
        info!("{} old versions could not be deleted", report.failed.len());
    }
    Ok(())
}

fn print_report(report: &CleanupReport) {
    for version in &report.deleted {
        println!("Deleted version {}", version);
    }
    for version in &report.failed {
        println!("Could not delete version {}", version);
    }
}

/// Initialize logging
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
