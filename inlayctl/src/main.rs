//! `inlayctl`: resolve the images of a document against an inlay cache.

mod commands;
mod scan;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "inlayctl",
    version,
    about = "Resolve inline document images against a persistent cache"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the cache file name derived from each reference
    Key {
        #[arg(required = true)]
        references: Vec<String>,
    },
    /// List the image references found in an HTML or Markdown document
    Scan { document: PathBuf },
    /// Resolve every image in a document, fetching misses, then re-render once
    Resolve(ResolveArgs),
    /// List published cache entries
    Entries(CacheArgs),
    /// Delete temp files left behind by interrupted cache writes
    Sweep(CacheArgs),
}

#[derive(Args, Debug)]
struct CacheArgs {
    /// Cache directory (overrides configuration)
    #[arg(long)]
    cache_dir: Option<PathBuf>,
    /// Configuration file (TOML or JSON); defaults to the environment
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ResolveArgs {
    document: PathBuf,
    #[command(flatten)]
    cache: CacheArgs,
    /// Render width in layout pixels
    #[arg(long)]
    width: Option<u32>,
    /// Base URL for relative image references
    #[arg(long)]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Key { references } => {
            init_tracing(None);
            commands::print_keys(&references);
            Ok(())
        }
        Command::Scan { document } => {
            init_tracing(None);
            commands::scan(&document)
        }
        Command::Resolve(args) => {
            let config = commands::load_config(&args.cache)?;
            init_tracing(config.log_filter.as_deref());
            commands::resolve(config, &args).await
        }
        Command::Entries(args) => {
            let config = commands::load_config(&args)?;
            init_tracing(config.log_filter.as_deref());
            commands::entries(&config)
        }
        Command::Sweep(args) => {
            let config = commands::load_config(&args)?;
            init_tracing(config.log_filter.as_deref());
            commands::sweep(&config)
        }
    }
}

/// Logs go to stderr so stdout stays a clean table.
fn init_tracing(configured: Option<&str>) {
    let fallback = configured.unwrap_or("warn").to_string();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
