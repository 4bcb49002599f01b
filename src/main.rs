//! wheelfork CLI.
//!
//! Fetch a release (or the nightly channel) and write the forked artifacts to
//! the dist directory.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

use wheelfork::ArchiveTransformer;
use wheelfork::Channel;
use wheelfork::CommandArchiver;
use wheelfork::Driver;
use wheelfork::ForkConfig;
use wheelfork::NativeArchiver;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Archiver {
    /// zip/tar/flate2 in process
    Native,
    /// External zip, unzip and tar commands
    Command,
}

#[derive(Parser)]
#[command(name = "wheelfork")]
#[command(about = "Republish Python release artifacts under a forked package name")]
struct Cli {
    /// Version to fetch, or `nightly`
    version: String,

    /// TOML file overriding the built-in fork settings
    #[arg(long, env = "WHEELFORK_CONFIG")]
    config: Option<PathBuf>,

    /// Output directory (defaults to `dist`)
    #[arg(long)]
    dist: Option<PathBuf>,

    /// Archive backend
    #[arg(long, value_enum, default_value = "native")]
    archiver: Archiver,

    /// Enable verbose output
    #[arg(long, short)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = match &cli.config {
        Some(path) => ForkConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ForkConfig::default(),
    };
    if let Some(dist) = cli.dist {
        config.dist_dir = dist;
    }

    let archiver: Arc<dyn ArchiveTransformer> = match cli.archiver {
        Archiver::Native => Arc::new(NativeArchiver),
        Archiver::Command => Arc::new(CommandArchiver::default()),
    };

    let channel = Channel::parse(&cli.version);
    let driver = Driver::new(Arc::new(config), archiver)?;
    let patched = driver
        .run(&channel)
        .await
        .with_context(|| format!("patching {}", cli.version))?;

    for artifact in &patched {
        println!("{}", artifact.path.display());
    }

    Ok(())
}
