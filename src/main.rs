use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use nixwrap::config::{DEFAULT_CONFIG_PATH, DEFAULT_PACKAGE_NIX_PATH, load_config};
use nixwrap::update::Updater;
use nixwrap::version::error::RegistryError;

#[derive(Parser)]
#[command(name = "nixwrap")]
#[command(version, about = "Keep a wrapped package's pinned version and hash up to date")]
struct Cli {
    /// Path to wrapper.toml
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Path to the artifact holding the pinned version and sha256
    #[arg(long, default_value = DEFAULT_PACKAGE_NIX_PATH)]
    package_nix: PathBuf,

    /// Write JSON logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check whether a newer version is available
    Check,
    /// Update to the configured pinned version, the given version, or latest
    Update {
        /// Version to update to. When omitted, a version pinned under
        /// `[source]` in the config wins over the latest release
        #[arg(short, long)]
        version: Option<String>,
    },
    /// Show registry information for a version (latest when omitted)
    Info { version: Option<String> },
    /// Print the content hash of a version's tarball
    Hash { version: String },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = nixwrap::logging::init(cli.log_file.as_deref())?;

    let result = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(run(cli));

    if let Err(error) = &result {
        if is_registry_request_failure(error) {
            warn!("Registry request failed; check network access and the [registries] settings");
        }
    }
    result
}

fn is_registry_request_failure(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        cause
            .downcast_ref::<RegistryError>()
            .is_some_and(RegistryError::is_request_failure)
    })
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli.config)?;
    let updater = Updater::from_config(&config, &cli.package_nix)?;

    match cli.command {
        Command::Check => {
            let result = updater.check_for_updates().await?;
            if result.update_available {
                println!(
                    "Update available: {} -> {}",
                    result.current_version, result.latest_version
                );
            } else {
                println!("Already at latest version ({})", result.current_version);
            }
        }
        Command::Update { version } => {
            let target = version.or_else(|| config.source.version.clone());
            match &target {
                Some(target) => info!("Updating {} to {}", config.source.name, target),
                None => info!("Updating {} to latest", config.source.name),
            }

            let result = updater
                .update_to_version(target.as_deref())
                .await
                .with_context(|| format!("failed to update {}", cli.package_nix.display()))?;

            if !result.update_available {
                println!("Already at version {}", result.current_version);
                return Ok(());
            }

            println!(
                "Updated: {} -> {}",
                result.current_version, result.latest_version
            );
            if let Some(hash) = result.new_hash {
                println!("Hash: {}", hash);
            }
        }
        Command::Info { version } => {
            let info = updater.version_info(version.as_deref()).await?;
            println!("Version: {}", info.version);
            println!("Tarball: {}", info.tarball_url);
            if let Some(published_at) = info.published_at {
                println!("Published: {}", published_at);
            }
            if let Some(sha256) = info.sha256 {
                println!("Registry sha256: {}", sha256);
            }
        }
        Command::Hash { version } => {
            println!("{}", updater.fetch_hash(&version).await?);
        }
    }

    Ok(())
}
