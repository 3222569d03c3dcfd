//! Content hash resolution for release tarballs

#[cfg(test)]
use mockall::automock;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

/// Tool used by [`NixPrefetchUrl`] unless told otherwise
pub const DEFAULT_PREFETCH_PROGRAM: &str = "nix-prefetch-url";

#[derive(Debug, Error)]
pub enum HashError {
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("Hashing {url} failed ({status}): {stderr}")]
    Failed {
        url: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("Hashing {url} produced no output")]
    EmptyOutput { url: String },
}

/// Obtains the sha256 of the archive behind a URL
#[cfg_attr(test, automock)]
#[async_trait]
pub trait HashResolver: Send + Sync {
    async fn prefetch_hash(&self, url: &str) -> Result<String, HashError>;
}

/// Hashes URLs by shelling out to `nix-prefetch-url --type sha256`
#[derive(Debug, Clone)]
pub struct NixPrefetchUrl {
    program: String,
}

impl NixPrefetchUrl {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for NixPrefetchUrl {
    fn default() -> Self {
        Self::new(DEFAULT_PREFETCH_PROGRAM)
    }
}

#[async_trait]
impl HashResolver for NixPrefetchUrl {
    async fn prefetch_hash(&self, url: &str) -> Result<String, HashError> {
        debug!("Running {} for {}", self.program, url);

        let output = Command::new(&self.program)
            .args(["--type", "sha256", url])
            .output()
            .await
            .map_err(|source| HashError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(HashError::Failed {
                url: url.to_string(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        // The hash is the last line; earlier lines are download progress
        let stdout = String::from_utf8_lossy(&output.stdout);
        let hash = stdout
            .lines()
            .map(str::trim)
            .rfind(|line| !line.is_empty())
            .ok_or_else(|| HashError::EmptyOutput {
                url: url.to_string(),
            })?
            .to_string();

        info!("Resolved hash {} for {}", hash, url);
        Ok(hash)
    }
}
