use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::version::registries::{github, npm, pypi};
use crate::version::types::PackageRegistry;

/// Timeout for a single registry request in seconds
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default location of the wrapper configuration
pub const DEFAULT_CONFIG_PATH: &str = "wrapper.toml";

/// Default location of the generated packaging artifact
pub const DEFAULT_PACKAGE_NIX_PATH: &str = "package.nix";

/// Environment variable consulted when no GitHub token is configured
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid configuration in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("source.name must not be empty")]
    MissingPackageName,
}

/// Wrapper configuration (`wrapper.toml`)
///
/// Only the tables the update engine consumes are modeled; the rendering
/// tables (`runtime`, `wrapper`, `meta`, ...) are ignored here.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct WrapperConfig {
    pub flake_name: String,
    pub source: PackageSource,
    #[serde(default)]
    pub registries: RegistriesConfig,
}

/// Where the wrapped package is fetched from
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PackageSource {
    pub registry: PackageRegistry,
    /// Package name in the registry (e.g., "@anthropic-ai/claude-code", "owner/repo")
    pub name: String,
    /// Pinned version, or None to follow latest
    #[serde(default)]
    pub version: Option<String>,
}

/// Registry endpoints and client settings
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RegistriesConfig {
    pub npm_url: String,
    pub pypi_url: String,
    pub github_url: String,
    pub timeout_secs: u64,
    pub github_token: Option<String>,
}

impl Default for RegistriesConfig {
    fn default() -> Self {
        Self {
            npm_url: npm::DEFAULT_BASE_URL.to_string(),
            pypi_url: pypi::DEFAULT_BASE_URL.to_string(),
            github_url: github::DEFAULT_BASE_URL.to_string(),
            timeout_secs: REQUEST_TIMEOUT_SECS,
            github_token: None,
        }
    }
}

impl RegistriesConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Configured token, else `$GITHUB_TOKEN`
    pub fn github_token(&self) -> Option<String> {
        github_token_with_env(
            self.github_token.clone(),
            std::env::var(GITHUB_TOKEN_ENV).ok(),
        )
    }
}

fn github_token_with_env(configured: Option<String>, env: Option<String>) -> Option<String> {
    configured.or(env).filter(|token| !token.is_empty())
}

impl WrapperConfig {
    /// Parses a configuration document
    pub fn from_toml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: WrapperConfig = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if config.source.name.trim().is_empty() {
            return Err(ConfigError::MissingPackageName);
        }

        Ok(config)
    }
}

/// Loads `wrapper.toml` from `path`
pub fn load_config(path: &Path) -> Result<WrapperConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    WrapperConfig::from_toml(&content, path)
}
