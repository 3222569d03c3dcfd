use thiserror::Error;

use crate::version::types::PackageRegistry;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Rate limited: retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Package not found: {0}")]
    NotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// `tried` holds the URLs or tags that were looked up
    #[error("Version {version} not found for {package} (tried {})", .tried.join(", "))]
    VersionNotFound {
        package: String,
        version: String,
        tried: Vec<String>,
    },

    #[error("No distribution files found for {package} {version}")]
    NoDistributionAvailable { package: String, version: String },

    #[error("Invalid package name: {0}")]
    InvalidPackageName(String),

    #[error("Registry {0} not yet implemented")]
    Unimplemented(PackageRegistry),

    #[error("Registry session already closed")]
    SessionClosed,
}

impl RegistryError {
    /// True for failures of the request itself (transport, status, body shape)
    pub fn is_request_failure(&self) -> bool {
        matches!(
            self,
            RegistryError::Network(_)
                | RegistryError::RateLimited { .. }
                | RegistryError::NotFound(_)
                | RegistryError::InvalidResponse(_)
                | RegistryError::SessionClosed
        )
    }
}
