//! Registry factory: maps a registry kind to a constructed client

use tracing::debug;

use crate::config::RegistriesConfig;
use crate::version::error::RegistryError;
use crate::version::registries::{NpmRegistry, PypiRegistry};
use crate::version::registry::RegistryClient;
use crate::version::types::PackageRegistry;

/// Constructs registry clients by kind
pub trait RegistryFactory: Send + Sync {
    /// Returns a fresh client for `kind`, or `RegistryError::Unimplemented`
    /// for kinds without a backend wired in
    fn get_registry(&self, kind: PackageRegistry)
    -> Result<Box<dyn RegistryClient>, RegistryError>;
}

/// Factory backed by the real HTTP registries
#[derive(Debug, Clone, Default)]
pub struct DefaultRegistryFactory {
    config: RegistriesConfig,
}

impl DefaultRegistryFactory {
    pub fn new(config: RegistriesConfig) -> Self {
        Self { config }
    }
}

impl RegistryFactory for DefaultRegistryFactory {
    fn get_registry(
        &self,
        kind: PackageRegistry,
    ) -> Result<Box<dyn RegistryClient>, RegistryError> {
        debug!("Creating {} registry client", kind);

        match kind {
            PackageRegistry::Npm => Ok(Box::new(NpmRegistry::new(
                &self.config.npm_url,
                self.config.timeout(),
            )?)),
            PackageRegistry::Pypi => Ok(Box::new(PypiRegistry::new(
                &self.config.pypi_url,
                self.config.timeout(),
            )?)),
            // GitHubRegistry exists but is only built directly, not by kind
            PackageRegistry::Cargo | PackageRegistry::GithubRelease => {
                Err(RegistryError::Unimplemented(kind))
            }
        }
    }
}
