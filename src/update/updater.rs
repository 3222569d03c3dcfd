//! Check and update workflow for the pinned version/hash pair

use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::{PackageSource, WrapperConfig};
use crate::hashing::{HashError, HashResolver, NixPrefetchUrl};
use crate::update::artifact::{FileArtifact, PinnedArtifact};
use crate::update::state::{PinnedField, PinnedState, StateError, read_field};
use crate::version::error::RegistryError;
use crate::version::factory::{DefaultRegistryFactory, RegistryFactory};
use crate::version::registry::RegistrySession;
use crate::version::types::{PackageRegistry, UpdateResult, VersionInfo};

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("Missing configuration: {0}")]
    ConfigurationMissing(String),

    #[error("{registry} lookup for {package} failed: {source}")]
    Registry {
        registry: PackageRegistry,
        package: String,
        #[source]
        source: RegistryError,
    },

    #[error(transparent)]
    Hash(#[from] HashError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error("Failed to access pinned artifact: {0}")]
    Artifact(#[from] std::io::Error),
}

/// Keeps the artifact's pinned state in sync with the package's registry
pub struct Updater<F, H, A> {
    source: PackageSource,
    factory: F,
    hasher: H,
    artifact: A,
}

impl Updater<DefaultRegistryFactory, NixPrefetchUrl, FileArtifact> {
    /// Updater using the real registries, `nix-prefetch-url` and `package_nix` on disk
    pub fn from_config(
        config: &WrapperConfig,
        package_nix: impl Into<PathBuf>,
    ) -> Result<Self, UpdateError> {
        Self::new(
            config.source.clone(),
            DefaultRegistryFactory::new(config.registries.clone()),
            NixPrefetchUrl::default(),
            FileArtifact::new(package_nix),
        )
    }
}

impl<F, H, A> Updater<F, H, A>
where
    F: RegistryFactory,
    H: HashResolver,
    A: PinnedArtifact,
{
    pub fn new(
        source: PackageSource,
        factory: F,
        hasher: H,
        artifact: A,
    ) -> Result<Self, UpdateError> {
        if source.name.trim().is_empty() {
            return Err(UpdateError::ConfigurationMissing(format!(
                "no package name configured for {} source",
                source.registry
            )));
        }

        Ok(Self {
            source,
            factory,
            hasher,
            artifact,
        })
    }

    pub fn source(&self) -> &PackageSource {
        &self.source
    }

    /// Reads the pinned version
    pub fn current_version(&self) -> Result<String, UpdateError> {
        let content = self.artifact.read()?;
        Ok(read_field(&content, PinnedField::Version)?)
    }

    /// Reads the pinned sha256
    pub fn current_hash(&self) -> Result<String, UpdateError> {
        let content = self.artifact.read()?;
        Ok(read_field(&content, PinnedField::Sha256)?)
    }

    /// Compares the pinned version with the registry's latest. Never writes.
    pub async fn check_for_updates(&self) -> Result<UpdateResult, UpdateError> {
        let current_version = self.current_version()?;
        let latest_version = self.latest_version().await?;

        debug!(
            "{}: pinned {}, latest {}",
            self.source.name, current_version, latest_version
        );
        Ok(UpdateResult::compared(current_version, latest_version))
    }

    /// Looks up `version`, or the latest version when `None`
    pub async fn version_info(&self, version: Option<&str>) -> Result<VersionInfo, UpdateError> {
        let registry = self.open_registry()?;
        registry
            .resolve_version_info(&self.source.name, version)
            .await
            .map_err(|e| self.registry_error(e))
    }

    /// Resolves the tarball of `version` and hashes it
    pub async fn fetch_hash(&self, version: &str) -> Result<String, UpdateError> {
        let info = self.version_info(Some(version)).await?;
        Ok(self.hasher.prefetch_hash(&info.tarball_url).await?)
    }

    /// Moves the artifact to `version` (or the latest version) and its hash.
    ///
    /// Returns without touching the artifact or the hasher when the target
    /// equals the pinned version.
    pub async fn update_to_version(
        &self,
        version: Option<&str>,
    ) -> Result<UpdateResult, UpdateError> {
        let content = self.artifact.read()?;
        let current = PinnedState::parse(&content)?;

        let target = match version {
            Some(version) => version.to_string(),
            None => self.latest_version().await?,
        };

        if target == current.version {
            info!("{} is already at {}", self.source.name, target);
            return Ok(UpdateResult::compared(current.version, target));
        }

        let new_hash = self.fetch_hash(&target).await?;

        let next = PinnedState {
            version: target,
            sha256: new_hash,
        };
        self.artifact.write(&next.apply(&content)?)?;

        info!(
            "Updated {}: {} -> {}",
            self.source.name, current.version, next.version
        );
        Ok(UpdateResult::applied(
            current.version,
            next.version,
            next.sha256,
        ))
    }

    async fn latest_version(&self) -> Result<String, UpdateError> {
        let registry = self.open_registry()?;
        registry
            .resolve_latest_version(&self.source.name)
            .await
            .map_err(|e| self.registry_error(e))
    }

    fn open_registry(&self) -> Result<RegistrySession, UpdateError> {
        let client = self
            .factory
            .get_registry(self.source.registry)
            .map_err(|e| self.registry_error(e))?;
        Ok(RegistrySession::new(client))
    }

    fn registry_error(&self, source: RegistryError) -> UpdateError {
        UpdateError::Registry {
            registry: self.source.registry,
            package: self.source.name.clone(),
            source,
        }
    }
}
