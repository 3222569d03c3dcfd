//! Registry and artifact test utilities

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tempfile::TempDir;

use nixwrap::config::{PackageSource, RegistriesConfig};
use nixwrap::hashing::{HashError, HashResolver};
use nixwrap::update::{FileArtifact, Updater};
use nixwrap::version::error::RegistryError;
use nixwrap::version::factory::{DefaultRegistryFactory, RegistryFactory};
use nixwrap::version::registries::GitHubRegistry;
use nixwrap::version::registry::RegistryClient;
use nixwrap::version::types::PackageRegistry;

/// Hash resolver answering from a fixed table and recording requested URLs
pub struct FakeHasher {
    hashes: Vec<(String, String)>,
    requested: Mutex<Vec<String>>,
}

impl FakeHasher {
    pub fn new() -> Self {
        Self {
            hashes: Vec::new(),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn with_hash(mut self, url: &str, hash: &str) -> Self {
        self.hashes.push((url.to_string(), hash.to_string()));
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl HashResolver for &FakeHasher {
    async fn prefetch_hash(&self, url: &str) -> Result<String, HashError> {
        self.requested.lock().unwrap().push(url.to_string());
        self.hashes
            .iter()
            .find(|(known, _)| known == url)
            .map(|(_, hash)| hash.clone())
            .ok_or_else(|| HashError::EmptyOutput {
                url: url.to_string(),
            })
    }
}

/// Writes `content` to a package.nix inside a fresh temp dir
pub fn create_package_nix(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("package.nix");
    std::fs::write(&path, content).unwrap();
    (temp_dir, path)
}

/// Registry settings pointing every backend at `base_url`
pub fn registries_for(base_url: &str) -> RegistriesConfig {
    RegistriesConfig {
        npm_url: base_url.to_string(),
        pypi_url: base_url.to_string(),
        github_url: base_url.to_string(),
        timeout_secs: 5,
        github_token: Some("test-token".to_string()),
    }
}

/// Default factory that additionally builds GitHub release clients
pub struct TestRegistryFactory {
    config: RegistriesConfig,
    default: DefaultRegistryFactory,
}

impl TestRegistryFactory {
    pub fn new(config: RegistriesConfig) -> Self {
        Self {
            default: DefaultRegistryFactory::new(config.clone()),
            config,
        }
    }
}

impl RegistryFactory for TestRegistryFactory {
    fn get_registry(
        &self,
        kind: PackageRegistry,
    ) -> Result<Box<dyn RegistryClient>, RegistryError> {
        match kind {
            PackageRegistry::GithubRelease => Ok(Box::new(GitHubRegistry::new(
                &self.config.github_url,
                self.config.timeout(),
                self.config.github_token().as_deref(),
            )?)),
            _ => self.default.get_registry(kind),
        }
    }
}

/// Updater wired to real registry clients, a fake hasher and an artifact on disk
pub fn create_test_updater<'a>(
    registry: PackageRegistry,
    name: &str,
    base_url: &str,
    hasher: &'a FakeHasher,
    package_nix: &Path,
) -> Updater<TestRegistryFactory, &'a FakeHasher, FileArtifact> {
    Updater::new(
        PackageSource {
            registry,
            name: name.to_string(),
            version: None,
        },
        TestRegistryFactory::new(registries_for(base_url)),
        hasher,
        FileArtifact::new(package_nix),
    )
    .unwrap()
}
