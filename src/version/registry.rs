//! Registry trait for resolving package versions from various sources

use std::ops::{Deref, DerefMut};

use async_trait::async_trait;
use tracing::debug;

use crate::version::error::RegistryError;
use crate::version::types::{PackageRegistry, VersionInfo};

/// Capability interface shared by every registry backend
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Returns the kind of registry this implementation handles
    fn registry_kind(&self) -> PackageRegistry;

    /// Resolves the version the registry currently reports as latest
    ///
    /// # Arguments
    /// * `package_name` - The name of the package (e.g., "owner/repo" for GitHub releases)
    async fn resolve_latest_version(&self, package_name: &str) -> Result<String, RegistryError>;

    /// Resolves full information for `version`, or for the latest version when `None`
    async fn resolve_version_info(
        &self,
        package_name: &str,
        version: Option<&str>,
    ) -> Result<VersionInfo, RegistryError>;

    /// Resolves the archive URL for a specific version
    async fn resolve_tarball_url(
        &self,
        package_name: &str,
        version: &str,
    ) -> Result<String, RegistryError>;

    /// Closes the underlying HTTP session. Calling it more than once is a no-op.
    fn release_resources(&mut self);
}

/// Owns a registry client for the duration of one lookup and releases it on drop
pub struct RegistrySession {
    client: Box<dyn RegistryClient>,
}

impl RegistrySession {
    pub fn new(client: Box<dyn RegistryClient>) -> Self {
        Self { client }
    }
}

impl Deref for RegistrySession {
    type Target = dyn RegistryClient;

    fn deref(&self) -> &Self::Target {
        self.client.as_ref()
    }
}

impl DerefMut for RegistrySession {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.client.as_mut()
    }
}

impl Drop for RegistrySession {
    fn drop(&mut self) {
        debug!(
            "Releasing {} registry session",
            self.client.registry_kind()
        );
        self.client.release_resources();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingClient {
        releases: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl RegistryClient for CountingClient {
        fn registry_kind(&self) -> PackageRegistry {
            PackageRegistry::Npm
        }

        async fn resolve_latest_version(
            &self,
            package_name: &str,
        ) -> Result<String, RegistryError> {
            Err(RegistryError::NotFound(package_name.to_string()))
        }

        async fn resolve_version_info(
            &self,
            package_name: &str,
            _version: Option<&str>,
        ) -> Result<VersionInfo, RegistryError> {
            Err(RegistryError::NotFound(package_name.to_string()))
        }

        async fn resolve_tarball_url(
            &self,
            package_name: &str,
            version: &str,
        ) -> Result<String, RegistryError> {
            Ok(format!("https://example.test/{package_name}-{version}.tgz"))
        }

        fn release_resources(&mut self) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    async fn failing_lookup(session: RegistrySession) -> Result<String, RegistryError> {
        let version = session.resolve_latest_version("missing").await?;
        Ok(version)
    }

    #[tokio::test]
    async fn session_releases_client_when_lookup_fails() {
        let releases = Arc::new(AtomicUsize::new(0));
        let session = RegistrySession::new(Box::new(CountingClient {
            releases: releases.clone(),
        }));

        let result = failing_lookup(session).await;

        assert!(matches!(result, Err(RegistryError::NotFound(_))));
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn session_releases_client_without_any_request() {
        let releases = Arc::new(AtomicUsize::new(0));
        drop(RegistrySession::new(Box::new(CountingClient {
            releases: releases.clone(),
        })));

        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }
}
