//! npm registry API implementation

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use tracing::info;

use crate::version::error::RegistryError;
use crate::version::registries::{build_client, fetch_json};
use crate::version::registry::RegistryClient;
use crate::version::types::{PackageRegistry, VersionInfo};

/// Default base URL for npm registry
pub const DEFAULT_BASE_URL: &str = "https://registry.npmjs.org";

/// Package document (`GET /{package}`)
#[derive(Debug, Deserialize)]
struct NpmPackageResponse {
    #[serde(rename = "dist-tags", default)]
    dist_tags: HashMap<String, String>,
}

/// Version document (`GET /{package}/{version}`)
#[derive(Debug, Deserialize)]
struct NpmVersionResponse {
    dist: NpmDist,
    #[serde(default)]
    time: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct NpmDist {
    tarball: String,
}

/// Registry implementation for npm registry API
pub struct NpmRegistry {
    client: Option<Client>,
    base_url: String,
}

impl NpmRegistry {
    /// Creates a new NpmRegistry with a custom base URL
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RegistryError> {
        Ok(Self {
            client: Some(build_client(timeout, HeaderMap::new())?),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn session(&self) -> Result<&Client, RegistryError> {
        self.client.as_ref().ok_or(RegistryError::SessionClosed)
    }

    /// Encode package name for URL (handles scoped packages)
    fn encode_package_name(package_name: &str) -> String {
        if package_name.starts_with('@') {
            // Scoped package: @scope/name -> @scope%2Fname
            package_name.replace('/', "%2F")
        } else {
            package_name.to_string()
        }
    }
}

#[async_trait]
impl RegistryClient for NpmRegistry {
    fn registry_kind(&self) -> PackageRegistry {
        PackageRegistry::Npm
    }

    async fn resolve_latest_version(&self, package_name: &str) -> Result<String, RegistryError> {
        let url = format!(
            "{}/{}",
            self.base_url,
            Self::encode_package_name(package_name)
        );

        let package: NpmPackageResponse = fetch_json(self.session()?, &url)
            .await?
            .ok_or_else(|| RegistryError::NotFound(package_name.to_string()))?;

        let latest = package.dist_tags.get("latest").cloned().ok_or_else(|| {
            RegistryError::InvalidResponse(format!(
                "missing dist-tags.latest for {}",
                package_name
            ))
        })?;

        info!("npm reports {}@{} as latest", package_name, latest);
        Ok(latest)
    }

    async fn resolve_version_info(
        &self,
        package_name: &str,
        version: Option<&str>,
    ) -> Result<VersionInfo, RegistryError> {
        let version = match version {
            Some(version) => version.to_string(),
            None => self.resolve_latest_version(package_name).await?,
        };

        let url = format!(
            "{}/{}/{}",
            self.base_url,
            Self::encode_package_name(package_name),
            version
        );

        let mut document: NpmVersionResponse = fetch_json(self.session()?, &url)
            .await?
            .ok_or_else(|| RegistryError::VersionNotFound {
                package: package_name.to_string(),
                version: version.clone(),
                tried: vec![url.clone()],
            })?;

        let published_at = document.time.remove(&version);
        Ok(VersionInfo::new(version, document.dist.tarball).with_published_at(published_at))
    }

    async fn resolve_tarball_url(
        &self,
        package_name: &str,
        version: &str,
    ) -> Result<String, RegistryError> {
        if package_name.starts_with('@') {
            let (scope, name) = package_name
                .split_once('/')
                .ok_or_else(|| RegistryError::InvalidPackageName(package_name.to_string()))?;
            return Ok(format!(
                "{}/{}/{}/-/{}-{}.tgz",
                self.base_url, scope, name, name, version
            ));
        }

        Ok(format!(
            "{}/{}/-/{}-{}.tgz",
            self.base_url, package_name, package_name, version
        ))
    }

    fn release_resources(&mut self) {
        self.client = None;
    }
}
