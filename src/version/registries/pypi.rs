//! PyPI registry client for resolving Python package versions

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use tracing::{debug, info};

use crate::version::error::RegistryError;
use crate::version::registries::{build_client, fetch_json};
use crate::version::registry::RegistryClient;
use crate::version::types::{PackageRegistry, VersionInfo};

pub const DEFAULT_BASE_URL: &str = "https://pypi.org/pypi";

/// PyPI registry client
pub struct PypiRegistry {
    client: Option<Client>,
    base_url: String,
}

impl PypiRegistry {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RegistryError> {
        Ok(Self {
            client: Some(build_client(timeout, HeaderMap::new())?),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn session(&self) -> Result<&Client, RegistryError> {
        self.client.as_ref().ok_or(RegistryError::SessionClosed)
    }
}

/// PyPI JSON API response structure
#[derive(Debug, Deserialize)]
struct PypiResponse {
    info: PypiInfo,
    /// Distribution files of the requested release
    #[serde(default)]
    urls: Vec<PypiFile>,
}

/// Package information from PyPI
#[derive(Debug, Deserialize)]
struct PypiInfo {
    /// Latest version (according to PyPI)
    version: String,
}

#[derive(Debug, Deserialize)]
struct PypiFile {
    url: String,
    #[serde(default)]
    packagetype: Option<String>,
    #[serde(default)]
    upload_time_iso_8601: Option<String>,
    #[serde(default)]
    digests: PypiDigests,
}

#[derive(Debug, Default, Deserialize)]
struct PypiDigests {
    sha256: Option<String>,
}

#[async_trait]
impl RegistryClient for PypiRegistry {
    fn registry_kind(&self) -> PackageRegistry {
        PackageRegistry::Pypi
    }

    async fn resolve_latest_version(&self, package_name: &str) -> Result<String, RegistryError> {
        let url = format!("{}/{}/json", self.base_url, package_name);

        let response: PypiResponse = fetch_json(self.session()?, &url)
            .await?
            .ok_or_else(|| RegistryError::NotFound(package_name.to_string()))?;

        info!(
            "PyPI reports {} {} as latest",
            package_name, response.info.version
        );
        Ok(response.info.version)
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

        let url = format!("{}/{}/{}/json", self.base_url, package_name, version);

        let response: PypiResponse = fetch_json(self.session()?, &url).await?.ok_or_else(|| {
            RegistryError::VersionNotFound {
                package: package_name.to_string(),
                version: version.clone(),
                tried: vec![url.clone()],
            }
        })?;

        debug!(
            "Found {} distribution files for {} {}",
            response.urls.len(),
            package_name,
            version
        );

        let mut files = response.urls;
        if files.is_empty() {
            return Err(RegistryError::NoDistributionAvailable {
                package: package_name.to_string(),
                version,
            });
        }

        // Prefer the sdist; otherwise take whatever PyPI lists first
        let index = files
            .iter()
            .position(|file| file.packagetype.as_deref() == Some("sdist"))
            .unwrap_or(0);
        let file = files.swap_remove(index);
        Ok(VersionInfo {
            version,
            tarball_url: file.url,
            sha256: file.digests.sha256,
            published_at: file.upload_time_iso_8601,
        })
    }

    async fn resolve_tarball_url(
        &self,
        package_name: &str,
        version: &str,
    ) -> Result<String, RegistryError> {
        let info = self.resolve_version_info(package_name, Some(version)).await?;
        Ok(info.tarball_url)
    }

    fn release_resources(&mut self) {
        self.client = None;
    }
}
