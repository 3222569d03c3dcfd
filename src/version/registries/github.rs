//! GitHub Releases API registry implementation

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use tracing::{info, warn};

use crate::version::error::RegistryError;
use crate::version::registries::{build_client, fetch_json};
use crate::version::registry::RegistryClient;
use crate::version::types::{PackageRegistry, VersionInfo};

/// Default base URL for GitHub API
pub const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// Host serving `archive/refs/tags/*` tarballs
const ARCHIVE_BASE_URL: &str = "https://github.com";

/// Response from GitHub Releases API
#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
    #[serde(default)]
    tarball_url: Option<String>,
    #[serde(default)]
    published_at: Option<String>,
}

/// Registry implementation for GitHub Releases API
pub struct GitHubRegistry {
    client: Option<Client>,
    base_url: String,
}

impl GitHubRegistry {
    /// Creates a new GitHubRegistry; `token` raises the API rate limit
    pub fn new(
        base_url: &str,
        timeout: Duration,
        token: Option<&str>,
    ) -> Result<Self, RegistryError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                RegistryError::InvalidResponse("GitHub token is not a valid header value".into())
            })?;
            headers.insert(AUTHORIZATION, value);
        }

        Ok(Self {
            client: Some(build_client(timeout, headers)?),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn session(&self) -> Result<&Client, RegistryError> {
        self.client.as_ref().ok_or(RegistryError::SessionClosed)
    }

    /// Splits "owner/repo"
    fn parse_repo(package_name: &str) -> Result<(&str, &str), RegistryError> {
        let mut parts = package_name.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(repo), None) if !owner.is_empty() && !repo.is_empty() => {
                Ok((owner, repo))
            }
            _ => Err(RegistryError::InvalidPackageName(format!(
                "GitHub package name must be in format 'owner/repo', got: {}",
                package_name
            ))),
        }
    }

    async fn fetch_release(
        &self,
        owner: &str,
        repo: &str,
        tag: &str,
    ) -> Result<Option<Release>, RegistryError> {
        let url = format!(
            "{}/repos/{}/{}/releases/tags/{}",
            self.base_url, owner, repo, tag
        );
        fetch_json(self.session()?, &url).await
    }
}

#[async_trait]
impl RegistryClient for GitHubRegistry {
    fn registry_kind(&self) -> PackageRegistry {
        PackageRegistry::GithubRelease
    }

    async fn resolve_latest_version(&self, package_name: &str) -> Result<String, RegistryError> {
        let (owner, repo) = Self::parse_repo(package_name)?;
        let url = format!("{}/repos/{}/{}/releases/latest", self.base_url, owner, repo);

        let release: Release = fetch_json(self.session()?, &url)
            .await?
            .ok_or_else(|| RegistryError::NotFound(package_name.to_string()))?;

        let version = strip_tag_prefix(&release.tag_name).to_string();
        info!(
            "GitHub reports {} {} (tag {}) as latest",
            package_name, version, release.tag_name
        );
        Ok(version)
    }

    async fn resolve_version_info(
        &self,
        package_name: &str,
        version: Option<&str>,
    ) -> Result<VersionInfo, RegistryError> {
        let (owner, repo) = Self::parse_repo(package_name)?;

        let version = match version {
            Some(version) => version.to_string(),
            None => self.resolve_latest_version(package_name).await?,
        };

        let bare = strip_tag_prefix(&version);
        let prefixed = format!("v{}", bare);

        // Upstream tagging is inconsistent: try "v1.2.3" first, then "1.2.3"
        let (tag, release) = match self.fetch_release(owner, repo, &prefixed).await? {
            Some(release) => (prefixed, release),
            None => {
                warn!(
                    "No release tagged {} in {}, retrying with {}",
                    prefixed, package_name, bare
                );
                let release = self
                    .fetch_release(owner, repo, bare)
                    .await?
                    .ok_or_else(|| RegistryError::VersionNotFound {
                        package: package_name.to_string(),
                        version: version.clone(),
                        tried: vec![prefixed.clone(), bare.to_string()],
                    })?;
                (bare.to_string(), release)
            }
        };

        let tarball_url = release.tarball_url.unwrap_or_else(|| {
            format!(
                "{}/{}/{}/archive/refs/tags/{}.tar.gz",
                ARCHIVE_BASE_URL, owner, repo, tag
            )
        });

        Ok(VersionInfo::new(bare, tarball_url).with_published_at(release.published_at))
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

/// "v2.0.0" -> "2.0.0"
fn strip_tag_prefix(tag: &str) -> &str {
    tag.strip_prefix('v').unwrap_or(tag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use rstest::rstest;

    fn registry(base_url: &str) -> GitHubRegistry {
        GitHubRegistry::new(base_url, Duration::from_secs(5), None).unwrap()
    }

    #[tokio::test]
    async fn resolve_latest_version_strips_v_prefix() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repos/owner/repo/releases/latest")
            .match_header("accept", "application/vnd.github+json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"tag_name": "v2.0.0", "published_at": "2024-01-15T00:00:00Z"}"#)
            .create_async()
            .await;

        let result = registry(&server.url())
            .resolve_latest_version("owner/repo")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result, "2.0.0");
    }

    #[tokio::test]
    async fn requests_carry_bearer_token_when_configured() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repos/owner/repo/releases/latest")
            .match_header("authorization", "Bearer secret-token")
            .with_status(200)
            .with_body(r#"{"tag_name": "1.0.0"}"#)
            .create_async()
            .await;

        let registry =
            GitHubRegistry::new(&server.url(), Duration::from_secs(5), Some("secret-token"))
                .unwrap();
        let result = registry.resolve_latest_version("owner/repo").await.unwrap();

        mock.assert_async().await;
        assert_eq!(result, "1.0.0");
    }

    #[tokio::test]
    async fn resolve_version_info_tries_v_prefixed_tag_first() {
        let mut server = Server::new_async().await;

        let prefixed = server
            .mock("GET", "/repos/owner/repo/releases/tags/v2.0.0")
            .with_status(200)
            .with_body(
                r#"{
                    "tag_name": "v2.0.0",
                    "tarball_url": "https://api.example.test/repos/owner/repo/tarball/v2.0.0",
                    "published_at": "2024-01-15T00:00:00Z"
                }"#,
            )
            .create_async()
            .await;
        let bare = server
            .mock("GET", "/repos/owner/repo/releases/tags/2.0.0")
            .expect(0)
            .create_async()
            .await;

        let info = registry(&server.url())
            .resolve_version_info("owner/repo", Some("2.0.0"))
            .await
            .unwrap();

        prefixed.assert_async().await;
        bare.assert_async().await;
        assert_eq!(
            info,
            VersionInfo::new(
                "2.0.0",
                "https://api.example.test/repos/owner/repo/tarball/v2.0.0"
            )
            .with_published_at(Some("2024-01-15T00:00:00Z".to_string()))
        );
    }

    #[tokio::test]
    async fn resolve_version_info_falls_back_to_bare_tag_and_archive_url() {
        let mut server = Server::new_async().await;

        let prefixed = server
            .mock("GET", "/repos/owner/repo/releases/tags/v2.0.0")
            .with_status(404)
            .with_body(r#"{"message": "Not Found"}"#)
            .create_async()
            .await;
        let bare = server
            .mock("GET", "/repos/owner/repo/releases/tags/2.0.0")
            .with_status(200)
            .with_body(r#"{"tag_name": "2.0.0"}"#)
            .create_async()
            .await;

        let info = registry(&server.url())
            .resolve_version_info("owner/repo", Some("2.0.0"))
            .await
            .unwrap();

        prefixed.assert_async().await;
        bare.assert_async().await;
        assert_eq!(info.version, "2.0.0");
        assert_eq!(
            info.tarball_url,
            "https://github.com/owner/repo/archive/refs/tags/2.0.0.tar.gz"
        );
    }

    #[tokio::test]
    async fn resolve_version_info_returns_version_not_found_when_both_tags_missing() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", Matcher::Regex(r"^/repos/owner/repo/releases/tags/".into()))
            .with_status(404)
            .expect(2)
            .create_async()
            .await;

        let result = registry(&server.url())
            .resolve_version_info("owner/repo", Some("v9.9.9"))
            .await;

        mock.assert_async().await;
        let error = result.unwrap_err();
        assert!(matches!(
            &error,
            RegistryError::VersionNotFound { tried, .. } if tried == &["v9.9.9", "9.9.9"]
        ));
        assert_eq!(
            error.to_string(),
            "Version v9.9.9 not found for owner/repo (tried v9.9.9, 9.9.9)"
        );
    }

    #[tokio::test]
    async fn resolve_version_info_without_version_matches_latest() {
        let mut server = Server::new_async().await;

        let _latest = server
            .mock("GET", "/repos/owner/repo/releases/latest")
            .with_status(200)
            .with_body(r#"{"tag_name": "v3.1.0"}"#)
            .expect(2)
            .create_async()
            .await;
        let _release = server
            .mock("GET", "/repos/owner/repo/releases/tags/v3.1.0")
            .with_status(200)
            .with_body(r#"{"tag_name": "v3.1.0"}"#)
            .create_async()
            .await;

        let registry = registry(&server.url());
        let latest = registry.resolve_latest_version("owner/repo").await.unwrap();
        let info = registry
            .resolve_version_info("owner/repo", None)
            .await
            .unwrap();

        assert_eq!(info.version, latest);
    }

    #[tokio::test]
    async fn resolve_latest_version_returns_rate_limited_for_429() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/repos/owner/repo/releases/latest")
            .with_status(429)
            .with_header("content-type", "application/json")
            .with_header("retry-after", "60")
            .with_body(r#"{"message": "API rate limit exceeded"}"#)
            .create_async()
            .await;

        let result = registry(&server.url())
            .resolve_latest_version("owner/repo")
            .await;

        mock.assert_async().await;
        assert!(matches!(
            result,
            Err(RegistryError::RateLimited {
                retry_after_secs: Some(60)
            })
        ));
    }

    #[rstest]
    #[case("onlyname")]
    #[case("a/b/c")]
    #[case("/repo")]
    #[case("owner/")]
    #[tokio::test]
    async fn malformed_package_name_fails_before_any_request(#[case] package: &str) {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let registry = registry(&server.url());
        let latest = registry.resolve_latest_version(package).await;
        let info = registry.resolve_version_info(package, Some("1.0.0")).await;

        mock.assert_async().await;
        assert!(matches!(latest, Err(RegistryError::InvalidPackageName(_))));
        assert!(matches!(info, Err(RegistryError::InvalidPackageName(_))));
    }
}
