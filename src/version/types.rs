//! Common types for registry lookups and update results

use serde::Deserialize;

/// Kind of package registry a wrapped package is published to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageRegistry {
    /// npm registry (registry.npmjs.org)
    Npm,
    /// Python Package Index (pypi.org)
    Pypi,
    /// crates.io
    Cargo,
    /// GitHub releases of an `owner/repo`
    #[serde(alias = "github-release")]
    GithubRelease,
}

impl PackageRegistry {
    /// Returns the string representation of the registry kind
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageRegistry::Npm => "npm",
            PackageRegistry::Pypi => "pypi",
            PackageRegistry::Cargo => "cargo",
            PackageRegistry::GithubRelease => "github_release",
        }
    }
}

impl std::fmt::Display for PackageRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PackageRegistry {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "npm" => Ok(PackageRegistry::Npm),
            "pypi" => Ok(PackageRegistry::Pypi),
            "cargo" => Ok(PackageRegistry::Cargo),
            "github_release" | "github-release" => Ok(PackageRegistry::GithubRelease),
            _ => Err(()),
        }
    }
}

/// A resolved version of a package as reported by its registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    /// Version in the registry's own notation, never re-parsed
    pub version: String,
    /// Absolute URL of the distributable archive
    pub tarball_url: String,
    /// Content hash, when the registry already knows it
    pub sha256: Option<String>,
    /// ISO-8601 publish timestamp (informational)
    pub published_at: Option<String>,
}

impl VersionInfo {
    pub fn new(version: impl Into<String>, tarball_url: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            tarball_url: tarball_url.into(),
            sha256: None,
            published_at: None,
        }
    }

    pub fn with_published_at(mut self, published_at: Option<String>) -> Self {
        self.published_at = published_at;
        self
    }
}

/// Outcome of a check or update run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateResult {
    /// Version pinned in the artifact before the run
    pub current_version: String,
    /// Version the run resolved as its target
    pub latest_version: String,
    /// `current_version != latest_version`, compared as plain strings
    pub update_available: bool,
    /// Hash written to the artifact; only set when an update was applied
    pub new_hash: Option<String>,
}

impl UpdateResult {
    /// Result of a comparison that did not write anything
    pub fn compared(current_version: String, latest_version: String) -> Self {
        let update_available = current_version != latest_version;
        Self {
            current_version,
            latest_version,
            update_available,
            new_hash: None,
        }
    }

    /// Result of an update that rewrote the artifact
    pub fn applied(current_version: String, latest_version: String, new_hash: String) -> Self {
        Self {
            current_version,
            latest_version,
            update_available: true,
            new_hash: Some(new_hash),
        }
    }
}
