//! Registry implementations for resolving package versions

pub mod github;
pub mod npm;
pub mod pypi;

pub use github::GitHubRegistry;
pub use npm::NpmRegistry;
pub use pypi::PypiRegistry;

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::version::error::RegistryError;

const USER_AGENT: &str = concat!("nixwrap/", env!("CARGO_PKG_VERSION"));

/// Builds the HTTP session owned by a registry client
fn build_client(timeout: Duration, headers: HeaderMap) -> Result<Client, RegistryError> {
    Ok(Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .default_headers(headers)
        .build()?)
}

/// GETs `url` and decodes its JSON body.
///
/// Returns `Ok(None)` on 404 so each backend can decide whether that means
/// a missing package or a missing version.
async fn fetch_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
) -> Result<Option<T>, RegistryError> {
    debug!("GET {}", url);

    let response = client.get(url).send().await?;
    let status = response.status();

    if status == StatusCode::NOT_FOUND {
        return Ok(None);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        return Err(RegistryError::RateLimited {
            retry_after_secs: retry_after,
        });
    }

    if !status.is_success() {
        warn!("Registry returned status {}: {}", status, url);
        return Err(RegistryError::InvalidResponse(format!(
            "Unexpected status {} from {}",
            status, url
        )));
    }

    let body = response.json::<T>().await.map_err(|e| {
        warn!("Failed to parse response from {}: {}", url, e);
        RegistryError::InvalidResponse(format!("{}: {}", url, e))
    })?;

    Ok(Some(body))
}
