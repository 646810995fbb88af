// npm and PyPI registry lookups - only the latest version is needed
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

const NPM_REGISTRY_BASE: &str = "https://registry.npmjs.org";
const PYPI_BASE: &str = "https://pypi.org";

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("{registry} returned status: {status}")]
    BadStatus {
        registry: &'static str,
        status: reqwest::StatusCode,
    },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, RegistryError>;

/// npm registry API response
#[derive(Debug, Deserialize)]
struct NpmResponse {
    #[serde(rename = "dist-tags", default)]
    dist_tags: Option<NpmDistTags>,
}

#[derive(Debug, Deserialize)]
struct NpmDistTags {
    latest: Option<String>,
}

/// PyPI JSON API response
#[derive(Debug, Deserialize)]
struct PyPIResponse {
    #[serde(default)]
    info: Option<PyPIInfo>,
}

#[derive(Debug, Deserialize)]
struct PyPIInfo {
    version: Option<String>,
}

/// Registry API client
pub struct RegistryClient {
    client: reqwest::Client,
    npm_url: String,
    pypi_url: String,
}

impl RegistryClient {
    pub fn new() -> Self {
        Self::with_base_urls(NPM_REGISTRY_BASE.to_string(), PYPI_BASE.to_string())
    }

    pub fn with_base_urls(npm_url: String, pypi_url: String) -> Self {
        Self::with_config(npm_url, pypi_url, Duration::from_secs(10))
    }

    pub fn with_config(npm_url: String, pypi_url: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("VersionScout/0.1.0")
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            npm_url: npm_url.trim_end_matches('/').to_string(),
            pypi_url: pypi_url.trim_end_matches('/').to_string(),
        }
    }

    /// `dist-tags.latest` for an npm package, "Unknown" when the tag is missing
    pub async fn npm_latest_version(&self, package: &str) -> Result<String> {
        let url = format!("{}/{}", self.npm_url, urlencoding::encode(package));
        debug!("Querying npm registry: {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(RegistryError::BadStatus {
                registry: "npm",
                status: response.status(),
            });
        }

        let data: NpmResponse = response.json().await?;
        Ok(data
            .dist_tags
            .and_then(|tags| tags.latest)
            .unwrap_or_else(|| "Unknown".to_string()))
    }

    /// `info.version` for a PyPI project, "Unknown" when absent
    pub async fn pypi_latest_version(&self, project: &str) -> Result<String> {
        let url = format!("{}/pypi/{}/json", self.pypi_url, urlencoding::encode(project));
        debug!("Querying PyPI: {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(RegistryError::BadStatus {
                registry: "PyPI",
                status: response.status(),
            });
        }

        let data: PyPIResponse = response.json().await?;
        Ok(data
            .info
            .and_then(|info| info.version)
            .unwrap_or_else(|| "Unknown".to_string()))
    }
}

impl Default for RegistryClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Public npm page for a package
pub fn npm_package_url(package: &str) -> String {
    format!("https://www.npmjs.com/package/{}", package)
}

/// Public PyPI page for a project
pub fn pypi_project_url(project: &str) -> String {
    format!("https://pypi.org/project/{}/", project)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_npm_latest_version() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/left-pad")
            .with_status(200)
            .with_body(r#"{"name":"left-pad","dist-tags":{"latest":"1.3.0"}}"#)
            .create_async()
            .await;

        let client = RegistryClient::with_base_urls(server.url(), server.url());
        let version = client.npm_latest_version("left-pad").await.unwrap();

        mock.assert_async().await;
        assert_eq!(version, "1.3.0");
    }

    #[tokio::test]
    async fn test_npm_missing_dist_tags_is_unknown() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/odd")
            .with_status(200)
            .with_body(r#"{"name":"odd"}"#)
            .create_async()
            .await;

        let client = RegistryClient::with_base_urls(server.url(), server.url());
        assert_eq!(client.npm_latest_version("odd").await.unwrap(), "Unknown");
    }

    #[tokio::test]
    async fn test_pypi_latest_version() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/pypi/requests/json")
            .with_status(200)
            .with_body(r#"{"info":{"name":"requests","version":"2.32.3"}}"#)
            .create_async()
            .await;

        let client = RegistryClient::with_base_urls(server.url(), server.url());
        assert_eq!(client.pypi_latest_version("requests").await.unwrap(), "2.32.3");
    }

    #[tokio::test]
    async fn test_pypi_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/pypi/nope/json")
            .with_status(404)
            .create_async()
            .await;

        let client = RegistryClient::with_base_urls(server.url(), server.url());
        let result = client.pypi_latest_version("nope").await;
        assert!(matches!(result, Err(RegistryError::BadStatus { .. })));
    }

    #[test]
    fn test_package_urls() {
        assert_eq!(npm_package_url("left-pad"), "https://www.npmjs.com/package/left-pad");
        assert_eq!(pypi_project_url("requests"), "https://pypi.org/project/requests/");
    }
}
