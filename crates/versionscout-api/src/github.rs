use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const GITHUB_API_BASE: &str = "https://api.github.com";

/// Page size for the repository listing endpoint (GitHub's maximum)
pub const REPOS_PER_PAGE: usize = 100;

/// Hourly request ceiling GitHub applies to anonymous callers
pub const REQUESTS_PER_HOUR_NO_TOKEN: u32 = 60;

/// Hourly request ceiling GitHub applies to token-authenticated callers
pub const REQUESTS_PER_HOUR_WITH_TOKEN: u32 = 5000;

/// Default timeout for a single GitHub call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum GitHubError {
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authentication required")]
    AuthRequired,

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Could not decode file content: {0}")]
    DecodeError(String),
}

pub type Result<T> = std::result::Result<T, GitHubError>;

/// Thin client over the handful of GitHub REST endpoints we need
pub struct GitHubClient {
    client: reqwest::Client,
    token: Option<String>,
    base_url: String,
}

impl GitHubClient {
    pub fn new(token: Option<String>) -> Self {
        Self::with_base_url(token, GITHUB_API_BASE.to_string())
    }

    /// For GitHub Enterprise (or a mock server in tests)
    pub fn with_base_url(token: Option<String>, base_url: String) -> Self {
        Self::with_config(token, base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_config(token: Option<String>, base_url: String, timeout: Duration) -> Self {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("VersionScout/0.1.0"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/vnd.github.v3+json"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            token: token.filter(|t| !t.is_empty()),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Request ceiling that applies to this client's credentials
    pub fn hourly_rate_ceiling(&self) -> u32 {
        if self.has_token() {
            REQUESTS_PER_HOUR_WITH_TOKEN
        } else {
            REQUESTS_PER_HOUR_NO_TOKEN
        }
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let request = self.client.get(url);
        match self.token {
            Some(ref token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// One page of a user's repositories, most recently updated first
    pub async fn list_user_repos_page(
        &self,
        username: &str,
        page: u32,
        per_page: usize,
    ) -> Result<Vec<GitHubRepo>> {
        let url = format!("{}/users/{}/repos", self.base_url, username);
        debug!("Fetching repositories page {} from {}", page, url);

        let response = self
            .get(&url)
            .query(&[
                ("page", page.to_string()),
                ("per_page", per_page.to_string()),
                ("sort", "updated".to_string()),
                ("direction", "desc".to_string()),
            ])
            .send()
            .await?;

        let response = check_status(response, username).await?;
        let repos: Vec<GitHubRepo> = response.json().await?;
        Ok(repos)
    }

    /// Latest published release; `NotFound` when the repository has none
    pub async fn get_latest_release(&self, owner: &str, name: &str) -> Result<GitHubRelease> {
        let url = format!("{}/repos/{}/{}/releases/latest", self.base_url, owner, name);
        debug!("Fetching latest release from {}", url);

        let response = self.get(&url).send().await?;
        let response = check_status(response, &format!("{}/{}", owner, name)).await?;
        let release: GitHubRelease = response.json().await?;
        Ok(release)
    }

    /// Repository metadata (language, stars, forks)
    pub async fn get_repository(&self, owner: &str, name: &str) -> Result<GitHubRepo> {
        let url = format!("{}/repos/{}/{}", self.base_url, owner, name);
        debug!("Fetching repository info from {}", url);

        let response = self.get(&url).send().await?;
        let response = check_status(response, &format!("{}/{}", owner, name)).await?;
        let repo: GitHubRepo = response.json().await?;
        Ok(repo)
    }

    /// Decoded text of a file at the repository root via the contents API
    pub async fn get_file_content(&self, owner: &str, name: &str, path: &str) -> Result<String> {
        let url = format!("{}/repos/{}/{}/contents/{}", self.base_url, owner, name, path);
        debug!("Fetching file content from {}", url);

        let response = self.get(&url).send().await?;
        let response = check_status(response, &format!("{}/{}/{}", owner, name, path)).await?;
        let body: ContentResponse = response.json().await?;
        decode_content(&body.content)
    }
}

/// Map HTTP failures onto our error type, passing successful responses through
async fn check_status(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(GitHubError::NotFound(what.to_string()));
    }

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(GitHubError::AuthRequired);
    }

    // GitHub signals an exhausted quota with 403 + x-ratelimit-remaining: 0
    let quota_exhausted = response
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == "0");
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS
        || (status == reqwest::StatusCode::FORBIDDEN && quota_exhausted)
    {
        return Err(GitHubError::RateLimitExceeded);
    }

    let body = response.text().await.unwrap_or_default();
    Err(GitHubError::RequestFailed(format!("Status {}: {}", status, body)))
}

/// The contents API wraps base64 at 60 columns, so strip whitespace first
pub fn decode_content(encoded: &str) -> Result<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| GitHubError::DecodeError(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| GitHubError::DecodeError(e.to_string()))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubRepo {
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    pub owner: GitHubOwner,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub stargazers_count: u32,
    #[serde(default)]
    pub forks_count: u32,
    #[serde(default)]
    pub html_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubOwner {
    pub login: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GitHubRelease {
    #[serde(default)]
    pub tag_name: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub assets: Vec<GitHubAsset>,
}

impl GitHubRelease {
    /// Downloads summed over every asset attached to the release
    pub fn total_downloads(&self) -> u64 {
        self.assets.iter().map(|a| a.download_count).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GitHubAsset {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub download_count: u64,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    content: String,
}
