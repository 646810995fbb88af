// GitHub provider implementation - bridges the API clients with ReleaseSource
use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use tracing::{debug, warn};
use versionscout_api::{
    npm_package_url, pypi_project_url, GitHubClient, GitHubError, GitHubRelease, GitHubRepo,
    RegistryClient, REPOS_PER_PAGE,
};

use crate::{
    config::Config,
    models::{PackageInfo, PackageType, ReleaseInfo, Repository},
    packages::{npm_package_name, python_package_name},
    source::ReleaseSource,
};

/// Wrapper around the GitHub and registry clients that never fails outright
pub struct GitHubProvider {
    client: GitHubClient,
    registries: RegistryClient,
}

impl GitHubProvider {
    pub fn new(token: Option<String>) -> Self {
        Self::with_clients(GitHubClient::new(token), RegistryClient::new())
    }

    /// Build from config; `token` overrides whatever the config file holds
    pub fn from_config(config: &Config, token: Option<String>) -> Self {
        let timeout = Duration::from_secs(config.github.request_timeout_secs);
        let token = token.or_else(|| config.github.token.clone());

        Self::with_clients(
            GitHubClient::with_config(token, config.github.api_url.clone(), timeout),
            RegistryClient::with_config(
                config.registries.npm_url.clone(),
                config.registries.pypi_url.clone(),
                timeout,
            ),
        )
    }

    pub fn with_clients(client: GitHubClient, registries: RegistryClient) -> Self {
        Self { client, registries }
    }

    pub fn has_token(&self) -> bool {
        self.client.has_token()
    }

    pub fn hourly_rate_ceiling(&self) -> u32 {
        self.client.hourly_rate_ceiling()
    }

    /// npm record, only if package.json names a package the registry knows
    async fn npm_package(&self, owner: &str, name: &str) -> Option<PackageInfo> {
        let manifest = PackageType::Npm.manifest_files()[0];
        let contents = match self.client.get_file_content(owner, name, manifest).await {
            Ok(contents) => contents,
            Err(GitHubError::NotFound(_)) => return None,
            Err(e) => {
                debug!("No readable {} in {}/{}: {}", manifest, owner, name, e);
                return None;
            }
        };

        let package = npm_package_name(&contents)?;
        match self.registries.npm_latest_version(&package).await {
            Ok(version) => Some(PackageInfo::published(
                format!("{}/{}", owner, name),
                PackageType::Npm,
                version,
                npm_package_url(&package),
            )),
            Err(e) => {
                debug!("npm lookup for {} failed: {}", package, e);
                None
            }
        }
    }

    /// Python record from the first manifest present; degrades to a placeholder
    async fn python_package(&self, owner: &str, name: &str) -> Option<PackageInfo> {
        for manifest in PackageType::Python.manifest_files() {
            let contents = match self.client.get_file_content(owner, name, manifest).await {
                Ok(contents) => Some(contents),
                Err(GitHubError::NotFound(_)) => continue,
                // The file is there but we couldn't read it: still a Python project
                Err(GitHubError::DecodeError(e)) => {
                    debug!("Undecodable {} in {}/{}: {}", manifest, owner, name, e);
                    None
                }
                Err(e) => {
                    debug!("Could not fetch {} for {}/{}: {}", manifest, owner, name, e);
                    continue;
                }
            };

            let package = contents.and_then(|c| python_package_name(manifest, &c));
            let Some(package) = package else {
                return Some(PackageInfo::python_placeholder(owner, name));
            };

            return match self.registries.pypi_latest_version(&package).await {
                Ok(version) => Some(PackageInfo::published(
                    format!("{}/{}", owner, name),
                    PackageType::Python,
                    version,
                    pypi_project_url(&package),
                )),
                Err(e) => {
                    debug!("PyPI lookup for {} failed: {}", package, e);
                    Some(PackageInfo::python_placeholder(owner, name))
                }
            };
        }

        None
    }
}

#[async_trait]
impl ReleaseSource for GitHubProvider {
    async fn list_repositories(&self, username: &str, include_forks: bool) -> Vec<Repository> {
        let mut repos = Vec::new();
        let mut page = 1;

        loop {
            let batch = match self
                .client
                .list_user_repos_page(username, page, REPOS_PER_PAGE)
                .await
            {
                Ok(batch) => batch,
                Err(e) => {
                    warn!("Error fetching repositories for {}: {}", username, e);
                    break;
                }
            };

            let fetched = batch.len();
            repos.extend(
                batch
                    .into_iter()
                    .filter(|repo| include_forks || !repo.fork)
                    .map(github_to_repo),
            );

            if fetched < REPOS_PER_PAGE {
                break;
            }
            page += 1;
        }

        debug!("Found {} repositories for {}", repos.len(), username);
        repos
    }

    async fn latest_release(&self, owner: &str, name: &str) -> Option<ReleaseInfo> {
        let release = match self.client.get_latest_release(owner, name).await {
            Ok(release) => release,
            Err(GitHubError::NotFound(_)) => return None,
            Err(e) => {
                warn!("Latest release lookup failed for {}/{}: {}", owner, name, e);
                return None;
            }
        };

        // Second call per repository: the release payload has no language or counts
        let metadata = match self.client.get_repository(owner, name).await {
            Ok(repo) => Some(repo),
            Err(e) => {
                warn!("Repository metadata lookup failed for {}/{}: {}", owner, name, e);
                None
            }
        };

        Some(github_to_release(owner, name, release, metadata))
    }

    async fn packages(&self, owner: &str, name: &str) -> Vec<PackageInfo> {
        let mut packages = Vec::new();
        packages.extend(self.npm_package(owner, name).await);
        packages.extend(self.python_package(owner, name).await);
        packages
    }
}

/// Convert GitHub API repo to our internal Repository model
fn github_to_repo(gh: GitHubRepo) -> Repository {
    Repository {
        owner: gh.owner.login,
        name: gh.name,
        is_fork: gh.fork,
        language: gh.language,
        stars: gh.stargazers_count,
        forks: gh.forks_count,
    }
}

fn github_to_release(
    owner: &str,
    name: &str,
    release: GitHubRelease,
    metadata: Option<GitHubRepo>,
) -> ReleaseInfo {
    let download_count = release.total_downloads();
    let (language, stars, forks) = match metadata {
        Some(repo) => (repo.language, repo.stargazers_count, repo.forks_count),
        None => (None, 0, 0),
    };

    ReleaseInfo {
        repo_name: format!("{}/{}", owner, name),
        latest_version: release.tag_name.unwrap_or_else(|| "N/A".to_string()),
        release_date: format_release_date(release.published_at.as_deref()),
        release_url: release.html_url,
        download_count,
        is_prerelease: release.prerelease,
        description: release
            .body
            .filter(|body| !body.is_empty())
            .unwrap_or_else(|| "No description".to_string()),
        language: language
            .filter(|lang| !lang.is_empty())
            .unwrap_or_else(|| "Unknown".to_string()),
        stars,
        forks,
    }
}

/// ISO timestamp -> `%Y-%m-%d`; unparseable input is passed through as-is
pub fn format_release_date(published_at: Option<&str>) -> String {
    match published_at {
        None | Some("") => "Unknown".to_string(),
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|_| raw.to_string()),
    }
}
