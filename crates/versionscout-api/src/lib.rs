// API client implementations for GitHub and the package registries
pub mod github;
pub mod registry;

// Re-export common types
pub use github::{
    GitHubAsset, GitHubClient, GitHubError, GitHubOwner, GitHubRelease, GitHubRepo,
    REPOS_PER_PAGE, REQUESTS_PER_HOUR_NO_TOKEN, REQUESTS_PER_HOUR_WITH_TOKEN,
};
pub use registry::{npm_package_url, pypi_project_url, RegistryClient, RegistryError};
