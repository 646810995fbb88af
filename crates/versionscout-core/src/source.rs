use crate::models::{PackageInfo, ReleaseInfo, Repository};

/// Where repositories, releases and packages come from
///
/// The GitHub provider is the only real implementation; the trait exists so
/// the aggregator can be exercised without a network. Implementations must
/// not fail: a remote error turns into an empty list or `None`, so a dead API
/// just shows up as a thinner report.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ReleaseSource: Send + Sync {
    /// All of a user's repositories, most recently updated first
    async fn list_repositories(&self, username: &str, include_forks: bool) -> Vec<Repository>;

    /// Latest release, or `None` if there is none (or the lookup failed)
    async fn latest_release(&self, owner: &str, name: &str) -> Option<ReleaseInfo>;

    /// Packages detected from manifest files, at most one per registry
    async fn packages(&self, owner: &str, name: &str) -> Vec<PackageInfo>;
}
