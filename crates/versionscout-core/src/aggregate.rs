// Turns a username into a full AggregateReport
use crate::{
    models::{AggregateReport, PackageInfo, ReleaseInfo, Repository, Summary},
    source::ReleaseSource,
    stats,
    validate::validate_username,
    Result,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

/// Walks every repository of a user and collects releases and packages
///
/// Repositories are processed one at a time in listing order. A user with
/// a few hundred repos means a few hundred round trips, which is slow but
/// keeps us well clear of GitHub's abuse detection.
#[derive(Clone)]
pub struct Aggregator {
    source: Arc<dyn ReleaseSource>,
}

impl Aggregator {
    pub fn new(source: Arc<dyn ReleaseSource>) -> Self {
        Self { source }
    }

    pub async fn generate(&self, username: &str, include_forks: bool) -> Result<AggregateReport> {
        validate_username(username)?;

        info!("Generating report for {}", username);
        let repos = self.source.list_repositories(username, include_forks).await;
        debug!("Processing {} repositories", repos.len());

        let mut releases = Vec::new();
        let mut packages = Vec::new();

        for repo in &repos {
            debug!("Checking {}", repo.full_name());
            if let Some(release) = self.source.latest_release(&repo.owner, &repo.name).await {
                releases.push(release);
            }
            packages.extend(self.source.packages(&repo.owner, &repo.name).await);
        }

        info!(
            "Report for {}: {} repositories, {} releases, {} packages",
            username,
            repos.len(),
            releases.len(),
            packages.len()
        );

        Ok(build_report(username, &repos, releases, packages, Utc::now()))
    }
}

/// Assemble the report from already-collected data
pub fn build_report(
    username: &str,
    repos: &[Repository],
    releases: Vec<ReleaseInfo>,
    packages: Vec<PackageInfo>,
    now: DateTime<Utc>,
) -> AggregateReport {
    let totals = stats::totals(&releases);
    let recent = stats::recent_releases(&releases, now);

    let summary = Summary {
        total_repositories: repos.len(),
        total_releases: releases.len(),
        total_packages: packages.len(),
        total_downloads: totals.downloads,
        total_stars: totals.stars,
        total_forks: totals.forks,
        recent_releases: recent.len(),
        active_languages: stats::distinct_languages(repos),
        most_popular_language: stats::most_popular_language(&releases),
        most_starred_repo: stats::most_starred(&releases),
    };

    AggregateReport {
        username: username.to_string(),
        generated_at: now,
        summary,
        languages: stats::top_languages(repos, stats::TOP_LANGUAGES),
        categories: stats::category_breakdown(&releases),
        recent_activity: recent
            .into_iter()
            .take(stats::RECENT_ACTIVITY_LIMIT)
            .collect(),
        releases,
        packages,
    }
}
