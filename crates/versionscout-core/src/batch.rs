// Batch analysis - run the aggregator over several users and write JSON files
use crate::{
    aggregate::Aggregator,
    models::{AggregateReport, Summary},
    Result,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub const COMBINED_REPORT_FILE: &str = "combined_report.json";
pub const SUMMARY_REPORT_FILE: &str = "summary_report.json";

/// Per-user report file name inside the output directory
pub fn report_file_name(username: &str) -> String {
    format!("{}_report.json", username)
}

/// Totals across every user that made it through
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedStats {
    pub total_repositories: usize,
    pub total_releases: usize,
    pub total_packages: usize,
    pub total_downloads: u64,
    pub total_stars: u64,
}

impl AggregatedStats {
    fn add(&mut self, summary: &Summary) {
        self.total_repositories += summary.total_repositories;
        self.total_releases += summary.total_releases;
        self.total_packages += summary.total_packages;
        self.total_downloads += summary.total_downloads;
        self.total_stars += summary.total_stars;
    }
}

/// Contents of `summary_report.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub generated_at: DateTime<Utc>,
    pub total_users_analyzed: usize,
    pub aggregated_stats: AggregatedStats,
    pub user_summaries: BTreeMap<String, Summary>,
}

impl BatchSummary {
    pub fn from_reports(reports: &BTreeMap<String, AggregateReport>, now: DateTime<Utc>) -> Self {
        let mut aggregated_stats = AggregatedStats::default();
        let mut user_summaries = BTreeMap::new();

        for (username, report) in reports {
            aggregated_stats.add(&report.summary);
            user_summaries.insert(username.clone(), report.summary.clone());
        }

        Self {
            generated_at: now,
            total_users_analyzed: reports.len(),
            aggregated_stats,
            user_summaries,
        }
    }
}

/// What a batch run produced
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub summary: BatchSummary,
    /// Users that failed, with the reason; they have no files
    pub failed: Vec<(String, String)>,
    pub report_paths: Vec<PathBuf>,
    pub combined_path: PathBuf,
    pub summary_path: PathBuf,
}

pub struct BatchRunner {
    aggregator: Aggregator,
    output_dir: PathBuf,
}

impl BatchRunner {
    pub fn new(aggregator: Aggregator, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            aggregator,
            output_dir: output_dir.into(),
        }
    }

    /// Analyze each user in turn; a failing user is logged and skipped
    pub async fn run(&self, usernames: &[String]) -> Result<BatchOutcome> {
        std::fs::create_dir_all(&self.output_dir)?;

        let mut reports = BTreeMap::new();
        let mut failed = Vec::new();
        let mut report_paths = Vec::new();

        for username in usernames {
            info!("Analyzing {}", username);

            let report = match self.aggregator.generate(username, false).await {
                Ok(report) => report,
                Err(e) => {
                    error!("Error analyzing {}: {}", username, e);
                    failed.push((username.clone(), e.to_string()));
                    continue;
                }
            };

            let path = self.output_dir.join(report_file_name(username));
            write_json(&path, &report)?;
            info!(
                "Report saved: {} ({} repositories, {} releases, {} packages)",
                path.display(),
                report.summary.total_repositories,
                report.summary.total_releases,
                report.summary.total_packages
            );

            report_paths.push(path);
            reports.insert(username.clone(), report);
        }

        let combined_path = self.output_dir.join(COMBINED_REPORT_FILE);
        write_json(&combined_path, &reports)?;

        let summary = BatchSummary::from_reports(&reports, Utc::now());
        let summary_path = self.output_dir.join(SUMMARY_REPORT_FILE);
        write_json(&summary_path, &summary)?;

        Ok(BatchOutcome {
            summary,
            failed,
            report_paths,
            combined_path,
            summary_path,
        })
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ReleaseInfo, Repository};
    use crate::source::MockReleaseSource;
    use std::sync::Arc;

    fn source() -> MockReleaseSource {
        let mut source = MockReleaseSource::new();
        source.expect_list_repositories().returning(|user, _| {
            vec![Repository {
                owner: user.to_string(),
                name: "proj".to_string(),
                is_fork: false,
                language: Some("Go".to_string()),
                stars: 0,
                forks: 0,
            }]
        });
        source.expect_latest_release().returning(|owner, name| {
            Some(ReleaseInfo {
                repo_name: format!("{}/{}", owner, name),
                latest_version: "v0.1.0".to_string(),
                release_date: "2024-05-05".to_string(),
                release_url: String::new(),
                download_count: 40,
                is_prerelease: false,
                description: "No description".to_string(),
                language: "Go".to_string(),
                stars: 6,
                forks: 1,
            })
        });
        source.expect_packages().returning(|_, _| Vec::new());
        source
    }

    #[tokio::test]
    async fn test_batch_writes_all_files_and_skips_failures() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("reports");
        let runner = BatchRunner::new(Aggregator::new(Arc::new(source())), &out);

        let users = vec!["alice".to_string(), "-bad-".to_string(), "bob".to_string()];
        let outcome = runner.run(&users).await.unwrap();

        assert!(out.join("alice_report.json").exists());
        assert!(out.join("bob_report.json").exists());
        assert!(!out.join("-bad-_report.json").exists());
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].0, "-bad-");
        assert_eq!(outcome.report_paths.len(), 2);

        let combined: BTreeMap<String, AggregateReport> =
            serde_json::from_str(&std::fs::read_to_string(&outcome.combined_path).unwrap())
                .unwrap();
        assert_eq!(combined.keys().collect::<Vec<_>>(), vec!["alice", "bob"]);

        let summary: BatchSummary =
            serde_json::from_str(&std::fs::read_to_string(&outcome.summary_path).unwrap())
                .unwrap();
        assert_eq!(summary.total_users_analyzed, 2);
        assert_eq!(summary.aggregated_stats.total_repositories, 2);
        assert_eq!(summary.aggregated_stats.total_downloads, 80);
        assert_eq!(summary.aggregated_stats.total_stars, 12);
        assert!(summary.user_summaries.contains_key("bob"));
    }

    #[tokio::test]
    async fn test_empty_batch_still_writes_summary() {
        let dir = tempfile::tempdir().unwrap();
        let runner = BatchRunner::new(Aggregator::new(Arc::new(MockReleaseSource::new())), dir.path());

        let outcome = runner.run(&[]).await.unwrap();

        assert_eq!(outcome.summary.total_users_analyzed, 0);
        assert_eq!(outcome.summary.aggregated_stats, AggregatedStats::default());
        assert_eq!(std::fs::read_to_string(&outcome.combined_path).unwrap(), "{}");
    }
}
