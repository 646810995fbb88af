use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Repository as returned by the listing call - only what we aggregate over
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub owner: String,
    pub name: String,
    pub is_fork: bool,
    pub language: Option<String>,
    pub stars: u32,
    pub forks: u32,
}

impl Repository {
    /// "owner/name"
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Latest release of one repository, enriched with repository metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseInfo {
    /// "owner/name"
    pub repo_name: String,
    pub latest_version: String,
    /// `%Y-%m-%d`, "Unknown", or the raw timestamp if it didn't parse
    pub release_date: String,
    pub release_url: String,
    pub download_count: u64,
    pub is_prerelease: bool,
    pub description: String,
    pub language: String,
    pub stars: u32,
    pub forks: u32,
}

/// Registries we know how to detect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageType {
    Npm,
    Python,
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackageType::Npm => write!(f, "npm"),
            PackageType::Python => write!(f, "python"),
        }
    }
}

/// A published package detected through a manifest file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub repo_name: String,
    pub package_type: PackageType,
    pub latest_version: String,
    pub package_url: String,
    /// Registries aren't queried for download stats, so this stays 0
    pub downloads: u64,
}

/// Heuristic project buckets, declared in matching priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProjectCategory {
    #[serde(rename = "Web Development")]
    WebDevelopment,
    #[serde(rename = "Data Science")]
    DataScience,
    DevOps,
    Mobile,
    Desktop,
    Libraries,
    Tools,
    Other,
}

impl ProjectCategory {
    pub const ALL: [ProjectCategory; 8] = [
        ProjectCategory::WebDevelopment,
        ProjectCategory::DataScience,
        ProjectCategory::DevOps,
        ProjectCategory::Mobile,
        ProjectCategory::Desktop,
        ProjectCategory::Libraries,
        ProjectCategory::Tools,
        ProjectCategory::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ProjectCategory::WebDevelopment => "Web Development",
            ProjectCategory::DataScience => "Data Science",
            ProjectCategory::DevOps => "DevOps",
            ProjectCategory::Mobile => "Mobile",
            ProjectCategory::Desktop => "Desktop",
            ProjectCategory::Libraries => "Libraries",
            ProjectCategory::Tools => "Tools",
            ProjectCategory::Other => "Other",
        }
    }
}

impl fmt::Display for ProjectCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: ProjectCategory,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageCount {
    pub language: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarredRepo {
    pub repo_name: String,
    pub stars: u32,
}

impl fmt::Display for StarredRepo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} stars)", self.repo_name, self.stars)
    }
}

/// Headline numbers for a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total_repositories: usize,
    pub total_releases: usize,
    pub total_packages: usize,
    pub total_downloads: u64,
    pub total_stars: u64,
    pub total_forks: u64,
    /// Releases published within the last 30 days
    pub recent_releases: usize,
    /// Distinct languages across all repositories
    pub active_languages: usize,
    pub most_popular_language: String,
    pub most_starred_repo: Option<StarredRepo>,
}

/// Everything we know about one user's published software
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    pub username: String,
    pub generated_at: DateTime<Utc>,
    pub summary: Summary,
    /// In repository listing order (most recently updated first)
    pub releases: Vec<ReleaseInfo>,
    pub packages: Vec<PackageInfo>,
    /// Top languages by repository count
    pub languages: Vec<LanguageCount>,
    /// Nonzero categories, in priority order
    pub categories: Vec<CategoryCount>,
    /// Newest first, capped
    pub recent_activity: Vec<ReleaseInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_type_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&PackageType::Npm).unwrap(), "\"npm\"");
        assert_eq!(PackageType::Python.to_string(), "python");
    }

    #[test]
    fn test_category_serializes_as_label() {
        assert_eq!(
            serde_json::to_string(&ProjectCategory::WebDevelopment).unwrap(),
            "\"Web Development\""
        );
        assert_eq!(ProjectCategory::DevOps.to_string(), "DevOps");
    }

    #[test]
    fn test_full_name() {
        let repo = Repository {
            owner: "alice".into(),
            name: "tool".into(),
            is_fork: false,
            language: None,
            stars: 0,
            forks: 0,
        };
        assert_eq!(repo.full_name(), "alice/tool");
    }

    #[test]
    fn test_starred_repo_display() {
        let top = StarredRepo {
            repo_name: "alice/tool".into(),
            stars: 20,
        };
        assert_eq!(top.to_string(), "alice/tool (20 stars)");
    }
}
