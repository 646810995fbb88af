// Pure statistics over collected releases and repositories
// Nothing in here touches the network, so it is all plain functions.

use crate::models::{
    CategoryCount, LanguageCount, ProjectCategory, ReleaseInfo, Repository, StarredRepo,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::HashSet;

/// A release counts as recent when it shipped within this many days
pub const RECENT_DAYS: i64 = 30;

/// Cap on `recent_activity` in a report; the summary count is uncapped
pub const RECENT_ACTIVITY_LIMIT: usize = 10;

/// How many languages make it into the report
pub const TOP_LANGUAGES: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub downloads: u64,
    pub stars: u64,
    pub forks: u64,
}

pub fn totals(releases: &[ReleaseInfo]) -> Totals {
    releases.iter().fold(Totals::default(), |acc, r| Totals {
        downloads: acc.downloads + r.download_count,
        stars: acc.stars + u64::from(r.stars),
        forks: acc.forks + u64::from(r.forks),
    })
}

/// Most common release language; first seen wins a tie, "Unknown" when empty
pub fn most_popular_language(releases: &[ReleaseInfo]) -> String {
    let counts = count_in_order(releases.iter().map(|r| r.language.as_str()));

    let mut best: Option<(&str, usize)> = None;
    for (language, count) in counts {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((language, count));
        }
    }

    best.map(|(language, _)| language.to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Release with the most stars; first seen wins a tie
pub fn most_starred(releases: &[ReleaseInfo]) -> Option<StarredRepo> {
    let mut best: Option<&ReleaseInfo> = None;
    for release in releases {
        if best.map_or(true, |top| release.stars > top.stars) {
            best = Some(release);
        }
    }

    best.map(|r| StarredRepo {
        repo_name: r.repo_name.clone(),
        stars: r.stars,
    })
}

/// Parse a `%Y-%m-%d` release date as midnight UTC
fn release_day(release: &ReleaseInfo) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(&release.release_date, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

pub fn is_recent(release: &ReleaseInfo, now: DateTime<Utc>) -> bool {
    let cutoff = now - Duration::days(RECENT_DAYS);
    release_day(release).is_some_and(|day| day >= cutoff)
}

/// Every recent release, newest first (stable for same-day releases)
pub fn recent_releases(releases: &[ReleaseInfo], now: DateTime<Utc>) -> Vec<ReleaseInfo> {
    let mut recent: Vec<ReleaseInfo> = releases
        .iter()
        .filter(|r| is_recent(r, now))
        .cloned()
        .collect();
    recent.sort_by(|a, b| release_day(b).cmp(&release_day(a)));
    recent
}

/// Top languages by repository count, over every repository
pub fn top_languages(repos: &[Repository], limit: usize) -> Vec<LanguageCount> {
    let mut counts = count_in_order(repos.iter().filter_map(|r| r.language.as_deref()));
    // sort_by is stable, so equal counts keep first-seen order
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    counts
        .into_iter()
        .take(limit)
        .map(|(language, count)| LanguageCount {
            language: language.to_string(),
            count,
        })
        .collect()
}

pub fn distinct_languages(repos: &[Repository]) -> usize {
    repos
        .iter()
        .filter_map(|r| r.language.as_deref())
        .collect::<HashSet<_>>()
        .len()
}

const WEB_NAMES: &[&str] = &["web", "site", "html", "css", "js"];
const WEB_LANGUAGES: &[&str] = &["javascript", "typescript", "html", "css"];
const DATA_NAMES: &[&str] = &["data", "ml", "ai", "analysis"];
const DATA_LANGUAGES: &[&str] = &["python", "r", "jupyter notebook"];
const DEVOPS_NAMES: &[&str] = &["docker", "k8s", "deploy", "ci", "cd"];
const DEVOPS_LANGUAGES: &[&str] = &["shell", "dockerfile"];
const MOBILE_LANGUAGES: &[&str] = &["swift", "kotlin", "java", "dart"];
const DESKTOP_LANGUAGES: &[&str] = &["c++", "c#", "c", "rust", "go"];
const LIBRARY_NAMES: &[&str] = &["lib", "sdk", "api", "framework"];
const TOOL_NAMES: &[&str] = &["tool", "cli", "util", "helper"];

/// Bucket a project by its "owner/name" and language; first matching rule wins
///
/// The name checks are plain substring matches over the whole
/// "owner/name", so "email-client" lands in Data Science because it
/// contains "ai", and an owner like "webber" pulls every repo into Web
/// Development. The counts are only meant as a rough breakdown.
pub fn categorize(name: &str, language: &str) -> ProjectCategory {
    let name = name.to_lowercase();
    let language = language.to_lowercase();

    let name_has = |needles: &[&str]| needles.iter().any(|n| name.contains(n));
    let language_in = |langs: &[&str]| langs.contains(&language.as_str());

    if name_has(WEB_NAMES) || language_in(WEB_LANGUAGES) {
        ProjectCategory::WebDevelopment
    } else if name_has(DATA_NAMES) || language_in(DATA_LANGUAGES) {
        ProjectCategory::DataScience
    } else if name_has(DEVOPS_NAMES) || language_in(DEVOPS_LANGUAGES) {
        ProjectCategory::DevOps
    } else if language_in(MOBILE_LANGUAGES) {
        ProjectCategory::Mobile
    } else if language_in(DESKTOP_LANGUAGES) {
        ProjectCategory::Desktop
    } else if name_has(LIBRARY_NAMES) {
        ProjectCategory::Libraries
    } else if name_has(TOOL_NAMES) {
        ProjectCategory::Tools
    } else {
        ProjectCategory::Other
    }
}

/// Nonzero category counts over releases, in priority order
pub fn category_breakdown(releases: &[ReleaseInfo]) -> Vec<CategoryCount> {
    let mut counts = [0usize; ProjectCategory::ALL.len()];
    for release in releases {
        let category = categorize(&release.repo_name, &release.language);
        if let Some(slot) = ProjectCategory::ALL.iter().position(|c| *c == category) {
            counts[slot] += 1;
        }
    }

    ProjectCategory::ALL
        .iter()
        .zip(counts)
        .filter(|(_, count)| *count > 0)
        .map(|(category, count)| CategoryCount {
            category: *category,
            count,
        })
        .collect()
}

/// Occurrence counts keyed by first appearance
fn count_in_order<'a>(items: impl Iterator<Item = &'a str>) -> Vec<(&'a str, usize)> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for item in items {
        match counts.iter_mut().find(|(key, _)| *key == item) {
            Some((_, count)) => *count += 1,
            None => counts.push((item, 1)),
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // "bob" matches no category keyword, unlike "alice" which contains "ai"
    fn release(name: &str, language: &str, stars: u32, date: &str) -> ReleaseInfo {
        ReleaseInfo {
            repo_name: format!("bob/{}", name),
            latest_version: "v1.0.0".to_string(),
            release_date: date.to_string(),
            release_url: String::new(),
            download_count: 10,
            is_prerelease: false,
            description: "No description".to_string(),
            language: language.to_string(),
            stars,
            forks: 1,
        }
    }

    fn repo(name: &str, language: Option<&str>) -> Repository {
        Repository {
            owner: "alice".to_string(),
            name: name.to_string(),
            is_fork: false,
            language: language.map(str::to_string),
            stars: 0,
            forks: 0,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 31, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_totals() {
        let releases = vec![
            release("a", "Go", 5, "2025-01-01"),
            release("b", "Go", 20, "2025-01-01"),
        ];
        assert_eq!(
            totals(&releases),
            Totals {
                downloads: 20,
                stars: 25,
                forks: 2
            }
        );
        assert_eq!(totals(&[]), Totals::default());
    }

    #[test]
    fn test_most_starred_first_wins_tie() {
        let releases = vec![
            release("a", "Go", 5, "2025-01-01"),
            release("b", "Go", 20, "2025-01-01"),
            release("c", "Go", 20, "2025-01-01"),
            release("d", "Go", 1, "2025-01-01"),
        ];
        let top = most_starred(&releases).unwrap();
        assert_eq!(top.repo_name, "bob/b");
        assert_eq!(top.to_string(), "bob/b (20 stars)");
        assert!(most_starred(&[]).is_none());
    }

    #[test]
    fn test_most_popular_language() {
        let releases = vec![
            release("a", "Go", 0, "2025-01-01"),
            release("b", "Go", 0, "2025-01-01"),
            release("c", "Rust", 0, "2025-01-01"),
        ];
        assert_eq!(most_popular_language(&releases), "Go");
        assert_eq!(most_popular_language(&[]), "Unknown");

        let tied = vec![
            release("a", "Rust", 0, "2025-01-01"),
            release("b", "Go", 0, "2025-01-01"),
        ];
        assert_eq!(most_popular_language(&tied), "Rust");
    }

    #[test]
    fn test_recent_window() {
        assert!(is_recent(&release("a", "Go", 0, "2025-03-30"), now()));
        // Midnight of the cutoff day is before now - 30d at noon
        assert!(!is_recent(&release("a", "Go", 0, "2025-03-01"), now()));
        assert!(is_recent(&release("a", "Go", 0, "2025-03-02"), now()));
        assert!(!is_recent(&release("a", "Go", 0, "Unknown"), now()));
        assert!(!is_recent(&release("a", "Go", 0, "2025-03-30T10:00:00Z"), now()));
    }

    #[test]
    fn test_recent_releases_newest_first() {
        let releases = vec![
            release("old", "Go", 0, "2025-03-10"),
            release("ancient", "Go", 0, "2024-01-01"),
            release("new", "Go", 0, "2025-03-29"),
            release("mid", "Go", 0, "2025-03-20"),
        ];
        let names: Vec<_> = recent_releases(&releases, now())
            .into_iter()
            .map(|r| r.repo_name)
            .collect();
        assert_eq!(names, vec!["bob/new", "bob/mid", "bob/old"]);
    }

    #[test]
    fn test_top_languages_skip_missing_and_cap() {
        let repos = vec![
            repo("a", Some("Go")),
            repo("b", Some("Rust")),
            repo("c", Some("Go")),
            repo("d", None),
            repo("e", Some("C")),
            repo("f", Some("Zig")),
            repo("g", Some("Lua")),
            repo("h", Some("Nim")),
        ];
        let top = top_languages(&repos, TOP_LANGUAGES);
        assert_eq!(top.len(), 5);
        assert_eq!(top[0].language, "Go");
        assert_eq!(top[0].count, 2);
        assert_eq!(top[1].language, "Rust");
        assert_eq!(top[4].language, "Lua");
        assert_eq!(distinct_languages(&repos), 6);
    }

    #[test]
    fn test_categorize_priority() {
        assert_eq!(categorize("mycli", "Rust"), ProjectCategory::Desktop);
        assert_eq!(categorize("mycli", ""), ProjectCategory::Tools);
        assert_eq!(categorize("WebApp", "JavaScript"), ProjectCategory::WebDevelopment);
        // Name rule for Web beats the Python language rule
        assert_eq!(categorize("website", "Python"), ProjectCategory::WebDevelopment);
        assert_eq!(categorize("notebooks", "Jupyter Notebook"), ProjectCategory::DataScience);
        assert_eq!(categorize("k8s-stuff", "Go"), ProjectCategory::DevOps);
        assert_eq!(categorize("app", "Kotlin"), ProjectCategory::Mobile);
        assert_eq!(categorize("go-sdk", "Unknown"), ProjectCategory::Libraries);
        assert_eq!(categorize("misc", "Unknown"), ProjectCategory::Other);
    }

    #[test]
    fn test_breakdown_matches_owner_too() {
        // The owner is part of the matched name
        let mut mytool = release("mytool", "Unknown", 0, "2025-01-01");
        mytool.repo_name = "webber/mytool".to_string();
        assert_eq!(
            category_breakdown(&[mytool]),
            vec![CategoryCount {
                category: ProjectCategory::WebDevelopment,
                count: 1
            }]
        );

        let mut notes = release("notes", "Unknown", 0, "2025-01-01");
        notes.repo_name = "alice/notes".to_string();
        assert_eq!(
            category_breakdown(&[notes])[0].category,
            ProjectCategory::DataScience
        );
    }

    #[test]
    fn test_category_breakdown_nonzero_in_order() {
        let releases = vec![
            release("mytool", "Unknown", 0, "2025-01-01"),
            release("webapp", "JavaScript", 0, "2025-01-01"),
            release("thing", "Unknown", 0, "2025-01-01"),
            release("site", "HTML", 0, "2025-01-01"),
        ];
        let breakdown = category_breakdown(&releases);
        assert_eq!(
            breakdown,
            vec![
                CategoryCount {
                    category: ProjectCategory::WebDevelopment,
                    count: 2
                },
                CategoryCount {
                    category: ProjectCategory::Tools,
                    count: 1
                },
                CategoryCount {
                    category: ProjectCategory::Other,
                    count: 1
                },
            ]
        );
    }
}
