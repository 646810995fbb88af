use crate::{
    models::{AggregateReport, ReleaseInfo},
    Error, Result,
};
use crossterm::style::Stylize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    Table,
    #[default]
    Rich,
    Json,
}

impl ReportFormat {
    /// Files never get escape codes, so rich degrades to table there
    pub fn for_file(self) -> Self {
        match self {
            ReportFormat::Rich => ReportFormat::Table,
            other => other,
        }
    }

    /// Pipes and redirects get the plain table instead of escape codes
    pub fn for_output(self, is_terminal: bool) -> Self {
        if is_terminal {
            self
        } else {
            self.for_file()
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::Table => "table",
            ReportFormat::Rich => "rich",
            ReportFormat::Json => "json",
        }
    }
}

impl FromStr for ReportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "table" => Ok(ReportFormat::Table),
            "rich" => Ok(ReportFormat::Rich),
            "json" => Ok(ReportFormat::Json),
            other => Err(Error::ConfigError(format!(
                "Unknown format '{}'. Use table, rich, or json",
                other
            ))),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Release notes longer than this get cut in web responses
pub const DESCRIPTION_LIMIT: usize = 1000;

/// A newline past this point is a good place to cut
const DESCRIPTION_BREAK_AFTER: usize = 800;

const TRUNCATION_MARKER: &str = "*[Truncated - see full release notes]*";

const RELEASE_HEADERS: [&str; 7] = [
    "Repository",
    "Version",
    "Date",
    "Language",
    "Stars",
    "Downloads",
    "Pre-release",
];
const PACKAGE_HEADERS: [&str; 4] = ["Repository", "Type", "Version", "URL"];

/// Renders an AggregateReport for humans or machines
pub struct Exporter;

impl Exporter {
    pub fn render(report: &AggregateReport, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Table => Ok(Self::to_table(report)),
            ReportFormat::Rich => Ok(Self::to_rich(report)),
            ReportFormat::Json => Self::to_json(report),
        }
    }

    /// Write a report to disk; rich output is saved as plain tables
    pub fn save_to_file<P: AsRef<Path>>(
        report: &AggregateReport,
        path: P,
        format: ReportFormat,
    ) -> Result<()> {
        let content = Self::render(report, format.for_file())?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Pretty JSON of the whole report, releases in listing order
    pub fn to_json(report: &AggregateReport) -> Result<String> {
        Ok(serde_json::to_string_pretty(report)?)
    }

    /// Plain grid tables plus a summary block
    pub fn to_table(report: &AggregateReport) -> String {
        let mut output = banner(&report_title(report), 80);

        if !report.releases.is_empty() {
            output.push_str(&banner("LATEST RELEASES", 80));
            output.push_str(&releases_grid(report, "Yes", "No").render());
        }

        if !report.packages.is_empty() {
            output.push_str(&banner("PUBLISHED PACKAGES", 80));
            output.push_str(&packages_grid(report).render());
        }

        if !report.languages.is_empty() {
            output.push_str(&banner("TOP LANGUAGES", 50));
            output.push_str(&languages_grid(report).render());
        }

        if !report.categories.is_empty() {
            output.push_str(&banner("PROJECT CATEGORIES", 50));
            output.push_str(&categories_grid(report).render());
        }

        output.push_str(&banner("SUMMARY", 50));
        for (label, value) in summary_lines(report) {
            output.push_str(&format!("{}: {}\n", label, value));
        }

        output
    }

    /// ANSI-styled terminal output, same sections as the table
    pub fn to_rich(report: &AggregateReport) -> String {
        let mut output = String::new();

        let title = report_title(report);
        output.push_str(&format!("{}\n", title.as_str().bold().blue()));
        output.push_str(&format!("{}\n", "─".repeat(title.chars().count()).blue()));

        if !report.releases.is_empty() {
            output.push_str(&format!("\n{}\n", "Latest Releases".bold().magenta()));
            let grid = releases_grid(report, "✓", "");
            output.push_str(&grid.render_styled(|column, cell| match column {
                0 => cell.cyan().to_string(),
                1 | 5 => cell.green().to_string(),
                2 => cell.yellow().to_string(),
                3 => cell.blue().to_string(),
                4 => cell.dark_yellow().to_string(),
                _ => cell.to_string(),
            }));
        }

        if !report.packages.is_empty() {
            output.push_str(&format!("\n{}\n", "Published Packages".bold().cyan()));
            output.push_str(&packages_grid(report).render_styled(|column, cell| match column {
                0 => cell.cyan().to_string(),
                1 => cell.magenta().to_string(),
                2 => cell.green().to_string(),
                3 => cell.blue().to_string(),
                _ => cell.to_string(),
            }));
        }

        if !report.languages.is_empty() {
            output.push_str(&format!("\n{}\n", "Top Languages".bold()));
            output.push_str(&languages_grid(report).render_styled(|column, cell| match column {
                0 => cell.blue().to_string(),
                _ => cell.to_string(),
            }));
        }

        if !report.categories.is_empty() {
            output.push_str(&format!("\n{}\n", "Project Categories".bold()));
            output.push_str(&categories_grid(report).render_styled(|column, cell| match column {
                0 => cell.magenta().to_string(),
                _ => cell.to_string(),
            }));
        }

        output.push_str(&format!("\n{}\n", "Summary".bold().green()));
        for (label, value) in summary_lines(report) {
            let label = format!("{}:", label);
            output.push_str(&format!("{} {}\n", label.as_str().bold(), value));
        }

        output
    }
}

fn report_title(report: &AggregateReport) -> String {
    format!("GitHub Version Report - {}", report.username)
}

/// Every summary field, in display order; both text renderers print these
fn summary_lines(report: &AggregateReport) -> Vec<(&'static str, String)> {
    let summary = &report.summary;
    vec![
        ("Repositories analyzed", summary.total_repositories.to_string()),
        ("Repositories with releases", summary.total_releases.to_string()),
        ("Published packages", summary.total_packages.to_string()),
        ("Total download count", format_thousands(summary.total_downloads)),
        ("Total stars", format_thousands(summary.total_stars)),
        ("Total forks", format_thousands(summary.total_forks)),
        ("Releases in the last 30 days", summary.recent_releases.to_string()),
        ("Active languages", summary.active_languages.to_string()),
        ("Most popular language", summary.most_popular_language.clone()),
        (
            "Most starred",
            summary
                .most_starred_repo
                .as_ref()
                .map(|top| top.to_string())
                .unwrap_or_else(|| "None".to_string()),
        ),
        (
            "Report generated",
            report.generated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ),
    ]
}

fn releases_grid(report: &AggregateReport, yes: &str, no: &str) -> Grid {
    let mut grid = Grid::new(&RELEASE_HEADERS, &[4, 5]);
    for release in by_stars(&report.releases) {
        grid.push(release_row(release, yes, no));
    }
    grid
}

fn packages_grid(report: &AggregateReport) -> Grid {
    let mut grid = Grid::new(&PACKAGE_HEADERS, &[]);
    for package in &report.packages {
        grid.push(vec![
            package.repo_name.clone(),
            package.package_type.to_string(),
            package.latest_version.clone(),
            package.package_url.clone(),
        ]);
    }
    grid
}

fn languages_grid(report: &AggregateReport) -> Grid {
    let mut grid = Grid::new(&["Language", "Repositories"], &[1]);
    for entry in &report.languages {
        grid.push(vec![entry.language.clone(), entry.count.to_string()]);
    }
    grid
}

fn categories_grid(report: &AggregateReport) -> Grid {
    let mut grid = Grid::new(&["Category", "Releases"], &[1]);
    for entry in &report.categories {
        grid.push(vec![entry.category.label().to_string(), entry.count.to_string()]);
    }
    grid
}

/// Shorten long release notes for web responses
///
/// Cuts at the last newline past 800 characters when there is one,
/// otherwise hard at 1000 with an ellipsis.
pub fn truncate_description(description: &str) -> String {
    if description.chars().count() <= DESCRIPTION_LIMIT {
        return description.to_string();
    }

    let truncated: String = description.chars().take(DESCRIPTION_LIMIT).collect();
    let last_newline = truncated
        .char_indices()
        .filter(|(_, c)| *c == '\n')
        .last()
        .map(|(byte_idx, _)| (byte_idx, truncated[..byte_idx].chars().count()));

    match last_newline {
        Some((byte_idx, char_idx)) if char_idx > DESCRIPTION_BREAK_AFTER => {
            format!("{}\n\n{}", &truncated[..byte_idx], TRUNCATION_MARKER)
        }
        _ => format!("{}...\n\n{}", truncated, TRUNCATION_MARKER),
    }
}

/// Apply `truncate_description` to every release in a report
pub fn truncate_report_descriptions(report: &mut AggregateReport) {
    for release in report
        .releases
        .iter_mut()
        .chain(report.recent_activity.iter_mut())
    {
        release.description = truncate_description(&release.description);
    }
}

/// Releases by stars, highest first; equal stars keep listing order
fn by_stars(releases: &[ReleaseInfo]) -> Vec<&ReleaseInfo> {
    let mut sorted: Vec<&ReleaseInfo> = releases.iter().collect();
    sorted.sort_by(|a, b| b.stars.cmp(&a.stars));
    sorted
}

fn release_row(release: &ReleaseInfo, yes: &str, no: &str) -> Vec<String> {
    vec![
        release.repo_name.clone(),
        release.latest_version.clone(),
        release.release_date.clone(),
        release.language.clone(),
        release.stars.to_string(),
        release.download_count.to_string(),
        if release.is_prerelease { yes } else { no }.to_string(),
    ]
}

fn banner(title: &str, width: usize) -> String {
    let rule = "=".repeat(width);
    format!("\n{}\n{}\n{}\n", rule, title, rule)
}

/// 1234567 -> "1,234,567"
pub fn format_thousands(num: u64) -> String {
    let digits = num.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Minimal grid table: `+---+` borders, `===` under the header
struct Grid {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    right_aligned: Vec<usize>,
}

impl Grid {
    fn new(headers: &[&str], right_aligned: &[usize]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
            right_aligned: right_aligned.to_vec(),
        }
    }

    fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }
        widths
    }

    fn render(&self) -> String {
        self.render_styled(|_, cell| cell.to_string())
    }

    /// `style` sees already-padded cells, so escape codes never skew widths
    fn render_styled<F>(&self, style: F) -> String
    where
        F: Fn(usize, &str) -> String,
    {
        let widths = self.widths();
        let rule = |fill: char| {
            let mut line = String::from("+");
            for width in &widths {
                line.push_str(&fill.to_string().repeat(width + 2));
                line.push('+');
            }
            line.push('\n');
            line
        };

        let mut out = rule('-');
        out.push_str(&self.line(&self.headers, &widths, |_, cell| cell.to_string()));
        out.push_str(&rule('='));
        for row in &self.rows {
            out.push_str(&self.line(row, &widths, &style));
            out.push_str(&rule('-'));
        }
        out
    }

    fn line<F>(&self, cells: &[String], widths: &[usize], style: F) -> String
    where
        F: Fn(usize, &str) -> String,
    {
        let mut line = String::from("|");
        for (column, (cell, width)) in cells.iter().zip(widths).enumerate() {
            let padded = if self.right_aligned.contains(&column) {
                format!("{:>width$}", cell, width = width)
            } else {
                format!("{:<width$}", cell, width = width)
            };
            line.push_str(&format!(" {} |", style(column, &padded)));
        }
        line.push('\n');
        line
    }
}
