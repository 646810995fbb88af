// Package detection from manifest files
// Detects npm and PyPI packages by looking at well-known files in a repo

use crate::models::{PackageInfo, PackageType};
use regex::Regex;
use std::sync::OnceLock;

/// Manifest that marks an npm package
pub const NPM_MANIFEST: &str = "package.json";

/// Python manifests, checked in this order; the first one present wins
pub const PYTHON_MANIFESTS: [&str; 3] = ["setup.py", "pyproject.toml", "setup.cfg"];

impl PackageType {
    /// Manifest files that indicate this package type
    pub fn manifest_files(&self) -> &'static [&'static str] {
        match self {
            PackageType::Npm => &[NPM_MANIFEST],
            PackageType::Python => &PYTHON_MANIFESTS,
        }
    }
}

/// `name` field of a package.json, if the file parses and has one
pub fn npm_package_name(manifest: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(manifest).ok()?;
    value
        .get("name")?
        .as_str()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// Sniff a package name out of a Python manifest
///
/// This is a text match for `name = "..."`, not a parser. It happily picks
/// up the first match even inside a comment or an unrelated table, and it
/// misses names built from expressions. `setup.cfg` is never inspected.
/// `None` means the caller should fall back to a placeholder record.
pub fn python_package_name(file: &str, contents: &str) -> Option<String> {
    if file == "setup.cfg" {
        return None;
    }

    name_pattern()?
        .captures(contents)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn name_pattern() -> Option<&'static Regex> {
    static NAME: OnceLock<Option<Regex>> = OnceLock::new();
    NAME.get_or_init(|| Regex::new(r#"name\s*=\s*["']([^"']+)["']"#).ok())
        .as_ref()
}

impl PackageInfo {
    /// Record for a package we found on its registry
    pub fn published(
        repo_name: String,
        package_type: PackageType,
        latest_version: String,
        package_url: String,
    ) -> Self {
        Self {
            repo_name,
            package_type,
            latest_version,
            package_url,
            downloads: 0,
        }
    }

    /// Python manifest exists but we couldn't pin down the published package
    pub fn python_placeholder(owner: &str, name: &str) -> Self {
        Self {
            repo_name: format!("{}/{}", owner, name),
            package_type: PackageType::Python,
            latest_version: "Unknown".to_string(),
            package_url: format!("https://github.com/{}/{}", owner, name),
            downloads: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_npm_name() {
        assert_eq!(
            npm_package_name(r#"{"name": "left-pad", "version": "1.0.0"}"#),
            Some("left-pad".to_string())
        );
        assert_eq!(npm_package_name(r#"{"private": true}"#), None);
        assert_eq!(npm_package_name(r#"{"name": ""}"#), None);
        assert_eq!(npm_package_name("not json"), None);
    }

    #[test]
    fn test_python_name_from_setup_py() {
        let setup = r#"
from setuptools import setup

setup(
    name='fancy-tool',
    version="0.3.1",
)
"#;
        assert_eq!(
            python_package_name("setup.py", setup),
            Some("fancy-tool".to_string())
        );
    }

    #[test]
    fn test_python_name_from_pyproject() {
        let pyproject = "[project]\nname = \"fancy_tool\"\nversion = \"1.0\"\n";
        assert_eq!(
            python_package_name("pyproject.toml", pyproject),
            Some("fancy_tool".to_string())
        );
    }

    #[test]
    fn test_python_name_takes_first_match_even_if_wrong() {
        // Known limitation: the first `name = "..."` wins, wherever it is
        let pyproject = "[tool.other]\nname = \"decoy\"\n\n[project]\nname = \"real\"\n";
        assert_eq!(
            python_package_name("pyproject.toml", pyproject),
            Some("decoy".to_string())
        );
    }

    #[test]
    fn test_python_name_misses_computed_names() {
        assert_eq!(python_package_name("setup.py", "setup(name=NAME)"), None);
    }

    #[test]
    fn test_setup_cfg_is_never_parsed() {
        assert_eq!(python_package_name("setup.cfg", "[metadata]\nname = 'x'\n"), None);
    }

    #[test]
    fn test_placeholder_points_at_github() {
        let pkg = PackageInfo::python_placeholder("alice", "tool");
        assert_eq!(pkg.repo_name, "alice/tool");
        assert_eq!(pkg.latest_version, "Unknown");
        assert_eq!(pkg.package_url, "https://github.com/alice/tool");
        assert_eq!(pkg.downloads, 0);
    }

    #[test]
    fn test_manifest_precedence() {
        assert_eq!(PackageType::Python.manifest_files()[0], "setup.py");
        assert_eq!(PackageType::Npm.manifest_files(), &["package.json"]);
    }
}
