// src/package.rs
// =============================================================================
// Package names and the seed list.
//
// Every name that enters the program goes through PackageName::new, which
// normalizes it once: lowercase, and any run of '-', '_' or '.' becomes a
// single '-'. "Zope.Interface", "zope_interface" and "zope-interface" are the
// same package, so the resolver's sets, the listing URL and the storage
// directory all agree on one spelling.
// =============================================================================

use crate::error::InputError;
use log::warn;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

/// A normalized package identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PackageName(String);

impl PackageName {
    /// Normalizes `raw`. Returns None if it is empty or contains characters
    /// that cannot appear in a package name.
    pub fn new(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() || !raw.chars().all(is_name_char) {
            return None;
        }

        let mut normalized = String::with_capacity(raw.len());
        let mut in_separator_run = false;
        for c in raw.chars() {
            if matches!(c, '-' | '_' | '.') {
                if !in_separator_run {
                    normalized.push('-');
                }
                in_separator_run = true;
            } else {
                normalized.push(c.to_ascii_lowercase());
                in_separator_run = false;
            }
        }

        Some(PackageName(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

// Derives the bare package name from a requirement specifier such as
//   "requests[socks] (>=2.0) ; extra == 'socks'"
//   "charset-normalizer<4,>=2"
// by keeping the leading run of name characters. That drops extras,
// version constraints, whitespace and environment markers in one pass.
pub fn requirement_name(specifier: &str) -> Option<PackageName> {
    let specifier = specifier.trim();
    let end = specifier
        .find(|c: char| !is_name_char(c))
        .unwrap_or(specifier.len());
    PackageName::new(&specifier[..end])
}

fn seed_line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\s*([\w.-]+)").expect("seed line pattern is valid"))
}

#[derive(Debug)]
enum SeedLine {
    Name(PackageName),
    // Blank line, comment or pip option
    Skip,
    // Looks like a requirement but has no name we can use ("café==1.0")
    Unusable,
}

fn classify_seed_line(line: &str) -> SeedLine {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('-') {
        return SeedLine::Skip;
    }

    seed_line_pattern()
        .captures(trimmed)
        .and_then(|captures| PackageName::new(&captures[1]))
        .map_or(SeedLine::Unusable, SeedLine::Name)
}

// Extracts the package name from one pip-freeze style line ("name==1.0",
// "name>=1.0,<=2.0", or just "name"). Blank lines, comments and option
// lines such as "-r other.txt" yield nothing. Any other line without a
// usable name is dropped with a warning.
pub fn parse_seed_line(line: &str) -> Option<PackageName> {
    match classify_seed_line(line) {
        SeedLine::Name(name) => Some(name),
        SeedLine::Skip => None,
        SeedLine::Unusable => {
            warn!("Ignoring seed line {:?}: no usable package name", line.trim());
            None
        }
    }
}

/// Parses a whole seed list, dropping duplicates while keeping first-seen order.
pub fn parse_seed_list<'a>(lines: impl IntoIterator<Item = &'a str>) -> Vec<PackageName> {
    let mut seen = BTreeSet::new();
    lines
        .into_iter()
        .filter_map(parse_seed_line)
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Reads the seed file. Any I/O failure is fatal for the run.
pub async fn load_seed_file(path: &Path) -> Result<Vec<PackageName>, InputError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| InputError::SeedFile {
            path: path.to_path_buf(),
            source,
        })?;

    let names = parse_seed_list(content.lines());
    if names.is_empty() {
        return Err(InputError::EmptySeed);
    }
    Ok(names)
}

/// Writes the resolved names back to the seed file, one per line.
/// Failing to write it is as fatal as failing to read it.
pub async fn write_seed_file<'a>(
    path: &Path,
    names: impl IntoIterator<Item = &'a PackageName>,
) -> Result<(), InputError> {
    let body: Vec<&str> = names.into_iter().map(PackageName::as_str).collect();
    tokio::fs::write(path, body.join("\n"))
        .await
        .map_err(|source| InputError::SeedWrite {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(raw: &str) -> PackageName {
        PackageName::new(raw).unwrap()
    }

    #[test]
    fn test_normalization_collapses_separators() {
        assert_eq!(name("Zope.Interface"), name("zope_interface"));
        assert_eq!(name("zope__-.interface").as_str(), "zope-interface");
        assert_eq!(name("  Django ").as_str(), "django");
    }

    #[test]
    fn test_rejects_empty_and_odd_names() {
        assert!(PackageName::new("").is_none());
        assert!(PackageName::new("   ").is_none());
        assert!(PackageName::new("../etc").is_none());
        assert!(PackageName::new("a b").is_none());
    }

    #[test]
    fn test_requirement_name_strips_constraints_and_markers() {
        assert_eq!(requirement_name("idna (<4,>=2.5)"), Some(name("idna")));
        assert_eq!(requirement_name("charset-normalizer<4,>=2"), Some(name("charset-normalizer")));
        assert_eq!(
            requirement_name("PySocks!=1.5.7,>=1.5.6; extra == \"socks\""),
            Some(name("pysocks"))
        );
        assert_eq!(requirement_name("requests[security]>=2.0"), Some(name("requests")));
        assert_eq!(requirement_name("zope.interface;python_version<'3'"), Some(name("zope-interface")));
        assert_eq!(requirement_name(">=1.0"), None);
    }

    #[test]
    fn test_parse_seed_lines() {
        assert_eq!(parse_seed_line("requests==2.31.0"), Some(name("requests")));
        assert_eq!(parse_seed_line("numpy>=1.0,<=2.0\n"), Some(name("numpy")));
        assert_eq!(parse_seed_line("zope.interface==6.0"), Some(name("zope-interface")));
        assert_eq!(parse_seed_line("# a comment"), None);
        assert_eq!(parse_seed_line("-r base.txt"), None);
        assert_eq!(parse_seed_line("   "), None);
    }

    #[test]
    fn test_unusable_seed_lines_are_reported_and_dropped() {
        assert!(matches!(classify_seed_line("café==1.0"), SeedLine::Unusable));
        assert!(matches!(classify_seed_line("==1.0"), SeedLine::Unusable));
        assert!(matches!(classify_seed_line("# café"), SeedLine::Skip));
        assert!(matches!(classify_seed_line("--index-url x"), SeedLine::Skip));
        assert!(matches!(classify_seed_line("six"), SeedLine::Name(_)));

        assert_eq!(parse_seed_line("café==1.0"), None);
        let names = parse_seed_list(["café==1.0", "six==1.16.0"]);
        assert_eq!(names, vec![name("six")]);
    }

    #[test]
    fn test_seed_list_dedups_spellings() {
        let names = parse_seed_list(["Flask==2.0", "flask", "Jinja2", "jinja2==3.1"]);
        assert_eq!(names, vec![name("flask"), name("jinja2")]);
    }

    #[tokio::test]
    async fn test_missing_seed_file_is_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_seed_file(&dir.path().join("missing.txt")).await;
        assert!(matches!(result, Err(InputError::SeedFile { .. })));
    }

    #[tokio::test]
    async fn test_seed_file_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("requirement.txt");
        tokio::fs::write(&path, "six==1.16.0\n\nurllib3\n").await.unwrap();

        let names = load_seed_file(&path).await.unwrap();
        assert_eq!(names, vec![name("six"), name("urllib3")]);

        write_seed_file(&path, &names).await.unwrap();
        let written = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(written, "six\nurllib3");
    }

    #[tokio::test]
    async fn test_unwritable_seed_file_is_input_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be overwritten as a file
        let result = write_seed_file(dir.path(), &[name("six")]).await;
        assert!(matches!(result, Err(InputError::SeedWrite { .. })));
    }

    #[tokio::test]
    async fn test_seed_file_with_only_comments_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("requirement.txt");
        tokio::fs::write(&path, "# nothing here\n").await.unwrap();
        assert!(matches!(load_seed_file(&path).await, Err(InputError::EmptySeed)));
    }
}
