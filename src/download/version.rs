// src/download/version.rs
// =============================================================================
// Version keys and "keep the latest N versions" selection.
//
// A VersionKey is the dotted version token found in a distribution file
// name, e.g. "2.31.0" in "requests-2.31.0-py3-none-any.whl", split into its
// components as STRINGS.
//
// Ordering: components are paired up by position, the shorter key padded
// with empty strings, and the first pair that differs decides, using plain
// string comparison. That means "10" < "9", so 1.10 sorts below 1.9.
// Mirrors ordered this way historically; keep it unless the ranking rule
// is deliberately changed.
// =============================================================================

use super::index::DistributionEntry;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct VersionKey {
    components: Vec<String>,
}

fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d+(\.\d+)+$").expect("version pattern is valid"))
}

// One or more dot-separated numeric groups, followed by the '-' or '.' that
// ends the version inside a file name.
fn file_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d+(\.\d+)+[-.]").expect("file name pattern is valid"))
}

impl VersionKey {
    /// Parses a bare version like "1.2.3". Needs at least two components.
    pub fn parse(version: &str) -> Option<Self> {
        if !version_pattern().is_match(version) {
            return None;
        }
        Some(VersionKey {
            components: version.split('.').map(str::to_string).collect(),
        })
    }

    /// Finds the first version token in a distribution file name.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let token = file_name_pattern().find(name)?.as_str();
        // Drop the trailing separator
        VersionKey::parse(&token[..token.len() - 1])
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }
}

/// Three-way comparison over padded string components.
pub fn compare_versions(a: &[String], b: &[String]) -> Ordering {
    let len = a.len().max(b.len());
    for i in 0..len {
        let left = a.get(i).map(String::as_str).unwrap_or("");
        let right = b.get(i).map(String::as_str).unwrap_or("");
        match left.cmp(right) {
            Ordering::Equal => continue,
            unequal => return unequal,
        }
    }
    Ordering::Equal
}

impl PartialEq for VersionKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for VersionKey {}

impl PartialOrd for VersionKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VersionKey {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_versions(&self.components, &other.components)
    }
}

impl fmt::Display for VersionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.components().join("."))
    }
}

// Keeps the entries belonging to the `keep` highest distinct versions.
//
// - keep = None or Some(0): everything is returned untouched
// - otherwise entries without a recognisable version are dropped, since
//   they cannot be ranked
//
// The relative order of the kept entries is the listing order.
pub fn select_versions(entries: Vec<DistributionEntry>, keep: Option<usize>) -> Vec<DistributionEntry> {
    let keep = match keep {
        Some(n) if n > 0 => n,
        _ => return entries,
    };

    let distinct: BTreeSet<&VersionKey> = entries.iter().filter_map(|e| e.version.as_ref()).collect();
    let retained: BTreeSet<VersionKey> = distinct.into_iter().rev().take(keep).cloned().collect();

    entries
        .into_iter()
        .filter(|entry| matches!(&entry.version, Some(v) if retained.contains(v)))
        .collect()
}
