// src/config.rs
// =============================================================================
// Run configuration.
//
// RunConfig is built once from the command line, before any network work,
// and from then on only shared by reference. Nothing downstream mutates it.
// =============================================================================

use crate::cli::Cli;
use log::warn;
use regex::Regex;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_INDEX_URL: &str = "https://pypi.org/simple/";
pub const DEFAULT_METADATA_URL: &str = "https://pypi.org/pypi/{}/json";
pub const DEFAULT_STORAGE_ROOT: &str = "packages";

/// Hard ceiling on one artifact download.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(120);

/// Connections the remote side tolerates at once. Shared by every package
/// being downloaded in parallel.
pub const CONNECTION_BUDGET: usize = 120;

#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Base of the "simple" index; always ends with '/'.
    pub index_url: Url,
    /// Metadata endpoint, `{}` is replaced by the package name.
    pub metadata_url_template: String,
    pub storage_root: PathBuf,
    /// Ceiling of the random delay before each artifact request.
    pub time_delay: Duration,
    pub max_concurrent_packages: usize,
    /// Keep only the N most recent versions; None keeps everything.
    pub latest_versions: Option<usize>,
    pub fetch_timeout: Duration,
    pub connection_budget: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            index_url: Url::parse(DEFAULT_INDEX_URL).expect("default index URL is valid"),
            metadata_url_template: DEFAULT_METADATA_URL.to_string(),
            storage_root: PathBuf::from(DEFAULT_STORAGE_ROOT),
            time_delay: Duration::from_secs(2),
            max_concurrent_packages: 4,
            latest_versions: None,
            fetch_timeout: FETCH_TIMEOUT,
            connection_budget: CONNECTION_BUDGET,
        }
    }
}

impl RunConfig {
    // Resolves every command-line override against the defaults.
    // Bad index or metadata URLs are not fatal: we warn and keep the default.
    pub fn from_cli(cli: &Cli) -> Self {
        let mut config = RunConfig::default();

        if let Some(dir) = &cli.dir {
            config.storage_root = dir.clone();
        }

        if let Some(raw) = &cli.index_url {
            match parse_index_url(raw) {
                Some(url) => config.index_url = url,
                None => warn!(
                    "URL {} has an incorrect route, using {}",
                    raw, config.index_url
                ),
            }
        }

        if let Some(template) = &cli.metadata_url {
            if template.contains("{}") {
                config.metadata_url_template = template.clone();
            } else {
                warn!(
                    "metadata URL {} has no '{{}}' placeholder, using {}",
                    template, config.metadata_url_template
                );
            }
        }

        config.max_concurrent_packages = cli.working_packages.max(1);
        match Duration::try_from_secs_f64(cli.time_delay.max(0.0)) {
            Ok(delay) => config.time_delay = delay,
            Err(e) => warn!(
                "time delay {} is unusable ({}), using {}s",
                cli.time_delay,
                e,
                config.time_delay.as_secs_f64()
            ),
        }
        config.latest_versions = keep_latest(cli.latest_versions);

        config
    }

    /// How many artifacts one package may fetch at once, so that all packages
    /// in a batch together stay within the connection budget.
    pub fn sub_batch_size(&self) -> usize {
        sub_batch_size(self.connection_budget, self.max_concurrent_packages)
    }
}

pub fn sub_batch_size(budget: usize, max_concurrent_packages: usize) -> usize {
    (budget / max_concurrent_packages.max(1)).max(1)
}

// -1 (the default) and 0 both mean "every version"
fn keep_latest(n: i64) -> Option<usize> {
    if n > 0 {
        usize::try_from(n).ok()
    } else {
        None
    }
}

fn index_url_pattern() -> &'static Regex {
    static PATTERN: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^https?://(\w*\.)+\w*(:\d+)?/simple/?").expect("index URL pattern is valid")
    })
}

// Accepts URLs shaped like "https://host.tld/simple" or ".../simple/",
// optionally with a port.
// The returned URL always ends in '/', so joining a package name onto it
// appends rather than replaces the last segment.
pub fn parse_index_url(raw: &str) -> Option<Url> {
    if !index_url_pattern().is_match(raw) {
        return None;
    }

    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    };
    Url::parse(&with_slash).ok()
}
