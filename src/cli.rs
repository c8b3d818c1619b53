// src/cli.rs
// =============================================================================
// Command-line interface, defined with clap's derive API.
//
// These values are read exactly once, in RunConfig::from_cli, and never
// consulted again after the run starts.
// =============================================================================

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "happypi-mirror",
    version = "0.1.0",
    about = "Mirror packages (and optionally their dependency tree) from a Python package index",
    long_about = "happypi-mirror reads a pip-freeze style list of packages, optionally expands it \
                  to its full transitive dependency closure, and downloads the distributions of \
                  every package into a local directory, politely and with bounded concurrency."
)]
pub struct Cli {
    /// The pip-freeze format file for packages to be included
    ///
    /// With --recursive the resolved package list is written back here.
    #[arg(default_value = "requirement.txt")]
    pub pip_list: PathBuf,

    /// The directory for saving packages
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Optional index URL to acquire packages from (must end in /simple/)
    #[arg(short, long)]
    pub index_url: Option<String>,

    /// Metadata API URL; `{}` is replaced by the package name
    #[arg(long)]
    pub metadata_url: Option<String>,

    /// Download packages in dependency trees recursively
    #[arg(short = 'R', long)]
    pub recursive: bool,

    /// The maximum number of packages to download simultaneously
    #[arg(short, long, default_value_t = 4)]
    pub working_packages: usize,

    /// The maximum random delay, in seconds, before each download
    #[arg(short, long, default_value_t = 2.0, allow_negative_numbers = true)]
    pub time_delay: f64,

    /// Only use the packages in this comma-separated list instead of reading PIP_LIST
    #[arg(short, long, value_delimiter = ',')]
    pub packages: Option<Vec<String>>,

    /// Download only the latest N versions (-1 keeps every version)
    #[arg(short, long, default_value_t = -1, allow_negative_numbers = true)]
    pub latest_versions: i64,

    /// Print the run report as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}
