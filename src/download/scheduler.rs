// src/download/scheduler.rs
// =============================================================================
// Two-level batched downloading.
//
// Level 1, packages: the package list is cut into chunks of
//   max_concurrent_packages. A chunk's packages run concurrently and the next
//   chunk starts only once all of them are done.
//
// Level 2, artifacts: inside one package the selected distributions are cut
//   into chunks of (connection_budget / max_concurrent_packages). Again one
//   chunk at a time, each chunk fully joined before the next.
//
// With the default budget of 120 and 4 packages at once, a package never has
// more than 30 downloads in flight, so the whole run stays under 120
// connections however many packages run side by side.
//
// No failure here escapes as an error. Every outcome is counted, and the
// worst that can happen to a package is being reported as aborted.
// =============================================================================

use super::fetcher::{politeness_delay, ArtifactFetcher};
use super::index::IndexClient;
use super::version::select_versions;
use crate::config::RunConfig;
use crate::package::PackageName;
use crate::storage;
use futures::future::join_all;
use log::{error, info, warn};
use reqwest::Client;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// How a package's download phase ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PackageStatus {
    /// Every selected distribution was attempted
    Completed,
    /// Stopped before any artifact was fetched (directory or listing failure)
    Aborted { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct PackageReport {
    pub package: PackageName,
    pub total: usize,
    pub finished: usize,
    pub failed: usize,
    #[serde(flatten)]
    pub status: PackageStatus,
}

impl PackageReport {
    fn aborted(package: &PackageName, reason: String) -> Self {
        PackageReport {
            package: package.clone(),
            total: 0,
            finished: 0,
            failed: 0,
            status: PackageStatus::Aborted { reason },
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == PackageStatus::Completed && self.failed == 0
    }
}

/// Per-package reports for a whole run, in package order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub packages: Vec<PackageReport>,
}

impl RunReport {
    pub fn total(&self) -> usize {
        self.packages.iter().map(|p| p.total).sum()
    }

    pub fn finished(&self) -> usize {
        self.packages.iter().map(|p| p.finished).sum()
    }

    pub fn failed(&self) -> usize {
        self.packages.iter().map(|p| p.failed).sum()
    }

    pub fn aborted(&self) -> usize {
        self.packages
            .iter()
            .filter(|p| matches!(p.status, PackageStatus::Aborted { .. }))
            .count()
    }
}

pub struct DownloadScheduler {
    index: IndexClient,
    fetcher: ArtifactFetcher,
    storage_root: PathBuf,
    time_delay: Duration,
    max_concurrent_packages: usize,
    latest_versions: Option<usize>,
    sub_batch_size: usize,
}

impl DownloadScheduler {
    pub fn new(client: Client, config: &RunConfig) -> Self {
        DownloadScheduler {
            index: IndexClient::new(client.clone(), config),
            fetcher: ArtifactFetcher::new(client, config),
            storage_root: config.storage_root.clone(),
            time_delay: config.time_delay,
            max_concurrent_packages: config.max_concurrent_packages.max(1),
            latest_versions: config.latest_versions,
            sub_batch_size: config.sub_batch_size(),
        }
    }

    /// Downloads every package, `max_concurrent_packages` at a time.
    pub async fn download_all(&self, packages: &[PackageName]) -> RunReport {
        let mut report = RunReport::default();

        for (i, batch) in packages.chunks(self.max_concurrent_packages).enumerate() {
            let names: Vec<&str> = batch.iter().map(PackageName::as_str).collect();
            info!("Downloading batch {}: [{}]", i, names.join(", "));

            let reports = join_all(batch.iter().map(|package| self.download_package(package))).await;
            report.packages.extend(reports);
        }

        report
    }

    // Downloads the selected distributions of one package, one sub-batch at
    // a time. Only a missing directory or listing aborts the package.
    pub async fn download_package(&self, package: &PackageName) -> PackageReport {
        if let Err(e) = storage::ensure_package_dir(&self.storage_root, package).await {
            warn!("Package: cannot prepare directory for {}: {}", package, e);
            return PackageReport::aborted(package, e.to_string());
        }

        politeness_delay(self.time_delay, 0.5).await;

        let listing = match self.index.list_distributions(package).await {
            Ok(listing) => listing,
            Err(e) => {
                warn!("Package: failed to get list of {}: {}", package, e);
                return PackageReport::aborted(package, e.to_string());
            }
        };

        let selected = select_versions(listing, self.latest_versions);
        let total = selected.len();
        info!("[Downloading] {:>20}, total: {:4}", package.as_str(), total);

        let mut failed = 0;
        for chunk in selected.chunks(self.sub_batch_size) {
            let outcomes = join_all(chunk.iter().map(|entry| async move {
                match self.fetcher.fetch(package, entry).await {
                    Ok(_) => true,
                    Err(e) if e.is_network() => {
                        warn!("File: failed to download {}: {}", entry.file_name, e);
                        false
                    }
                    Err(e) => {
                        error!("File: failed to save {}: {}", entry.file_name, e);
                        false
                    }
                }
            }))
            .await;
            failed += outcomes.iter().filter(|ok| !**ok).count();
        }

        let finished = total - failed;
        info!(
            "[Downloaded]  {:>20}, total: {:4}, finished: {:4}, failed: {:4}",
            package.as_str(),
            total,
            finished,
            failed
        );

        PackageReport {
            package: package.clone(),
            total,
            finished,
            failed,
            status: PackageStatus::Completed,
        }
    }
}
