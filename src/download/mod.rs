// src/download/mod.rs
// =============================================================================
// Everything needed to turn a list of package names into files on disk.
//
// Submodules:
// - index: reads a package's listing page
// - version: ranks listed files by version and keeps the latest N
// - fetcher: downloads one file, politely and with a timeout
// - scheduler: batches packages and files under the connection budget
// =============================================================================

mod fetcher;
mod index;
mod scheduler;
mod version;

pub use scheduler::{DownloadScheduler, PackageReport, PackageStatus, RunReport};
