// src/download/fetcher.rs
// =============================================================================
// Downloads one distribution file.
//
// Steps:
// 1. Sleep a random time in [0, time_delay) so we don't hammer the mirror
// 2. GET the file, bounded by a hard timeout (body included)
// 3. Reject non-2xx answers and HTML error pages served with a 200
// 4. Write the bytes to <root>/<package>/<file name>
//
// Nothing here retries. Every failure comes back as a FetchError and the
// scheduler counts it; a timeout only ever cancels this one download.
// =============================================================================

use super::index::DistributionEntry;
use crate::config::RunConfig;
use crate::error::FetchError;
use crate::package::PackageName;
use crate::storage;
use log::debug;
use rand::Rng;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;

/// Sleeps a uniformly random time in `[0, ceiling * ratio)`.
/// Does nothing when the ceiling or the ratio is zero.
pub async fn politeness_delay(ceiling: Duration, ratio: f64) {
    let max = ceiling.as_secs_f64() * ratio;
    if max <= 0.0 {
        return;
    }
    let secs = rand::thread_rng().gen_range(0.0..max);
    tokio::time::sleep(Duration::from_secs_f64(secs)).await;
}

// Error pages start with an <html> tag; real archives never do.
fn looks_like_html(body: &[u8]) -> bool {
    let start = body
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(body.len());
    let head = &body[start..body.len().min(start + 15)];
    let head = String::from_utf8_lossy(head).to_ascii_lowercase();
    head.starts_with("<html") || head.starts_with("<!doctype html")
}

#[derive(Debug, Clone)]
pub struct ArtifactFetcher {
    client: Client,
    storage_root: PathBuf,
    time_delay: Duration,
    timeout: Duration,
}

impl ArtifactFetcher {
    pub fn new(client: Client, config: &RunConfig) -> Self {
        ArtifactFetcher {
            client,
            storage_root: config.storage_root.clone(),
            time_delay: config.time_delay,
            timeout: config.fetch_timeout,
        }
    }

    /// Downloads `entry` into the package's directory and returns the written path.
    pub async fn fetch(&self, package: &PackageName, entry: &DistributionEntry) -> Result<PathBuf, FetchError> {
        politeness_delay(self.time_delay, 1.0).await;

        let mut url = entry.url.clone();
        url.set_fragment(None);

        let body = match tokio::time::timeout(self.timeout, self.download(url.clone())).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(FetchError::Timeout {
                    url: url.to_string(),
                    limit: self.timeout,
                })
            }
        };

        if looks_like_html(&body) {
            return Err(FetchError::HtmlPage { url: url.to_string() });
        }

        let dir = self.storage_root.join(package.as_str());
        let path = storage::write_artifact(&dir, &entry.file_name, &body).await?;
        debug!("File: saved {}/{}", package, entry.file_name);
        Ok(path)
    }

    async fn download(&self, url: url::Url) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::transport(url.as_str(), e))?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::transport(url.as_str(), e))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::version::VersionKey;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn entry(server: &MockServer, file_name: &str) -> DistributionEntry {
        DistributionEntry {
            url: Url::parse(&format!("{}/packages/{}#sha256=00", server.uri(), file_name)).unwrap(),
            file_name: file_name.to_string(),
            version: VersionKey::from_file_name(file_name),
        }
    }

    async fn fetcher_in(root: &std::path::Path, package: &PackageName) -> ArtifactFetcher {
        storage::ensure_package_dir(root, package).await.unwrap();
        let config = RunConfig {
            storage_root: root.to_path_buf(),
            time_delay: Duration::ZERO,
            fetch_timeout: Duration::from_millis(300),
            ..RunConfig::default()
        };
        ArtifactFetcher::new(Client::new(), &config)
    }

    #[test]
    fn test_html_detection() {
        assert!(looks_like_html(b"<html><body>502</body></html>"));
        assert!(looks_like_html(b"\n  <HTML>"));
        assert!(looks_like_html(b"<!DOCTYPE html><html>"));
        assert!(!looks_like_html(b"PK\x03\x04binary"));
        assert!(!looks_like_html(b""));
    }

    #[tokio::test]
    async fn test_zero_delay_returns_immediately() {
        let started = std::time::Instant::now();
        politeness_delay(Duration::ZERO, 1.0).await;
        politeness_delay(Duration::from_secs(5), 0.0).await;
        assert!(started.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_fetch_writes_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/packages/six-1.16.0.tar.gz"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"\x1f\x8barchive".to_vec()))
            .mount(&server)
            .await;

        let root = tempfile::tempdir().unwrap();
        let six = PackageName::new("six").unwrap();
        let fetcher = fetcher_in(root.path(), &six).await;

        let written = fetcher.fetch(&six, &entry(&server, "six-1.16.0.tar.gz")).await.unwrap();
        assert_eq!(written, root.path().join("six").join("six-1.16.0.tar.gz"));
        assert_eq!(tokio::fs::read(&written).await.unwrap(), b"\x1f\x8barchive");
    }

    #[tokio::test]
    async fn test_failures_write_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/packages/error-page-1.0.tar.gz"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>mirror is syncing</html>"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/packages/slow-1.0.tar.gz"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"late".to_vec())
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let root = tempfile::tempdir().unwrap();
        let pkg = PackageName::new("pkg").unwrap();
        let fetcher = fetcher_in(root.path(), &pkg).await;

        let html = fetcher.fetch(&pkg, &entry(&server, "error-page-1.0.tar.gz")).await;
        assert!(matches!(html, Err(FetchError::HtmlPage { .. })));

        let slow = fetcher.fetch(&pkg, &entry(&server, "slow-1.0.tar.gz")).await;
        assert!(matches!(slow, Err(FetchError::Timeout { .. })));

        let missing = fetcher.fetch(&pkg, &entry(&server, "missing-1.0.tar.gz")).await;
        assert!(matches!(missing, Err(FetchError::Status { status: 404, .. })));

        let mut leftovers = tokio::fs::read_dir(root.path().join("pkg")).await.unwrap();
        assert!(leftovers.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_package_dir_is_storage_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"data".to_vec()))
            .mount(&server)
            .await;

        let root = tempfile::tempdir().unwrap();
        let config = RunConfig {
            storage_root: root.path().join("never-created"),
            time_delay: Duration::ZERO,
            ..RunConfig::default()
        };
        let fetcher = ArtifactFetcher::new(Client::new(), &config);
        let pkg = PackageName::new("pkg").unwrap();

        let result = fetcher.fetch(&pkg, &entry(&server, "pkg-1.0.tar.gz")).await;
        assert!(matches!(result, Err(FetchError::Storage { .. })));
    }
}
