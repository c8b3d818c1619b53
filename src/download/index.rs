// src/download/index.rs
// =============================================================================
// Reads a package's listing page from the "simple" index.
//
// A listing page is plain HTML with one anchor per distribution file:
//   <a href="../../packages/ab/cd/six-1.16.0.tar.gz#sha256=...">six-1.16.0.tar.gz</a>
//
// We use `scraper` to find every <a href> and `url` to resolve the href
// against the configured index base. The anchor text is the file name.
//
// A failed or non-200 listing request is a whole-package failure; we never
// work from a partial listing.
// =============================================================================

use super::version::VersionKey;
use crate::config::RunConfig;
use crate::error::FetchError;
use crate::package::PackageName;
use log::warn;
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

/// One downloadable file from a listing page.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionEntry {
    pub url: Url,
    pub file_name: String,
    /// None when the file name carries no recognisable version
    pub version: Option<VersionKey>,
}

#[derive(Debug, Clone)]
pub struct IndexClient {
    client: Client,
    index_url: Url,
}

impl IndexClient {
    pub fn new(client: Client, config: &RunConfig) -> Self {
        IndexClient {
            client,
            index_url: config.index_url.clone(),
        }
    }

    // URL of the package's listing page: <index>/<package>/
    pub fn listing_url(&self, package: &PackageName) -> Result<Url, url::ParseError> {
        self.index_url.join(&format!("{}/", package))
    }

    pub async fn list_distributions(&self, package: &PackageName) -> Result<Vec<DistributionEntry>, FetchError> {
        let url = self
            .listing_url(package)
            .map_err(|e| FetchError::InvalidUrl {
                url: format!("{}{}/", self.index_url, package),
                reason: e.to_string(),
            })?;

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

        let html = response
            .text()
            .await
            .map_err(|e| FetchError::transport(url.as_str(), e))?;

        Ok(parse_listing(&html, &self.index_url))
    }
}

// Extracts every distribution link from a listing page.
//
// Parameters:
//   html: the listing page
//   base: the index base URL, relative hrefs are resolved against it
pub fn parse_listing(html: &str, base: &Url) -> Vec<DistributionEntry> {
    let document = Html::parse_document(html);

    // Constant selector, known to be valid
    let selector = Selector::parse("a[href]").unwrap();

    let mut entries = Vec::new();
    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };

        let url = match base.join(href.trim()) {
            Ok(url) => url,
            Err(e) => {
                warn!("Listing: skipping link {:?}: {}", href, e);
                continue;
            }
        };

        let text: String = element.text().collect();
        let file_name = match text.trim() {
            "" => file_name_from_url(&url),
            name => name.to_string(),
        };

        entries.push(DistributionEntry {
            version: VersionKey::from_file_name(&file_name),
            url,
            file_name,
        });
    }

    entries
}

fn file_name_from_url(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.last())
        .unwrap_or_default()
        .to_string()
}
