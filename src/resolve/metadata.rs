// src/resolve/metadata.rs
// =============================================================================
// Fetches a package's declared dependencies from the JSON metadata API.
//
// The payload we care about looks like:
//   { "info": { "requires_dist": ["idna (<4,>=2.5)", "urllib3<3,>=1.21.1", ...] } }
//
// `requires_dist` is null for packages without dependencies; that is not an
// error, just an empty list.
// =============================================================================

use crate::config::RunConfig;
use crate::error::FetchError;
use crate::package::{requirement_name, PackageName};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashSet;

#[derive(Debug, Deserialize)]
struct ProjectMetadata {
    info: ProjectInfo,
}

#[derive(Debug, Deserialize)]
struct ProjectInfo {
    #[serde(default)]
    requires_dist: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct MetadataClient {
    client: Client,
    url_template: String,
}

impl MetadataClient {
    pub fn new(client: Client, config: &RunConfig) -> Self {
        MetadataClient {
            client,
            url_template: config.metadata_url_template.clone(),
        }
    }

    // Returns the normalized names of everything `package` declares in
    // requires_dist, markers and extras included.
    pub async fn dependencies(&self, package: &PackageName) -> Result<HashSet<PackageName>, FetchError> {
        let url = self.url_template.replace("{}", package.as_str());

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::transport(&url, e))?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url,
                status: response.status().as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::transport(&url, e))?;

        parse_requirements(package, &body)
    }
}

fn parse_requirements(package: &PackageName, body: &[u8]) -> Result<HashSet<PackageName>, FetchError> {
    let metadata: ProjectMetadata =
        serde_json::from_slice(body).map_err(|e| FetchError::Metadata {
            package: package.to_string(),
            reason: e.to_string(),
        })?;

    Ok(metadata
        .info
        .requires_dist
        .unwrap_or_default()
        .iter()
        .filter_map(|spec| requirement_name(spec))
        .collect())
}
