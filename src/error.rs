// src/error.rs
// =============================================================================
// Error types shared by the resolver and the download pipeline.
//
// Two families:
// - InputError: something wrong before any network activity starts
//   (unreadable seed file, nothing to do, storage root unusable), plus
//   failing to write the resolved list back to the seed file.
//   These are fatal and end the run with exit code -1.
// - FetchError: anything that can go wrong for one metadata request,
//   one listing page or one artifact. These never abort sibling work;
//   the download phase turns them into counts in the report.
// =============================================================================

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Fatal problems with the run's input, detected before any request is made.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to load requirement file {path}: {source}")]
    SeedFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write resolved packages to {path}: {source}")]
    SeedWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no package names found in the seed list")]
    EmptySeed,

    #[error("cannot use storage directory {path}: {reason}")]
    StorageRoot { path: PathBuf, reason: String },
}

/// A failed request or write for a single item.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("{url} timed out after {}s", .limit.as_secs())]
    Timeout { url: String, limit: Duration },

    // Mirrors sometimes answer 200 with an HTML error page instead of the file
    #[error("{url} returned an HTML page instead of a distribution")]
    HtmlPage { url: String },

    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("metadata for {package} is unusable: {reason}")]
    Metadata { package: String, reason: String },

    #[error("refusing to write unsafe file name {name:?}")]
    UnsafeName { name: String },

    #[error("failed to write {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    pub fn transport(url: &str, source: reqwest::Error) -> Self {
        FetchError::Transport {
            url: url.to_string(),
            source,
        }
    }

    /// True for failures that happened on the network side rather than locally.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            FetchError::Transport { .. }
                | FetchError::Status { .. }
                | FetchError::Timeout { .. }
                | FetchError::HtmlPage { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_shows_seconds() {
        let err = FetchError::Timeout {
            url: "https://example.com/a.whl".to_string(),
            limit: Duration::from_secs(120),
        };
        assert_eq!(err.to_string(), "https://example.com/a.whl timed out after 120s");
        assert!(err.is_network());
    }

    #[test]
    fn test_storage_error_is_local() {
        let err = FetchError::Storage {
            path: PathBuf::from("/nope/a.whl"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(!err.is_network());
    }
}
