//! Errors from loading menus

use std::path::PathBuf;

use thiserror::Error;

/// Broad category of a [`MenuError`], for callers that only need to branch
/// on what kind of thing went wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    UnknownLocation,
    CacheRead,
    Network,
    UpstreamStatus,
    InvalidBody,
    Config,
}

#[derive(Debug, Error)]
pub enum MenuError {
    #[error("Unknown location: '{0}'")]
    UnknownLocation(String),

    #[error("Failed to read cached menu {path}: {source}")]
    CacheRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cached menu {path} is not valid JSON: {source}")]
    CacheCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Network error fetching {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Upstream returned {status} for {url}")]
    UpstreamStatus { status: u16, url: String },

    #[error("Response from {url} is not valid JSON: {source}")]
    InvalidBody {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid menu endpoint '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl MenuError {
    pub fn kind(&self) -> FailureKind {
        match self {
            MenuError::UnknownLocation(_) => FailureKind::UnknownLocation,
            MenuError::CacheRead { .. } | MenuError::CacheCorrupt { .. } => FailureKind::CacheRead,
            MenuError::Network { .. } => FailureKind::Network,
            MenuError::UpstreamStatus { .. } => FailureKind::UpstreamStatus,
            MenuError::InvalidBody { .. } => FailureKind::InvalidBody,
            MenuError::InvalidUrl { .. } | MenuError::Client(_) => FailureKind::Config,
        }
    }

    /// The request URL, for failures that happened while talking to the API
    pub fn url(&self) -> Option<&str> {
        match self {
            MenuError::Network { url, .. }
            | MenuError::UpstreamStatus { url, .. }
            | MenuError::InvalidBody { url, .. } => Some(url),
            _ => None,
        }
    }

    /// HTTP status for upstream failures
    pub fn status(&self) -> Option<u16> {
        match self {
            MenuError::UpstreamStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, MenuError::Network { source, .. } if source.is_timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_status_details() {
        let err = MenuError::UpstreamStatus {
            status: 404,
            url: "http://example.test/menu.json?date=2024-01-01".to_string(),
        };

        assert_eq!(err.kind(), FailureKind::UpstreamStatus);
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.url(), Some("http://example.test/menu.json?date=2024-01-01"));
        assert!(err.to_string().contains("404"));
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_unknown_location_has_no_url() {
        let err = MenuError::UnknownLocation("Nowhere".to_string());
        assert_eq!(err.kind(), FailureKind::UnknownLocation);
        assert!(err.url().is_none());
        assert!(err.status().is_none());
        assert_eq!(err.to_string(), "Unknown location: 'Nowhere'");
    }

    #[test]
    fn test_corrupt_cache_is_a_cache_read_failure() {
        let source = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = MenuError::CacheCorrupt {
            path: PathBuf::from("json/2024-01-01_IV.json"),
            source,
        };
        assert_eq!(err.kind(), FailureKind::CacheRead);
        assert!(err.to_string().contains("2024-01-01_IV.json"));
    }
}
