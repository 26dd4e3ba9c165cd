//! Error types for the download module.
//!
//! Every failure of an HTTP fetch or of writing its body to disk is one of
//! these variants. [`FetchError::kind`] folds them into the three kinds a
//! caller acts on: network trouble, missing authentication, or a local
//! filesystem problem.

use std::path::PathBuf;

use thiserror::Error;

/// Suggestion shown when a resource rejects an anonymous or expired session.
const CREDENTIALS_SUGGESTION: &str =
    "Set NCCN_USERNAME and NCCN_PASSWORD (or pass --username/--password) to download with credentials.";

/// Suggestion shown for HTTP 407.
const PROXY_SUGGESTION: &str = "Configure your HTTP proxy settings or check proxy credentials.";

/// Errors that can occur while fetching a document or the catalog.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// HTTP error response other than an authentication rejection.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The provided URL is malformed or invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The resource requires an authenticated session.
    #[error(
        "[AUTH] authentication required for {domain} (HTTP {status}) fetching {url}\n  Suggestion: {suggestion}"
    )]
    AuthRequired {
        /// The URL that requires authentication.
        url: String,
        /// The HTTP status code (401, 403, 407, or 0 for a login redirect).
        status: u16,
        /// The domain requiring authentication.
        domain: String,
        /// User-facing suggestion for resolving the auth issue.
        suggestion: &'static str,
    },

    /// Creating, writing or renaming a local file failed.
    #[error("filesystem error at {path}: {source}")]
    Filesystem {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Coarse classification of a [`FetchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Transport failure, timeout, bad URL or non-auth HTTP status.
    Network,
    /// The server rejected the request for lack of authentication.
    AuthRequired,
    /// Local filesystem failure.
    Filesystem,
}

impl FetchError {
    /// Creates a network error from a reqwest error, promoting timeouts.
    pub fn from_reqwest(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { url: url.into() }
        } else {
            Self::Network {
                url: url.into(),
                source,
            }
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a filesystem error.
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Creates an authentication-required error.
    ///
    /// 407 (Proxy Authentication Required) gets a proxy hint, everything else
    /// (401, 403, login redirect) tells the caller to supply credentials.
    pub fn auth_required(url: impl Into<String>, status: u16, domain: impl Into<String>) -> Self {
        let suggestion = if status == 407 {
            PROXY_SUGGESTION
        } else {
            CREDENTIALS_SUGGESTION
        };
        Self::AuthRequired {
            url: url.into(),
            status,
            domain: domain.into(),
            suggestion,
        }
    }

    /// Returns the coarse kind callers branch on.
    #[must_use]
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            Self::Network { .. }
            | Self::Timeout { .. }
            | Self::HttpStatus { .. }
            | Self::InvalidUrl { .. } => FetchErrorKind::Network,
            Self::AuthRequired { .. } => FetchErrorKind::AuthRequired,
            Self::Filesystem { .. } => FetchErrorKind::Filesystem,
        }
    }
}
