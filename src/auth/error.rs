//! Error types for the login handshake.

use thiserror::Error;

/// Errors that can occur while establishing an authenticated session.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The site rejected the submitted credentials.
    #[error("[AUTH] login rejected for {username} at {url}: check NCCN_USERNAME and NCCN_PASSWORD")]
    InvalidCredentials {
        /// Login endpoint that rejected the credentials.
        url: String,
        /// The username that was submitted.
        username: String,
    },

    /// Network-level error during the handshake.
    #[error("network error during login at {url}: {source}")]
    Network {
        /// Login URL being contacted.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The handshake timed out.
    #[error("timeout during login at {url}")]
    Timeout {
        /// Login URL being contacted.
        url: String,
    },

    /// The site answered in a way the handshake does not understand.
    #[error("unexpected login response from {url}: {detail}")]
    UnexpectedResponse {
        /// URL whose response was unexpected.
        url: String,
        /// What was wrong with it.
        detail: String,
    },
}

/// Coarse classification of an [`AuthError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    /// Credentials were refused.
    InvalidCredentials,
    /// Transport failure or timeout.
    Network,
    /// The site's response did not yield a usable session.
    UnexpectedResponse,
}

impl AuthError {
    /// Creates an invalid-credentials error.
    pub fn invalid_credentials(url: impl Into<String>, username: impl Into<String>) -> Self {
        Self::InvalidCredentials {
            url: url.into(),
            username: username.into(),
        }
    }

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

    /// Creates an unexpected-response error.
    pub fn unexpected_response(url: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            url: url.into(),
            detail: detail.into(),
        }
    }

    /// Returns the coarse kind callers branch on.
    #[must_use]
    pub fn kind(&self) -> AuthErrorKind {
        match self {
            Self::InvalidCredentials { .. } => AuthErrorKind::InvalidCredentials,
            Self::Network { .. } | Self::Timeout { .. } => AuthErrorKind::Network,
            Self::UnexpectedResponse { .. } => AuthErrorKind::UnexpectedResponse,
        }
    }
}
