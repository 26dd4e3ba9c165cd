//! Error types for page selection and extraction.

use std::path::PathBuf;

use thiserror::Error;

/// A page-selector token that cannot be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    /// The token resolves to a page outside `1..=page_count`.
    #[error("page selector '{token}' resolves to page {resolved}, outside 1..={page_count}")]
    OutOfRange {
        /// The offending token.
        token: String,
        /// The resolved (1-based) page index.
        resolved: i64,
        /// Number of pages in the document.
        page_count: u32,
    },

    /// The token is not an integer or an `a-b` range.
    #[error("malformed page selector '{token}': {reason}")]
    MalformedToken {
        /// The offending token.
        token: String,
        /// What is wrong with it.
        reason: &'static str,
    },
}

/// Coarse classification of a [`SelectorError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorErrorKind {
    /// Resolved index outside the document.
    OutOfRange,
    /// Unparseable token.
    MalformedToken,
}

impl SelectorError {
    /// Creates an out-of-range error.
    pub fn out_of_range(token: impl Into<String>, resolved: i64, page_count: u32) -> Self {
        Self::OutOfRange {
            token: token.into(),
            resolved,
            page_count,
        }
    }

    /// Creates a malformed-token error.
    pub fn malformed(token: impl Into<String>, reason: &'static str) -> Self {
        Self::MalformedToken {
            token: token.into(),
            reason,
        }
    }

    /// Returns the coarse kind callers branch on.
    #[must_use]
    pub fn kind(&self) -> SelectorErrorKind {
        match self {
            Self::OutOfRange { .. } => SelectorErrorKind::OutOfRange,
            Self::MalformedToken { .. } => SelectorErrorKind::MalformedToken,
        }
    }

    /// The token that failed.
    #[must_use]
    pub fn token(&self) -> &str {
        match self {
            Self::OutOfRange { token, .. } | Self::MalformedToken { token, .. } => token,
        }
    }
}

/// Errors from [`PageRangeExtractor`](super::PageRangeExtractor).
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The document could not be opened or parsed.
    #[error("failed to load document {path}: {source}")]
    Load {
        /// Document path (`<memory>` for in-memory documents).
        path: PathBuf,
        /// The underlying PDF error.
        #[source]
        source: lopdf::Error,
    },

    /// The page selector is invalid for this document.
    #[error(transparent)]
    Selector(#[from] SelectorError),
}

impl ExtractError {
    /// Creates a load error.
    pub fn load(path: impl Into<PathBuf>, source: lopdf::Error) -> Self {
        Self::Load {
            path: path.into(),
            source,
        }
    }
}
