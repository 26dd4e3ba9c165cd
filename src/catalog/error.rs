//! Error types for the catalog cache.

use std::path::PathBuf;

use thiserror::Error;

use crate::download::FetchError;

/// Why a refresh of the catalog from its remote source failed.
#[derive(Debug, Error)]
pub enum RefreshError {
    /// The source could not be fetched.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The source was fetched but yielded no usable entries.
    #[error("catalog source {source_name} yielded no entries")]
    Empty {
        /// Description of the source.
        source_name: String,
    },
}

/// Errors returned by [`CatalogCache::ensure`](super::CatalogCache::ensure).
#[derive(Debug, Error)]
pub enum CacheError {
    /// No usable persisted copy exists and the remote refresh failed.
    #[error("guidelines index unavailable: no usable copy at {path} and refresh failed: {source}")]
    Unavailable {
        /// Catalog file that was looked for.
        path: PathBuf,
        /// Why the refresh failed.
        #[source]
        source: RefreshError,
    },
}

impl CacheError {
    /// Creates an unavailable error.
    pub fn unavailable(path: impl Into<PathBuf>, source: RefreshError) -> Self {
        Self::Unavailable {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_display_names_path_and_cause() {
        let error = CacheError::unavailable(
            "/srv/index.yaml",
            RefreshError::Empty {
                source_name: "https://site.org/catalog".to_string(),
            },
        );
        let msg = error.to_string();
        assert!(msg.contains("/srv/index.yaml"), "{msg}");
        assert!(msg.contains("no entries"), "{msg}");
    }
}
