//! Freshness-governed catalog cache.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use super::error::{CacheError, RefreshError};
use super::model::Catalog;
use super::source::CatalogSource;
use crate::storage::write_atomic;

/// Default freshness window for the persisted catalog (7 days).
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Time-to-live cache of the remote catalog, persisted as a YAML file.
///
/// The persisted file's last-modified time is the freshness signal. Writers
/// publish through an atomic rename, so concurrent readers of a present file
/// never block and never see a partial write.
#[derive(Clone)]
pub struct CatalogCache {
    source: Arc<dyn CatalogSource>,
}

impl std::fmt::Debug for CatalogCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogCache")
            .field("source", &self.source.describe())
            .finish()
    }
}

impl CatalogCache {
    /// Creates a cache over `source`.
    #[must_use]
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        Self { source }
    }

    /// Returns the catalog, refreshing the persisted copy only when needed.
    ///
    /// 1. A persisted copy no older than `max_age` is returned as-is.
    /// 2. Otherwise the remote source is fetched, persisted and returned.
    /// 3. If that fails, an expired persisted copy is returned instead.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Unavailable`] only when the refresh failed and no
    /// readable persisted copy exists.
    #[instrument(skip(self), fields(path = %output_path.display()))]
    pub async fn ensure(&self, output_path: &Path, max_age: Duration) -> Result<Catalog, CacheError> {
        let persisted = load_with_age(output_path).await;

        if let Some((catalog, age)) = &persisted
            && *age <= max_age
        {
            debug!(age_secs = age.as_secs(), "persisted catalog is fresh");
            return Ok(catalog.clone());
        }

        match self.refresh(output_path).await {
            Ok(catalog) => Ok(catalog),
            Err(error) => match persisted {
                Some((catalog, age)) => {
                    warn!(
                        error = %error,
                        age_days = age.as_secs() / 86_400,
                        "catalog refresh failed, using stale copy; data may be out of date"
                    );
                    Ok(catalog)
                }
                None => Err(CacheError::unavailable(output_path, error)),
            },
        }
    }

    /// Fetches the remote catalog and persists it to `output_path`.
    ///
    /// A source yielding no entries is treated as a failed refresh so an
    /// earlier good copy is never replaced by an empty one.
    ///
    /// A failed write is logged and the fetched catalog is still returned.
    /// Nothing fresh is then on disk, so every later [`ensure`](Self::ensure)
    /// fetches again until a write succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`RefreshError`] when the source cannot be fetched or is empty.
    pub async fn refresh(&self, output_path: &Path) -> Result<Catalog, RefreshError> {
        info!(source = %self.source.describe(), "refreshing guidelines catalog");
        let categories = self.source.fetch().await?;
        let catalog = Catalog::new(categories, Utc::now());
        if catalog.entry_count() == 0 {
            return Err(RefreshError::Empty {
                source_name: self.source.describe(),
            });
        }

        match catalog.to_yaml() {
            Ok(yaml) => {
                if let Err(error) = write_atomic(output_path, yaml.as_bytes()).await {
                    warn!(
                        path = %output_path.display(),
                        error = %error,
                        "failed to persist catalog; the next lookup will fetch it again"
                    );
                }
            }
            Err(error) => warn!(error = %error, "failed to serialize catalog"),
        }

        info!(
            categories = catalog.category_count(),
            entries = catalog.entry_count(),
            "guidelines catalog refreshed"
        );
        Ok(catalog)
    }
}

/// Reads the persisted catalog and its age.
///
/// Returns `None` when the file is absent, is not a catalog, or holds no
/// usable entry. A file without `fetched_at` is dated by its mtime.
pub(crate) async fn load_with_age(path: &Path) -> Option<(Catalog, Duration)> {
    let metadata = tokio::fs::metadata(path).await.ok()?;
    let modified = metadata.modified().ok()?;
    let age = SystemTime::now()
        .duration_since(modified)
        .unwrap_or(Duration::ZERO);

    let yaml = tokio::fs::read_to_string(path).await.ok()?;
    match Catalog::from_yaml(&yaml, DateTime::<Utc>::from(modified)) {
        Ok(catalog) if catalog.entry_count() > 0 => Some((catalog, age)),
        Ok(_) => {
            warn!(path = %path.display(), "persisted catalog has no usable entries, ignoring it");
            None
        }
        Err(error) => {
            warn!(path = %path.display(), error = %error, "persisted catalog is unreadable, ignoring it");
            None
        }
    }
}
