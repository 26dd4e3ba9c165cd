//! Caller-facing operations over the engine.
//!
//! [`GuidelineService`] wires the components together from [`Settings`] and
//! turns each outcome into the message a caller sees. [`IndexRefresh`] runs the
//! startup catalog check as a visible background task.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::auth::CredentialSession;
use crate::catalog::{
    CacheError, Catalog, CatalogCache, CatalogSource, HttpCatalogSource, RefreshError,
};
use crate::config::Settings;
use crate::download::{DocumentFetcher, FetchResult, HttpClient};
use crate::extract::{ExtractError, ExtractedContent, PageRangeExtractor};

/// Appended to a failed download when the engine runs anonymously.
const CREDENTIALS_HINT: &str = "You may need to provide NCCN login credentials via environment \
                                variables (NCCN_USERNAME, NCCN_PASSWORD).";

/// Errors surfaced by [`GuidelineService`].
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A relative document path matched nothing under the downloads dir or
    /// the working directory, or an absolute path does not exist.
    #[error("PDF file not found: {path}")]
    DocumentNotFound {
        /// The path as given by the caller.
        path: PathBuf,
    },

    /// The catalog is neither persisted nor fetchable.
    #[error(transparent)]
    Index(#[from] CacheError),

    /// A forced catalog refresh failed.
    #[error("guidelines index refresh failed: {0}")]
    Refresh(#[from] RefreshError),

    /// Text extraction failed.
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// The catalog could not be serialized.
    #[error("failed to serialize guidelines index: {0}")]
    Serialize(#[from] serde_yaml::Error),

    /// A blocking worker task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(String),
}

impl ServiceError {
    /// Creates a not-found error.
    pub fn document_not_found(path: impl Into<PathBuf>) -> Self {
        Self::DocumentNotFound { path: path.into() }
    }
}

/// Readiness of the catalog after startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexState {
    /// The startup check is still running.
    Pending,
    /// A catalog is available.
    Ready {
        /// Number of categories.
        categories: usize,
        /// Number of entries across all categories.
        entries: usize,
    },
    /// No catalog could be obtained; carries the reason.
    Failed(String),
}

impl IndexState {
    /// True once the startup check has finished, successfully or not.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Handle to the background catalog check started at startup.
///
/// The state is published through a watch channel so any number of callers
/// can poll it or wait for it to settle.
#[derive(Debug)]
pub struct IndexRefresh {
    state: watch::Receiver<IndexState>,
    task: JoinHandle<()>,
}

impl IndexRefresh {
    /// Spawns `cache.ensure(index_file, max_age)` on the tokio runtime.
    #[must_use]
    pub fn spawn(cache: CatalogCache, index_file: PathBuf, max_age: Duration) -> Self {
        let (tx, rx) = watch::channel(IndexState::Pending);
        let task = tokio::spawn(async move {
            let state = match cache.ensure(&index_file, max_age).await {
                Ok(catalog) => {
                    info!(
                        categories = catalog.category_count(),
                        entries = catalog.entry_count(),
                        "guidelines index ready"
                    );
                    IndexState::Ready {
                        categories: catalog.category_count(),
                        entries: catalog.entry_count(),
                    }
                }
                Err(e) => {
                    error!(error = %e, "guidelines index unavailable, continuing with limited functionality");
                    IndexState::Failed(e.to_string())
                }
            };
            tx.send_replace(state);
        });
        Self { state: rx, task }
    }

    /// Current state without waiting.
    #[must_use]
    pub fn state(&self) -> IndexState {
        self.state.borrow().clone()
    }

    /// Waits until the check settles and returns the final state.
    pub async fn wait(&self) -> IndexState {
        let mut rx = self.state.clone();
        let settled = match rx.wait_for(IndexState::is_settled).await {
            Ok(state) => state.clone(),
            Err(_) => IndexState::Failed("index refresh task ended without a result".to_string()),
        };
        settled
    }

    /// True once the background task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// The engine's operations, built once from [`Settings`] and shared.
#[derive(Debug, Clone)]
pub struct GuidelineService {
    settings: Settings,
    cache: CatalogCache,
    fetcher: DocumentFetcher,
    extractor: PageRangeExtractor,
}

impl GuidelineService {
    /// Builds the service against the live catalog at `settings.catalog_url`.
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        let client =
            HttpClient::new_with_timeouts(settings.connect_timeout_secs, settings.read_timeout_secs);
        let source = Arc::new(HttpCatalogSource::with_client(
            settings.catalog_url.clone(),
            client,
        ));
        Self::with_catalog_source(settings, source)
    }

    /// Builds the service with an explicit catalog source.
    #[must_use]
    pub fn with_catalog_source(settings: Settings, source: Arc<dyn CatalogSource>) -> Self {
        let session = Arc::new(CredentialSession::with_timeouts(
            settings.login.clone(),
            settings.connect_timeout_secs,
            settings.read_timeout_secs,
        ));
        Self {
            cache: CatalogCache::new(source),
            fetcher: DocumentFetcher::new(session),
            extractor: PageRangeExtractor::new(),
            settings,
        }
    }

    /// The settings the service was built from.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Starts the startup catalog check in the background.
    #[must_use]
    pub fn start_index_refresh(&self) -> IndexRefresh {
        IndexRefresh::spawn(
            self.cache.clone(),
            self.settings.index_file.clone(),
            self.settings.max_age,
        )
    }

    /// Returns the catalog, refreshing it only when stale or missing.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Index`] when no catalog can be obtained.
    pub async fn index(&self) -> Result<Catalog, ServiceError> {
        Ok(self
            .cache
            .ensure(&self.settings.index_file, self.settings.max_age)
            .await?)
    }

    /// Refreshes the catalog regardless of its age.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Refresh`] when the source cannot be fetched or
    /// is empty; the persisted copy is left untouched in that case.
    pub async fn refresh_index(&self) -> Result<Catalog, ServiceError> {
        Ok(self.cache.refresh(&self.settings.index_file).await?)
    }

    /// The persisted catalog document as stored on disk.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Index`] when no catalog can be obtained.
    pub async fn raw_index(&self) -> Result<String, ServiceError> {
        let catalog = self.index().await?;
        match tokio::fs::read_to_string(&self.settings.index_file).await {
            Ok(raw) => Ok(raw),
            Err(e) => {
                // Persisting may have failed after a successful refresh.
                debug!(error = %e, "persisted index unreadable, serializing in-memory copy");
                Ok(catalog.to_yaml()?)
            }
        }
    }

    /// Human-readable listing of the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Index`] when no catalog can be obtained.
    pub async fn render_index(&self) -> Result<String, ServiceError> {
        Ok(self.index().await?.render())
    }

    /// Downloads `url` into the downloads dir, skipping when already present.
    pub async fn download(&self, url: &str) -> FetchResult {
        self.fetcher
            .download(
                url,
                &self.settings.download_dir,
                self.settings.credentials.as_ref(),
                true,
            )
            .await
    }

    /// Downloads `url` and describes the outcome.
    pub async fn download_message(&self, url: &str) -> String {
        let result = self.download(url).await;
        self.describe_download(url, &result)
    }

    /// Message for a finished download of `url`.
    #[must_use]
    pub fn describe_download(&self, url: &str, result: &FetchResult) -> String {
        if result.success {
            return format!(
                "PDF downloaded successfully: {} (filename: {})",
                result.path.display(),
                result.filename
            );
        }

        let mut message = format!(
            "Failed to download PDF from {} (attempted filename: {}).",
            url.trim(),
            result.filename
        );
        if let Some(error) = &result.error {
            message.push(' ');
            message.push_str(&error.to_string());
        }
        if self.settings.credentials.is_none() {
            message.push(' ');
            message.push_str(CREDENTIALS_HINT);
        }
        message
    }

    /// Resolves a caller-supplied document path.
    ///
    /// Absolute paths are used as-is. Relative paths are tried under the
    /// downloads dir first, then under the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::DocumentNotFound`] when no candidate exists.
    pub async fn resolve_path(&self, path: &str) -> Result<PathBuf, ServiceError> {
        let given = Path::new(path.trim());
        let candidates = if given.is_absolute() {
            vec![given.to_path_buf()]
        } else {
            vec![self.settings.download_dir.join(given), given.to_path_buf()]
        };

        for candidate in candidates {
            if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
                return Ok(candidate);
            }
        }
        Err(ServiceError::document_not_found(given))
    }

    /// Extracts text from the selected pages of the document at `path`.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::DocumentNotFound`] when the path does not resolve
    /// - [`ServiceError::Extract`] when the document or selector is invalid
    #[instrument(skip(self))]
    pub async fn extract(
        &self,
        path: &str,
        pages: Option<&str>,
    ) -> Result<(PathBuf, ExtractedContent), ServiceError> {
        let resolved = self.resolve_path(path).await?;
        let extractor = self.extractor;
        let selector = pages.map(str::to_string);
        let target = resolved.clone();
        let content = tokio::task::spawn_blocking(move || {
            extractor.extract(&target, selector.as_deref())
        })
        .await
        .map_err(|e| ServiceError::Task(e.to_string()))??;
        Ok((resolved, content))
    }

    /// Extracts text and describes the outcome.
    pub async fn extract_message(&self, path: &str, pages: Option<&str>) -> String {
        let pages_label = pages
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or("all");

        match self.extract(path, pages).await {
            Ok((resolved, content)) if content.is_empty() => {
                warn!(path = %resolved.display(), pages = pages_label, "no content extracted");
                no_content_message(&resolved, pages)
            }
            Ok((resolved, content)) => {
                info!(path = %resolved.display(), pages = pages_label, "content extracted");
                content.text()
            }
            Err(e @ ServiceError::DocumentNotFound { .. }) => {
                warn!(error = %e, "document not found");
                e.to_string()
            }
            Err(e) => {
                warn!(error = %e, "extraction failed");
                format!("Error extracting content from PDF: {e}")
            }
        }
    }
}

/// Message for an extraction that selected pages but found no text.
#[must_use]
pub fn no_content_message(path: &Path, pages: Option<&str>) -> String {
    let pages = pages.map(str::trim).filter(|p| !p.is_empty()).unwrap_or("all");
    format!("No content extracted from {} (pages: {pages})", path.display())
}
