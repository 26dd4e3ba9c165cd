//! Idempotent single-document downloads.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::error::{FetchError, FetchErrorKind};
use super::filename::target_filename;
use crate::auth::{AuthError, AuthErrorKind, CredentialSession, Credentials, Session};
use crate::storage::{publish, temp_path_for};

/// Why a download did not produce a file.
#[derive(Debug, Error)]
pub enum DownloadFailure {
    /// The login handshake failed.
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// The fetch itself, or writing its body, failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl DownloadFailure {
    /// True when the resource asked for credentials that were not supplied
    /// (or were rejected).
    #[must_use]
    pub fn is_auth_required(&self) -> bool {
        match self {
            Self::Auth(error) => error.kind() == AuthErrorKind::InvalidCredentials,
            Self::Fetch(error) => error.kind() == FetchErrorKind::AuthRequired,
        }
    }
}

/// Outcome of [`DocumentFetcher::download`].
///
/// `filename` and `path` are populated even on failure so callers can report
/// what was attempted.
#[derive(Debug)]
pub struct FetchResult {
    /// Whether the document is present under `path`.
    pub success: bool,
    /// Target filename derived from the URL.
    pub filename: String,
    /// Full target path (`target_dir/filename`).
    pub path: PathBuf,
    /// True when an existing file satisfied the request without network I/O.
    pub skipped: bool,
    /// Bytes written by this call (0 when skipped or failed).
    pub bytes: u64,
    /// Failure detail when `success` is false.
    pub error: Option<DownloadFailure>,
}

impl FetchResult {
    fn downloaded(path: PathBuf, filename: String, bytes: u64) -> Self {
        Self {
            success: true,
            filename,
            path,
            skipped: false,
            bytes,
            error: None,
        }
    }

    fn already_present(path: PathBuf, filename: String) -> Self {
        Self {
            success: true,
            filename,
            path,
            skipped: true,
            bytes: 0,
            error: None,
        }
    }

    fn failed(path: PathBuf, filename: String, error: DownloadFailure) -> Self {
        Self {
            success: false,
            filename,
            path,
            skipped: false,
            bytes: 0,
            error: Some(error),
        }
    }

    /// True when the failure was an authentication rejection.
    #[must_use]
    pub fn auth_required(&self) -> bool {
        self.error
            .as_ref()
            .is_some_and(DownloadFailure::is_auth_required)
    }
}

/// Downloads documents into a target directory through a [`CredentialSession`].
///
/// The fetcher is constructed explicitly and shared by reference; the session
/// it wraps caches at most one login, so a batch of downloads with the same
/// credentials performs a single handshake.
#[derive(Debug, Clone)]
pub struct DocumentFetcher {
    session: Arc<CredentialSession>,
}

impl DocumentFetcher {
    /// Creates a fetcher over an existing session manager.
    #[must_use]
    pub fn new(session: Arc<CredentialSession>) -> Self {
        Self { session }
    }

    /// The session manager used for authenticated fetches.
    #[must_use]
    pub fn session(&self) -> &CredentialSession {
        &self.session
    }

    /// Downloads `url` into `target_dir`.
    ///
    /// With `skip_if_exists`, a non-empty file already present under the
    /// derived name short-circuits the call with no network I/O. Otherwise the
    /// body is streamed to a temp file and renamed over the final name once
    /// complete. Never returns an error: failures are carried in the result.
    #[instrument(skip(self, credentials), fields(url = %url, authenticated = credentials.is_some()))]
    pub async fn download(
        &self,
        url: &str,
        target_dir: &Path,
        credentials: Option<&Credentials>,
        skip_if_exists: bool,
    ) -> FetchResult {
        let url = url.trim();
        let filename = target_filename(url);
        let path = target_dir.join(&filename);

        if Url::parse(url).is_err() {
            return FetchResult::failed(path, filename, FetchError::invalid_url(url).into());
        }

        if skip_if_exists && is_present(&path).await {
            info!(path = %path.display(), "document already present, skipping download");
            return FetchResult::already_present(path, filename);
        }

        match self.fetch_into(url, target_dir, &path, credentials).await {
            Ok(bytes) => {
                info!(path = %path.display(), bytes, "document downloaded");
                FetchResult::downloaded(path, filename, bytes)
            }
            Err(error) => {
                warn!(path = %path.display(), error = %error, "document download failed");
                FetchResult::failed(path, filename, error)
            }
        }
    }

    async fn fetch_into(
        &self,
        url: &str,
        target_dir: &Path,
        path: &Path,
        credentials: Option<&Credentials>,
    ) -> Result<u64, DownloadFailure> {
        tokio::fs::create_dir_all(target_dir)
            .await
            .map_err(|e| FetchError::filesystem(target_dir, e))?;

        let Some(credentials) = credentials else {
            debug!("no credentials supplied, fetching anonymously");
            return Ok(self.fetch_once(None, url, path).await?);
        };

        let session = self.session.authenticate(credentials).await?;
        match self.fetch_once(Some(&session), url, path).await {
            Err(error) if error.kind() == FetchErrorKind::AuthRequired => {
                // The cached session may have expired server-side: one fresh login, one retry.
                warn!(error = %error, "authenticated fetch rejected, re-authenticating once");
                self.session.invalidate().await;
                let session = self.session.authenticate(credentials).await?;
                Ok(self.fetch_once(Some(&session), url, path).await?)
            }
            other => Ok(other?),
        }
    }

    async fn fetch_once(
        &self,
        session: Option<&Session>,
        url: &str,
        path: &Path,
    ) -> Result<u64, FetchError> {
        let temp_path = temp_path_for(path);
        let bytes = self.session.get_to_file(session, url, &temp_path).await?;
        publish(&temp_path, path)
            .await
            .map_err(|e| FetchError::filesystem(path, e))?;
        Ok(bytes)
    }
}

async fn is_present(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .is_ok_and(|meta| meta.is_file() && meta.len() > 0)
}
