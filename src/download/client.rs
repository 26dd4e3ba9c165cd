//! HTTP client wrapper shared by login, catalog and document requests.
//!
//! This module provides the `HttpClient` struct which applies the engine's
//! timeouts and User-Agent, classifies authentication rejections, and streams
//! response bodies to disk.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use reqwest::cookie::Jar;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::FetchError;
use crate::user_agent;

/// HTTP client with bounded timeouts and an optional cookie jar.
///
/// A client built with a cookie jar carries an authenticated session; the
/// plain client is used for anonymous requests. Both are cheap to clone and
/// share one connection pool per instance.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new anonymous HTTP client with default timeouts.
    ///
    /// Default configuration:
    /// - Connect timeout: 30 seconds
    /// - Read timeout: 5 minutes (for large files)
    /// - Gzip decompression: enabled
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    pub fn new() -> Self {
        Self::new_with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a new anonymous HTTP client with explicit timeout values.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new_with_timeouts(connect_timeout_secs: u64, read_timeout_secs: u64) -> Self {
        let client = build_client(None, connect_timeout_secs, read_timeout_secs)
            .expect("failed to build HTTP client with static configuration");
        Self { client }
    }

    /// Creates a new HTTP client with a cookie jar and explicit timeout values.
    ///
    /// Cookies set by the server are stored in the jar and attached to
    /// matching requests based on domain, path, and secure flag.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    #[instrument(level = "debug", skip(cookie_jar))]
    pub fn with_cookie_jar_and_timeouts(
        cookie_jar: Arc<Jar>,
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Self {
        let client = build_client(Some(cookie_jar), connect_timeout_secs, read_timeout_secs)
            .expect("failed to build HTTP client with static configuration");
        Self { client }
    }

    /// Sends a GET request and returns the successful response.
    ///
    /// # Errors
    ///
    /// - [`FetchError::InvalidUrl`] when `url` does not parse
    /// - [`FetchError::AuthRequired`] for 401/403/407 or a login redirect
    /// - [`FetchError::HttpStatus`] for any other non-success status
    /// - [`FetchError::Timeout`] / [`FetchError::Network`] for transport failures
    pub async fn get(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        let parsed = Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;

        let response = self
            .client
            .get(parsed.clone())
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            // Promote auth-related status codes to AuthRequired
            if matches!(status_code, 401 | 403 | 407) {
                let domain = parsed
                    .host_str()
                    .map_or_else(|| url.to_string(), ToString::to_string);
                return Err(FetchError::auth_required(url, status_code, domain));
            }
            return Err(FetchError::http_status(url, status_code));
        }

        if let Some(auth_err) = detect_login_redirect(url, &response) {
            return Err(auth_err);
        }

        Ok(response)
    }

    /// Fetches `url` and returns the full response body.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get), plus network errors while reading the body.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.get(url).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;
        debug!(bytes = body.len(), "response body received");
        Ok(body.to_vec())
    }

    /// Streams the body of `url` into `file_path`, returning bytes written.
    ///
    /// The file is removed again when the request or the stream fails, so a
    /// failed transfer never leaves partial data behind.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get), plus [`FetchError::Filesystem`] when the
    /// file cannot be created or written.
    #[instrument(skip(self), fields(url = %url, path = %file_path.display()))]
    pub async fn get_to_file(&self, url: &str, file_path: &Path) -> Result<u64, FetchError> {
        let response = self.get(url).await?;

        let mut file = File::create(file_path)
            .await
            .map_err(|e| FetchError::filesystem(file_path, e))?;

        let stream_result = stream_to_file(&mut file, response, url, file_path).await;
        if stream_result.is_err() {
            debug!(path = %file_path.display(), "cleaning up partial file after error");
            drop(file);
            let _ = tokio::fs::remove_file(file_path).await;
        }
        stream_result
    }

    /// Returns a reference to the underlying reqwest client.
    ///
    /// Used by the login handshake, which needs POST requests and raw
    /// responses.
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

/// Streams response body to file, returning bytes written.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, FetchError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| FetchError::from_reqwest(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| FetchError::filesystem(file_path, e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| FetchError::filesystem(file_path, e))?;
    writer
        .get_mut()
        .sync_all()
        .await
        .map_err(|e| FetchError::filesystem(file_path, e))?;

    Ok(bytes_written)
}

fn build_client(
    cookie_jar: Option<Arc<Jar>>,
    connect_timeout_secs: u64,
    read_timeout_secs: u64,
) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .timeout(Duration::from_secs(read_timeout_secs))
        .gzip(true)
        .user_agent(user_agent::default_user_agent());
    if let Some(jar) = cookie_jar {
        builder = builder.cookie_provider(jar);
    }
    builder.build()
}

/// Known binary file extensions that indicate the server should NOT return HTML.
const BINARY_EXTENSIONS: &[&str] = &[
    ".pdf", ".doc", ".docx", ".epub", ".zip", ".xls", ".xlsx", ".ppt", ".pptx", ".rtf",
];

/// Common URL patterns indicating a login/SSO redirect.
const LOGIN_PATTERNS: &[&str] = &[
    "/login",
    "/signin",
    "/sign-in",
    "/account/log",
    "/auth/",
    "/sso",
    "/saml",
    "/oauth",
    "/idp/",
];

/// Returns true if the URL path ends in a known binary extension.
fn is_expected_binary(url: &str) -> bool {
    let path = Url::parse(url)
        .ok()
        .map(|u| u.path().to_lowercase())
        .unwrap_or_default();
    BINARY_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Detects login redirect: HTML response returned when a binary file was expected.
fn detect_login_redirect(original_url: &str, response: &reqwest::Response) -> Option<FetchError> {
    if !is_expected_binary(original_url) {
        return None;
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if !content_type.to_ascii_lowercase().contains("text/html") {
        return None;
    }

    // Without a login pattern the HTML may just be an error page.
    let response_url = response.url();
    let lowered = response_url.as_str().to_lowercase();
    if !LOGIN_PATTERNS.iter().any(|pattern| lowered.contains(pattern)) {
        debug!(
            url = %original_url,
            response_url = %response_url,
            "HTML response for expected binary download but no login pattern"
        );
        return None;
    }

    let domain = response_url.host_str().unwrap_or("unknown").to_string();
    Some(FetchError::auth_required(original_url, 0, domain))
}
