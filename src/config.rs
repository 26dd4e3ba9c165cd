//! Engine settings: paths, endpoints, timeouts and credentials.

use std::path::PathBuf;
use std::time::Duration;

use crate::auth::{Credentials, DEFAULT_LOGIN_URL, LoginConfig};
use crate::catalog::{DEFAULT_CATALOG_URL, DEFAULT_MAX_AGE};
use crate::download::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};

/// Default directory documents are downloaded into.
pub const DEFAULT_DOWNLOAD_DIR: &str = "downloads";

/// Default location of the persisted catalog.
pub const DEFAULT_INDEX_FILE: &str = "nccn_guidelines_index.yaml";

/// Everything the engine needs to run, with no CLI dependency.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory documents are downloaded into; relative extract paths are
    /// resolved against it first.
    pub download_dir: PathBuf,
    /// Persisted catalog file.
    pub index_file: PathBuf,
    /// How old the persisted catalog may be before a refresh is attempted.
    pub max_age: Duration,
    /// Remote catalog page.
    pub catalog_url: String,
    /// Login endpoint and form field names.
    pub login: LoginConfig,
    /// Seconds allowed to establish a connection.
    pub connect_timeout_secs: u64,
    /// Seconds allowed for a whole request, body included.
    pub read_timeout_secs: u64,
    /// `None` runs the engine anonymously.
    pub credentials: Option<Credentials>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from(DEFAULT_DOWNLOAD_DIR),
            index_file: PathBuf::from(DEFAULT_INDEX_FILE),
            max_age: DEFAULT_MAX_AGE,
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            login: LoginConfig::with_login_url(DEFAULT_LOGIN_URL),
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
            credentials: None,
        }
    }
}

impl Settings {
    /// Sets credentials from optional parts; blank or missing parts leave the
    /// engine anonymous.
    #[must_use]
    pub fn with_credentials(mut self, username: Option<String>, password: Option<String>) -> Self {
        self.credentials = Credentials::from_parts(username, password);
        self
    }

    /// Sets the catalog freshness window in whole days.
    #[must_use]
    pub fn with_max_age_days(mut self, days: u64) -> Self {
        self.max_age = Duration::from_secs(days.saturating_mul(24 * 60 * 60));
        self
    }
}
