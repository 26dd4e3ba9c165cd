//! Session-based login and authenticated fetch.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::CONTENT_TYPE;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::credentials::Credentials;
use super::error::AuthError;
use super::login_form::{LoginForm, page_has_password_field, parse_login_form};
use crate::download::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use crate::download::{FetchError, HttpClient};

/// Default login page of the guideline publisher.
pub const DEFAULT_LOGIN_URL: &str = "https://www.nccn.org/login";

/// Where and how credentials are submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginConfig {
    /// Login page; fetched first to collect hidden form fields.
    pub login_url: String,
    /// Form field carrying the username.
    pub username_field: String,
    /// Form field carrying the password.
    pub password_field: String,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            login_url: DEFAULT_LOGIN_URL.to_string(),
            username_field: "Username".to_string(),
            password_field: "Password".to_string(),
        }
    }
}

impl LoginConfig {
    /// Config for `login_url` with the default field names.
    #[must_use]
    pub fn with_login_url(login_url: impl Into<String>) -> Self {
        Self {
            login_url: login_url.into(),
            ..Self::default()
        }
    }
}

/// An authenticated transport bound to one set of credentials.
///
/// Cloning is cheap and shares the cookie jar.
#[derive(Debug, Clone)]
pub struct Session {
    username: String,
    fingerprint: [u8; 32],
    client: HttpClient,
    established_at: DateTime<Utc>,
}

impl Session {
    /// The username the session was established for.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// When the login handshake completed.
    #[must_use]
    pub fn established_at(&self) -> DateTime<Utc> {
        self.established_at
    }

    /// Whether this session was established with exactly `credentials`.
    #[must_use]
    pub fn is_for(&self, credentials: &Credentials) -> bool {
        self.fingerprint == credentials.fingerprint()
    }

    pub(crate) fn client(&self) -> &HttpClient {
        &self.client
    }
}

/// Performs the login handshake and issues requests with or without a session.
///
/// At most one successful session is cached. `authenticate` with the same
/// credentials returns it without touching the network; [`invalidate`]
/// discards it after the site stops honouring it.
///
/// [`invalidate`]: CredentialSession::invalidate
#[derive(Debug)]
pub struct CredentialSession {
    login: LoginConfig,
    anonymous: HttpClient,
    connect_timeout_secs: u64,
    read_timeout_secs: u64,
    cached: Mutex<Option<Session>>,
}

impl CredentialSession {
    /// Creates a session manager with default timeouts.
    #[must_use]
    pub fn new(login: LoginConfig) -> Self {
        Self::with_timeouts(login, CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a session manager with explicit timeouts for every request.
    #[must_use]
    pub fn with_timeouts(login: LoginConfig, connect_timeout_secs: u64, read_timeout_secs: u64) -> Self {
        Self {
            login,
            anonymous: HttpClient::new_with_timeouts(connect_timeout_secs, read_timeout_secs),
            connect_timeout_secs,
            read_timeout_secs,
            cached: Mutex::new(None),
        }
    }

    /// The login configuration in use.
    #[must_use]
    pub fn login_config(&self) -> &LoginConfig {
        &self.login
    }

    /// Returns a session for `credentials`, logging in only when none is cached.
    ///
    /// Concurrent callers are serialized so one set of credentials triggers a
    /// single handshake.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] when the handshake does not yield a usable session.
    #[instrument(skip(self, credentials), fields(username = %credentials.username()))]
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let mut cached = self.cached.lock().await;
        if let Some(session) = cached.as_ref().filter(|s| s.is_for(credentials)) {
            debug!("reusing cached session");
            return Ok(session.clone());
        }

        let session = self.login(credentials).await?;
        *cached = Some(session.clone());
        Ok(session)
    }

    /// Drops the cached session, forcing the next `authenticate` to log in.
    pub async fn invalidate(&self) {
        if self.cached.lock().await.take().is_some() {
            info!("cached session invalidated");
        }
    }

    /// Fetches `url` and returns its body.
    ///
    /// Without a session the request is anonymous.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::AuthRequired`] for authentication rejections and
    /// a network-kind [`FetchError`] for everything else.
    pub async fn get(&self, session: Option<&Session>, url: &str) -> Result<Vec<u8>, FetchError> {
        self.client_for(session).get_bytes(url).await
    }

    /// Streams `url` into `file_path`; see [`get`](Self::get).
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get), plus [`FetchError::Filesystem`].
    pub async fn get_to_file(
        &self,
        session: Option<&Session>,
        url: &str,
        file_path: &Path,
    ) -> Result<u64, FetchError> {
        self.client_for(session).get_to_file(url, file_path).await
    }

    fn client_for<'a>(&'a self, session: Option<&'a Session>) -> &'a HttpClient {
        session.map_or(&self.anonymous, Session::client)
    }

    async fn login(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let login_url_str = self.login.login_url.as_str();
        let login_url = Url::parse(login_url_str)
            .map_err(|_| AuthError::unexpected_response(login_url_str, "login URL is not a valid URL"))?;

        let jar = Arc::new(Jar::default());
        let client = HttpClient::with_cookie_jar_and_timeouts(
            Arc::clone(&jar),
            self.connect_timeout_secs,
            self.read_timeout_secs,
        );

        // Step 1: login page, for hidden fields and any pre-login cookies.
        let page = client
            .inner()
            .get(login_url.clone())
            .send()
            .await
            .map_err(|e| AuthError::from_reqwest(login_url_str, e))?;
        if !page.status().is_success() {
            return Err(AuthError::unexpected_response(
                login_url_str,
                format!("login page returned HTTP {}", page.status().as_u16()),
            ));
        }
        let page_url = page.url().clone();
        let page_body = page
            .text()
            .await
            .map_err(|e| AuthError::from_reqwest(login_url_str, e))?;
        let form = parse_login_form(&page_body, &page_url, &self.login.password_field)
            .unwrap_or_else(|| {
                warn!("no login form found on login page, posting to login URL");
                LoginForm {
                    action: login_url.clone(),
                    hidden_fields: Vec::new(),
                }
            });
        debug!(action = %form.action, hidden = form.hidden_fields.len(), "login form parsed");

        // Step 2: submit credentials, following redirects.
        let body = self.encode_form(&form, credentials);
        let response = client
            .inner()
            .post(form.action.clone())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(|e| AuthError::from_reqwest(form.action.as_str(), e))?;

        let status = response.status().as_u16();
        if matches!(status, 401 | 403) {
            return Err(AuthError::invalid_credentials(form.action.as_str(), credentials.username()));
        }
        if !response.status().is_success() {
            return Err(AuthError::unexpected_response(
                form.action.as_str(),
                format!("login submission returned HTTP {status}"),
            ));
        }

        // Step 3: landing back on the login form means the credentials were refused.
        let final_url = response.url().clone();
        let landing = response
            .text()
            .await
            .map_err(|e| AuthError::from_reqwest(final_url.as_str(), e))?;
        let on_login_page =
            final_url.path() == form.action.path() || final_url.path() == login_url.path();
        if on_login_page && page_has_password_field(&landing, &self.login.password_field) {
            return Err(AuthError::invalid_credentials(final_url.as_str(), credentials.username()));
        }

        if jar.cookies(&final_url).is_none() && jar.cookies(&login_url).is_none() {
            return Err(AuthError::unexpected_response(
                final_url.as_str(),
                "login completed without a session cookie",
            ));
        }

        info!(username = %credentials.username(), "authenticated session established");
        Ok(Session {
            username: credentials.username().to_string(),
            fingerprint: credentials.fingerprint(),
            client,
            established_at: Utc::now(),
        })
    }

    fn encode_form(&self, form: &LoginForm, credentials: &Credentials) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (name, value) in &form.hidden_fields {
            if name != &self.login.username_field && name != &self.login.password_field {
                serializer.append_pair(name, value);
            }
        }
        serializer.append_pair(&self.login.username_field, credentials.username());
        serializer.append_pair(&self.login.password_field, credentials.password());
        serializer.finish()
    }
}
