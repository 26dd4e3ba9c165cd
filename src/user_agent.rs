//! Shared User-Agent string for login, catalog and document requests.

/// Project URL for User-Agent identification (RFC 9308).
const PROJECT_UA_URL: &str = "https://github.com/nicksrandall/guidelines";

/// Default User-Agent for every request the engine sends.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("guidelines/{version} (clinical-guideline-reader; +{PROJECT_UA_URL})")
}
