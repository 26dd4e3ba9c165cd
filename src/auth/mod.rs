//! Credentials and authenticated sessions.
//!
//! A [`CredentialSession`] performs the site's form login once per set of
//! [`Credentials`] and hands out a [`Session`] whose cookie jar carries the
//! authenticated state for later document fetches.

mod credentials;
mod error;
mod login_form;
mod session;

pub use credentials::Credentials;
pub use error::{AuthError, AuthErrorKind};
pub use session::{CredentialSession, DEFAULT_LOGIN_URL, LoginConfig, Session};
