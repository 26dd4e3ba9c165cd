//! A mocked publisher site with a form login.

use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SESSION_COOKIE: &str = "session=abc123";
pub const CSRF_TOKEN: &str = "tok-7f3a";
pub const USERNAME: &str = "alice@example.org";
pub const PASSWORD: &str = "s3cret";

/// Login page with a hidden anti-forgery token and a form posting to
/// `/account/login`.
#[must_use]
pub fn login_page() -> String {
    format!(
        r#"<html><body>
        <form id="search" action="/search"><input name="q"></form>
        <form method="post" action="/account/login">
          <input type="hidden" name="__RequestVerificationToken" value="{CSRF_TOKEN}">
          <input type="text" name="Username">
          <input type="password" name="Password">
        </form>
        </body></html>"#
    )
}

/// Mounts the login page and a submission endpoint accepting only
/// [`USERNAME`]/[`PASSWORD`] with the token; the submission must happen
/// exactly `logins` times.
pub async fn mount_login(server: &MockServer, logins: u64) {
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string(login_page()),
        )
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/account/login"))
        .and(body_string_contains(format!(
            "__RequestVerificationToken={CSRF_TOKEN}"
        )))
        .and(body_string_contains("Username=alice%40example.org"))
        .and(body_string_contains(format!("Password={PASSWORD}")))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", format!("{SESSION_COOKIE}; Path=/; HttpOnly"))
                .insert_header("content-type", "text/html")
                .set_body_string("<html><body>Welcome back</body></html>"),
        )
        .expect(logins)
        .mount(server)
        .await;
}

/// Login URL on `server`.
#[must_use]
pub fn login_url(server: &MockServer) -> String {
    format!("{}/login", server.uri())
}
