//! Integration tests for document downloads.
//!
//! These tests verify the full download flow against mock HTTP servers.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use guidelines_core::auth::{CredentialSession, Credentials, LoginConfig};
use guidelines_core::download::{DocumentFetcher, DownloadFailure, FetchError, FetchErrorKind};
use tempfile::TempDir;
use wiremock::matchers::{header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod support;
use support::login_site::{PASSWORD, USERNAME, login_url, mount_login};
use support::socket_guard::start_mock_server_or_skip;

const PDF_BYTES: &[u8] = b"%PDF-1.5\n1 0 obj\n<< >>\nendobj\ntrailer\n<< >>\n%%EOF\n";

fn fetcher(server: &MockServer) -> DocumentFetcher {
    DocumentFetcher::new(Arc::new(CredentialSession::new(LoginConfig::with_login_url(
        login_url(server),
    ))))
}

fn credentials() -> Credentials {
    Credentials::new(USERNAME, PASSWORD)
}

/// Names of leftover temp files in `dir`.
fn partial_files(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .filter(|name| name.ends_with(".part"))
                .collect()
        })
        .unwrap_or_default()
}

/// Public document at `/pdf/<name>`.
async fn mount_public_pdf(server: &MockServer, name: &str, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/pdf/{name}")))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(PDF_BYTES.to_vec()),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

/// Members-only document at `/members/<name>`: served with the session
/// cookie, 401 without it.
async fn mount_members_pdf(server: &MockServer, name: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/members/{name}")))
        .and(header_regex("cookie", "session=abc123"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(PDF_BYTES.to_vec()),
        )
        .with_priority(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/members/{name}")))
        .respond_with(ResponseTemplate::new(401))
        .with_priority(2)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_anonymous_download_writes_complete_file() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_public_pdf(&server, "nscl.pdf", 1).await;
    let dir = TempDir::new().expect("failed to create temp dir");
    let target = dir.path().join("downloads");

    let result = fetcher(&server)
        .download(&format!("{}/pdf/nscl.pdf", server.uri()), &target, None, true)
        .await;

    assert!(result.success, "download should succeed: {:?}", result.error);
    assert!(!result.skipped);
    assert_eq!(result.filename, "nscl.pdf");
    assert_eq!(result.path, target.join("nscl.pdf"));
    assert_eq!(result.bytes, PDF_BYTES.len() as u64);
    assert_eq!(std::fs::read(&result.path).unwrap(), PDF_BYTES);
    assert!(partial_files(&target).is_empty());
}

#[tokio::test]
async fn test_second_download_is_skipped_without_network() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    // Exactly one network fetch across both calls.
    mount_public_pdf(&server, "nscl.pdf", 1).await;
    let dir = TempDir::new().unwrap();
    let url = format!("{}/pdf/nscl.pdf", server.uri());
    let fetcher = fetcher(&server);

    let first = fetcher.download(&url, dir.path(), None, true).await;
    let second = fetcher.download(&url, dir.path(), None, true).await;

    assert!(first.success && !first.skipped);
    assert!(second.success && second.skipped);
    assert_eq!(second.bytes, 0);
    assert_eq!(first.path, second.path);
}

#[tokio::test]
async fn test_download_without_skip_refetches() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_public_pdf(&server, "nscl.pdf", 2).await;
    let dir = TempDir::new().unwrap();
    let url = format!("{}/pdf/nscl.pdf", server.uri());
    let fetcher = fetcher(&server);

    assert!(fetcher.download(&url, dir.path(), None, false).await.success);
    let again = fetcher.download(&url, dir.path(), None, false).await;
    assert!(again.success && !again.skipped);
}

#[tokio::test]
async fn test_empty_existing_file_is_not_treated_as_present() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_public_pdf(&server, "nscl.pdf", 1).await;
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("nscl.pdf"), b"").unwrap();

    let result = fetcher(&server)
        .download(&format!("{}/pdf/nscl.pdf", server.uri()), dir.path(), None, true)
        .await;

    assert!(result.success && !result.skipped);
    assert_eq!(std::fs::read(&result.path).unwrap(), PDF_BYTES);
}

#[tokio::test]
async fn test_protected_document_anonymous_then_with_credentials() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_login(&server, 1).await;
    mount_members_pdf(&server, "doc.pdf").await;
    let dir = TempDir::new().unwrap();
    let url = format!("{}/members/doc.pdf", server.uri());
    let fetcher = fetcher(&server);

    let anonymous = fetcher.download(&url, dir.path(), None, true).await;
    assert!(!anonymous.success);
    assert!(anonymous.auth_required(), "error: {:?}", anonymous.error);
    assert_eq!(anonymous.filename, "doc.pdf");
    assert!(!dir.path().join("doc.pdf").exists());
    assert!(partial_files(dir.path()).is_empty());

    let authenticated = fetcher
        .download(&url, dir.path(), Some(&credentials()), true)
        .await;
    assert!(authenticated.success, "error: {:?}", authenticated.error);
    assert_eq!(authenticated.path, dir.path().join("doc.pdf"));
    assert_eq!(std::fs::read(&authenticated.path).unwrap(), PDF_BYTES);
}

#[tokio::test]
async fn test_batch_with_same_credentials_logs_in_once() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_login(&server, 1).await;
    mount_members_pdf(&server, "a.pdf").await;
    mount_members_pdf(&server, "b.pdf").await;
    let dir = TempDir::new().unwrap();
    let fetcher = fetcher(&server);
    let creds = credentials();

    for name in ["a.pdf", "b.pdf"] {
        let url = format!("{}/members/{name}", server.uri());
        let result = fetcher.download(&url, dir.path(), Some(&creds), true).await;
        assert!(result.success, "{name}: {:?}", result.error);
    }
}

#[tokio::test]
async fn test_expired_session_is_renewed_once() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_login(&server, 2).await;
    // The first authenticated request finds the session expired server-side.
    Mock::given(method("GET"))
        .and(path("/members/doc.pdf"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_members_pdf(&server, "doc.pdf").await;
    let dir = TempDir::new().unwrap();

    let result = fetcher(&server)
        .download(
            &format!("{}/members/doc.pdf", server.uri()),
            dir.path(),
            Some(&credentials()),
            true,
        )
        .await;

    assert!(result.success, "error: {:?}", result.error);
}

#[tokio::test]
async fn test_rejected_credentials_report_auth_failure() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_login(&server, 0).await;
    mount_members_pdf(&server, "doc.pdf").await;
    let dir = TempDir::new().unwrap();

    let result = fetcher(&server)
        .download(
            &format!("{}/members/doc.pdf", server.uri()),
            dir.path(),
            Some(&Credentials::new(USERNAME, "not-the-password")),
            true,
        )
        .await;

    assert!(!result.success);
    assert!(matches!(result.error, Some(DownloadFailure::Auth(_))));
    assert!(!dir.path().join("doc.pdf").exists());
}

#[tokio::test]
async fn test_login_redirect_is_auth_required() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/pdf/gated.pdf"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("{}/login?returnUrl=/pdf/gated.pdf", server.uri())),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(
                    "<html><form><input type=password name=Password></form></html>",
                    "text/html; charset=utf-8",
                ),
        )
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();

    let result = fetcher(&server)
        .download(&format!("{}/pdf/gated.pdf", server.uri()), dir.path(), None, true)
        .await;

    assert!(result.auth_required(), "error: {:?}", result.error);
    assert!(!dir.path().join("gated.pdf").exists());
}

#[tokio::test]
async fn test_missing_document_is_network_kind() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/pdf/gone.pdf"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();

    let result = fetcher(&server)
        .download(&format!("{}/pdf/gone.pdf", server.uri()), dir.path(), None, true)
        .await;

    assert!(!result.success);
    assert!(!result.auth_required());
    match result.error {
        Some(DownloadFailure::Fetch(error)) => assert_eq!(error.kind(), FetchErrorKind::Network),
        other => panic!("expected fetch failure, got {other:?}"),
    }
    assert!(partial_files(dir.path()).is_empty());
}

#[tokio::test]
async fn test_url_without_filename_gets_stable_hashed_name() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/guidelines-detail"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(PDF_BYTES.to_vec()),
        )
        .expect(1)
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let url = format!("{}/guidelines-detail?category=1&id=1450", server.uri());
    let fetcher = fetcher(&server);

    let first = fetcher.download(&url, dir.path(), None, true).await;
    let second = fetcher.download(&url, dir.path(), None, true).await;

    assert!(first.success);
    assert!(first.filename.starts_with("document-") && first.filename.ends_with(".pdf"));
    assert_eq!(first.filename, second.filename);
    assert!(second.skipped);
}

#[tokio::test]
async fn test_slow_document_times_out_as_network_failure() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/pdf/slow.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(PDF_BYTES.to_vec())
                .set_delay(Duration::from_secs(4)),
        )
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let fetcher = DocumentFetcher::new(Arc::new(CredentialSession::with_timeouts(
        LoginConfig::with_login_url(login_url(&server)),
        1,
        1,
    )));

    let result = fetcher
        .download(&format!("{}/pdf/slow.pdf", server.uri()), dir.path(), None, true)
        .await;

    assert!(!result.success);
    match result.error {
        Some(DownloadFailure::Fetch(error)) => {
            assert!(matches!(error, FetchError::Timeout { .. }), "{error:?}");
            assert_eq!(error.kind(), FetchErrorKind::Network);
        }
        other => panic!("expected fetch failure, got {other:?}"),
    }
    assert!(!dir.path().join("slow.pdf").exists());
    assert!(partial_files(dir.path()).is_empty());
}
