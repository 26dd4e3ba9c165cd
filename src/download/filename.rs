//! Deterministic filename derivation for downloaded documents.
//!
//! The skip-if-present check runs before any network I/O, so the name of a
//! document must be a pure function of its URL: the last path segment when it
//! looks like a real filename, otherwise a digest of the whole URL.

use std::fmt::Write as _;
use std::path::{Component, Path};

use sha2::{Digest, Sha256};
use tracing::debug;
use url::Url;

use super::constants::{FALLBACK_EXTENSION, URL_DIGEST_HEX_LEN};

/// Derives the target filename for `url`.
///
/// The same URL string always maps to the same filename.
///
/// ```
/// use guidelines_core::target_filename;
///
/// assert_eq!(target_filename("https://site.org/pdf/nscl.pdf"), "nscl.pdf");
/// assert!(target_filename("https://site.org/detail?id=7").starts_with("document-"));
/// ```
#[must_use]
pub fn target_filename(url: &str) -> String {
    let url = url.trim();
    Url::parse(url)
        .ok()
        .and_then(|parsed| descriptive_segment(&parsed))
        .unwrap_or_else(|| hashed_filename(url))
}

/// Last path segment, percent-decoded and sanitized, if it carries an extension.
fn descriptive_segment(url: &Url) -> Option<String> {
    let last = url.path_segments()?.next_back()?;
    if last.is_empty() {
        return None;
    }
    let decoded = urlencoding::decode(last).unwrap_or_else(|e| {
        debug!(segment = %last, error = %e, "URL decoding failed, using raw segment");
        last.into()
    });
    let name = sanitize_filename(&decoded);
    if !is_safe_filename_segment(&name) {
        return None;
    }

    let (stem, ext) = name.rsplit_once('.')?;
    let stem_ok = !stem.trim_matches(|c| c == '_' || c == '.').is_empty();
    let ext_ok = (1..=12).contains(&ext.len()) && ext.chars().all(|c| c.is_ascii_alphanumeric());
    (stem_ok && ext_ok).then_some(name)
}

/// `document-<digest>.pdf`, where the digest is a SHA-256 prefix of the URL.
pub(crate) fn hashed_filename(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    let mut hex = String::with_capacity(URL_DIGEST_HEX_LEN);
    for byte in digest.iter().take(URL_DIGEST_HEX_LEN / 2) {
        let _ = write!(hex, "{byte:02x}");
    }
    format!("document-{hex}{FALLBACK_EXTENSION}")
}

/// Sanitizes filename for filesystem safety.
///
/// Replaces characters that are invalid on common filesystems:
/// / \ : * ? " < > |
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}
