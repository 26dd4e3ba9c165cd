//! Constants for the download module (timeouts, filename fallback).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for large guideline PDFs).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Extension used for hash-derived filenames.
pub const FALLBACK_EXTENSION: &str = ".pdf";

/// Number of hex characters of the URL digest kept in hash-derived filenames.
pub const URL_DIGEST_HEX_LEN: usize = 16;
