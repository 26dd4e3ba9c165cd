//! HTTP transport and idempotent document downloads.
//!
//! # Features
//!
//! - Deterministic target filenames derived from the URL alone
//! - Skip-if-present: a non-empty file under the target name short-circuits
//!   the download with no network I/O
//! - Streaming bodies to a temp file published by atomic rename
//! - Authentication rejections (401/403/407, login redirects) classified
//!   separately from network failures
//! - Configurable timeouts (30s connect, 5min read by default)
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use guidelines_core::{CredentialSession, DocumentFetcher, LoginConfig};
//!
//! # async fn example() {
//! let session = Arc::new(CredentialSession::new(LoginConfig::default()));
//! let fetcher = DocumentFetcher::new(session);
//! let result = fetcher
//!     .download("https://example.com/pdf/doc.pdf", Path::new("./downloads"), None, true)
//!     .await;
//! println!("{} -> {}", result.filename, result.success);
//! # }
//! ```

mod client;
pub mod constants;
mod error;
mod fetcher;
mod filename;

pub use client::HttpClient;
pub use error::{FetchError, FetchErrorKind};
pub use fetcher::{DocumentFetcher, DownloadFailure, FetchResult};
pub use filename::target_filename;
