//! Guidelines Core Library
//!
//! Retrieval and content-extraction engine for clinical guideline documents
//! published behind a credential-gated catalog.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`auth`] - Credentials, login handshake and reusable authenticated sessions
//! - [`download`] - HTTP transport and idempotent document downloads
//! - [`catalog`] - Catalog model, source parsing and the time-to-live cache
//! - [`extract`] - Page-selector grammar and per-page PDF text extraction
//! - [`service`] - Caller-facing operations that turn outcomes into messages
//! - [`config`] - Paths, endpoints, timeouts and credentials

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod catalog;
pub mod config;
pub mod download;
pub mod extract;
pub mod service;
pub mod storage;
mod user_agent;

// Re-export commonly used types
pub use auth::{AuthError, AuthErrorKind, CredentialSession, Credentials, LoginConfig, Session};
pub use catalog::{
    CacheError, Catalog, CatalogCache, CatalogCategory, CatalogEntry, CatalogSource,
    HttpCatalogSource, parse_catalog_source,
};
pub use config::Settings;
pub use download::{
    DocumentFetcher, DownloadFailure, FetchError, FetchErrorKind, FetchResult, HttpClient,
    target_filename,
};
pub use extract::{
    ExtractError, ExtractedContent, PageRangeExtractor, PageSelector, SelectorError,
    SelectorErrorKind, parse_selector,
};
pub use service::{GuidelineService, IndexRefresh, IndexState, ServiceError};
