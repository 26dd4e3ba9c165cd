//! Guideline catalog: model, source parsing and the time-to-live cache.
//!
//! The catalog maps category names to ordered lists of `{title, url}`
//! entries. [`CatalogCache::ensure`] keeps a persisted YAML copy and only
//! goes to the network when that copy is missing or older than the
//! configured age, falling back to an expired copy when the refresh fails.

mod cache;
mod error;
mod model;
mod parser;
mod source;

pub use cache::{CatalogCache, DEFAULT_MAX_AGE};
pub use error::{CacheError, RefreshError};
pub use model::{Catalog, CatalogCategory, CatalogEntry};
pub use parser::{UNCATEGORIZED, parse_catalog_source};
pub use source::{CatalogSource, DEFAULT_CATALOG_URL, HttpCatalogSource};
