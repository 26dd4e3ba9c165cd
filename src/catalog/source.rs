//! Remote catalog sources.

use async_trait::async_trait;
use tracing::{debug, instrument};
use url::Url;

use super::model::CatalogCategory;
use super::parser::parse_catalog_source;
use crate::download::{FetchError, HttpClient};

/// Default catalog page of the guideline publisher.
pub const DEFAULT_CATALOG_URL: &str = "https://www.nccn.org/guidelines/category_1";

/// Produces the categories of the remote catalog.
///
/// `async_trait` keeps the trait object-safe so the cache can hold an
/// `Arc<dyn CatalogSource>`.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetches and parses the remote catalog.
    async fn fetch(&self) -> Result<Vec<CatalogCategory>, FetchError>;

    /// Short description used in logs.
    fn describe(&self) -> String;
}

/// Catalog page fetched anonymously over HTTP.
#[derive(Debug, Clone)]
pub struct HttpCatalogSource {
    url: String,
    client: HttpClient,
}

impl HttpCatalogSource {
    /// Source at `url` using a default anonymous client.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(url, HttpClient::new())
    }

    /// Source at `url` using `client` (for custom timeouts).
    #[must_use]
    pub fn with_client(url: impl Into<String>, client: HttpClient) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch(&self) -> Result<Vec<CatalogCategory>, FetchError> {
        let base = Url::parse(&self.url).map_err(|_| FetchError::invalid_url(&self.url))?;
        let body = self.client.get_bytes(&self.url).await?;
        let text = String::from_utf8_lossy(&body);
        let categories = parse_catalog_source(&text, &base);
        debug!(categories = categories.len(), "catalog source parsed");
        Ok(categories)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}
