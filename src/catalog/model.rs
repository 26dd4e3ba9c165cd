//! Catalog data model and its persisted YAML form.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::parser::parse_persisted;

/// One document listed in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    /// Human-readable title.
    pub title: String,
    /// Absolute document URL; never empty in a valid catalog.
    pub url: String,
}

impl CatalogEntry {
    /// Creates an entry.
    #[must_use]
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// A named group of entries, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogCategory {
    /// Category name.
    #[serde(rename = "category")]
    pub name: String,
    /// Entries, in catalog order.
    #[serde(rename = "guidelines")]
    pub entries: Vec<CatalogEntry>,
}

impl CatalogCategory {
    /// Creates an empty category.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Appends `entry` unless an entry with the same URL is already present.
    pub fn push_unique(&mut self, entry: CatalogEntry) {
        if !self.entries.iter().any(|e| e.url == entry.url) {
            self.entries.push(entry);
        }
    }
}

/// The structured index of available documents.
///
/// Persisted as a single YAML document; that file is the source of truth
/// between refreshes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Catalog {
    /// When the catalog was fetched from the remote source.
    pub fetched_at: DateTime<Utc>,
    /// Categories, in catalog order.
    #[serde(rename = "nccn_guidelines")]
    pub categories: Vec<CatalogCategory>,
}

impl Catalog {
    /// Builds a catalog, dropping entries with an empty URL or title.
    #[must_use]
    pub fn new(categories: Vec<CatalogCategory>, fetched_at: DateTime<Utc>) -> Self {
        let mut catalog = Self {
            fetched_at,
            categories,
        };
        catalog.retain_valid();
        catalog
    }

    fn retain_valid(&mut self) {
        for category in &mut self.categories {
            category
                .entries
                .retain(|e| !e.url.trim().is_empty() && !e.title.trim().is_empty());
        }
    }

    /// Number of categories.
    #[must_use]
    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    /// Number of entries across all categories.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.categories.iter().map(|c| c.entries.len()).sum()
    }

    /// Serializes to the persisted YAML form.
    ///
    /// # Errors
    ///
    /// Returns the serializer error.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Parses the persisted YAML form.
    ///
    /// Categories and entries that do not parse are dropped one by one, so a
    /// single damaged entry never discards the file. A missing or unreadable
    /// `fetched_at` becomes `default_fetched_at`.
    ///
    /// # Errors
    ///
    /// Returns the YAML error when the document is not a catalog at all.
    pub fn from_yaml(yaml: &str, default_fetched_at: DateTime<Utc>) -> Result<Self, serde_yaml::Error> {
        let (categories, fetched_at) = parse_persisted(yaml)?;
        Ok(Self::new(categories, fetched_at.unwrap_or(default_fetched_at)))
    }

    /// Human-readable listing of every category and entry.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::from("Guidelines Index\n================\n\n");
        for category in &self.categories {
            let _ = writeln!(out, "Category: {}", category.name);
            let _ = writeln!(out, "{}", "-".repeat(category.name.chars().count() + 10));
            for entry in &category.entries {
                let _ = writeln!(out, "  \u{2022} {}", entry.title);
                let _ = writeln!(out, "    URL: {}", entry.url);
            }
            out.push('\n');
        }
        out
    }
}
