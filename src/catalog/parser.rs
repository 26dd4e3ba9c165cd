//! Defensive parsing of the remote catalog source.
//!
//! Two shapes are accepted:
//! - an HTML page, where headings open categories and document links become
//!   entries;
//! - a structured YAML/JSON document shaped like the persisted catalog.
//!
//! Malformed entries are skipped one by one; a bad entry never aborts the
//! whole catalog.

use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use serde::de::Error as _;
use serde_yaml::{Mapping, Value};
use tracing::debug;
use url::Url;

use super::model::{CatalogCategory, CatalogEntry};

/// Category for document links that appear before the first heading.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// URL fragments that identify a guideline link on an HTML catalog page.
const ENTRY_URL_MARKERS: &[&str] = &["guidelines-detail"];

/// Parses a catalog source body into categories.
///
/// Relative URLs are resolved against `base_url`. Categories that end up
/// without entries are dropped.
#[must_use]
pub fn parse_catalog_source(body: &str, base_url: &Url) -> Vec<CatalogCategory> {
    let trimmed = body.trim_start();
    if !trimmed.starts_with('<')
        && let Some(categories) = parse_structured(trimmed, base_url)
    {
        debug!(categories = categories.len(), "parsed structured catalog source");
        return categories;
    }
    let categories = parse_html(body, base_url);
    debug!(categories = categories.len(), "parsed HTML catalog source");
    categories
}

fn parse_structured(body: &str, base_url: &Url) -> Option<Vec<CatalogCategory>> {
    let value: Value = serde_yaml::from_str(body).ok()?;
    categories_from_document(&value, Some(base_url))
}

/// Parses a persisted catalog file.
///
/// Returns the categories and the recorded fetch time, if one is present and
/// readable. Entries must carry absolute URLs; anything else is skipped.
///
/// # Errors
///
/// Returns the YAML error when the text is not YAML at all, or a custom error
/// when the document has no category list.
pub(crate) fn parse_persisted(
    yaml: &str,
) -> Result<(Vec<CatalogCategory>, Option<DateTime<Utc>>), serde_yaml::Error> {
    let value: Value = serde_yaml::from_str(yaml)?;
    let categories = categories_from_document(&value, None)
        .ok_or_else(|| serde_yaml::Error::custom("document has no guidelines category list"))?;
    let fetched_at = value
        .get("fetched_at")
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw.trim()).ok())
        .map(|at| at.with_timezone(&Utc));
    Ok((categories, fetched_at))
}

fn categories_from_document(value: &Value, base_url: Option<&Url>) -> Option<Vec<CatalogCategory>> {
    let groups = match value {
        Value::Sequence(groups) => groups,
        Value::Mapping(map) => ["nccn_guidelines", "categories"]
            .iter()
            .find_map(|key| map.get(*key)?.as_sequence())?,
        _ => return None,
    };

    let categories = groups
        .iter()
        .filter_map(|group| category_from_value(group, base_url))
        .filter(|category| !category.entries.is_empty())
        .collect();
    Some(categories)
}

fn category_from_value(value: &Value, base_url: Option<&Url>) -> Option<CatalogCategory> {
    let map = value.as_mapping()?;
    let name = string_field(map, &["category", "name"])?;
    let entries = ["guidelines", "entries"]
        .iter()
        .find_map(|key| map.get(*key)?.as_sequence())?;

    let mut category = CatalogCategory::named(name);
    for entry in entries.iter().filter_map(|e| entry_from_value(e, base_url)) {
        category.push_unique(entry);
    }
    Some(category)
}

fn entry_from_value(value: &Value, base_url: Option<&Url>) -> Option<CatalogEntry> {
    let map = value.as_mapping()?;
    let title = string_field(map, &["title", "name"])?;
    let href = string_field(map, &["url", "href"])?;
    let url = match base_url {
        Some(base) => base.join(&href).ok()?,
        None => Url::parse(&href).ok()?,
    };
    Some(CatalogEntry::new(title, url.as_str()))
}

fn string_field(map: &Mapping, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        map.get(*key)?
            .as_str()
            .map(collapse_whitespace)
            .filter(|s| !s.is_empty())
    })
}

fn parse_html(body: &str, base_url: &Url) -> Vec<CatalogCategory> {
    let document = Html::parse_document(body);
    let Ok(walk) = Selector::parse("h1, h2, h3, h4, a[href]") else {
        return Vec::new();
    };
    let Ok(anchors) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut categories: Vec<CatalogCategory> = Vec::new();
    let mut current: Option<CatalogCategory> = None;

    for element in document.select(&walk) {
        if element.value().name() == "a" {
            if let Some(entry) = entry_from_anchor(element, base_url) {
                current
                    .get_or_insert_with(|| CatalogCategory::named(UNCATEGORIZED))
                    .push_unique(entry);
            }
            continue;
        }

        // A heading that is itself a document link is an entry, not a category.
        if element
            .select(&anchors)
            .any(|a| entry_from_anchor(a, base_url).is_some())
        {
            continue;
        }
        let name = collapse_whitespace(&element.text().collect::<String>());
        if name.is_empty() {
            continue;
        }
        finish_category(&mut categories, current.take());
        current = Some(CatalogCategory::named(name));
    }
    finish_category(&mut categories, current);

    categories
}

/// Appends a category with entries, merging into an earlier one of the same name.
fn finish_category(categories: &mut Vec<CatalogCategory>, category: Option<CatalogCategory>) {
    let Some(category) = category.filter(|c| !c.entries.is_empty()) else {
        return;
    };
    if let Some(existing) = categories.iter_mut().find(|c| c.name == category.name) {
        for entry in category.entries {
            existing.push_unique(entry);
        }
    } else {
        categories.push(category);
    }
}

fn entry_from_anchor(anchor: ElementRef<'_>, base_url: &Url) -> Option<CatalogEntry> {
    let href = anchor.value().attr("href")?.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
    {
        return None;
    }
    let url = base_url.join(href).ok()?;
    if !is_document_link(&url) {
        return None;
    }

    let text = collapse_whitespace(&anchor.text().collect::<String>());
    let title = if text.is_empty() {
        anchor.value().attr("title").map(collapse_whitespace)?
    } else {
        text
    };
    if title.is_empty() {
        return None;
    }
    Some(CatalogEntry::new(title, url.as_str()))
}

fn is_document_link(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    path.ends_with(".pdf")
        || ENTRY_URL_MARKERS
            .iter()
            .any(|marker| url.as_str().contains(marker))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
