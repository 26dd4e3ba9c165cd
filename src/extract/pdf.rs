//! Page-range text extraction from PDF documents.

use std::fmt;
use std::path::Path;

use lopdf::Document;
use tracing::{debug, instrument, warn};

use super::error::ExtractError;
use super::selector::parse_selector;

/// Separator placed between page segments in [`ExtractedContent::text`].
pub const PAGE_SEPARATOR: &str = "\n\n";

/// Text of a single selected page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    /// 1-based page number.
    pub number: u32,
    /// Extracted text, trailing whitespace trimmed. Empty when the page has no
    /// extractable text.
    pub text: String,
}

/// Result of an extraction: the selected pages in ascending order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractedContent {
    /// Number of pages in the source document.
    pub page_count: u32,
    /// Selected pages, ascending.
    pub pages: Vec<PageText>,
}

impl ExtractedContent {
    /// True when no selected page produced any text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.iter().all(|page| page.text.trim().is_empty())
    }

    /// Selected page numbers, ascending.
    #[must_use]
    pub fn page_numbers(&self) -> Vec<u32> {
        self.pages.iter().map(|page| page.number).collect()
    }

    /// Concatenated text, one `--- Page N ---` segment per selected page.
    #[must_use]
    pub fn text(&self) -> String {
        self.pages
            .iter()
            .map(|page| format!("--- Page {} ---\n{}", page.number, page.text))
            .collect::<Vec<_>>()
            .join(PAGE_SEPARATOR)
    }
}

impl fmt::Display for ExtractedContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// Extracts text from a selected subset of a PDF's pages.
///
/// Stateless and synchronous; async callers wrap it in
/// `tokio::task::spawn_blocking`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageRangeExtractor;

impl PageRangeExtractor {
    /// Creates an extractor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Extracts the pages of the document at `path` chosen by `selector`.
    ///
    /// `None` or a blank selector selects every page. A page whose text
    /// cannot be decoded contributes an empty segment rather than failing
    /// the whole extraction.
    ///
    /// # Errors
    ///
    /// - [`ExtractError::Load`] when the file is missing or not a readable PDF
    /// - [`ExtractError::Selector`] when the selector is invalid for the
    ///   document's page count
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn extract(
        &self,
        path: &Path,
        selector: Option<&str>,
    ) -> Result<ExtractedContent, ExtractError> {
        let document = Document::load(path).map_err(|e| ExtractError::load(path, e))?;
        extract_from(&document, selector)
    }

    /// Same as [`extract`](Self::extract) for an in-memory document.
    ///
    /// # Errors
    ///
    /// See [`extract`](Self::extract).
    pub fn extract_bytes(
        &self,
        bytes: &[u8],
        selector: Option<&str>,
    ) -> Result<ExtractedContent, ExtractError> {
        let document = Document::load_mem(bytes).map_err(|e| ExtractError::load("<memory>", e))?;
        extract_from(&document, selector)
    }

    /// Number of pages in the document at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Load`] when the document cannot be read.
    pub fn page_count(&self, path: &Path) -> Result<u32, ExtractError> {
        let document = Document::load(path).map_err(|e| ExtractError::load(path, e))?;
        Ok(document_page_count(&document))
    }
}

fn document_page_count(document: &Document) -> u32 {
    u32::try_from(document.get_pages().len()).unwrap_or(u32::MAX)
}

fn extract_from(document: &Document, selector: Option<&str>) -> Result<ExtractedContent, ExtractError> {
    let page_count = document_page_count(document);
    let selection = parse_selector(selector.unwrap_or_default(), page_count)?;
    debug!(page_count, selected = selection.len(), "extracting pages");

    let pages = selection
        .pages()
        .iter()
        .map(|&number| PageText {
            number,
            text: page_text(document, number),
        })
        .collect();

    Ok(ExtractedContent { page_count, pages })
}

fn page_text(document: &Document, number: u32) -> String {
    match document.extract_text(&[number]) {
        Ok(text) => text.trim_end().to_string(),
        Err(error) => {
            warn!(page = number, error = %error, "page text could not be decoded");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(pages: &[(u32, &str)]) -> ExtractedContent {
        ExtractedContent {
            page_count: 10,
            pages: pages
                .iter()
                .map(|&(number, text)| PageText {
                    number,
                    text: text.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_text_labels_each_page_in_order() {
        let extracted = content(&[(1, "Alpha"), (3, "Gamma")]);
        assert_eq!(
            extracted.text(),
            "--- Page 1 ---\nAlpha\n\n--- Page 3 ---\nGamma"
        );
        assert_eq!(extracted.page_numbers(), vec![1, 3]);
        assert_eq!(extracted.to_string(), extracted.text());
    }

    #[test]
    fn test_is_empty_when_every_page_is_blank() {
        assert!(content(&[(1, ""), (2, "  \n")]).is_empty());
        assert!(content(&[]).is_empty());
        assert!(!content(&[(1, ""), (2, "text")]).is_empty());
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let result = PageRangeExtractor::new().extract(Path::new("/nonexistent/doc.pdf"), None);
        assert!(matches!(result, Err(ExtractError::Load { .. })));
    }

    #[test]
    fn test_non_pdf_bytes_are_load_error() {
        let result = PageRangeExtractor::new().extract_bytes(b"<html>login</html>", Some("1"));
        assert!(matches!(result, Err(ExtractError::Load { .. })));
    }
}
