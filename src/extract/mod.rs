//! Page-range text extraction.
//!
//! [`parse_selector`] turns a selector such as `"1,5-7,-1"` into an ordered
//! set of pages, and [`PageRangeExtractor`] pulls the text of those pages out
//! of a PDF, one labelled segment per page.

mod error;
mod pdf;
mod selector;

pub use error::{ExtractError, SelectorError, SelectorErrorKind};
pub use pdf::{ExtractedContent, PAGE_SEPARATOR, PageRangeExtractor, PageText};
pub use selector::{PageSelector, parse_selector};
