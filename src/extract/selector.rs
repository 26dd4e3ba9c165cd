//! Page-selector grammar.
//!
//! ```text
//! selector := token ("," token)*
//! token    := index | index "-" index
//! index    := ["-"] digits        ; 1-based, negative counts from the end
//! ```
//!
//! `-1` is the last page, so `"-2--1"` selects the last two pages. The
//! resolved set is de-duplicated and sorted ascending; selector order never
//! affects output order.

use std::collections::BTreeSet;
use std::num::IntErrorKind;

use super::error::SelectorError;

/// Resolved, de-duplicated, ascending 1-based page numbers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageSelector {
    pages: Vec<u32>,
}

impl PageSelector {
    /// Every page of a `page_count`-page document.
    #[must_use]
    pub fn all(page_count: u32) -> Self {
        Self {
            pages: (1..=page_count).collect(),
        }
    }

    /// The selected page numbers, ascending.
    #[must_use]
    pub fn pages(&self) -> &[u32] {
        &self.pages
    }

    /// Number of selected pages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// True when no page is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Parses `raw` against a document of `page_count` pages.
///
/// A blank `raw` selects every page. Empty tokens (`"1,,3"`, a trailing
/// comma) are ignored.
///
/// ```
/// use guidelines_core::parse_selector;
///
/// assert_eq!(parse_selector("3,1", 10).unwrap().pages(), &[1, 3]);
/// assert_eq!(parse_selector("-2--1", 10).unwrap().pages(), &[9, 10]);
/// assert!(parse_selector("11", 10).is_err());
/// ```
///
/// # Errors
///
/// - [`SelectorError::OutOfRange`] when a token resolves outside `1..=page_count`
/// - [`SelectorError::MalformedToken`] when a token is not an index or range,
///   or a range runs backwards after resolution
pub fn parse_selector(raw: &str, page_count: u32) -> Result<PageSelector, SelectorError> {
    if raw.trim().is_empty() {
        return Ok(PageSelector::all(page_count));
    }

    let mut pages = BTreeSet::new();
    for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if let Some((start, end)) = split_range(token) {
            let start = resolve(parse_index(start, token)?, page_count, token)?;
            let end = resolve(parse_index(end, token)?, page_count, token)?;
            if start > end {
                return Err(SelectorError::malformed(
                    token,
                    "range start is after range end",
                ));
            }
            pages.extend(start..=end);
        } else {
            pages.insert(resolve(parse_index(token, token)?, page_count, token)?);
        }
    }

    Ok(PageSelector {
        pages: pages.into_iter().collect(),
    })
}

/// Splits `a-b` at the first `-` that follows a digit.
///
/// A leading `-` is a sign, as is a `-` directly after the separator, so
/// `-3--1` splits into `-3` and `-1`.
fn split_range(token: &str) -> Option<(&str, &str)> {
    token.char_indices().skip(1).find_map(|(i, c)| {
        let before = token[..i].trim_end();
        (c == '-' && before.ends_with(|p: char| p.is_ascii_digit()))
            .then(|| (before, token[i + 1..].trim()))
    })
}

fn parse_index(text: &str, token: &str) -> Result<i64, SelectorError> {
    if text.is_empty() {
        return Err(SelectorError::malformed(token, "missing page number"));
    }
    // Overflowing integers are well formed and resolve out of range.
    text.parse::<i64>().or_else(|error| match error.kind() {
        IntErrorKind::PosOverflow => Ok(i64::MAX),
        IntErrorKind::NegOverflow => Ok(i64::MIN),
        _ => Err(SelectorError::malformed(token, "not an integer page number")),
    })
}

/// Maps a possibly negative index onto `1..=page_count`.
fn resolve(index: i64, page_count: u32, token: &str) -> Result<u32, SelectorError> {
    let count = i64::from(page_count);
    let resolved = if index < 0 { count + index + 1 } else { index };
    if resolved < 1 || resolved > count {
        return Err(SelectorError::out_of_range(token, resolved, page_count));
    }
    u32::try_from(resolved).map_err(|_| SelectorError::out_of_range(token, resolved, page_count))
}
