//! Login page parsing.
//!
//! Form-based logins usually embed anti-forgery tokens as hidden inputs that
//! must be echoed back with the credentials. This module finds the login form
//! on a page, its submit URL, and those hidden fields.

use scraper::{ElementRef, Html, Selector};
use url::Url;

/// The parts of a login form needed to submit credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LoginForm {
    /// Absolute URL the form posts to.
    pub action: Url,
    /// Hidden `name=value` pairs, in document order.
    pub hidden_fields: Vec<(String, String)>,
}

/// Extracts the login form from `html`.
///
/// Prefers the first form holding a password input (by `type=password` or by
/// `password_field` name) and falls back to the first form on the page.
/// Returns `None` when the page has no form at all.
pub(crate) fn parse_login_form(html: &str, page_url: &Url, password_field: &str) -> Option<LoginForm> {
    let document = Html::parse_document(html);
    let form_selector = Selector::parse("form").ok()?;
    let input_selector = Selector::parse("input").ok()?;

    let forms: Vec<ElementRef<'_>> = document.select(&form_selector).collect();
    let form = forms
        .iter()
        .find(|form| {
            form.select(&input_selector)
                .any(|input| is_password_input(input, password_field))
        })
        .or_else(|| forms.first())?;

    let action = form
        .value()
        .attr("action")
        .map(str::trim)
        .filter(|action| !action.is_empty())
        .and_then(|action| page_url.join(action).ok())
        .unwrap_or_else(|| page_url.clone());

    let hidden_fields = form
        .select(&input_selector)
        .filter(|input| {
            input
                .value()
                .attr("type")
                .is_some_and(|t| t.eq_ignore_ascii_case("hidden"))
        })
        .filter_map(|input| {
            let name = input.value().attr("name")?.trim();
            if name.is_empty() {
                return None;
            }
            let value = input.value().attr("value").unwrap_or_default();
            Some((name.to_string(), value.to_string()))
        })
        .collect();

    Some(LoginForm {
        action,
        hidden_fields,
    })
}

/// True when the page still asks for a password, i.e. the login did not take.
pub(crate) fn page_has_password_field(html: &str, password_field: &str) -> bool {
    let document = Html::parse_document(html);
    let Ok(input_selector) = Selector::parse("input") else {
        return false;
    };
    document
        .select(&input_selector)
        .any(|input| is_password_input(input, password_field))
}

fn is_password_input(input: ElementRef<'_>, password_field: &str) -> bool {
    let element = input.value();
    element
        .attr("type")
        .is_some_and(|t| t.eq_ignore_ascii_case("password"))
        || element.attr("name") == Some(password_field)
}
