//! Text sanitization for name and currency fields.

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Trim and collapse every whitespace run to a single space.
pub(crate) fn collapse_whitespace(value: &str) -> String {
    WHITESPACE_RUN.replace_all(value.trim(), " ").into_owned()
}

/// Uppercase the first letter of each space-delimited word, lowercase the rest.
///
/// Casing is ASCII-only; non-ASCII characters pass through unchanged.
pub(crate) fn title_case_ascii(value: &str) -> String {
    value
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    let mut out = String::with_capacity(word.len());
                    out.push(first.to_ascii_uppercase());
                    out.extend(chars.map(|c| c.to_ascii_lowercase()));
                    out
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Canonical product name, or `None` when nothing is left after trimming.
pub(crate) fn sanitize_name(value: Option<&str>) -> Option<String> {
    let collapsed = collapse_whitespace(value?);
    if collapsed.is_empty() {
        return None;
    }
    Some(title_case_ascii(&collapsed))
}

/// Canonical currency code, or `None` when nothing is left after trimming.
pub(crate) fn sanitize_currency(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_ascii_uppercase())
}
