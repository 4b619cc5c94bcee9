//! Field-type resolution for search hits.
//!
//! Decides which document field a typed query matched, and extracts clean
//! display values from highlighted (marker-wrapped) backend values.

use crate::types::{FieldType, FieldValue, SearchHit};
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

static MARKUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("markup pattern is valid"));

/// Remove every `<...>` tag from a highlighted value.
pub fn strip_markup(value: &str) -> Cow<'_, str> {
    MARKUP.replace_all(value, "")
}

/// Case-insensitive substring test; `needle_lower` must already be lowercase.
pub(crate) fn contains_lower(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Resolve which field of `hit` the query matched.
///
/// Highlights win when present: the first one carrying a match marker, else
/// the first highlight. Without usable highlights the document fields are
/// scanned in [`FieldType::PRIORITY`] order. Falls back to [`FieldType::Title`].
///
/// Candidates from [`extract`](super::suggest::extract) already carry the field
/// they were registered under; this is for callers holding a bare hit.
pub fn resolve(hit: &SearchHit, query: &str) -> FieldType {
    if let Some(field) = resolve_from_highlights(hit) {
        return field;
    }

    let query_lower = query.to_lowercase();
    FieldType::PRIORITY
        .into_iter()
        .find(|&field| match hit.document.field_value(field) {
            FieldValue::Text(text) => contains_lower(text, &query_lower),
            FieldValue::List(items) => items.iter().any(|item| contains_lower(item, &query_lower)),
            FieldValue::Missing => false,
        })
        .unwrap_or(FieldType::Title)
}

fn resolve_from_highlights(hit: &SearchHit) -> Option<FieldType> {
    // Highlights on fields we don't model are ignored
    let known: Vec<_> = hit
        .highlights
        .iter()
        .filter_map(|h| h.field_type().map(|field| (field, h)))
        .collect();

    known
        .iter()
        .find(|(_, h)| h.has_marker())
        .or_else(|| known.first())
        .map(|(field, _)| *field)
}

/// Display value of a scalar field: the marker-stripped highlight when it is
/// non-empty, otherwise the raw document value.
pub fn scalar_display_value(hit: &SearchHit, field: FieldType) -> Option<String> {
    let highlighted = hit
        .highlight(field)
        .and_then(|h| h.value.as_deref())
        .map(strip_markup)
        .filter(|value| !value.is_empty());

    if let Some(value) = highlighted {
        return Some(value.into_owned());
    }

    match hit.document.field_value(field) {
        FieldValue::Text(text) if !text.is_empty() => Some(text.to_string()),
        _ => None,
    }
}

/// First element of an array field containing the query, case-insensitively.
pub fn array_match<'a>(hit: &'a SearchHit, field: FieldType, query: &str) -> Option<&'a str> {
    let query_lower = query.to_lowercase();
    match hit.document.field_value(field) {
        FieldValue::List(items) => items
            .iter()
            .find(|item| !item.is_empty() && contains_lower(item, &query_lower))
            .map(String::as_str),
        _ => None,
    }
}
