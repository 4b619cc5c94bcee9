//! Query planning: backend request objects built from the compiled tag store.
//!
//! Zero or one included free-text tag yields a single request. Two or more fan
//! out into one request per free-text value, sharing filter and exclusions, to
//! be unioned by the backend with duplicates removed.

use super::filter::{CompiledFilter, compile};
use crate::types::{FieldModes, HIGHLIGHT_END, HIGHLIGHT_START, Tag};
use serde::Serialize;

/// Fields searched when a request carries free text.
pub const SEARCH_FIELDS: &str = "title,developer,publisher,genres,supportedOperatingSystems";
/// Fields searched by suggestion lookups, in priority order.
pub const SUGGEST_FIELDS: &str = "genres,supportedOperatingSystems,developer,publisher,title";
/// Per-field weights matching [`SUGGEST_FIELDS`].
pub const SUGGEST_FIELD_WEIGHTS: &str = "5,4,3,2,1";
/// Query string matching every document.
pub const MATCH_ALL: &str = "*";

/// Number of page buttons shown around the current page.
const PAGE_BUTTONS: u32 = 5;

/// One result search, as submitted inside a multi-search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRequest {
    pub collection: String,
    pub q: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_by: Option<String>,
    pub drop_tokens_threshold: u32,
    pub prioritize_exact_match: bool,
    pub prioritize_token_position: bool,
    pub prefix: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_by: Option<String>,
}

impl SearchRequest {
    fn new(collection: &str, q: String, multi_field: bool, filter_by: Option<String>) -> Self {
        Self {
            collection: collection.to_string(),
            q,
            query_by: multi_field.then(|| SEARCH_FIELDS.to_string()),
            drop_tokens_threshold: 0,
            prioritize_exact_match: true,
            prioritize_token_position: true,
            prefix: true,
            filter_by,
        }
    }
}

/// Body of a unioned multi-search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MultiSearchRequest {
    pub union: bool,
    pub remove_duplicates: bool,
    pub searches: Vec<SearchRequest>,
}

impl MultiSearchRequest {
    pub const fn union(searches: Vec<SearchRequest>) -> Self {
        Self {
            union: true,
            remove_duplicates: true,
            searches,
        }
    }
}

/// Common pagination parameters sent alongside a multi-search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

/// Suggestion lookup parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestionQuery {
    /// Addressed in the request path, not the body.
    #[serde(skip)]
    pub collection: String,
    pub q: String,
    pub query_by: &'static str,
    pub query_by_weights: &'static str,
    pub highlight_full_fields: &'static str,
    pub highlight_start_tag: &'static str,
    pub highlight_end_tag: &'static str,
    pub per_page: u32,
    pub prefix: bool,
    pub infix: &'static str,
    pub prioritize_exact_match: bool,
    pub prioritize_token_position: bool,
}

impl SuggestionQuery {
    pub fn new(collection: &str, q: &str, per_page: u32) -> Self {
        Self {
            collection: collection.to_string(),
            q: q.to_string(),
            query_by: SUGGEST_FIELDS,
            query_by_weights: SUGGEST_FIELD_WEIGHTS,
            highlight_full_fields: SUGGEST_FIELDS,
            highlight_start_tag: HIGHLIGHT_START,
            highlight_end_tag: HIGHLIGHT_END,
            per_page,
            prefix: true,
            infix: "always",
            prioritize_exact_match: true,
            prioritize_token_position: true,
        }
    }
}

fn with_exclusions(base: &str, exclusion_terms: Option<&str>) -> String {
    match exclusion_terms {
        Some(terms) => format!("{base} {terms}"),
        None => base.to_string(),
    }
}

/// Build the requests for an already compiled store.
pub fn plan_compiled(compiled: &CompiledFilter, collection: &str) -> Vec<SearchRequest> {
    let exclusions = compiled.exclusion_terms.as_deref();

    match compiled.free_text.as_slice() {
        [] => vec![SearchRequest::new(
            collection,
            with_exclusions(MATCH_ALL, exclusions),
            exclusions.is_some(),
            compiled.filter_by.clone(),
        )],
        values => values
            .iter()
            .map(|value| {
                SearchRequest::new(
                    collection,
                    with_exclusions(value, exclusions),
                    true,
                    compiled.filter_by.clone(),
                )
            })
            .collect(),
    }
}

/// Compile `tags` and build the ordered list of requests.
pub fn plan(tags: &[Tag], modes: &FieldModes, collection: &str) -> Vec<SearchRequest> {
    plan_compiled(&compile(tags, modes), collection)
}

/// Which slice of the result set a page shows, and which page buttons apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    pub page: u32,
    pub total_pages: u32,
    pub found: u64,
    /// 1-based index of the first shown result; 0 when nothing was found.
    pub first: u64,
    /// 1-based index of the last shown result.
    pub last: u64,
    pub buttons: Vec<u32>,
    pub has_previous: bool,
    pub has_next: bool,
}

impl PageWindow {
    pub fn new(page: u32, found: u64, per_page: u32) -> Self {
        let page = page.max(1);
        let per_page = u64::from(per_page.max(1));
        let total_pages = u32::try_from(found.div_ceil(per_page)).unwrap_or(u32::MAX);

        let start = u64::from(page - 1) * per_page;
        let end = (start + per_page).min(found);
        let (first, last) = if start < end { (start + 1, end) } else { (0, 0) };

        let buttons = if total_pages <= 1 {
            Vec::new()
        } else {
            let lowest = total_pages
                .saturating_sub(PAGE_BUTTONS - 1)
                .min(page.saturating_sub(2))
                .max(1);
            let count = total_pages.min(PAGE_BUTTONS);
            (lowest..lowest + count).collect()
        };

        Self {
            page,
            total_pages,
            found,
            first,
            last,
            buttons,
            has_previous: page > 1 && total_pages > 1,
            has_next: page < total_pages,
        }
    }
}
