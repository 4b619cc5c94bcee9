//! Suggestion extraction and ranking.
//!
//! Turns one batch of backend hits into a deduplicated, per-field capped list of
//! tag candidates ordered by [`FieldType::PRIORITY`], then merges in the
//! synthetic guide and free-text entries.

use super::resolve::{array_match, contains_lower, scalar_display_value};
use crate::types::{FieldType, FieldValue, SearchHit};
use ahash::{AHashMap, AHashSet};
use serde::Serialize;

/// Maximum accepted candidates per field type in one extraction pass.
pub const MAX_PER_FIELD: usize = 3;

const SCALAR_FIELDS: [FieldType; 3] = [FieldType::Developer, FieldType::Publisher, FieldType::Title];
const ARRAY_FIELDS: [FieldType; 2] = [FieldType::Genres, FieldType::SupportedOperatingSystems];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateKind {
    /// Extracted from a search hit.
    Match,
    /// Stands in for a hint link the user clicked.
    Guide,
    /// "Search this in all fields".
    FreeText,
}

/// One proposed tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestionCandidate {
    pub field: FieldType,
    /// Display-ready value, markers stripped.
    pub value: String,
    /// Index of the originating hit within the batch, for `Match` candidates.
    pub source_hit: Option<usize>,
    pub kind: CandidateKind,
}

impl SuggestionCandidate {
    pub const fn is_guide_entry(&self) -> bool {
        matches!(self.kind, CandidateKind::Guide)
    }

    /// Text shown for the candidate in a suggestion list.
    pub fn display(&self) -> String {
        match self.kind {
            CandidateKind::Match => self.value.clone(),
            CandidateKind::Guide => {
                format!("{} - Click to add {} tag", self.value, self.field.label())
            }
            CandidateKind::FreeText => format!("Search \"{}\" in all fields", self.value),
        }
    }
}

/// State outside the hit batch that shapes the final list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestContext {
    /// Field of the hint link the user clicked, if any.
    pub pending_guide: Option<FieldType>,
    /// Values of tags already in the store.
    pub tag_values: Vec<String>,
}

/// Batch-scoped dedup and per-field cap.
#[derive(Default)]
struct Collector {
    seen: AHashSet<(FieldType, String)>,
    by_field: AHashMap<FieldType, Vec<SuggestionCandidate>>,
}

impl Collector {
    fn register(&mut self, hit_index: usize, field: FieldType, value: &str) {
        let key = (field, value.trim().to_lowercase());
        if !self.seen.insert(key) {
            return;
        }

        let accepted = self.by_field.entry(field).or_default();
        if accepted.len() < MAX_PER_FIELD {
            accepted.push(SuggestionCandidate {
                field,
                value: value.to_string(),
                source_hit: Some(hit_index),
                kind: CandidateKind::Match,
            });
        }
    }

    fn into_ordered(mut self) -> Vec<SuggestionCandidate> {
        FieldType::PRIORITY
            .into_iter()
            .filter_map(|field| self.by_field.remove(&field))
            .flatten()
            .collect()
    }
}

/// Extract ordered, deduplicated candidates from a batch of hits.
pub fn extract(hits: &[SearchHit], query: &str) -> Vec<SuggestionCandidate> {
    let query_lower = query.to_lowercase();
    let mut collector = Collector::default();

    for (index, hit) in hits.iter().enumerate() {
        for field in ARRAY_FIELDS {
            if let Some(value) = array_match(hit, field, query) {
                collector.register(index, field, value);
            }
        }

        for field in SCALAR_FIELDS {
            let FieldValue::Text(raw) = hit.document.field_value(field) else {
                continue;
            };
            if !contains_lower(raw, &query_lower) {
                continue;
            }
            if let Some(value) = scalar_display_value(hit, field)
                && !value.trim().is_empty()
            {
                collector.register(index, field, &value);
            }
        }
    }

    collector.into_ordered()
}

/// Extract candidates and merge in the guide or free-text entry.
pub fn rank(hits: &[SearchHit], query: &str, ctx: &SuggestContext) -> Vec<SuggestionCandidate> {
    let mut candidates = extract(hits, query);
    let query_lower = query.to_lowercase();

    if let Some(field) = ctx.pending_guide {
        // The guide entry replaces the identical real match
        candidates.retain(|c| !(c.field == field && c.value.to_lowercase().trim() == query_lower));
        candidates.insert(
            0,
            SuggestionCandidate {
                field,
                value: query.to_string(),
                source_hit: None,
                kind: CandidateKind::Guide,
            },
        );
    } else if !query.trim().is_empty()
        && !ctx
            .tag_values
            .iter()
            .any(|value| value.to_lowercase() == query_lower)
    {
        candidates.push(SuggestionCandidate {
            field: FieldType::FreeText,
            value: query.to_string(),
            source_hit: None,
            kind: CandidateKind::FreeText,
        });
    }

    candidates
}
