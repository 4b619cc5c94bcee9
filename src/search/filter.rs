//! Compiles the tag store into a backend filter expression.
//!
//! Filter grammar: `field:=value` (scalar equality), `field:value` (array
//! membership), `field:!=value` (negation), joined with `&&`/`||`. Each field
//! group is parenthesized; negations are top-level terms after the groups.
//! Excluded free-text tags never become clauses: they turn into `-token` terms
//! appended to the query string.

use crate::types::{FieldModes, FieldType, Tag};

/// Output of [`compile`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledFilter {
    /// `None` when there are no typed tags at all.
    pub filter_by: Option<String>,
    /// Space-separated `-token` terms, `None` when nothing is excluded.
    pub exclusion_terms: Option<String>,
    /// Included free-text values in store order.
    pub free_text: Vec<String>,
}

/// Backslash-escape quote characters. Nothing else is escaped.
pub fn escape_value(value: &str) -> String {
    value.replace('"', "\\\"")
}

fn include_clause(field: FieldType, value: &str) -> String {
    let value = escape_value(value);
    if field.is_multi_valued() {
        format!("{field}:{value}")
    } else {
        format!("{field}:={value}")
    }
}

fn exclude_clause(field: FieldType, value: &str) -> String {
    format!("{field}:!={}", escape_value(value))
}

/// Compile `tags` under the given AND/OR `modes`.
///
/// Deterministic: the same store always yields byte-identical output.
pub fn compile(tags: &[Tag], modes: &FieldModes) -> CompiledFilter {
    let mut parts: Vec<String> = FieldType::PRIORITY
        .into_iter()
        .filter_map(|field| {
            let clauses: Vec<String> = tags
                .iter()
                .filter(|t| !t.excluded && t.field == field)
                .map(|t| t.value.trim())
                .filter(|value| !value.is_empty())
                .map(|value| include_clause(field, value))
                .collect();

            (!clauses.is_empty())
                .then(|| format!("({})", clauses.join(modes.get(field).operator())))
        })
        .collect();

    parts.extend(
        tags.iter()
            .filter(|t| t.excluded && !t.field.is_free_text())
            .map(|t| (t.field, t.value.trim()))
            .filter(|(_, value)| !value.is_empty())
            .map(|(field, value)| exclude_clause(field, value)),
    );

    let exclusion_terms = tags
        .iter()
        .filter(|t| t.excluded && t.field.is_free_text())
        .flat_map(|t| t.value.split_whitespace())
        .map(|token| format!("-{token}"))
        .collect::<Vec<_>>()
        .join(" ");

    let free_text = tags
        .iter()
        .filter(|t| !t.excluded && t.field.is_free_text())
        .map(|t| t.value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect();

    CompiledFilter {
        filter_by: (!parts.is_empty()).then(|| parts.join(" && ")),
        exclusion_terms: (!exclusion_terms.is_empty()).then_some(exclusion_terms),
        free_text,
    }
}
