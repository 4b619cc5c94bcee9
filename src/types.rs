//! Core data model: field types, tags, and the backend's search documents.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opening marker the backend wraps around matched substrings.
pub const HIGHLIGHT_START: &str = "<b>";
/// Closing marker the backend wraps around matched substrings.
pub const HIGHLIGHT_END: &str = "</b>";

/// The attribute a tag or suggestion is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    Title,
    Developer,
    Publisher,
    Genres,
    SupportedOperatingSystems,
    /// Not bound to a field: searched across all fields.
    #[serde(rename = "none")]
    FreeText,
}

impl FieldType {
    /// Document fields in resolution and suggestion-ordering priority.
    pub const PRIORITY: [Self; 5] = [
        Self::Genres,
        Self::SupportedOperatingSystems,
        Self::Developer,
        Self::Publisher,
        Self::Title,
    ];

    /// Name of the field in backend documents and filter expressions.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Developer => "developer",
            Self::Publisher => "publisher",
            Self::Genres => "genres",
            Self::SupportedOperatingSystems => "supportedOperatingSystems",
            Self::FreeText => "none",
        }
    }

    /// Short human label shown next to tags and suggestions.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Developer => "developer",
            Self::Publisher => "publisher",
            Self::Genres => "genre",
            Self::SupportedOperatingSystems => "OS",
            Self::FreeText => "all fields",
        }
    }

    /// Array-valued fields whose tags combine under a [`FieldMode`].
    pub const fn is_multi_valued(self) -> bool {
        matches!(self, Self::Genres | Self::SupportedOperatingSystems)
    }

    pub const fn is_free_text(self) -> bool {
        matches!(self, Self::FreeText)
    }

    /// Parse a field name as it appears in documents and highlights.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "title" => Some(Self::Title),
            "developer" => Some(Self::Developer),
            "publisher" => Some(Self::Publisher),
            "genres" => Some(Self::Genres),
            "supportedOperatingSystems" => Some(Self::SupportedOperatingSystems),
            "none" => Some(Self::FreeText),
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the tags of one multi-valued field combine in the filter expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldMode {
    #[default]
    Or,
    And,
}

impl FieldMode {
    pub const fn toggled(self) -> Self {
        match self {
            Self::Or => Self::And,
            Self::And => Self::Or,
        }
    }

    /// Boolean operator used to join clauses in this mode.
    pub const fn operator(self) -> &'static str {
        match self {
            Self::Or => " || ",
            Self::And => " && ",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Or => "OR",
            Self::And => "AND",
        }
    }
}

/// AND/OR mode per multi-valued field. Lives independently of the tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FieldModes {
    pub genres: FieldMode,
    pub supported_operating_systems: FieldMode,
}

impl FieldModes {
    /// Mode for `field`; single-valued fields always combine with OR.
    pub const fn get(&self, field: FieldType) -> FieldMode {
        match field {
            FieldType::Genres => self.genres,
            FieldType::SupportedOperatingSystems => self.supported_operating_systems,
            FieldType::Title
            | FieldType::Developer
            | FieldType::Publisher
            | FieldType::FreeText => FieldMode::Or,
        }
    }

    /// Flip the mode of a multi-valued field. Returns false for other fields.
    pub const fn toggle(&mut self, field: FieldType) -> bool {
        match field {
            FieldType::Genres => {
                self.genres = self.genres.toggled();
                true
            }
            FieldType::SupportedOperatingSystems => {
                self.supported_operating_systems = self.supported_operating_systems.toggled();
                true
            }
            FieldType::Title
            | FieldType::Developer
            | FieldType::Publisher
            | FieldType::FreeText => false,
        }
    }
}

/// Stable, never-reused tag identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagId(u64);

impl TagId {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tag-{}", self.0)
    }
}

/// Error returned when a string is not a valid [`TagId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid tag id '{0}' (expected 'tag-<n>' or '<n>')")]
pub struct ParseTagIdError(String);

impl FromStr for TagId {
    type Err = ParseTagIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digits = s.strip_prefix("tag-").unwrap_or(s);
        digits
            .parse::<u64>()
            .map(Self)
            .map_err(|_| ParseTagIdError(s.to_string()))
    }
}

/// A user-added search constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub id: TagId,
    /// Trimmed, never empty.
    pub value: String,
    pub field: FieldType,
    pub excluded: bool,
}

impl Tag {
    /// Whether this tag has the same identity as `(value, field)`.
    pub fn matches(&self, value: &str, field: FieldType) -> bool {
        self.field == field && self.value == value
    }
}

/// A game document as indexed by the search backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub developer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub supported_operating_systems: Vec<String>,
    /// Unix timestamp in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
}

/// Borrowed view of one document field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    List(&'a [String]),
    Missing,
}

impl GameDocument {
    pub fn field_value(&self, field: FieldType) -> FieldValue<'_> {
        fn text(value: &Option<String>) -> FieldValue<'_> {
            value.as_deref().map_or(FieldValue::Missing, FieldValue::Text)
        }
        match field {
            FieldType::Title => text(&self.title),
            FieldType::Developer => text(&self.developer),
            FieldType::Publisher => text(&self.publisher),
            FieldType::Genres => FieldValue::List(&self.genres),
            FieldType::SupportedOperatingSystems => {
                FieldValue::List(&self.supported_operating_systems)
            }
            FieldType::FreeText => FieldValue::Missing,
        }
    }
}

/// A backend-marked value showing which substring of a field matched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Per-element marked values, present for array fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

impl Highlight {
    /// The highlighted field, if it is one this crate knows about.
    pub fn field_type(&self) -> Option<FieldType> {
        FieldType::parse(&self.field).filter(|field| !field.is_free_text())
    }

    /// Whether any highlighted value carries a match marker.
    pub fn has_marker(&self) -> bool {
        self.value
            .as_deref()
            .is_some_and(|value| value.contains(HIGHLIGHT_START))
            || self.values.iter().any(|value| value.contains(HIGHLIGHT_START))
    }
}

/// One search result: a document plus its highlight records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub document: GameDocument,
    #[serde(default)]
    pub highlights: Vec<Highlight>,
}

impl SearchHit {
    pub fn highlight(&self, field: FieldType) -> Option<&Highlight> {
        self.highlights.iter().find(|h| h.field == field.as_str())
    }
}

/// Response body of a single search or a unioned multi-search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub hits: Vec<SearchHit>,
    #[serde(default)]
    pub found: u64,
}
