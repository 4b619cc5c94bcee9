//! The tag store and every operation that mutates it.
//!
//! [`SearchState`] is the single owner of tags, field modes, the pending guide
//! field and the current page. Mutations never perform side effects; they
//! return the [`Command`]s a dispatcher must run, in order.

use crate::guide::{GuideHint, GuideLink, next_hint};
use crate::search::filter::{CompiledFilter, compile};
use crate::search::suggest::{CandidateKind, SuggestContext, SuggestionCandidate};
use crate::types::{FieldMode, FieldModes, FieldType, Tag, TagId};
use serde::Serialize;

/// A follow-up effect of a state mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "command")]
pub enum Command {
    RenderTags,
    UpdateGuide,
    Reload { page: u32 },
    ClearResults,
}

/// Tags of one field type, as displayed together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagGroup {
    pub field: FieldType,
    pub label: &'static str,
    pub tags: Vec<Tag>,
    /// AND/OR switch, only for multi-valued fields.
    pub mode: Option<FieldMode>,
}

#[derive(Debug)]
pub struct SearchState {
    tags: Vec<Tag>,
    next_id: u64,
    modes: FieldModes,
    pending_guide: Option<FieldType>,
    page: u32,
}

impl Default for SearchState {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchState {
    pub fn new() -> Self {
        Self {
            tags: Vec::new(),
            next_id: 0,
            modes: FieldModes::default(),
            pending_guide: None,
            page: 1,
        }
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn tag(&self, id: TagId) -> Option<&Tag> {
        self.tags.iter().find(|t| t.id == id)
    }

    pub const fn modes(&self) -> &FieldModes {
        &self.modes
    }

    pub const fn pending_guide(&self) -> Option<FieldType> {
        self.pending_guide
    }

    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Compile the store into filter, exclusion terms and free-text values.
    pub fn compile(&self) -> CompiledFilter {
        compile(&self.tags, &self.modes)
    }

    /// Hint to show for the current tags.
    pub fn guide_hint(&self) -> Option<GuideHint> {
        next_hint(&self.tags)
    }

    /// Commands following a tag-set change.
    fn after_tags_changed(&mut self) -> Vec<Command> {
        self.page = 1;
        let results = if self.tags.is_empty() {
            Command::ClearResults
        } else {
            Command::Reload { page: 1 }
        };
        vec![Command::RenderTags, Command::UpdateGuide, results]
    }

    /// Add a tag. Blank values and duplicate `(value, field)` pairs are ignored.
    pub fn add_tag(&mut self, value: &str, field: FieldType) -> Vec<Command> {
        let value = value.trim();
        if value.is_empty() || self.tags.iter().any(|t| t.matches(value, field)) {
            tracing::debug!("Ignoring blank or duplicate tag {:?} ({})", value, field);
            return Vec::new();
        }

        let id = TagId::new(self.next_id);
        self.next_id += 1;
        tracing::debug!("Adding tag {} {:?} ({})", id, value, field);
        self.tags.push(Tag {
            id,
            value: value.to_string(),
            field,
            excluded: false,
        });
        self.after_tags_changed()
    }

    /// Remove one tag by id. Unknown ids still re-render.
    pub fn remove_tag(&mut self, id: TagId) -> Vec<Command> {
        self.tags.retain(|t| t.id != id);
        self.after_tags_changed()
    }

    /// Remove every tag of `field`, free-text tags included when `field` is
    /// [`FieldType::FreeText`].
    pub fn remove_all_tags_of_type(&mut self, field: FieldType) -> Vec<Command> {
        self.tags.retain(|t| t.field != field);
        self.after_tags_changed()
    }

    /// Flip AND/OR for a multi-valued field. Other fields have no mode.
    pub fn toggle_field_mode(&mut self, field: FieldType) -> Vec<Command> {
        if !self.modes.toggle(field) {
            return Vec::new();
        }
        tracing::debug!("{} now combines with {}", field, self.modes.get(field).as_str());
        self.page = 1;
        vec![Command::RenderTags, Command::Reload { page: 1 }]
    }

    /// Mark a tag as excluded or included.
    pub fn set_excluded(&mut self, id: TagId, excluded: bool) -> Vec<Command> {
        let Some(tag) = self.tags.iter_mut().find(|t| t.id == id) else {
            return Vec::new();
        };
        tag.excluded = excluded;
        self.page = 1;
        vec![
            Command::RenderTags,
            Command::UpdateGuide,
            Command::Reload { page: 1 },
        ]
    }

    /// Move to another result page.
    pub fn go_to_page(&mut self, page: u32) -> Vec<Command> {
        if self.tags.is_empty() {
            return vec![Command::ClearResults];
        }
        self.page = page.max(1);
        vec![Command::Reload { page: self.page }]
    }

    /// Follow a hint link: the next lookup gets a guide entry for its field.
    ///
    /// Returns the text to place in the input.
    pub fn select_guide_link(&mut self, link: &GuideLink) -> &'static str {
        self.pending_guide = Some(link.field);
        link.value
    }

    /// Snapshot for ranking suggestions of `query`.
    ///
    /// A blank query clears the pending guide field and needs no lookup.
    pub fn begin_suggest(&mut self, query: &str) -> Option<SuggestContext> {
        if query.trim().is_empty() {
            self.pending_guide = None;
            return None;
        }
        Some(SuggestContext {
            pending_guide: self.pending_guide,
            tag_values: self.tags.iter().map(|t| t.value.clone()).collect(),
        })
    }

    /// Add the tag a picked suggestion stands for.
    pub fn accept_candidate(&mut self, candidate: &SuggestionCandidate) -> Vec<Command> {
        self.pending_guide = None;
        let field = match candidate.kind {
            CandidateKind::FreeText => FieldType::FreeText,
            CandidateKind::Match | CandidateKind::Guide => candidate.field,
        };
        self.add_tag(&candidate.value, field)
    }

    /// Tags grouped by field, groups in order of first appearance.
    pub fn tag_groups(&self) -> Vec<TagGroup> {
        let mut groups: Vec<TagGroup> = Vec::new();
        for tag in &self.tags {
            match groups.iter_mut().find(|g| g.field == tag.field) {
                Some(group) => group.tags.push(tag.clone()),
                None => groups.push(TagGroup {
                    field: tag.field,
                    label: tag.field.label(),
                    tags: vec![tag.clone()],
                    mode: tag
                        .field
                        .is_multi_valued()
                        .then(|| self.modes.get(tag.field)),
                }),
            }
        }
        groups
    }
}
