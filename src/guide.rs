//! "Try: ..." hints walking a new user through a fixed sequence of tags.

use crate::types::{FieldType, Tag};
use serde::Serialize;

/// A hint link: clicking it pre-fills the input with `value` for `field`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GuideLink {
    pub label: &'static str,
    pub value: &'static str,
    pub field: FieldType,
}

const fn link(label: &'static str, value: &'static str, field: FieldType) -> GuideLink {
    GuideLink {
        label,
        value,
        field,
    }
}

const ELECTRONIC_ARTS: GuideLink = link("Electronic Arts", "Electronic Arts", FieldType::Publisher);
const ROLE_PLAYING: GuideLink = link("Role-playing", "Role-playing", FieldType::Genres);
const THQ_NORDIC: GuideLink = link("THQ Nordic", "THQ Nordic GmbH", FieldType::Publisher);
const ACTION: GuideLink = link("Action", "Action", FieldType::Genres);
const DARK: GuideLink = link("Dark", "Dark", FieldType::FreeText);
const TWO: GuideLink = link("2", "2", FieldType::FreeText);

const GUIDE_TAGS: [GuideLink; 6] = [ELECTRONIC_ARTS, ROLE_PLAYING, THQ_NORDIC, ACTION, DARK, TWO];

/// The links to show next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuideHint {
    pub links: Vec<GuideLink>,
    /// Joins the links when rendered, `" & "` or `" or "`.
    pub separator: &'static str,
}

impl GuideHint {
    fn all(links: Vec<GuideLink>) -> Self {
        Self {
            links,
            separator: " & ",
        }
    }

    fn either(links: Vec<GuideLink>) -> Self {
        Self {
            links,
            separator: " or ",
        }
    }

    pub fn render(&self) -> String {
        let labels: Vec<_> = self.links.iter().map(|l| l.label).collect();
        format!("Try: {}", labels.join(self.separator))
    }
}

/// Compute the next hint for the current tags.
///
/// `None` once the walkthrough is complete or the user added a tag of their own.
pub fn next_hint(tags: &[Tag]) -> Option<GuideHint> {
    let has = |link: GuideLink| tags.iter().any(|t| t.matches(link.value, link.field));
    let off_script = tags
        .iter()
        .any(|t| !GUIDE_TAGS.iter().any(|g| t.matches(g.value, g.field)));

    if off_script || GUIDE_TAGS.into_iter().all(has) {
        return None;
    }

    let (ea, rpg, thq, action) = (has(ELECTRONIC_ARTS), has(ROLE_PLAYING), has(THQ_NORDIC), has(ACTION));

    let hint = if ea && thq && action && rpg {
        let missing = [DARK, TWO].into_iter().filter(|&l| !has(l)).collect();
        GuideHint::all(missing)
    } else if ea && (action || rpg) {
        let remaining_genre = if action { ROLE_PLAYING } else { ACTION };
        match (thq, action && rpg) {
            (false, false) => GuideHint::all(vec![THQ_NORDIC, remaining_genre]),
            (false, true) => GuideHint::all(vec![THQ_NORDIC]),
            (true, false) => GuideHint::all(vec![remaining_genre]),
            (true, true) => GuideHint::either(vec![ACTION, ROLE_PLAYING]),
        }
    } else if ea {
        GuideHint::either(vec![ACTION, ROLE_PLAYING])
    } else {
        GuideHint::all(vec![ELECTRONIC_ARTS])
    };

    Some(hint)
}
