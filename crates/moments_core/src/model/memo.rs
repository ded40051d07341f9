//! Memo entry domain model.
//!
//! # Responsibility
//! - Define the canonical journaling record (content, mood, tags, timestamp).
//! - Own tag-set insertion/removal rules shared by the editor and the store.
//!
//! # Invariants
//! - `id` is a non-nil, time-ordered UUID and never reused.
//! - Persisted entries always carry non-blank `content`.
//! - `tags` never contains duplicates or blank values.
//!
//! # See also
//! - `service::memo_store` for the persisted list semantics.

use chrono::{DateTime, Local};
use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of one memo entry.
pub type MemoId = Uuid;

/// Fixed emotional tone enumeration attached to an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Hopeful,
    Thoughtful,
    Peaceful,
    Accomplished,
    Nostalgic,
}

impl Mood {
    /// Cycling order used by the editor mood selector.
    pub const ALL: [Mood; 5] = [
        Mood::Hopeful,
        Mood::Thoughtful,
        Mood::Peaceful,
        Mood::Accomplished,
        Mood::Nostalgic,
    ];

    /// Mood preselected for a blank draft or an entry without a mood.
    pub const DEFAULT_DRAFT: Mood = Mood::Peaceful;

    /// Glyph shown in place of an unset mood.
    pub const UNSET_GLYPH: &'static str = "·";

    /// Position of this mood inside [`Mood::ALL`].
    pub fn index(self) -> usize {
        match self {
            Self::Hopeful => 0,
            Self::Thoughtful => 1,
            Self::Peaceful => 2,
            Self::Accomplished => 3,
            Self::Nostalgic => 4,
        }
    }

    /// Next mood in cycling order, wrapping from the last to the first.
    pub fn next(self) -> Mood {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// Previous mood in cycling order, wrapping from the first to the last.
    pub fn prev(self) -> Mood {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn glyph(self) -> &'static str {
        match self {
            Self::Hopeful => "✦",
            Self::Thoughtful => "◯",
            Self::Peaceful => "◇",
            Self::Accomplished => "△",
            Self::Nostalgic => "□",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Hopeful => "期待",
            Self::Thoughtful => "沉思",
            Self::Peaceful => "平静",
            Self::Accomplished => "成就",
            Self::Nostalgic => "怀旧",
        }
    }

    /// Wire name, identical to the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hopeful => "hopeful",
            Self::Thoughtful => "thoughtful",
            Self::Peaceful => "peaceful",
            Self::Accomplished => "accomplished",
            Self::Nostalgic => "nostalgic",
        }
    }

    pub fn parse(value: &str) -> Option<Mood> {
        Self::ALL
            .into_iter()
            .find(|mood| mood.as_str() == value.trim())
    }
}

/// Validation failures for memo entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoValidationError {
    NilId,
    EmptyContent,
    DuplicateTag(String),
    BlankTag,
}

impl Display for MemoValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "memo id must not be nil"),
            Self::EmptyContent => write!(f, "memo content must not be blank"),
            Self::DuplicateTag(tag) => write!(f, "duplicate tag `{tag}`"),
            Self::BlankTag => write!(f, "tags must not be blank"),
        }
    }
}

impl Error for MemoValidationError {}

/// One journaling record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoEntry {
    pub id: MemoId,
    pub content: String,
    /// Creation or last-save time. Serialized as RFC 3339 text.
    pub date: DateTime<Local>,
    /// `None` renders with [`Mood::UNSET_GLYPH`].
    #[serde(default, deserialize_with = "lenient_mood")]
    pub mood: Option<Mood>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl MemoEntry {
    /// Creates a new entry with a freshly generated time-ordered id.
    pub fn new(
        content: impl Into<String>,
        date: DateTime<Local>,
        mood: Option<Mood>,
        tags: Vec<String>,
    ) -> Self {
        Self {
            id: new_memo_id(),
            content: content.into(),
            date,
            mood,
            tags,
        }
    }

    /// Checks the invariants every persisted entry must satisfy.
    pub fn validate(&self) -> Result<(), MemoValidationError> {
        if self.id.is_nil() {
            return Err(MemoValidationError::NilId);
        }
        if self.content.trim().is_empty() {
            return Err(MemoValidationError::EmptyContent);
        }
        for (idx, tag) in self.tags.iter().enumerate() {
            if tag.trim().is_empty() {
                return Err(MemoValidationError::BlankTag);
            }
            if self.tags[..idx].contains(tag) {
                return Err(MemoValidationError::DuplicateTag(tag.clone()));
            }
        }
        Ok(())
    }

    /// Mood glyph, or the unset placeholder.
    pub fn mood_glyph(&self) -> &'static str {
        self.mood.map_or(Mood::UNSET_GLYPH, Mood::glyph)
    }
}

/// Generates a unique, time-ordered memo id.
pub fn new_memo_id() -> MemoId {
    Uuid::now_v7()
}

/// Appends `raw` (trimmed) unless blank or already present.
///
/// Returns `true` when the tag set changed.
pub fn insert_tag(tags: &mut Vec<String>, raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.is_empty() || tags.iter().any(|tag| tag == trimmed) {
        return false;
    }
    tags.push(trimmed.to_string());
    true
}

/// Removes `tag` if present. Returns `true` when the tag set changed.
pub fn remove_tag(tags: &mut Vec<String>, tag: &str) -> bool {
    let before = tags.len();
    tags.retain(|existing| existing != tag);
    tags.len() != before
}

fn lenient_mood<'de, D>(deserializer: D) -> Result<Option<Mood>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(Mood::parse))
}

#[cfg(test)]
mod tests {
    use super::{insert_tag, remove_tag, Mood};

    #[test]
    fn mood_cycle_wraps_in_both_directions() {
        assert_eq!(Mood::Nostalgic.next(), Mood::Hopeful);
        assert_eq!(Mood::Hopeful.prev(), Mood::Nostalgic);
        assert_eq!(Mood::Peaceful.next().next().next(), Mood::Hopeful);
    }

    #[test]
    fn mood_parse_matches_wire_names() {
        for mood in Mood::ALL {
            assert_eq!(Mood::parse(mood.as_str()), Some(mood));
        }
        assert_eq!(Mood::parse("default"), None);
    }

    #[test]
    fn insert_tag_trims_and_suppresses_duplicates() {
        let mut tags = Vec::new();
        assert!(insert_tag(&mut tags, "  阅读 "));
        assert!(!insert_tag(&mut tags, "阅读"));
        assert!(!insert_tag(&mut tags, "   "));
        assert!(insert_tag(&mut tags, "文学"));
        assert_eq!(tags, vec!["阅读".to_string(), "文学".to_string()]);

        assert!(remove_tag(&mut tags, "阅读"));
        assert!(!remove_tag(&mut tags, "阅读"));
        assert_eq!(tags, vec!["文学".to_string()]);
    }
}
