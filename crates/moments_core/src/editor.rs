//! Full-screen entry editor: draft state, focus regions, key handling.
//!
//! # Responsibility
//! - Own the draft (content, mood, tags, pending tag text) of one entry.
//! - Route keys by focus region; cycle regions with Tab/Shift+Tab.
//! - Describe the per-region enter/exit choreography.
//!
//! # Invariants
//! - Save is inert while the trimmed content is empty.
//! - Arrow keys change the mood only while the mood region has focus.
//! - Once leaving, every key is ignored.

use crate::model::memo::{insert_tag, remove_tag, MemoEntry, Mood};
use crate::motion::timings::EDITOR_FOCUS_SETTLE;
use crate::motion::{ease_out, Deadline, Tween};
use chrono::{DateTime, Datelike, Local};
use std::time::Instant;

/// Which logical input area receives keyboard navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusRegion {
    Content,
    Mood,
    Tags,
}

impl FocusRegion {
    pub fn next(self) -> FocusRegion {
        match self {
            Self::Content => Self::Mood,
            Self::Mood => Self::Tags,
            Self::Tags => Self::Content,
        }
    }

    pub fn prev(self) -> FocusRegion {
        match self {
            Self::Content => Self::Tags,
            Self::Mood => Self::Content,
            Self::Tags => Self::Mood,
        }
    }

    /// Regions backed by a text input that takes input focus.
    fn has_text_input(self) -> bool {
        matches!(self, Self::Content | Self::Tags)
    }
}

/// Keys the editor understands, independent of any terminal library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKey {
    Escape,
    /// Cmd/Ctrl+Enter.
    Submit,
    Tab,
    BackTab,
    Left,
    Right,
    Home,
    End,
    Enter,
    Backspace,
    Delete,
    Char(char),
}

/// Result of one key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorCommand {
    None,
    Cancel,
    Save(MemoDraft),
}

/// User-editable fields of an entry, as produced by a save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoDraft {
    pub content: String,
    pub mood: Mood,
    pub tags: Vec<String>,
}

/// Visual regions with their own enter/exit timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorRegion {
    DateHeader,
    MoodSelector,
    TextArea,
    TagList,
    CloseButton,
    SaveButton,
    Hint,
}

impl EditorRegion {
    pub const ALL: [EditorRegion; 7] = [
        EditorRegion::DateHeader,
        EditorRegion::MoodSelector,
        EditorRegion::TextArea,
        EditorRegion::TagList,
        EditorRegion::CloseButton,
        EditorRegion::SaveButton,
        EditorRegion::Hint,
    ];

    pub fn enter_tween(self) -> Tween {
        match self {
            Self::DateHeader => Tween::new(300, 600),
            Self::MoodSelector => Tween::new(500, 500),
            Self::TextArea => Tween::new(600, 600),
            Self::TagList => Tween::new(750, 500),
            Self::CloseButton => Tween::new(900, 500),
            Self::SaveButton => Tween::new(950, 500),
            Self::Hint => Tween::new(1000, 400),
        }
    }

    /// Exit timing; every region finishes within `EDITOR_EXIT`.
    pub fn exit_tween(self) -> Tween {
        match self {
            Self::DateHeader => Tween::new(100, 500),
            Self::MoodSelector => Tween::new(50, 500),
            Self::TextArea => Tween::new(0, 600),
            Self::TagList | Self::CloseButton | Self::SaveButton => Tween::new(0, 500),
            Self::Hint => Tween::new(0, 400),
        }
    }
}

/// Single-line or multi-line text with a char-indexed cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBuffer {
    text: String,
    cursor: usize,
}

impl TextBuffer {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.chars().count();
        Self { text, cursor }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Cursor position in chars.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    fn byte_at(&self, char_index: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_index)
            .map_or(self.text.len(), |(idx, _)| idx)
    }

    pub fn insert(&mut self, ch: char) {
        let at = self.byte_at(self.cursor);
        self.text.insert(at, ch);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        let at = self.byte_at(self.cursor);
        self.text.remove(at);
        true
    }

    /// Removes the char under the cursor.
    pub fn delete(&mut self) -> bool {
        if self.cursor >= self.text.chars().count() {
            return false;
        }
        let at = self.byte_at(self.cursor);
        self.text.remove(at);
        true
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.text.chars().count());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.text.chars().count();
    }
}

/// Editor for one new or existing entry.
#[derive(Debug, Clone)]
pub struct EntryEditor {
    target: Option<MemoEntry>,
    content: TextBuffer,
    mood: Mood,
    tags: Vec<String>,
    tag_input: TextBuffer,
    /// Highlighted tag chip; set by arrowing left out of the tag input.
    tag_cursor: Option<usize>,
    focus: FocusRegion,
    input_focused: bool,
    mounted_at: Instant,
    focus_settle: Option<Deadline>,
    leaving_since: Option<Instant>,
}

impl EntryEditor {
    /// Mounts an editor; the content field takes focus after the settle delay.
    pub fn mount(target: Option<MemoEntry>, now: Instant) -> Self {
        let (content, mood, tags) = match &target {
            Some(entry) => (
                entry.content.clone(),
                entry.mood.unwrap_or(Mood::DEFAULT_DRAFT),
                entry.tags.clone(),
            ),
            None => (String::new(), Mood::DEFAULT_DRAFT, Vec::new()),
        };
        Self {
            target,
            content: TextBuffer::new(content),
            mood,
            tags,
            tag_input: TextBuffer::default(),
            tag_cursor: None,
            focus: FocusRegion::Content,
            input_focused: false,
            mounted_at: now,
            focus_settle: Some(Deadline::after(now, EDITOR_FOCUS_SETTLE)),
            leaving_since: None,
        }
    }

    pub fn target(&self) -> Option<&MemoEntry> {
        self.target.as_ref()
    }

    pub fn content(&self) -> &TextBuffer {
        &self.content
    }

    pub fn mood(&self) -> Mood {
        self.mood
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn tag_input(&self) -> &TextBuffer {
        &self.tag_input
    }

    /// Index of the highlighted tag chip, if any.
    pub fn selected_tag(&self) -> Option<usize> {
        self.tag_cursor
    }

    pub fn focus(&self) -> FocusRegion {
        self.focus
    }

    /// Whether a text control currently holds input focus.
    pub fn input_focused(&self) -> bool {
        self.input_focused
    }

    pub fn can_save(&self) -> bool {
        !self.content.is_blank()
    }

    pub fn is_leaving(&self) -> bool {
        self.leaving_since.is_some()
    }

    /// Applies the settle-delay focus once due.
    pub fn tick(&mut self, now: Instant) {
        if self.focus_settle.is_some_and(|deadline| deadline.is_due(now)) {
            self.focus_settle = None;
            self.focus = FocusRegion::Content;
            self.input_focused = true;
        }
    }

    /// Starts the exit choreography; keys are ignored from here on.
    pub fn begin_leaving(&mut self, now: Instant) {
        if self.leaving_since.is_none() {
            self.leaving_since = Some(now);
            self.focus_settle = None;
            self.input_focused = false;
        }
    }

    /// Opacity-like visibility of one region in `[0, 1]`.
    pub fn region_visibility(&self, region: EditorRegion, now: Instant) -> f32 {
        match self.leaving_since {
            Some(since) => {
                let t = region
                    .exit_tween()
                    .progress(now.saturating_duration_since(since));
                1.0 - ease_out(t)
            }
            None => ease_out(
                region
                    .enter_tween()
                    .progress(now.saturating_duration_since(self.mounted_at)),
            ),
        }
    }

    /// Moves focus to a region directly (e.g. pointer selection).
    pub fn focus_region(&mut self, region: FocusRegion) {
        if self.is_leaving() {
            return;
        }
        self.focus_settle = None;
        self.focus = region;
        self.input_focused = region.has_text_input();
        self.tag_cursor = None;
    }

    pub fn select_mood(&mut self, mood: Mood) {
        if !self.is_leaving() {
            self.mood = mood;
            self.focus_region(FocusRegion::Mood);
        }
    }

    /// Removes a tag chosen directly by the user.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        if self.is_leaving() || !remove_tag(&mut self.tags, tag) {
            return false;
        }
        self.tag_cursor = None;
        true
    }

    /// Removes the highlighted chip and keeps a neighbour highlighted.
    fn remove_selected_tag(&mut self, index: usize) {
        if index < self.tags.len() {
            self.tags.remove(index);
        }
        self.tag_cursor = match self.tags.len() {
            0 => None,
            len => Some(index.min(len - 1)),
        };
    }

    /// Builds the draft a save would produce, if content is non-blank.
    pub fn draft(&self) -> Option<MemoDraft> {
        self.can_save().then(|| MemoDraft {
            content: self.content.as_str().to_string(),
            mood: self.mood,
            tags: self.tags.clone(),
        })
    }

    pub fn handle_key(&mut self, key: EditorKey) -> EditorCommand {
        if self.is_leaving() {
            return EditorCommand::None;
        }
        match key {
            EditorKey::Escape => EditorCommand::Cancel,
            EditorKey::Submit => self
                .draft()
                .map_or(EditorCommand::None, EditorCommand::Save),
            EditorKey::Tab => {
                self.focus_region(self.focus.next());
                EditorCommand::None
            }
            EditorKey::BackTab => {
                self.focus_region(self.focus.prev());
                EditorCommand::None
            }
            other => {
                self.route_to_region(other);
                EditorCommand::None
            }
        }
    }

    fn route_to_region(&mut self, key: EditorKey) {
        match self.focus {
            FocusRegion::Mood => match key {
                EditorKey::Left => self.mood = self.mood.prev(),
                EditorKey::Right => self.mood = self.mood.next(),
                _ => {}
            },
            FocusRegion::Content if self.input_focused => match key {
                EditorKey::Enter => self.content.insert('\n'),
                EditorKey::Char(ch) => self.content.insert(ch),
                EditorKey::Backspace => {
                    self.content.backspace();
                }
                EditorKey::Delete => {
                    self.content.delete();
                }
                _ => edit_cursor(&mut self.content, key),
            },
            FocusRegion::Tags if self.input_focused => self.route_tag_key(key),
            FocusRegion::Content | FocusRegion::Tags => {}
        }
    }

    /// Tag row keys; a highlighted chip takes arrows and deletion.
    fn route_tag_key(&mut self, key: EditorKey) {
        if let Some(index) = self.tag_cursor {
            match key {
                EditorKey::Left => self.tag_cursor = Some(index.saturating_sub(1)),
                EditorKey::Right | EditorKey::End => {
                    self.tag_cursor = (index + 1 < self.tags.len()).then_some(index + 1);
                }
                EditorKey::Home => self.tag_cursor = Some(0),
                EditorKey::Backspace | EditorKey::Delete => self.remove_selected_tag(index),
                EditorKey::Char(ch) => {
                    self.tag_cursor = None;
                    self.tag_input.insert(ch);
                }
                _ => {}
            }
            return;
        }
        match key {
            EditorKey::Enter => {
                insert_tag(&mut self.tags, self.tag_input.as_str());
                if !self.tag_input.is_blank() {
                    self.tag_input.clear();
                }
            }
            EditorKey::Char(ch) => self.tag_input.insert(ch),
            EditorKey::Backspace => {
                if !self.tag_input.backspace() && self.tag_input.as_str().is_empty() {
                    self.tags.pop();
                }
            }
            EditorKey::Delete => {
                self.tag_input.delete();
            }
            EditorKey::Left if self.tag_input.cursor() == 0 && !self.tags.is_empty() => {
                self.tag_cursor = Some(self.tags.len() - 1);
            }
            _ => edit_cursor(&mut self.tag_input, key),
        }
    }
}

fn edit_cursor(buffer: &mut TextBuffer, key: EditorKey) {
    match key {
        EditorKey::Left => buffer.move_left(),
        EditorKey::Right => buffer.move_right(),
        EditorKey::Home => buffer.move_home(),
        EditorKey::End => buffer.move_end(),
        _ => {}
    }
}

/// Date and time lines shown at the top of the editor.
pub fn header_lines(now: DateTime<Local>) -> (String, String) {
    const WEEKDAYS: [&str; 7] = [
        "星期一", "星期二", "星期三", "星期四", "星期五", "星期六", "星期日",
    ];
    let weekday = WEEKDAYS[now.weekday().num_days_from_monday() as usize];
    (
        format!(
            "{}年{}月{}日 {}",
            now.year(),
            now.month(),
            now.day(),
            weekday
        ),
        now.format("%H:%M").to_string(),
    )
}
