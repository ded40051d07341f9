//! Terminal key mapping.
//!
//! # Responsibility
//! - Translate crossterm key events into editor keys or timeline commands.
//!
//! # Invariants
//! - `Ctrl+C` quits from every view.
//! - Plain characters typed into the editor never trigger timeline commands.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use moments_core::editor::EditorKey;

/// Commands available while the timeline is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineCommand {
    SelectNext,
    SelectPrev,
    PageDown,
    PageUp,
    EditSelected,
    DeleteSelected,
    NewEntry,
    ToggleMeditation,
    DismissQuote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Quit,
    Editor(EditorKey),
    Timeline(TimelineCommand),
}

/// Maps one key event; `editor_mode` selects the editor key table.
pub fn map_key(key: KeyEvent, editor_mode: bool) -> Option<Input> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && key.code == KeyCode::Char('c') {
        return Some(Input::Quit);
    }
    if editor_mode {
        editor_key(key, ctrl).map(Input::Editor)
    } else {
        timeline_command(key).map(Input::Timeline)
    }
}

fn editor_key(key: KeyEvent, ctrl: bool) -> Option<EditorKey> {
    let submit_modifier = ctrl || key.modifiers.contains(KeyModifiers::SUPER);
    let mapped = match key.code {
        KeyCode::Esc => EditorKey::Escape,
        KeyCode::Enter if submit_modifier => EditorKey::Submit,
        // Many terminals cannot report Ctrl+Enter distinctly.
        KeyCode::Char('s') if ctrl => EditorKey::Submit,
        KeyCode::Enter => EditorKey::Enter,
        KeyCode::BackTab => EditorKey::BackTab,
        KeyCode::Tab if key.modifiers.contains(KeyModifiers::SHIFT) => EditorKey::BackTab,
        KeyCode::Tab => EditorKey::Tab,
        KeyCode::Left => EditorKey::Left,
        KeyCode::Right => EditorKey::Right,
        KeyCode::Home => EditorKey::Home,
        KeyCode::End => EditorKey::End,
        KeyCode::Backspace => EditorKey::Backspace,
        KeyCode::Delete => EditorKey::Delete,
        KeyCode::Char(ch) if !ctrl => EditorKey::Char(ch),
        _ => return None,
    };
    Some(mapped)
}

fn timeline_command(key: KeyEvent) -> Option<TimelineCommand> {
    let command = match key.code {
        KeyCode::Down | KeyCode::Char('j') => TimelineCommand::SelectNext,
        KeyCode::Up | KeyCode::Char('k') => TimelineCommand::SelectPrev,
        KeyCode::PageDown => TimelineCommand::PageDown,
        KeyCode::PageUp => TimelineCommand::PageUp,
        KeyCode::Enter | KeyCode::Char('e') => TimelineCommand::EditSelected,
        KeyCode::Char('d') | KeyCode::Delete => TimelineCommand::DeleteSelected,
        KeyCode::Char('n') => TimelineCommand::NewEntry,
        KeyCode::Char('q') => TimelineCommand::ToggleMeditation,
        KeyCode::Char('x') => TimelineCommand::DismissQuote,
        _ => return None,
    };
    Some(command)
}
