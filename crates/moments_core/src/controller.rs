//! Application controller: view-state machine over the entry store.
//!
//! # Responsibility
//! - Sequence timeline and editor with timed hand-offs.
//! - Apply editor saves and timeline deletes to the entry store.
//! - Feed derived view flags to the timeline, quote overlay and background.
//!
//! # Invariants
//! - At most one transition is in flight; requests made mid-transition are rejected.
//! - The editor mounts only after the page exit delay has elapsed, and the
//!   timeline returns only after the editor exit delay has elapsed.
//! - Deletes are never gated by the view state.

use crate::background::Ambience;
use crate::editor::{EditorCommand, EditorKey, EntryEditor, MemoDraft};
use crate::model::memo::{MemoEntry, MemoId};
use crate::motion::timings::{EDITOR_EXIT, PAGE_EXIT};
use crate::motion::Deadline;
use crate::quotes::QuoteOverlay;
use crate::repo::memo_repo::MemoRepository;
use crate::service::memo_store::{MemoStore, StoreError};
use crate::timeline::TimelineView;
use chrono::{DateTime, Local};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};

/// Top-level view state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Idle,
    TransitioningOut,
    EditorOpen,
    TransitioningIn,
}

impl ViewState {
    pub fn flags(self) -> ViewFlags {
        ViewFlags {
            is_page_visible: matches!(self, Self::Idle | Self::TransitioningOut),
            is_page_leaving: self == Self::TransitioningOut,
            is_editor_visible: matches!(self, Self::EditorOpen | Self::TransitioningIn),
            is_editor_leaving: self == Self::TransitioningIn,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::TransitioningOut => "transitioning_out",
            Self::EditorOpen => "editor_open",
            Self::TransitioningIn => "transitioning_in",
        }
    }
}

/// Flags views use to pick enter/exit animation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewFlags {
    pub is_page_visible: bool,
    pub is_page_leaving: bool,
    pub is_editor_visible: bool,
    pub is_editor_leaving: bool,
}

/// A transition was requested from a state that does not allow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRejected {
    pub action: &'static str,
    pub state: ViewState,
}

impl Display for TransitionRejected {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cannot {} while view state is {}",
            self.action,
            self.state.as_str()
        )
    }
}

impl Error for TransitionRejected {}

/// Outcome of a completed timed transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    EditorMounted,
    PageRestored,
}

/// View-state machine holding at most one pending deadline.
#[derive(Debug, Clone)]
pub struct ViewMachine {
    state: ViewState,
    pending: Option<Deadline>,
}

impl Default for ViewMachine {
    fn default() -> Self {
        Self {
            state: ViewState::Idle,
            pending: None,
        }
    }
}

impl ViewMachine {
    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn pending(&self) -> Option<Deadline> {
        self.pending
    }

    /// `idle -> transitioning-out`, settling after [`PAGE_EXIT`].
    pub fn begin_open(&mut self, now: Instant) -> Result<(), TransitionRejected> {
        self.begin(ViewState::Idle, ViewState::TransitioningOut, "open editor", PAGE_EXIT, now)
    }

    /// `editor-open -> transitioning-in`, settling after [`EDITOR_EXIT`].
    pub fn begin_close(&mut self, now: Instant) -> Result<(), TransitionRejected> {
        self.begin(
            ViewState::EditorOpen,
            ViewState::TransitioningIn,
            "close editor",
            EDITOR_EXIT,
            now,
        )
    }

    fn begin(
        &mut self,
        from: ViewState,
        to: ViewState,
        action: &'static str,
        delay: Duration,
        now: Instant,
    ) -> Result<(), TransitionRejected> {
        if self.state != from {
            return Err(TransitionRejected {
                action,
                state: self.state,
            });
        }
        self.state = to;
        self.pending = Some(Deadline::after(now, delay));
        Ok(())
    }

    /// Completes the pending transition once its deadline is due.
    pub fn advance(&mut self, now: Instant) -> Option<Settled> {
        let deadline = self.pending?;
        if !deadline.is_due(now) {
            return None;
        }
        self.pending = None;
        match self.state {
            ViewState::TransitioningOut => {
                self.state = ViewState::EditorOpen;
                Some(Settled::EditorMounted)
            }
            ViewState::TransitioningIn => {
                self.state = ViewState::Idle;
                Some(Settled::PageRestored)
            }
            ViewState::Idle | ViewState::EditorOpen => None,
        }
    }
}

/// Owns every piece of application state and drives it from one clock.
pub struct AppController<R: MemoRepository> {
    store: MemoStore<R>,
    machine: ViewMachine,
    active: Option<MemoEntry>,
    editor: Option<EntryEditor>,
    timeline: TimelineView,
    quotes: QuoteOverlay,
    ambience: Ambience,
    wall_clock: fn() -> DateTime<Local>,
    last_tick: Option<Instant>,
}

impl<R: MemoRepository> AppController<R> {
    pub fn new(store: MemoStore<R>, quotes: QuoteOverlay, ambience: Ambience) -> Self {
        Self {
            store,
            machine: ViewMachine::default(),
            active: None,
            editor: None,
            timeline: TimelineView::new(),
            quotes,
            ambience,
            wall_clock: Local::now,
            last_tick: None,
        }
    }

    /// Replaces the clock used to stamp new entries.
    pub fn with_wall_clock(mut self, clock: fn() -> DateTime<Local>) -> Self {
        self.wall_clock = clock;
        self
    }

    pub fn store(&self) -> &MemoStore<R> {
        &self.store
    }

    pub fn state(&self) -> ViewState {
        self.machine.state()
    }

    pub fn flags(&self) -> ViewFlags {
        self.machine.state().flags()
    }

    /// Entry being edited, if the current draft targets one.
    pub fn active_entry(&self) -> Option<&MemoEntry> {
        self.active.as_ref()
    }

    pub fn editor(&self) -> Option<&EntryEditor> {
        self.editor.as_ref()
    }

    pub fn editor_mut(&mut self) -> Option<&mut EntryEditor> {
        self.editor.as_mut()
    }

    pub fn timeline(&self) -> &TimelineView {
        &self.timeline
    }

    pub fn timeline_mut(&mut self) -> &mut TimelineView {
        &mut self.timeline
    }

    pub fn quotes(&self) -> &QuoteOverlay {
        &self.quotes
    }

    pub fn quotes_mut(&mut self) -> &mut QuoteOverlay {
        &mut self.quotes
    }

    pub fn ambience(&self) -> &Ambience {
        &self.ambience
    }

    pub fn ambience_mut(&mut self) -> &mut Ambience {
        &mut self.ambience
    }

    /// Header count, zero-padded to two digits.
    pub fn memo_count_label(&self) -> String {
        format!("{:02}", self.store.len())
    }

    /// Starts the page exit; the editor mounts once the exit delay elapses.
    pub fn open_editor(
        &mut self,
        target: Option<MemoEntry>,
        now: Instant,
    ) -> Result<(), TransitionRejected> {
        self.machine.begin_open(now)?;
        info!(
            "event=view_transition module=controller status=ok to={} memo_id={}",
            self.machine.state().as_str(),
            target
                .as_ref()
                .map_or_else(|| "new".to_string(), |entry| entry.id.to_string())
        );
        self.active = target;
        self.sync_views(now);
        Ok(())
    }

    /// Starts the editor exit; the page returns once the exit delay elapses.
    pub fn close_editor(&mut self, now: Instant) -> Result<(), TransitionRejected> {
        self.machine.begin_close(now)?;
        info!(
            "event=view_transition module=controller status=ok to={}",
            self.machine.state().as_str()
        );
        if let Some(editor) = self.editor.as_mut() {
            editor.begin_leaving(now);
        }
        self.sync_views(now);
        Ok(())
    }

    /// Routes one key to the mounted editor and applies its command.
    pub fn handle_editor_key(&mut self, key: EditorKey, now: Instant) -> Result<(), StoreError> {
        if self.machine.state() != ViewState::EditorOpen {
            return Ok(());
        }
        let command = match self.editor.as_mut() {
            Some(editor) => editor.handle_key(key),
            None => return Ok(()),
        };
        match command {
            EditorCommand::None => Ok(()),
            EditorCommand::Cancel => {
                self.close_after_editor_command(now);
                Ok(())
            }
            EditorCommand::Save(draft) => {
                let saved = self.save_draft(draft);
                self.close_after_editor_command(now);
                saved.map(|_| ())
            }
        }
    }

    /// Saves the mounted editor's draft and closes it; inert for blank drafts.
    pub fn save_editor(&mut self, now: Instant) -> Result<Option<MemoId>, StoreError> {
        if self.machine.state() != ViewState::EditorOpen {
            return Ok(None);
        }
        let Some(draft) = self.editor.as_ref().and_then(EntryEditor::draft) else {
            return Ok(None);
        };
        let saved = self.save_draft(draft);
        self.close_after_editor_command(now);
        saved.map(Some)
    }

    fn close_after_editor_command(&mut self, now: Instant) {
        if let Err(err) = self.close_editor(now) {
            warn!(
                "event=view_transition module=controller status=rejected error={}",
                err
            );
        }
    }

    /// Writes a draft: replaces the active entry or prepends a new one.
    ///
    /// A persistence failure leaves the in-memory mutation in place.
    pub fn save_draft(&mut self, draft: MemoDraft) -> Result<MemoId, StoreError> {
        let MemoDraft {
            content,
            mood,
            tags,
        } = draft;
        let (id, result) = match &self.active {
            Some(existing) => {
                let entry = MemoEntry {
                    id: existing.id,
                    content,
                    date: existing.date,
                    mood: Some(mood),
                    tags,
                };
                (entry.id, self.store.replace(entry))
            }
            None => {
                let entry = MemoEntry::new(content, (self.wall_clock)(), Some(mood), tags);
                (entry.id, self.store.prepend(entry))
            }
        };
        match result {
            Ok(()) | Err(StoreError::Persist(_)) => Ok(id),
            Err(err) => Err(err),
        }
    }

    /// Removes an entry immediately; its card lingers as a departing ghost.
    pub fn delete_entry(&mut self, id: MemoId, now: Instant) -> Result<(), StoreError> {
        let shown = self.timeline.display_entries(self.store.entries());
        let anchor = shown
            .iter()
            .position(|entry| entry.id == id)
            .and_then(|index| shown.get(index + 1))
            .map(|entry| entry.id);
        let removed = match self.store.remove(id) {
            Ok(entry) => entry,
            Err(StoreError::Persist(_)) => shown
                .into_iter()
                .find(|entry| entry.id == id)
                .ok_or(StoreError::NotFound(id))?,
            Err(err) => return Err(err),
        };
        self.timeline.push_departing(removed, anchor, now);
        self.timeline.clamp_selection(self.store.len());
        Ok(())
    }

    /// Toggles meditation; returns the new setting.
    pub fn toggle_meditation(&mut self, now: Instant) -> bool {
        self.quotes.toggle_meditation(now)
    }

    /// Advances every time-driven component to `now`. Call once per frame.
    pub fn tick(&mut self, now: Instant) {
        let dt = self
            .last_tick
            .map_or(Duration::ZERO, |last| now.saturating_duration_since(last));
        self.last_tick = Some(now);

        match self.machine.advance(now) {
            Some(Settled::EditorMounted) => {
                self.editor = Some(EntryEditor::mount(self.active.clone(), now));
                info!(
                    "event=editor_mount module=controller status=ok mode={}",
                    if self.active.is_some() { "edit" } else { "create" }
                );
            }
            Some(Settled::PageRestored) => {
                self.editor = None;
                self.active = None;
                self.timeline.clamp_selection(self.store.len());
            }
            None => {}
        }

        if let Some(editor) = self.editor.as_mut() {
            editor.tick(now);
        }
        self.sync_views(now);
        self.timeline.tick(now, dt);
        self.ambience.step();
        self.quotes.tick(now);
    }

    fn sync_views(&mut self, now: Instant) {
        let flags = self.flags();
        self.timeline.set_leaving(flags.is_page_leaving, now);
        self.quotes
            .set_page(flags.is_page_visible, flags.is_page_leaving, now);
        self.ambience
            .set_paused(self.machine.state() != ViewState::Idle);
    }
}

#[cfg(test)]
mod tests {
    use super::{Settled, ViewMachine, ViewState};
    use crate::motion::timings::{EDITOR_EXIT, PAGE_EXIT};
    use std::time::{Duration, Instant};

    #[test]
    fn machine_walks_the_single_cycle() {
        let start = Instant::now();
        let mut machine = ViewMachine::default();
        machine.begin_open(start).unwrap();
        assert_eq!(machine.state(), ViewState::TransitioningOut);
        assert_eq!(machine.advance(start + PAGE_EXIT - Duration::from_millis(1)), None);
        assert_eq!(machine.advance(start + PAGE_EXIT), Some(Settled::EditorMounted));
        assert_eq!(machine.state(), ViewState::EditorOpen);

        let closing = start + Duration::from_secs(3);
        machine.begin_close(closing).unwrap();
        assert_eq!(machine.advance(closing + EDITOR_EXIT), Some(Settled::PageRestored));
        assert_eq!(machine.state(), ViewState::Idle);
        assert!(machine.pending().is_none());
    }

    #[test]
    fn machine_rejects_requests_mid_transition() {
        let start = Instant::now();
        let mut machine = ViewMachine::default();
        machine.begin_open(start).unwrap();
        let rejected = machine.begin_open(start).unwrap_err();
        assert_eq!(rejected.state, ViewState::TransitioningOut);
        assert!(machine.begin_close(start).is_err());
        assert!(rejected.to_string().contains("transitioning_out"));
    }

    #[test]
    fn flags_follow_state() {
        let idle = ViewState::Idle.flags();
        assert!(idle.is_page_visible && !idle.is_page_leaving && !idle.is_editor_visible);
        let out = ViewState::TransitioningOut.flags();
        assert!(out.is_page_visible && out.is_page_leaving && !out.is_editor_visible);
        let open = ViewState::EditorOpen.flags();
        assert!(!open.is_page_visible && open.is_editor_visible && !open.is_editor_leaving);
        let back = ViewState::TransitioningIn.flags();
        assert!(!back.is_page_visible && back.is_editor_visible && back.is_editor_leaving);
    }
}
