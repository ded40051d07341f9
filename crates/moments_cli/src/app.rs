//! Terminal application state around the core controller.
//!
//! # Responsibility
//! - Apply mapped input to the controller at the current instant.
//! - Lay out timeline rows and quote rectangles before each draw.
//! - Report drawn quote rectangles back to the overlay.

use crate::input::{Input, TimelineCommand};
use crate::ui;
use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
use log::{debug, warn};
use moments_core::controller::AppController;
use moments_core::model::memo::MemoId;
use moments_core::quotes::QuoteRect;
use moments_core::repo::memo_repo::MemoRepository;
use moments_core::timeline::{build_layout, scroll_fraction, CardPlacement, TimelineView};
use moments_core::MemoEntry;
use ratatui::layout::{Position, Rect};
use std::time::Instant;

/// Virtual pixels per terminal column.
pub const CELL_WIDTH_PX: f32 = 8.0;
/// Virtual pixels per terminal row.
pub const CELL_HEIGHT_PX: f32 = 16.0;

pub const CARD_HEIGHT: u16 = 5;
pub const GROUP_LABEL_HEIGHT: u16 = 2;
const PAGE_STEP: usize = 3;

/// One row-positioned item of the timeline content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineRow {
    MonthLabel { top: u16, year: i32, month: u32 },
    Card {
        top: u16,
        placement: CardPlacement,
        /// Already removed from the store; fading out in place.
        departing: bool,
    },
}

/// Timeline content laid out in rows, before scrolling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimelineFrame {
    pub rows: Vec<TimelineRow>,
    pub content_height: u16,
}

impl TimelineFrame {
    pub fn build(entries: &[MemoEntry], timeline: &TimelineView) -> Self {
        let mut rows = Vec::new();
        let mut top: u16 = 0;
        for group in build_layout(entries) {
            rows.push(TimelineRow::MonthLabel {
                top,
                year: group.year,
                month: group.month,
            });
            top = top.saturating_add(GROUP_LABEL_HEIGHT);
            for placement in group.cards {
                let departing = timeline.is_departing(placement.id);
                rows.push(TimelineRow::Card {
                    top,
                    placement,
                    departing,
                });
                top = top.saturating_add(CARD_HEIGHT);
            }
        }
        Self {
            rows,
            content_height: top,
        }
    }

    /// Cards still in the store, in rendering order.
    pub fn live_cards(&self) -> impl Iterator<Item = (u16, &CardPlacement)> {
        self.rows.iter().filter_map(|row| match row {
            TimelineRow::Card {
                top,
                placement,
                departing: false,
            } => Some((*top, placement)),
            _ => None,
        })
    }

    /// The `selected`-th live card.
    pub fn card_at(&self, selected: usize) -> Option<(u16, &CardPlacement)> {
        self.live_cards().nth(selected)
    }
}

pub struct App<R: MemoRepository> {
    controller: AppController<R>,
    shown: Vec<MemoEntry>,
    frame: TimelineFrame,
    quote_rects: Vec<(u64, Rect)>,
    header_quote: Rect,
    screen: Rect,
    status: Option<String>,
    should_quit: bool,
}

impl<R: MemoRepository> App<R> {
    pub fn new(controller: AppController<R>) -> Self {
        let shown = controller.store().entries().to_vec();
        let frame = TimelineFrame::build(&shown, controller.timeline());
        Self {
            controller,
            shown,
            frame,
            quote_rects: Vec::new(),
            header_quote: Rect::default(),
            screen: Rect::default(),
            status: None,
            should_quit: false,
        }
    }

    pub fn controller(&self) -> &AppController<R> {
        &self.controller
    }

    pub fn timeline_frame(&self) -> &TimelineFrame {
        &self.frame
    }

    /// Entries the current frame was built from, ghosts included.
    pub fn shown_entries(&self) -> &[MemoEntry] {
        &self.shown
    }

    pub fn quote_rects(&self) -> &[(u64, Rect)] {
        &self.quote_rects
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Whether keys go to the editor table.
    pub fn editor_mode(&self) -> bool {
        self.controller.flags().is_editor_visible
    }

    pub fn tick(&mut self, now: Instant) {
        self.controller.tick(now);
    }

    /// Reinitializes the background for a new terminal size.
    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.controller.ambience_mut().resize(
            f32::from(cols) * CELL_WIDTH_PX,
            f32::from(rows) * CELL_HEIGHT_PX,
        );
    }

    pub fn handle_input(&mut self, input: Input, now: Instant) {
        match input {
            Input::Quit => self.should_quit = true,
            Input::Editor(key) => {
                if let Err(err) = self.controller.handle_editor_key(key, now) {
                    self.report_error("save", &err);
                }
            }
            Input::Timeline(command) => self.handle_timeline(command, now),
        }
    }

    fn handle_timeline(&mut self, command: TimelineCommand, now: Instant) {
        let len = self.controller.store().len();
        match command {
            TimelineCommand::SelectNext => self.controller.timeline_mut().select_next(len),
            TimelineCommand::SelectPrev => self.controller.timeline_mut().select_prev(),
            TimelineCommand::PageDown => {
                for _ in 0..PAGE_STEP {
                    self.controller.timeline_mut().select_next(len);
                }
            }
            TimelineCommand::PageUp => {
                for _ in 0..PAGE_STEP {
                    self.controller.timeline_mut().select_prev();
                }
            }
            TimelineCommand::NewEntry => self.open_editor(None, now),
            TimelineCommand::EditSelected => {
                if let Some(id) = self.selected_id() {
                    self.open_editor(Some(id), now);
                }
            }
            TimelineCommand::DeleteSelected => {
                if let Some(id) = self.selected_id() {
                    match self.controller.delete_entry(id, now) {
                        Ok(()) => self.status = None,
                        Err(err) => self.report_error("delete", &err),
                    }
                }
            }
            TimelineCommand::ToggleMeditation => {
                self.controller.toggle_meditation(now);
            }
            TimelineCommand::DismissQuote => {
                self.controller.quotes_mut().dismiss_newest(now);
            }
        }
    }

    pub fn handle_mouse(&mut self, event: MouseEvent, now: Instant) {
        if self.editor_mode() {
            if event.kind == MouseEventKind::Down(MouseButton::Left) {
                self.click_editor(Position::new(event.column, event.row));
            }
            return;
        }
        let len = self.controller.store().len();
        match event.kind {
            MouseEventKind::ScrollDown => self.controller.timeline_mut().select_next(len),
            MouseEventKind::ScrollUp => self.controller.timeline_mut().select_prev(),
            MouseEventKind::Down(MouseButton::Left) => {
                let at = Position::new(event.column, event.row);
                if self.header_quote.contains(at) {
                    self.controller.toggle_meditation(now);
                    return;
                }
                let hit = self
                    .quote_rects
                    .iter()
                    .rev()
                    .find(|(_, rect)| rect.contains(at))
                    .map(|(id, _)| *id);
                if let Some(id) = hit {
                    self.controller.quotes_mut().dismiss(id, now);
                }
            }
            _ => {}
        }
    }

    /// Mood chips select, tag chips remove.
    fn click_editor(&mut self, at: Position) {
        let rows = ui::editor_areas(self.screen);
        let Some(editor) = self.controller.editor_mut() else {
            return;
        };
        if let Some(mood) = ui::mood_at(rows.mood, at) {
            editor.select_mood(mood);
            return;
        }
        let tag = ui::tag_at(rows.tags, editor.tags(), at).map(str::to_string);
        if let Some(tag) = tag {
            if editor.remove_tag(&tag) {
                debug!("event=tag_remove module=cli status=ok source=pointer");
            }
        }
    }

    fn selected_id(&self) -> Option<MemoId> {
        self.frame
            .card_at(self.controller.timeline().selected)
            .map(|(_, placement)| placement.id)
    }

    fn open_editor(&mut self, id: Option<MemoId>, now: Instant) {
        let target = id.and_then(|id| self.controller.store().get(id).cloned());
        if let Err(err) = self.controller.open_editor(target, now) {
            debug!("event=view_transition module=cli status=ignored reason={err}");
        }
    }

    fn report_error(&mut self, action: &str, err: &dyn std::error::Error) {
        warn!("event=cli_action module=cli status=error action={action} error={err}");
        self.status = Some(format!("{action} failed: {err}"));
    }

    /// Computes this frame's geometry and feeds it back into core state.
    pub fn prepare(&mut self, area: Rect) {
        let areas = ui::areas(area);
        self.screen = area;
        self.header_quote = areas.header_quote;
        self.shown = self
            .controller
            .timeline()
            .display_entries(self.controller.store().entries());
        self.frame = TimelineFrame::build(&self.shown, self.controller.timeline());
        let len = self.controller.store().len();
        self.controller.timeline_mut().clamp_selection(len);
        self.keep_selection_visible(areas.body.height);

        self.quote_rects = ui::layout_quotes(areas.body, self.controller.quotes());
        for (id, rect) in &self.quote_rects {
            self.controller.quotes_mut().report_rect(*id, to_virtual(*rect));
        }
    }

    fn keep_selection_visible(&mut self, viewport: u16) {
        let content = self.frame.content_height;
        let selected_top = self
            .frame
            .card_at(self.controller.timeline().selected)
            .map(|(top, _)| usize::from(top));
        let timeline = self.controller.timeline_mut();
        if let Some(top) = selected_top {
            let viewport = usize::from(viewport);
            let bottom = top + usize::from(CARD_HEIGHT);
            if top < timeline.scroll_offset {
                timeline.scroll_offset = top.saturating_sub(usize::from(GROUP_LABEL_HEIGHT));
            } else if bottom > timeline.scroll_offset + viewport {
                timeline.scroll_offset = bottom.saturating_sub(viewport);
            }
        }
        let max_offset = usize::from(content).saturating_sub(usize::from(viewport));
        timeline.scroll_offset = timeline.scroll_offset.min(max_offset);
        let fraction = scroll_fraction(
            timeline.scroll_offset,
            usize::from(content),
            usize::from(viewport),
        );
        timeline.highlight.set_target(fraction);
    }
}

/// Terminal cells to the overlay's virtual-pixel rectangle (center based).
pub fn to_virtual(rect: Rect) -> QuoteRect {
    let width = f32::from(rect.width) * CELL_WIDTH_PX;
    let height = f32::from(rect.height) * CELL_HEIGHT_PX;
    QuoteRect {
        x: f32::from(rect.x) * CELL_WIDTH_PX + width / 2.0,
        y: f32::from(rect.y) * CELL_HEIGHT_PX + height / 2.0,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        to_virtual, App, TimelineFrame, TimelineRow, CARD_HEIGHT, GROUP_LABEL_HEIGHT,
    };
    use crate::ui;
    use crossterm::event::{KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
    use moments_core::background::Ambience;
    use moments_core::controller::AppController;
    use moments_core::db::open_db_in_memory;
    use moments_core::editor::FocusRegion;
    use moments_core::model::memo::Mood;
    use moments_core::motion::timings::PAGE_EXIT;
    use moments_core::quotes::{QuoteOverlay, QuotePolicy};
    use moments_core::repo::kv_repo::SqliteKvStore;
    use moments_core::repo::memo_repo::KvMemoRepository;
    use moments_core::service::memo_store::MemoStore;
    use moments_core::service::seed::{local_datetime, seed_entries};
    use moments_core::timeline::TimelineView;
    use moments_core::MemoEntry;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use ratatui::layout::Rect;
    use std::time::Instant;

    #[test]
    fn frame_stacks_labels_and_cards() {
        let mut entries = seed_entries();
        entries.push(MemoEntry::new(
            "older month",
            local_datetime(2024, 11, 2, 8, 0),
            None,
            Vec::new(),
        ));
        let frame = TimelineFrame::build(&entries, &TimelineView::new());
        let labels = frame
            .rows
            .iter()
            .filter(|row| matches!(row, TimelineRow::MonthLabel { .. }))
            .count();
        assert_eq!(labels, 2);
        assert_eq!(
            frame.content_height,
            2 * GROUP_LABEL_HEIGHT + 6 * CARD_HEIGHT
        );
        let (top, last) = frame.card_at(5).unwrap();
        assert_eq!(top, 2 * GROUP_LABEL_HEIGHT + 5 * CARD_HEIGHT);
        assert_eq!(last.entry_index, 5);
    }

    #[test]
    fn departing_cards_keep_rows_but_are_not_selectable() {
        let entries = seed_entries();
        let mut live = entries.clone();
        let removed = live.remove(0);
        let mut timeline = TimelineView::new();
        timeline.push_departing(removed.clone(), Some(entries[1].id), Instant::now());

        let shown = timeline.display_entries(&live);
        let frame = TimelineFrame::build(&shown, &timeline);
        assert_eq!(frame.content_height, GROUP_LABEL_HEIGHT + 5 * CARD_HEIGHT);
        let (top, first) = frame.card_at(0).unwrap();
        assert_eq!(first.id, entries[1].id);
        assert_eq!(top, GROUP_LABEL_HEIGHT + CARD_HEIGHT);
        assert_eq!(frame.live_cards().count(), 4);
    }

    #[test]
    fn virtual_rect_is_centered() {
        let rect = to_virtual(Rect::new(10, 4, 20, 3));
        assert_eq!(rect.x, 80.0 + 80.0);
        assert_eq!(rect.y, 64.0 + 24.0);
        assert_eq!(rect.width, 160.0);
        assert_eq!(rect.height, 48.0);
    }

    #[test]
    fn clicking_a_tag_chip_removes_that_tag() {
        let repo = KvMemoRepository::new(SqliteKvStore::new(open_db_in_memory().unwrap()));
        let mut entries = seed_entries();
        entries[0].tags = vec!["晨跑".to_string(), "阅读".to_string(), "咖啡".to_string()];
        let target = entries[0].clone();
        let store = MemoStore::with_entries(repo, entries);
        let quotes = QuoteOverlay::new(QuotePolicy::default(), StdRng::seed_from_u64(1));
        let ambience = Ambience::new(800.0, 640.0, StdRng::seed_from_u64(2));
        let mut app = App::new(AppController::new(store, quotes, ambience));

        let start = Instant::now();
        app.controller.open_editor(Some(target), start).unwrap();
        app.tick(start + PAGE_EXIT);
        let screen = Rect::new(0, 0, 100, 40);
        app.prepare(screen);

        let rows = ui::editor_areas(screen);
        let click = |column, row| MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        };
        // Second chip starts after "#晨跑" (5 cells) and a gap.
        app.handle_mouse(click(rows.tags.x + 1 + 6, rows.tags.y + 1), start + PAGE_EXIT);
        let editor = app.controller().editor().unwrap();
        assert_eq!(editor.tags(), ["晨跑".to_string(), "咖啡".to_string()]);

        app.handle_mouse(click(rows.mood.x + 1, rows.mood.y + 1), start + PAGE_EXIT);
        let editor = app.controller().editor().unwrap();
        assert_eq!(editor.mood(), Mood::ALL[0]);
        assert_eq!(editor.focus(), FocusRegion::Mood);
    }
}
