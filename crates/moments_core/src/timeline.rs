//! Timeline layout: month grouping, alternating placement, exit choreography.
//!
//! # Responsibility
//! - Group entries by (year, month), most recent month first.
//! - Assign left/right sides with one running counter across all groups.
//! - Track deleted-card ghosts and the scroll-linked highlight spring.
//!
//! # Invariants
//! - Entry order inside a group is the store order; no secondary sort.
//! - The Nth rendered card (0-based, across groups) sits left iff N is even.

use crate::model::memo::{MemoEntry, MemoId};
use crate::motion::timings::{CARD_DELETE_FADE, CARD_EXIT, CARD_EXIT_STAGGER};
use crate::motion::{Deadline, Tween};
use chrono::{Datelike, Weekday};
use std::time::{Duration, Instant};

/// Side of the central axis a card is drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn for_global_index(index: usize) -> Side {
        if index % 2 == 0 {
            Side::Left
        } else {
            Side::Right
        }
    }

    /// Horizontal exit direction: left cards leave left, right cards right.
    pub fn exit_sign(self) -> f32 {
        match self {
            Side::Left => -1.0,
            Side::Right => 1.0,
        }
    }
}

/// One card's placement in the rendered timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardPlacement {
    pub id: MemoId,
    /// Index into the entry slice the layout was built from.
    pub entry_index: usize,
    pub global_index: usize,
    pub index_in_group: usize,
    pub side: Side,
}

impl CardPlacement {
    /// Cosmetic variation class (drop cap, spacing, compact text).
    pub fn variation(&self) -> usize {
        self.index_in_group % 3
    }

    /// Exit slide of this card, staggered by its position in the group.
    pub fn exit_tween(&self) -> Tween {
        let stagger = CARD_EXIT_STAGGER * u32::try_from(self.index_in_group).unwrap_or(u32::MAX);
        Tween {
            delay: stagger,
            duration: CARD_EXIT,
        }
    }
}

/// Entries sharing one calendar month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGroup {
    pub year: i32,
    /// 1-based month.
    pub month: u32,
    pub cards: Vec<CardPlacement>,
}

impl MonthGroup {
    pub fn month_label(&self) -> &'static str {
        month_label(self.month)
    }
}

/// Builds the grouped, side-assigned layout for `entries`.
pub fn build_layout(entries: &[MemoEntry]) -> Vec<MonthGroup> {
    let mut groups: Vec<MonthGroup> = Vec::new();
    for (entry_index, entry) in entries.iter().enumerate() {
        let (year, month) = (entry.date.year(), entry.date.month());
        let group = match groups
            .iter_mut()
            .position(|group| group.year == year && group.month == month)
        {
            Some(position) => &mut groups[position],
            None => {
                groups.push(MonthGroup {
                    year,
                    month,
                    cards: Vec::new(),
                });
                let last = groups.len() - 1;
                &mut groups[last]
            }
        };
        group.cards.push(CardPlacement {
            id: entry.id,
            entry_index,
            global_index: 0,
            index_in_group: group.cards.len(),
            side: Side::Left,
        });
    }

    groups.sort_by(|a, b| (b.year, b.month).cmp(&(a.year, a.month)));

    let mut global_index = 0;
    for group in &mut groups {
        for card in &mut group.cards {
            card.global_index = global_index;
            card.side = Side::for_global_index(global_index);
            global_index += 1;
        }
    }
    groups
}

/// Date parts shown on a card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardDate {
    pub day: String,
    pub month: &'static str,
    pub weekday: &'static str,
    pub time: String,
}

pub fn card_date(entry: &MemoEntry) -> CardDate {
    let date = entry.date;
    CardDate {
        day: format!("{:02}", date.day()),
        month: month_label(date.month()),
        weekday: weekday_label(date.weekday()),
        time: date.format("%H:%M").to_string(),
    }
}

pub fn month_label(month: u32) -> &'static str {
    const MONTHS: [&str; 12] = [
        "一月", "二月", "三月", "四月", "五月", "六月", "七月", "八月", "九月", "十月", "十一月",
        "十二月",
    ];
    month
        .checked_sub(1)
        .and_then(|idx| MONTHS.get(idx as usize))
        .copied()
        .unwrap_or("")
}

pub fn weekday_label(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "周一",
        Weekday::Tue => "周二",
        Weekday::Wed => "周三",
        Weekday::Thu => "周四",
        Weekday::Fri => "周五",
        Weekday::Sat => "周六",
        Weekday::Sun => "周日",
    }
}

/// A card already removed from the store, still fading on screen.
#[derive(Debug, Clone)]
pub struct DepartingCard {
    pub entry: MemoEntry,
    /// Entry shown right below this card when it was removed; `None` when it
    /// was the last card.
    pub anchor: Option<MemoId>,
    started_at: Instant,
    gone: Deadline,
}

impl DepartingCard {
    /// Fade progress in `[0, 1]`.
    pub fn progress(&self, now: Instant) -> f32 {
        Tween {
            delay: Duration::ZERO,
            duration: CARD_DELETE_FADE,
        }
        .progress(now.saturating_duration_since(self.started_at))
    }
}

/// Spring-smoothed highlight position along the central axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollHighlight {
    position: f32,
    velocity: f32,
    target: f32,
}

impl ScrollHighlight {
    pub const STIFFNESS: f32 = 50.0;
    pub const DAMPING: f32 = 20.0;

    pub fn new() -> Self {
        Self {
            position: 0.0,
            velocity: 0.0,
            target: 0.0,
        }
    }

    /// Smoothed position in `[0, 1]`.
    pub fn position(&self) -> f32 {
        self.position.clamp(0.0, 1.0)
    }

    pub fn set_target(&mut self, fraction: f32) {
        self.target = fraction.clamp(0.0, 1.0);
    }

    /// Advances the spring by `dt` using semi-implicit Euler substeps.
    pub fn step(&mut self, dt: Duration) {
        const SUBSTEP: f32 = 1.0 / 240.0;
        let mut remaining = dt.as_secs_f32().min(0.25);
        while remaining > 0.0 {
            let h = remaining.min(SUBSTEP);
            let force =
                Self::STIFFNESS * (self.target - self.position) - Self::DAMPING * self.velocity;
            self.velocity += force * h;
            self.position += self.velocity * h;
            remaining -= h;
        }
    }
}

impl Default for ScrollHighlight {
    fn default() -> Self {
        Self::new()
    }
}

/// Scroll fraction: 0 at the top of the content, 1 when its bottom is reached.
pub fn scroll_fraction(offset: usize, content_height: usize, viewport_height: usize) -> f32 {
    let scrollable = content_height.saturating_sub(viewport_height);
    if scrollable == 0 {
        return 0.0;
    }
    (offset.min(scrollable) as f32 / scrollable as f32).clamp(0.0, 1.0)
}

/// Interactive timeline state: selection, scroll, highlight and ghosts.
#[derive(Debug, Clone, Default)]
pub struct TimelineView {
    pub selected: usize,
    pub scroll_offset: usize,
    pub highlight: ScrollHighlight,
    departing: Vec<DepartingCard>,
    leaving_since: Option<Instant>,
}

impl TimelineView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn departing(&self) -> &[DepartingCard] {
        &self.departing
    }

    /// Keeps a removed entry on screen until its delete fade completes.
    pub fn push_departing(&mut self, entry: MemoEntry, anchor: Option<MemoId>, now: Instant) {
        self.departing.push(DepartingCard {
            entry,
            anchor,
            started_at: now,
            gone: Deadline::after(now, CARD_DELETE_FADE),
        });
    }

    /// Live entries with departing ones re-inserted above their anchors,
    /// so the remaining cards keep their places until the fade completes.
    pub fn display_entries(&self, entries: &[MemoEntry]) -> Vec<MemoEntry> {
        let mut merged = entries.to_vec();
        let mut pending: Vec<&DepartingCard> = self.departing.iter().collect();
        while !pending.is_empty() {
            let before = pending.len();
            pending.retain(|card| {
                let at = match card.anchor {
                    None => Some(merged.len()),
                    Some(anchor) => merged.iter().position(|entry| entry.id == anchor),
                };
                match at {
                    Some(at) => {
                        merged.insert(at, card.entry.clone());
                        false
                    }
                    None => true,
                }
            });
            if pending.len() == before {
                // Anchor left the view entirely.
                merged.extend(pending.drain(..).map(|card| card.entry.clone()));
            }
        }
        merged
    }

    pub fn is_departing(&self, id: MemoId) -> bool {
        self.departing.iter().any(|card| card.entry.id == id)
    }

    pub fn select_next(&mut self, len: usize) {
        if len > 0 {
            self.selected = (self.selected + 1).min(len - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Keeps the selection inside `len` after removals.
    pub fn clamp_selection(&mut self, len: usize) {
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    /// Marks the timeline as leaving (or not) for exit choreography.
    pub fn set_leaving(&mut self, leaving: bool, now: Instant) {
        match (leaving, self.leaving_since) {
            (true, None) => self.leaving_since = Some(now),
            (false, Some(_)) => self.leaving_since = None,
            _ => {}
        }
    }

    /// Exit progress of one card in `[0, 1]`; zero while not leaving.
    pub fn exit_progress(&self, card: &CardPlacement, now: Instant) -> f32 {
        self.leaving_since.map_or(0.0, |since| {
            card.exit_tween()
                .progress(now.saturating_duration_since(since))
        })
    }

    /// Drops finished ghosts and advances the highlight spring.
    pub fn tick(&mut self, now: Instant, dt: Duration) {
        let expired: Vec<(MemoId, Option<MemoId>)> = self
            .departing
            .iter()
            .filter(|card| card.gone.is_due(now))
            .map(|card| (card.entry.id, card.anchor))
            .collect();
        self.departing.retain(|card| !card.gone.is_due(now));
        // Ghosts anchored on an expired ghost follow its anchor instead.
        for card in &mut self.departing {
            while let Some(&(_, next)) = card
                .anchor
                .and_then(|anchor| expired.iter().find(|(id, _)| *id == anchor))
            {
                card.anchor = next;
            }
        }
        self.highlight.step(dt);
    }
}

#[cfg(test)]
mod tests {
    use super::{build_layout, scroll_fraction, ScrollHighlight, Side, TimelineView};
    use crate::model::memo::MemoEntry;
    use crate::service::seed::local_datetime;
    use std::time::{Duration, Instant};

    fn entry_at(year: i32, month: u32, day: u32) -> MemoEntry {
        MemoEntry::new(
            format!("{year}-{month}-{day}"),
            local_datetime(year, month, day, 12, 0),
            None,
            Vec::new(),
        )
    }

    #[test]
    fn groups_are_newest_first_and_keep_store_order_inside() {
        let entries = vec![
            entry_at(2024, 11, 2),
            entry_at(2024, 12, 1),
            entry_at(2024, 11, 30),
            entry_at(2023, 12, 31),
        ];
        let groups = build_layout(&entries);
        let keys: Vec<_> = groups.iter().map(|g| (g.year, g.month)).collect();
        assert_eq!(keys, vec![(2024, 12), (2024, 11), (2023, 12)]);

        let november: Vec<_> = groups[1].cards.iter().map(|c| c.entry_index).collect();
        assert_eq!(november, vec![0, 2]);
    }

    #[test]
    fn side_parity_runs_across_groups() {
        let entries = vec![
            entry_at(2024, 12, 3),
            entry_at(2024, 11, 3),
            entry_at(2024, 11, 2),
            entry_at(2024, 10, 1),
        ];
        let groups = build_layout(&entries);
        let sides: Vec<_> = groups
            .iter()
            .flat_map(|g| g.cards.iter())
            .map(|c| (c.global_index, c.side))
            .collect();
        assert_eq!(
            sides,
            vec![
                (0, Side::Left),
                (1, Side::Right),
                (2, Side::Left),
                (3, Side::Right)
            ]
        );
        // Second group starts at in-group index 0 but global index 1.
        assert_eq!(groups[1].cards[0].index_in_group, 0);
        assert_eq!(groups[1].cards[0].side, Side::Right);
    }

    #[test]
    fn scroll_fraction_clamps_to_unit_range() {
        assert_eq!(scroll_fraction(0, 10, 20), 0.0);
        assert_eq!(scroll_fraction(5, 30, 20), 0.5);
        assert_eq!(scroll_fraction(50, 30, 20), 1.0);
    }

    #[test]
    fn highlight_spring_converges_to_target() {
        let mut highlight = ScrollHighlight::new();
        highlight.set_target(1.0);
        for _ in 0..300 {
            highlight.step(Duration::from_millis(16));
        }
        assert!((highlight.position() - 1.0).abs() < 0.01);
    }

    #[test]
    fn departing_cards_expire_after_fade() {
        let start = Instant::now();
        let mut view = TimelineView::new();
        view.push_departing(entry_at(2024, 12, 1), None, start);
        view.tick(start + Duration::from_millis(400), Duration::from_millis(16));
        assert_eq!(view.departing().len(), 1);
        assert!(view.departing()[0].progress(start + Duration::from_millis(400)) > 0.4);
        view.tick(start + Duration::from_millis(800), Duration::from_millis(16));
        assert!(view.departing().is_empty());
    }

    #[test]
    fn departing_entries_hold_their_slot_until_gone() {
        let start = Instant::now();
        let entries = vec![
            entry_at(2024, 12, 3),
            entry_at(2024, 12, 2),
            entry_at(2024, 12, 1),
        ];
        let mut view = TimelineView::new();
        let mut live = entries.clone();
        let removed = live.remove(1);
        view.push_departing(removed.clone(), Some(entries[2].id), start);

        let shown = view.display_entries(&live);
        assert_eq!(shown, entries);
        assert!(view.is_departing(removed.id));
        assert_eq!(build_layout(&shown)[0].cards[2].side, Side::Left);

        view.tick(start + Duration::from_millis(800), Duration::ZERO);
        assert_eq!(view.display_entries(&live), live);
    }

    #[test]
    fn adjacent_ghosts_keep_their_order() {
        let start = Instant::now();
        let entries = vec![
            entry_at(2024, 12, 4),
            entry_at(2024, 12, 3),
            entry_at(2024, 12, 2),
            entry_at(2024, 12, 1),
        ];
        let mut view = TimelineView::new();
        let mut live = entries.clone();

        let first = live.remove(1);
        view.push_departing(first, Some(entries[2].id), start);
        let second = live.remove(1);
        let later = start + Duration::from_millis(100);
        view.push_departing(second, Some(entries[3].id), later);
        assert_eq!(view.display_entries(&live), entries);

        // The upper ghost anchored on the lower one outlives it.
        let mut live = entries.clone();
        let mut view = TimelineView::new();
        let lower = live.remove(2);
        view.push_departing(lower, Some(entries[3].id), start);
        let upper = live.remove(1);
        let later = start + Duration::from_millis(300);
        view.push_departing(upper.clone(), Some(entries[2].id), later);
        assert_eq!(view.display_entries(&live), entries);

        view.tick(start + Duration::from_millis(800), Duration::ZERO);
        assert_eq!(view.departing().len(), 1);
        assert_eq!(
            view.display_entries(&live),
            vec![entries[0].clone(), upper, entries[3].clone()]
        );
    }

    #[test]
    fn ghost_with_missing_anchor_goes_last() {
        let start = Instant::now();
        let entries = vec![entry_at(2024, 12, 2), entry_at(2024, 12, 1)];
        let orphan = entry_at(2024, 12, 3);
        let mut view = TimelineView::new();
        let missing = entry_at(2024, 1, 1).id;
        view.push_departing(orphan.clone(), Some(missing), start);
        let shown = view.display_entries(&entries);
        assert_eq!(shown.last(), Some(&orphan));
        assert_eq!(shown.len(), 3);
    }

    #[test]
    fn exit_is_staggered_by_index_in_group() {
        let start = Instant::now();
        let entries = vec![entry_at(2024, 12, 3), entry_at(2024, 12, 2)];
        let groups = build_layout(&entries);
        let mut view = TimelineView::new();
        view.set_leaving(true, start);
        let at = start + Duration::from_millis(50);
        assert!(view.exit_progress(&groups[0].cards[0], at) > 0.0);
        assert_eq!(view.exit_progress(&groups[0].cards[1], at), 0.0);
    }
}
