//! Frame rendering.
//!
//! # Responsibility
//! - Draw background, header, timeline, quotes and editor from core state.
//! - Own all terminal geometry (areas, card slots, quote boxes).
//!
//! # Invariants
//! - Drawing never mutates application state; geometry that core needs is
//!   computed by `App::prepare` through the helpers here.

use crate::app::{App, TimelineRow, CARD_HEIGHT, CELL_HEIGHT_PX, CELL_WIDTH_PX};
use chrono::{Local, Utc};
use moments_core::background::Ambience;
use moments_core::editor::{header_lines, EditorRegion, EntryEditor, FocusRegion};
use moments_core::model::memo::Mood;
use moments_core::motion::ease_out;
use moments_core::quotes::{daily_quote_at, glyph_units, QuoteOverlay};
use moments_core::repo::memo_repo::MemoRepository;
use moments_core::timeline::{card_date, month_label, Side};
use moments_core::MemoEntry;
use ratatui::layout::{Alignment, Constraint, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Line as CanvasLine, Points};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;
use std::time::Instant;

const AXIS_WIDTH: u16 = 3;
const EDITOR_MAX_WIDTH: u16 = 72;
const QUOTE_MAX_WIDTH: u16 = 30;
const ACCENT: Color = Color::Rgb(126, 170, 255);

/// Screen regions of the page view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Areas {
    pub header: Rect,
    pub header_quote: Rect,
    pub body: Rect,
    pub footer: Rect,
}

pub fn areas(area: Rect) -> Areas {
    let [header, body, footer] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(3),
        Constraint::Length(1),
    ])
    .areas(area);
    let [_, header_quote, _] = Layout::horizontal([
        Constraint::Length(14),
        Constraint::Min(10),
        Constraint::Length(14),
    ])
    .areas(Rect {
        height: header.height.min(2),
        ..header
    });
    Areas {
        header,
        header_quote,
        body,
        footer,
    }
}

/// Grey of brightness `level` in `[0, 1]`.
fn shade(level: f32) -> Color {
    let v = (30.0 + level.clamp(0.0, 1.0) * 225.0) as u8;
    Color::Rgb(v, v, v)
}

fn tinted(level: f32) -> Color {
    let v = level.clamp(0.0, 1.0);
    Color::Rgb(
        (30.0 + v * 96.0) as u8,
        (30.0 + v * 140.0) as u8,
        (30.0 + v * 225.0) as u8,
    )
}

/// Slot of a card whose content row is `top`, or `None` when scrolled out.
pub fn card_rect(body: Rect, top: u16, offset: usize, side: Side) -> Option<Rect> {
    let row = usize::from(top).checked_sub(offset)?;
    let height = CARD_HEIGHT - 1;
    if row + usize::from(height) > usize::from(body.height) {
        return None;
    }
    let row = u16::try_from(row).ok()?;
    let half = body.width.saturating_sub(AXIS_WIDTH) / 2;
    let x = match side {
        Side::Left => body.x,
        Side::Right => body.x + half + AXIS_WIDTH,
    };
    Some(Rect::new(x, body.y + row, half, height))
}

/// Boxes of the visible floating quotes, clamped inside `body`.
pub fn layout_quotes(body: Rect, overlay: &QuoteOverlay) -> Vec<(u64, Rect)> {
    let width = QUOTE_MAX_WIDTH.min(body.width / 3).max(8);
    overlay
        .quotes()
        .iter()
        .map(|quote| {
            let text_width = Span::raw(quote.quote().text).width() as u16;
            let text_rows = text_width.div_ceil(width.saturating_sub(2).max(1));
            let height = (text_rows + 1).min(body.height.max(1));
            let cx = f32::from(body.width) * quote.position.x / 100.0;
            let cy = f32::from(body.height) * quote.position.y / 100.0;
            let x = (cx as u16)
                .saturating_sub(width / 2)
                .min(body.width.saturating_sub(width));
            let y = (cy as u16)
                .saturating_sub(height / 2)
                .min(body.height.saturating_sub(height));
            (
                quote.id,
                Rect::new(body.x + x, body.y + y, width.min(body.width), height),
            )
        })
        .collect()
}

/// Rows of the editor panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorAreas {
    pub date: Rect,
    pub mood: Rect,
    pub text: Rect,
    pub tags: Rect,
    pub buttons: Rect,
    pub hint: Rect,
}

pub fn editor_areas(area: Rect) -> EditorAreas {
    let width = EDITOR_MAX_WIDTH.min(area.width.saturating_sub(4));
    let panel = Rect::new(
        area.x + (area.width.saturating_sub(width)) / 2,
        area.y + 1,
        width,
        area.height.saturating_sub(2),
    );
    let [date, mood, text, tags, buttons, hint] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Length(3),
        Constraint::Min(4),
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(panel);
    EditorAreas {
        date,
        mood,
        text,
        tags,
        buttons,
        hint,
    }
}

fn mood_chip(mood: Mood) -> String {
    format!(" {} {} ", mood.glyph(), mood.label())
}

fn tag_chip(tag: &str) -> String {
    format!("#{tag}")
}

fn bordered_inner(area: Rect) -> Rect {
    Block::default().borders(Borders::ALL).inner(area)
}

/// Index of the chip under `at`, for chips drawn left to right on the first
/// inner row of a bordered box with one blank cell between chips.
fn chip_at(area: Rect, widths: impl Iterator<Item = u16>, at: Position) -> Option<usize> {
    let inner = bordered_inner(area);
    if at.y != inner.y || !inner.contains(at) {
        return None;
    }
    let mut x = inner.x;
    for (index, width) in widths.enumerate() {
        if at.x >= x && at.x < x.saturating_add(width) {
            return Some(index);
        }
        x = x.saturating_add(width).saturating_add(1);
    }
    None
}

/// Mood chip under a click in the mood row.
pub fn mood_at(mood_area: Rect, at: Position) -> Option<Mood> {
    let widths = Mood::ALL
        .iter()
        .map(|mood| Span::raw(mood_chip(*mood)).width() as u16);
    chip_at(mood_area, widths, at).map(|index| Mood::ALL[index])
}

/// Tag chip under a click in the tag row.
pub fn tag_at<'a>(tags_area: Rect, tags: &'a [String], at: Position) -> Option<&'a str> {
    let widths = tags.iter().map(|tag| Span::raw(tag_chip(tag)).width() as u16);
    chip_at(tags_area, widths, at).map(|index| tags[index].as_str())
}

pub fn draw<R: MemoRepository>(f: &mut Frame, app: &App<R>, now: Instant) {
    let area = f.area();
    let controller = app.controller();
    draw_background(f, area, controller.ambience());

    let flags = controller.flags();
    let areas = areas(area);
    if flags.is_page_visible {
        let fade = if flags.is_page_leaving { 0.45 } else { 1.0 };
        draw_header(f, app, areas, fade);
        draw_timeline(f, app, areas.body, now);
        draw_quotes(f, app, now);
    }
    draw_particles(f, controller.quotes(), area, now);
    if flags.is_editor_visible {
        if let Some(editor) = controller.editor() {
            draw_editor(f, editor, area, now);
        }
    }
    draw_footer(f, app, areas.footer);
}

fn draw_background(f: &mut Frame, area: Rect, ambience: &Ambience) {
    let (width, height) = ambience.size();
    let canvas = Canvas::default()
        .marker(Marker::Braille)
        .x_bounds([0.0, f64::from(width)])
        .y_bounds([0.0, f64::from(height)])
        .paint(|ctx| {
            for speck in ambience.specks() {
                let level = (speck.opacity * 3.0 * (speck.size / 1.1)).min(1.0);
                let color = if speck.is_blue {
                    tinted(level)
                } else {
                    shade(level * 0.7)
                };
                ctx.draw(&Points {
                    coords: &[(f64::from(speck.x), f64::from(height - speck.y))],
                    color,
                });
            }
            for streak in ambience.streaks() {
                let (tail_x, tail_y) = streak.tail();
                ctx.draw(&CanvasLine {
                    x1: f64::from(tail_x),
                    y1: f64::from(height - tail_y),
                    x2: f64::from(streak.x),
                    y2: f64::from(height - streak.y),
                    color: tinted(streak.opacity * streak.life * 3.0),
                });
            }
        });
    f.render_widget(canvas, area);
}

fn draw_header<R: MemoRepository>(f: &mut Frame, app: &App<R>, areas: Areas, fade: f32) {
    let controller = app.controller();
    let [title, _, count] = Layout::horizontal([
        Constraint::Length(14),
        Constraint::Min(10),
        Constraint::Length(14),
    ])
    .areas(areas.header);

    f.render_widget(
        Paragraph::new(Line::from(Span::styled(
            " MOMENTS",
            Style::default()
                .fg(shade(0.9 * fade))
                .add_modifier(Modifier::BOLD),
        ))),
        title,
    );

    let quote = daily_quote_at(Utc::now());
    let meditation = if controller.quotes().meditation() {
        "◉ "
    } else {
        "○ "
    };
    f.render_widget(
        Paragraph::new(vec![
            Line::from(vec![
                Span::styled(meditation, Style::default().fg(ACCENT)),
                Span::styled(
                    format!("「{}」", quote.text),
                    Style::default()
                        .fg(shade(0.6 * fade))
                        .add_modifier(Modifier::ITALIC),
                ),
            ]),
            Line::from(Span::styled(
                format!("— {}", quote.author),
                Style::default().fg(shade(0.35 * fade)),
            )),
        ])
        .alignment(Alignment::Center),
        areas.header_quote,
    );

    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(
                controller.memo_count_label(),
                Style::default()
                    .fg(shade(0.95 * fade))
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(" 篇 ", Style::default().fg(shade(0.45 * fade))),
        ]))
        .alignment(Alignment::Right),
        count,
    );
}

fn draw_timeline<R: MemoRepository>(f: &mut Frame, app: &App<R>, body: Rect, now: Instant) {
    let controller = app.controller();
    let timeline = controller.timeline();
    let offset = timeline.scroll_offset;
    let half = body.width.saturating_sub(AXIS_WIDTH) / 2;
    let axis_x = body.x + half + 1;

    let axis: Vec<Line> = (0..body.height)
        .map(|_| Line::from(Span::styled("│", Style::default().fg(shade(0.18)))))
        .collect();
    f.render_widget(Paragraph::new(axis), Rect::new(axis_x, body.y, 1, body.height));

    let marker_row = (timeline.highlight.position() * f32::from(body.height.saturating_sub(1)))
        .round() as u16;
    f.render_widget(
        Paragraph::new(Span::styled("◆", Style::default().fg(ACCENT))),
        Rect::new(axis_x, body.y + marker_row.min(body.height.saturating_sub(1)), 1, 1),
    );

    let selected = app
        .timeline_frame()
        .card_at(timeline.selected)
        .map(|(_, placement)| placement.id);
    let entries = app.shown_entries();
    for row in &app.timeline_frame().rows {
        match row {
            TimelineRow::MonthLabel { top, year, month } => {
                let Some(y) = usize::from(*top)
                    .checked_sub(offset)
                    .and_then(|y| u16::try_from(y).ok())
                    .filter(|y| *y < body.height)
                else {
                    continue;
                };
                f.render_widget(
                    Paragraph::new(Line::from(vec![
                        Span::styled(format!("{year} "), Style::default().fg(shade(0.35))),
                        Span::styled(
                            month_label(*month),
                            Style::default()
                                .fg(shade(0.75))
                                .add_modifier(Modifier::BOLD),
                        ),
                    ]))
                    .alignment(Alignment::Center),
                    Rect::new(body.x, body.y + y, body.width, 1),
                );
            }
            TimelineRow::Card {
                top,
                placement,
                departing,
            } => {
                let Some(slot) = card_rect(body, *top, offset, placement.side) else {
                    continue;
                };
                let Some(entry) = entries.get(placement.entry_index) else {
                    continue;
                };
                let mut presence = 1.0 - ease_out(timeline.exit_progress(placement, now));
                if *departing {
                    presence *= timeline
                        .departing()
                        .iter()
                        .find(|card| card.entry.id == placement.id)
                        .map_or(0.0, |card| 1.0 - card.progress(now));
                }
                if presence <= 0.01 {
                    continue;
                }
                let shift = (f32::from(slot.width) * (1.0 - presence)) as u16;
                let rect = match placement.side {
                    Side::Left => Rect {
                        width: slot.width.saturating_sub(shift),
                        ..slot
                    },
                    Side::Right => Rect {
                        x: slot.x + shift,
                        width: slot.width.saturating_sub(shift),
                        ..slot
                    },
                };
                let card = CardStyle {
                    presence,
                    selected: selected == Some(placement.id),
                    variation: placement.variation(),
                    side: placement.side,
                };
                draw_card(f, rect, entry, card);
            }
        }
    }
}

struct CardStyle {
    presence: f32,
    selected: bool,
    variation: usize,
    side: Side,
}

fn draw_card(f: &mut Frame, rect: Rect, entry: &MemoEntry, style: CardStyle) {
    if rect.width < 4 {
        return;
    }
    let level = style.presence;
    let border_type = match style.variation {
        0 => BorderType::Plain,
        1 => BorderType::Thick,
        _ => BorderType::Double,
    };
    let border_color = if style.selected {
        ACCENT
    } else {
        shade(0.3 * level)
    };
    let borders = match style.side {
        Side::Left => Borders::RIGHT,
        Side::Right => Borders::LEFT,
    };
    let block = Block::default()
        .borders(borders)
        .border_type(border_type)
        .border_style(Style::default().fg(border_color));
    let inner = block.inner(rect);
    f.render_widget(Clear, rect);
    f.render_widget(block, rect);

    let date = card_date(entry);
    let mut date_style = Style::default().fg(shade(0.55 * level));
    if style.selected {
        date_style = date_style.fg(ACCENT);
    }
    let [date_row, content_rows, tags_row] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(2),
        Constraint::Length(1),
    ])
    .areas(inner);

    let padding = match style.side {
        Side::Left => "",
        Side::Right => " ",
    };
    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::raw(padding),
            Span::styled(
                format!("{} {} {} {}", date.day, date.month, date.weekday, date.time),
                date_style,
            ),
            Span::styled(
                format!("  {}", entry.mood_glyph()),
                Style::default().fg(ACCENT),
            ),
        ])),
        date_row,
    );

    let mut content_style = Style::default().fg(shade(0.85 * level));
    if style.variation == 0 {
        content_style = content_style.add_modifier(Modifier::BOLD);
    }
    f.render_widget(
        Paragraph::new(format!("{padding}{}", entry.content))
            .style(content_style)
            .wrap(Wrap { trim: true }),
        content_rows,
    );

    let tags: String = entry
        .tags
        .iter()
        .map(|tag| format!("#{tag}"))
        .collect::<Vec<_>>()
        .join(" ");
    f.render_widget(
        Paragraph::new(format!("{padding}{tags}")).style(Style::default().fg(shade(0.4 * level))),
        tags_row,
    );
}

fn draw_quotes<R: MemoRepository>(f: &mut Frame, app: &App<R>, now: Instant) {
    let quotes = app.controller().quotes().quotes();
    for (id, rect) in app.quote_rects() {
        let Some(quote) = quotes.iter().find(|quote| quote.id == *id) else {
            continue;
        };
        let opacity = quote.opacity(now);
        if opacity <= 0.02 {
            continue;
        }
        let text = quote.quote().text;
        let revealed: String = glyph_units(text)
            .into_iter()
            .take(quote.revealed_units(now))
            .collect();
        let mut text_style = Style::default()
            .fg(shade(opacity))
            .add_modifier(Modifier::ITALIC);
        if quote.blur(now) > 4.0 {
            text_style = text_style.add_modifier(Modifier::DIM);
        }
        let lines = vec![
            Line::from(Span::styled(revealed, text_style)),
            Line::from(Span::styled(
                format!("— {}", quote.quote().author),
                Style::default().fg(shade(opacity * 0.6)),
            ))
            .alignment(Alignment::Right),
        ];
        f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), *rect);
    }
}

fn draw_particles(f: &mut Frame, overlay: &QuoteOverlay, area: Rect, now: Instant) {
    let buffer = f.buffer_mut();
    for burst in overlay.bursts() {
        for particle in burst.frames(now) {
            if particle.x < 0.0 || particle.y < 0.0 {
                continue;
            }
            let col = (particle.x / CELL_WIDTH_PX) as u16;
            let row = (particle.y / CELL_HEIGHT_PX) as u16;
            if !area.contains(Position::new(col, row)) {
                continue;
            }
            let symbol = if particle.size > 1.5 { "•" } else { "·" };
            if let Some(cell) = buffer.cell_mut((col, row)) {
                cell.set_symbol(symbol).set_fg(shade(particle.opacity));
            }
        }
    }
}

fn region_style(editor: &EntryEditor, region: EditorRegion, now: Instant, level: f32) -> Option<Style> {
    let visibility = editor.region_visibility(region, now);
    (visibility > 0.01).then(|| Style::default().fg(shade(level * visibility)))
}

fn focus_block(title: &str, focused: bool, visibility_style: Style) -> Block<'_> {
    let border = if focused {
        Style::default().fg(ACCENT)
    } else {
        visibility_style
    };
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(border)
        .title(Span::styled(title, visibility_style))
}

fn draw_editor(f: &mut Frame, editor: &EntryEditor, area: Rect, now: Instant) {
    let EditorAreas {
        date: date_area,
        mood: mood_area,
        text: text_area,
        tags: tags_area,
        buttons: buttons_area,
        hint: hint_area,
    } = editor_areas(area);

    if let Some(style) = region_style(editor, EditorRegion::DateHeader, now, 0.9) {
        let (date, time) = header_lines(editor.target().map_or_else(Local::now, |entry| entry.date));
        f.render_widget(
            Paragraph::new(vec![
                Line::from(Span::styled(date, style.add_modifier(Modifier::BOLD))),
                Line::from(Span::styled(time, style)),
            ]),
            date_area,
        );
    }

    if let Some(style) = region_style(editor, EditorRegion::MoodSelector, now, 0.7) {
        let spans: Vec<Span> = Mood::ALL
            .iter()
            .flat_map(|mood| {
                let label = mood_chip(*mood);
                let span = if *mood == editor.mood() {
                    Span::styled(label, Style::default().fg(Color::Black).bg(ACCENT))
                } else {
                    Span::styled(label, style)
                };
                [span, Span::raw(" ")]
            })
            .collect();
        let focused = editor.focus() == FocusRegion::Mood;
        f.render_widget(Clear, mood_area);
        f.render_widget(
            Paragraph::new(Line::from(spans)).block(focus_block(" 心情 ", focused, style)),
            mood_area,
        );
    }

    if let Some(style) = region_style(editor, EditorRegion::TextArea, now, 0.9) {
        let focused = editor.focus() == FocusRegion::Content;
        let block = focus_block(" 此刻 ", focused, style);
        let inner = block.inner(text_area);
        let content = editor.content();
        let before_cursor: String = content.as_str().chars().take(content.cursor()).collect();
        let cursor_line = before_cursor.matches('\n').count() as u16;
        let cursor_col = Span::raw(before_cursor.rsplit('\n').next().unwrap_or("")).width() as u16;
        let scroll = cursor_line.saturating_sub(inner.height.saturating_sub(1));
        f.render_widget(Clear, text_area);
        f.render_widget(
            Paragraph::new(content.as_str())
                .style(style)
                .block(block)
                .scroll((scroll, 0)),
            text_area,
        );
        if focused && editor.input_focused() && !editor.is_leaving() {
            f.set_cursor_position(Position::new(
                inner.x + cursor_col.min(inner.width.saturating_sub(1)),
                inner.y + cursor_line - scroll,
            ));
        }
    }

    if let Some(style) = region_style(editor, EditorRegion::TagList, now, 0.7) {
        let focused = editor.focus() == FocusRegion::Tags;
        let mut spans: Vec<Span> = editor
            .tags()
            .iter()
            .enumerate()
            .flat_map(|(index, tag)| {
                let chip_style = if editor.selected_tag() == Some(index) {
                    Style::default().fg(Color::Black).bg(ACCENT)
                } else {
                    style.fg(ACCENT)
                };
                [Span::styled(tag_chip(tag), chip_style), Span::raw(" ")]
            })
            .collect();
        let prompt_width: u16 = spans.iter().map(|span| span.width() as u16).sum();
        let input = editor.tag_input();
        spans.push(Span::styled(input.as_str().to_string(), style));
        let block = focus_block(" 标签 ", focused, style);
        let inner = block.inner(tags_area);
        f.render_widget(Clear, tags_area);
        f.render_widget(Paragraph::new(Line::from(spans)).block(block), tags_area);
        let typing = editor.selected_tag().is_none();
        if focused && typing && editor.input_focused() && !editor.is_leaving() {
            let typed: String = input.as_str().chars().take(input.cursor()).collect();
            let col = prompt_width + Span::raw(typed).width() as u16;
            f.set_cursor_position(Position::new(
                inner.x + col.min(inner.width.saturating_sub(1)),
                inner.y,
            ));
        }
    }

    let [close_area, save_area] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
            .areas(buttons_area);
    if let Some(style) = region_style(editor, EditorRegion::CloseButton, now, 0.6) {
        f.render_widget(Paragraph::new(Span::styled("[Esc] 关闭", style)), close_area);
    }
    if let Some(style) = region_style(editor, EditorRegion::SaveButton, now, 0.9) {
        let save_style = if editor.can_save() {
            style.fg(ACCENT).add_modifier(Modifier::BOLD)
        } else {
            style.add_modifier(Modifier::DIM)
        };
        f.render_widget(
            Paragraph::new(Span::styled("[Ctrl+Enter] 保存", save_style)).alignment(Alignment::Right),
            save_area,
        );
    }
    if let Some(style) = region_style(editor, EditorRegion::Hint, now, 0.35) {
        f.render_widget(
            Paragraph::new(Span::styled(
                "Tab 切换区域 · ←/→ 选择心情 · Enter 添加标签 · ← Del 删除标签 · Ctrl+S 保存",
                style,
            ))
            .alignment(Alignment::Center),
            hint_area,
        );
    }
}

fn draw_footer<R: MemoRepository>(f: &mut Frame, app: &App<R>, footer: Rect) {
    let help = if app.editor_mode() {
        ""
    } else {
        " j/k 选择 · Enter 编辑 · n 新建 · d 删除 · q 冥想 · x 消散 · Ctrl+C 退出"
    };
    let mut spans = vec![Span::styled(help, Style::default().fg(shade(0.35)))];
    if let Some(status) = app.status() {
        spans.push(Span::styled(
            format!("  {status}"),
            Style::default().fg(Color::Rgb(230, 120, 120)),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), footer);
}
