//! Fixed durations of the staged view transitions.

use std::time::Duration;

/// Timeline exit before the editor mounts.
pub const PAGE_EXIT: Duration = Duration::from_millis(700);
/// Editor exit before the timeline returns.
pub const EDITOR_EXIT: Duration = Duration::from_millis(600);
/// Editor opening settle time before the content field takes focus.
pub const EDITOR_FOCUS_SETTLE: Duration = Duration::from_millis(800);
/// Card fade after deletion before the ghost leaves the timeline.
pub const CARD_DELETE_FADE: Duration = Duration::from_millis(800);
/// Per-card stagger of the timeline exit animation.
pub const CARD_EXIT_STAGGER: Duration = Duration::from_millis(50);
/// Duration of one card's exit slide.
pub const CARD_EXIT: Duration = Duration::from_millis(500);

/// First quote after overlay activation.
pub const QUOTE_FIRST_SPAWN: Duration = Duration::from_millis(500);
/// Spawn period when quotes dissipate into particles.
pub const QUOTE_SPAWN_DISSIPATE: Duration = Duration::from_secs(8);
/// Spawn period of the FIFO overlay.
pub const QUOTE_SPAWN_FIFO: Duration = Duration::from_secs(5);
/// Self-expiry of a dissipating quote.
pub const QUOTE_DWELL: Duration = Duration::from_secs(20);
/// Blur/fade of a dismissed quote.
pub const QUOTE_FADE: Duration = Duration::from_millis(1500);
/// Offset into the dismissal at which the particle burst spawns.
pub const QUOTE_PARTICLE_HANDOFF: Duration = Duration::from_millis(1200);
/// Dismissal start to pool removal.
pub const QUOTE_DISMISSAL_TOTAL: Duration = Duration::from_secs(8);
/// Reveal time per glyph unit of quote text.
pub const QUOTE_GLYPH_STEP: Duration = Duration::from_millis(80);
