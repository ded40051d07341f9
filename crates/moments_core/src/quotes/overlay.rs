//! Floating quote pool with timed spawning, expiry and dismissal.
//!
//! # Responsibility
//! - Decide when the overlay is active from page flags and the policy.
//! - Spawn quotes on a fixed schedule into a bounded pool.
//! - Sequence dismissal: blur/fade, particle hand-off, pool removal.
//!
//! # Invariants
//! - All timers live in this struct and are dropped on deactivation.
//! - A quote is dismissed at most once; removal follows its dismissal.

use crate::motion::timings::{
    QUOTE_DISMISSAL_TOTAL, QUOTE_DWELL, QUOTE_FADE, QUOTE_FIRST_SPAWN, QUOTE_GLYPH_STEP,
    QUOTE_PARTICLE_HANDOFF, QUOTE_SPAWN_DISSIPATE, QUOTE_SPAWN_FIFO,
};
use crate::motion::{ease_out, Deadline, Interval, Tween};
use crate::quotes::catalog::{glyph_units, Quote, QuoteDeck, CATALOG};
use crate::quotes::particles::ParticleBurst;
use log::debug;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const ENTER_FADE: Duration = Duration::from_millis(500);

/// What turns the overlay on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    /// The user toggles a persistent meditation mode.
    Toggled,
    /// Active whenever the timeline is shown and not leaving.
    Automatic,
}

/// How quotes leave the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitStyle {
    /// Per-quote dwell timer, then blur and a particle burst.
    Dissipate,
    /// No per-quote timer; the bounded pool drops its oldest quote.
    Fifo,
}

/// Overlay behavior knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotePolicy {
    pub activation: Activation,
    pub exit: ExitStyle,
    pub spawn_interval: Duration,
    /// Self-expiry for [`ExitStyle::Dissipate`]; ignored by FIFO.
    pub dwell: Duration,
    pub max_visible: usize,
}

impl QuotePolicy {
    pub const MAX_VISIBLE: usize = 4;

    /// Policy with the stock timings of `exit`.
    pub fn new(activation: Activation, exit: ExitStyle) -> Self {
        let spawn_interval = match exit {
            ExitStyle::Dissipate => QUOTE_SPAWN_DISSIPATE,
            ExitStyle::Fifo => QUOTE_SPAWN_FIFO,
        };
        Self {
            activation,
            exit,
            spawn_interval,
            dwell: QUOTE_DWELL,
            max_visible: Self::MAX_VISIBLE,
        }
    }
}

impl Default for QuotePolicy {
    fn default() -> Self {
        Self::new(Activation::Toggled, ExitStyle::Dissipate)
    }
}

/// Visual distance class; affects size and opacity only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthTier {
    Near,
    Mid,
    Far,
}

impl DepthTier {
    pub const ALL: [DepthTier; 3] = [DepthTier::Near, DepthTier::Mid, DepthTier::Far];

    pub fn max_opacity(self) -> f32 {
        match self {
            Self::Near => 0.85,
            Self::Mid => 0.65,
            Self::Far => 0.45,
        }
    }
}

/// Anchor in percent of the viewport (0..100 on both axes).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPos {
    pub x: f32,
    pub y: f32,
}

impl ScreenPos {
    /// Random spot in the left or right margin band, vertically centered-ish.
    fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let x = if rng.gen_bool(0.5) {
            8.0 + rng.gen::<f32>() * 22.0
        } else {
            70.0 + rng.gen::<f32>() * 22.0
        };
        Self {
            x,
            y: 20.0 + rng.gen::<f32>() * 60.0,
        }
    }

    pub fn is_left(&self) -> bool {
        self.x < 50.0
    }
}

/// Screen rectangle in virtual pixels; `x`/`y` is the center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuoteRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Dismissal {
    started_at: Instant,
    handoff: Option<Deadline>,
    removal: Deadline,
}

/// One quote in the pool.
#[derive(Debug, Clone)]
pub struct FloatingQuote {
    pub id: u64,
    pub catalog_index: usize,
    pub position: ScreenPos,
    pub depth: DepthTier,
    spawned_at: Instant,
    expiry: Option<Deadline>,
    dismissal: Option<Dismissal>,
    last_rect: Option<QuoteRect>,
}

impl FloatingQuote {
    pub fn quote(&self) -> &'static Quote {
        &CATALOG[self.catalog_index]
    }

    pub fn is_dismissing(&self) -> bool {
        self.dismissal.is_some()
    }

    pub fn last_rect(&self) -> Option<QuoteRect> {
        self.last_rect
    }

    /// Current opacity: fades in to the tier maximum, fades out on dismissal.
    pub fn opacity(&self, now: Instant) -> f32 {
        let max = self.depth.max_opacity();
        match self.dismissal {
            Some(dismissal) => {
                let fade = Tween {
                    delay: Duration::ZERO,
                    duration: QUOTE_FADE,
                }
                .progress(now.saturating_duration_since(dismissal.started_at));
                max * (1.0 - ease_out(fade))
            }
            None => {
                let enter = Tween {
                    delay: Duration::ZERO,
                    duration: ENTER_FADE,
                }
                .progress(now.saturating_duration_since(self.spawned_at));
                max * ease_out(enter)
            }
        }
    }

    /// Blur radius in virtual pixels (0 while shown, up to 16 while fading).
    pub fn blur(&self, now: Instant) -> f32 {
        self.dismissal.map_or(0.0, |dismissal| {
            let fade = now.saturating_duration_since(dismissal.started_at).as_secs_f32()
                / QUOTE_FADE.as_secs_f32();
            16.0 * fade.clamp(0.0, 1.0)
        })
    }

    /// Number of glyph units revealed so far; all of them once dismissing.
    pub fn revealed_units(&self, now: Instant) -> usize {
        let total = glyph_units(self.quote().text).len();
        if self.dismissal.is_some() {
            return total;
        }
        let elapsed = now.saturating_duration_since(self.spawned_at);
        let steps = elapsed.as_millis() / QUOTE_GLYPH_STEP.as_millis().max(1);
        usize::try_from(steps).map_or(total, |steps| (steps + 1).min(total))
    }
}

/// The floating quote controller.
pub struct QuoteOverlay {
    policy: QuotePolicy,
    rng: StdRng,
    deck: QuoteDeck,
    quotes: Vec<FloatingQuote>,
    bursts: Vec<ParticleBurst>,
    next_id: u64,
    first_spawn: Option<Deadline>,
    spawner: Option<Interval>,
    active: bool,
    meditation: bool,
    page_visible: bool,
    page_leaving: bool,
}

impl QuoteOverlay {
    pub fn new(policy: QuotePolicy, rng: StdRng) -> Self {
        Self {
            policy,
            rng,
            deck: QuoteDeck::new(CATALOG.len()),
            quotes: Vec::new(),
            bursts: Vec::new(),
            next_id: 1,
            first_spawn: None,
            spawner: None,
            active: false,
            meditation: false,
            page_visible: false,
            page_leaving: false,
        }
    }

    pub fn policy(&self) -> &QuotePolicy {
        &self.policy
    }

    pub fn quotes(&self) -> &[FloatingQuote] {
        &self.quotes
    }

    pub fn bursts(&self) -> &[ParticleBurst] {
        &self.bursts
    }

    pub fn deck(&self) -> &QuoteDeck {
        &self.deck
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn meditation(&self) -> bool {
        self.meditation
    }

    /// Feeds the page visibility flags from the controller.
    pub fn set_page(&mut self, visible: bool, leaving: bool, now: Instant) {
        let leaving_started = leaving && !self.page_leaving;
        self.page_visible = visible;
        self.page_leaving = leaving;
        self.reconcile(now);
        if leaving_started {
            // Leaving always clears, even when the overlay was already idle.
            self.deck.reset();
        }
    }

    /// Flips meditation mode. Has no effect on activation under
    /// [`Activation::Automatic`].
    pub fn toggle_meditation(&mut self, now: Instant) -> bool {
        self.meditation = !self.meditation;
        self.reconcile(now);
        self.meditation
    }

    fn wants_active(&self) -> bool {
        let page_ready = self.page_visible && !self.page_leaving;
        match self.policy.activation {
            Activation::Automatic => page_ready,
            Activation::Toggled => page_ready && self.meditation,
        }
    }

    fn reconcile(&mut self, now: Instant) {
        let wanted = self.wants_active();
        if wanted == self.active {
            return;
        }
        self.active = wanted;
        if wanted {
            self.first_spawn = Some(Deadline::after(now, QUOTE_FIRST_SPAWN));
            self.spawner = Some(Interval::starting_at(
                now + self.policy.spawn_interval,
                self.policy.spawn_interval,
            ));
            debug!("event=quote_overlay module=quotes status=active");
        } else {
            self.first_spawn = None;
            self.spawner = None;
            self.dismiss_all(now);
            self.deck.reset();
            debug!("event=quote_overlay module=quotes status=inactive");
        }
    }

    /// Starts dismissal of one quote (user click). Returns `false` when the
    /// quote is unknown or already dismissing.
    pub fn dismiss(&mut self, id: u64, now: Instant) -> bool {
        let exit = self.policy.exit;
        match self.quotes.iter_mut().find(|quote| quote.id == id) {
            Some(quote) if quote.dismissal.is_none() => {
                begin_dismissal(quote, exit, now);
                true
            }
            _ => false,
        }
    }

    /// Dismisses the most recently spawned quote still on screen.
    pub fn dismiss_newest(&mut self, now: Instant) -> bool {
        let newest = self
            .quotes
            .iter()
            .rev()
            .find(|quote| quote.dismissal.is_none())
            .map(|quote| quote.id);
        newest.is_some_and(|id| self.dismiss(id, now))
    }

    fn dismiss_all(&mut self, now: Instant) {
        let exit = self.policy.exit;
        for quote in self.quotes.iter_mut().filter(|q| q.dismissal.is_none()) {
            begin_dismissal(quote, exit, now);
        }
    }

    /// Records where the renderer last drew a quote.
    pub fn report_rect(&mut self, id: u64, rect: QuoteRect) {
        if let Some(quote) = self.quotes.iter_mut().find(|quote| quote.id == id) {
            quote.last_rect = Some(rect);
        }
    }

    /// Advances spawning, expiry, hand-off and removal up to `now`.
    pub fn tick(&mut self, now: Instant) {
        if self.active {
            if self.first_spawn.is_some_and(|deadline| deadline.is_due(now)) {
                self.first_spawn = None;
                self.spawn(now);
            }
            let fired = self
                .spawner
                .as_mut()
                .map(|interval| interval.poll(now))
                .unwrap_or_default();
            for at in fired {
                self.spawn(at);
            }
        }

        let exit = self.policy.exit;
        for quote in &mut self.quotes {
            if quote.dismissal.is_none() {
                if let Some(expiry) = quote.expiry.filter(|expiry| expiry.is_due(now)) {
                    begin_dismissal(quote, exit, expiry.due());
                }
            }
        }

        let mut handoffs = Vec::new();
        for quote in &mut self.quotes {
            if let Some(dismissal) = quote.dismissal.as_mut() {
                if let Some(handoff) = dismissal.handoff.filter(|h| h.is_due(now)) {
                    dismissal.handoff = None;
                    if let Some(rect) = quote.last_rect {
                        handoffs.push((quote.id, rect, handoff.due()));
                    }
                }
            }
        }
        for (id, rect, at) in handoffs {
            self.bursts
                .push(ParticleBurst::spawn(&mut self.rng, id, rect, at));
        }

        self.quotes.retain(|quote| {
            quote
                .dismissal
                .map_or(true, |dismissal| !dismissal.removal.is_due(now))
        });
        self.bursts.retain(|burst| !burst.is_finished(now));
    }

    /// Adds one quote immediately, evicting the oldest when the pool is full.
    pub fn spawn(&mut self, now: Instant) -> Option<u64> {
        let catalog_index = self.deck.draw(&mut self.rng)?;
        while self.quotes.len() >= self.policy.max_visible.max(1) {
            self.quotes.remove(0);
        }
        let id = self.next_id;
        self.next_id += 1;
        let depth = DepthTier::ALL[self.rng.gen_range(0..DepthTier::ALL.len())];
        let expiry = match self.policy.exit {
            ExitStyle::Dissipate => Some(Deadline::after(now, self.policy.dwell)),
            ExitStyle::Fifo => None,
        };
        self.quotes.push(FloatingQuote {
            id,
            catalog_index,
            position: ScreenPos::random(&mut self.rng),
            depth,
            spawned_at: now,
            expiry,
            dismissal: None,
            last_rect: None,
        });
        debug!(
            "event=quote_spawn module=quotes status=ok quote_id={id} catalog_index={catalog_index} pool={}",
            self.quotes.len()
        );
        Some(id)
    }
}

fn begin_dismissal(quote: &mut FloatingQuote, exit: ExitStyle, at: Instant) {
    quote.expiry = None;
    quote.dismissal = Some(match exit {
        ExitStyle::Dissipate => Dismissal {
            started_at: at,
            handoff: Some(Deadline::after(at, QUOTE_PARTICLE_HANDOFF)),
            removal: Deadline::after(at, QUOTE_DISMISSAL_TOTAL),
        },
        ExitStyle::Fifo => Dismissal {
            started_at: at,
            handoff: None,
            removal: Deadline::after(at, QUOTE_FADE),
        },
    });
}
