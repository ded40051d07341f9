//! Ambient floating quotations.
//!
//! # Responsibility
//! - Hold the fixed quote catalog and the no-repeat drawing deck.
//! - Run the bounded pool of floating quotes and their dissipation bursts.
//!
//! # Invariants
//! - At most `QuotePolicy::max_visible` quotes are in the pool.
//! - The deck never repeats an index until every index has been drawn.
//! - Deactivation cancels all spawn timers and clears the deck memory.

pub mod catalog;
pub mod overlay;
pub mod particles;

pub use catalog::{daily_quote, daily_quote_at, glyph_units, Quote, QuoteDeck, CATALOG};
pub use overlay::{
    Activation, DepthTier, ExitStyle, FloatingQuote, QuoteOverlay, QuotePolicy, QuoteRect,
    ScreenPos,
};
pub use particles::{Particle, ParticleBurst, ParticleFrame};
