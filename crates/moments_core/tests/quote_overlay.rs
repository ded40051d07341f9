use moments_core::motion::timings::{
    QUOTE_DISMISSAL_TOTAL, QUOTE_DWELL, QUOTE_FADE, QUOTE_PARTICLE_HANDOFF,
};
use moments_core::quotes::{
    Activation, ExitStyle, QuoteOverlay, QuotePolicy, QuoteRect, CATALOG,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::time::{Duration, Instant};

fn overlay(activation: Activation, exit: ExitStyle) -> QuoteOverlay {
    QuoteOverlay::new(
        QuotePolicy::new(activation, exit),
        StdRng::seed_from_u64(42),
    )
}

fn rect() -> QuoteRect {
    QuoteRect {
        x: 200.0,
        y: 120.0,
        width: 160.0,
        height: 48.0,
    }
}

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

#[test]
fn automatic_overlay_spawns_after_half_second_then_on_interval() {
    let start = Instant::now();
    let mut quotes = overlay(Activation::Automatic, ExitStyle::Dissipate);
    quotes.set_page(true, false, start);
    assert!(quotes.is_active());

    quotes.tick(start + ms(499));
    assert!(quotes.quotes().is_empty());
    quotes.tick(start + ms(500));
    assert_eq!(quotes.quotes().len(), 1);

    quotes.tick(start + Duration::from_secs(8));
    assert_eq!(quotes.quotes().len(), 2);
    quotes.tick(start + Duration::from_secs(16));
    assert_eq!(quotes.quotes().len(), 3);
}

#[test]
fn fifo_policy_uses_five_second_interval_without_expiry() {
    let start = Instant::now();
    let mut quotes = overlay(Activation::Automatic, ExitStyle::Fifo);
    quotes.set_page(true, false, start);
    quotes.tick(start + ms(500));
    quotes.tick(start + Duration::from_secs(5));
    assert_eq!(quotes.quotes().len(), 2);

    quotes.tick(start + Duration::from_secs(60));
    assert!(quotes.quotes().iter().all(|quote| !quote.is_dismissing()));
    assert_eq!(quotes.quotes().len(), QuotePolicy::MAX_VISIBLE);
}

#[test]
fn fifth_quote_evicts_the_oldest() {
    let start = Instant::now();
    let mut quotes = overlay(Activation::Toggled, ExitStyle::Fifo);
    let ids: Vec<u64> = (0..5).filter_map(|_| quotes.spawn(start)).collect();
    assert_eq!(ids.len(), 5);

    let remaining: Vec<u64> = quotes.quotes().iter().map(|quote| quote.id).collect();
    assert_eq!(remaining, ids[1..].to_vec());
}

#[test]
fn dwell_expiry_hands_off_to_particles_then_removes() {
    let start = Instant::now();
    let mut quotes = overlay(Activation::Toggled, ExitStyle::Dissipate);
    let id = quotes.spawn(start).unwrap();
    quotes.report_rect(id, rect());

    quotes.tick(start + QUOTE_DWELL - ms(1));
    assert!(!quotes.quotes()[0].is_dismissing());

    let expired = start + QUOTE_DWELL;
    quotes.tick(expired);
    assert!(quotes.quotes()[0].is_dismissing());
    assert!(quotes.bursts().is_empty());
    assert_eq!(quotes.quotes()[0].opacity(expired + QUOTE_FADE), 0.0);

    quotes.tick(expired + QUOTE_PARTICLE_HANDOFF);
    assert_eq!(quotes.bursts().len(), 1);
    assert_eq!(quotes.bursts()[0].quote_id, id);
    assert_eq!(quotes.bursts()[0].particles.len(), 12);

    quotes.tick(expired + QUOTE_DISMISSAL_TOTAL - ms(1));
    assert_eq!(quotes.quotes().len(), 1);
    quotes.tick(expired + QUOTE_DISMISSAL_TOTAL);
    assert!(quotes.quotes().is_empty());

    let lifetime = quotes.bursts().first().map(|burst| burst.lifetime());
    if let Some(lifetime) = lifetime {
        assert!(lifetime <= ms(7_800) + ms(500));
        quotes.tick(expired + QUOTE_PARTICLE_HANDOFF + lifetime);
    }
    assert!(quotes.bursts().is_empty());
}

#[test]
fn quote_without_reported_rect_dissolves_without_burst() {
    let start = Instant::now();
    let mut quotes = overlay(Activation::Toggled, ExitStyle::Dissipate);
    let id = quotes.spawn(start).unwrap();
    assert!(quotes.dismiss(id, start));
    assert!(!quotes.dismiss(id, start));
    quotes.tick(start + QUOTE_PARTICLE_HANDOFF);
    assert!(quotes.bursts().is_empty());
}

#[test]
fn dismiss_newest_picks_latest_visible_quote() {
    let start = Instant::now();
    let mut quotes = overlay(Activation::Toggled, ExitStyle::Dissipate);
    let first = quotes.spawn(start).unwrap();
    let second = quotes.spawn(start).unwrap();
    assert!(quotes.dismiss_newest(start));
    assert!(quotes.dismiss_newest(start));
    assert!(!quotes.dismiss_newest(start));
    let dismissed: Vec<u64> = quotes
        .quotes()
        .iter()
        .filter(|quote| quote.is_dismissing())
        .map(|quote| quote.id)
        .collect();
    assert_eq!(dismissed, vec![first, second]);
}

#[test]
fn page_leaving_force_dismisses_and_clears_used_set() {
    let start = Instant::now();
    let mut quotes = overlay(Activation::Automatic, ExitStyle::Fifo);
    quotes.set_page(true, false, start);
    quotes.tick(start + ms(500));
    assert_eq!(quotes.deck().used_count(), 1);

    let leaving = start + Duration::from_secs(1);
    quotes.set_page(true, true, leaving);
    assert!(!quotes.is_active());
    assert_eq!(quotes.deck().used_count(), 0);
    assert!(quotes.quotes().iter().all(|quote| quote.is_dismissing()));

    quotes.tick(leaving + QUOTE_FADE);
    assert!(quotes.quotes().is_empty());
    assert!(quotes.bursts().is_empty());

    quotes.tick(leaving + Duration::from_secs(30));
    assert!(quotes.quotes().is_empty());
}

#[test]
fn toggled_overlay_follows_meditation_switch() {
    let start = Instant::now();
    let mut quotes = overlay(Activation::Toggled, ExitStyle::Dissipate);
    quotes.set_page(true, false, start);
    assert!(!quotes.is_active());

    assert!(quotes.toggle_meditation(start));
    assert!(quotes.is_active());
    quotes.tick(start + ms(500));
    assert_eq!(quotes.quotes().len(), 1);

    assert!(!quotes.toggle_meditation(start + Duration::from_secs(1)));
    assert!(!quotes.is_active());
    assert_eq!(quotes.deck().used_count(), 0);
    assert!(quotes.quotes()[0].is_dismissing());
}

#[test]
fn catalog_is_exhausted_before_any_repeat() {
    let start = Instant::now();
    let mut quotes = overlay(Activation::Toggled, ExitStyle::Fifo);
    let mut seen = HashSet::new();
    for _ in 0..CATALOG.len() {
        let id = quotes.spawn(start).unwrap();
        let quote = quotes
            .quotes()
            .iter()
            .find(|quote| quote.id == id)
            .unwrap();
        assert!(seen.insert(quote.catalog_index));
    }
    assert_eq!(quotes.deck().used_count(), CATALOG.len());

    quotes.spawn(start).unwrap();
    assert_eq!(quotes.deck().used_count(), 1);
}
