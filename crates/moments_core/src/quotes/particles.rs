//! Particle bursts left behind by a dissipating quote.
//!
//! Coordinates are virtual pixels relative to the burst anchor (the quote's
//! last known rectangle center).

use crate::motion::{ease_out, Deadline};
use crate::quotes::overlay::QuoteRect;
use rand::Rng;
use std::time::{Duration, Instant};

pub const PARTICLES_PER_BURST: usize = 12;
const START_OPACITY: f32 = 0.6;
const END_SCALE: f32 = 0.1;
const BURST_TAIL: Duration = Duration::from_millis(500);

/// One drifting speck.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub start_x: f32,
    pub start_y: f32,
    pub drift_x: f32,
    pub drift_y: f32,
    pub size: f32,
    pub delay: Duration,
    pub duration: Duration,
}

/// Sampled particle state for drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleFrame {
    pub x: f32,
    pub y: f32,
    pub opacity: f32,
    pub size: f32,
}

impl Particle {
    fn random<R: Rng + ?Sized>(rng: &mut R, anchor: &QuoteRect) -> Self {
        Self {
            start_x: (rng.gen::<f32>() - 0.5) * anchor.width,
            start_y: (rng.gen::<f32>() - 0.5) * anchor.height,
            drift_x: (rng.gen::<f32>() - 0.5) * 200.0,
            drift_y: -30.0 - rng.gen::<f32>() * 80.0,
            size: rng.gen::<f32>() * 2.0 + 0.5,
            delay: Duration::from_secs_f32(rng.gen::<f32>() * 0.8),
            duration: Duration::from_secs_f32(4.0 + rng.gen::<f32>() * 3.0),
        }
    }

    pub fn end(&self) -> Duration {
        self.delay + self.duration
    }

    /// Position/opacity `elapsed` after the burst started; `None` once faded.
    pub fn sample(&self, elapsed: Duration) -> Option<ParticleFrame> {
        if elapsed >= self.end() {
            return None;
        }
        let linear = if elapsed <= self.delay {
            0.0
        } else {
            (elapsed - self.delay).as_secs_f32() / self.duration.as_secs_f32()
        };
        let t = ease_out(linear);
        Some(ParticleFrame {
            x: self.start_x + self.drift_x * t,
            y: self.start_y + self.drift_y * t,
            opacity: START_OPACITY * (1.0 - t),
            size: self.size * (1.0 - (1.0 - END_SCALE) * t),
        })
    }
}

/// Particles anchored to the rectangle a quote occupied when it faded.
#[derive(Debug, Clone)]
pub struct ParticleBurst {
    pub quote_id: u64,
    pub anchor: QuoteRect,
    pub particles: Vec<Particle>,
    started_at: Instant,
    gone: Deadline,
}

impl ParticleBurst {
    pub fn spawn<R: Rng + ?Sized>(
        rng: &mut R,
        quote_id: u64,
        anchor: QuoteRect,
        now: Instant,
    ) -> Self {
        let particles: Vec<Particle> = (0..PARTICLES_PER_BURST)
            .map(|_| Particle::random(rng, &anchor))
            .collect();
        let longest = particles
            .iter()
            .map(Particle::end)
            .max()
            .unwrap_or_default();
        Self {
            quote_id,
            anchor,
            particles,
            started_at: now,
            gone: Deadline::after(now, longest + BURST_TAIL),
        }
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        self.gone.is_due(now)
    }

    pub fn lifetime(&self) -> Duration {
        self.gone.due().saturating_duration_since(self.started_at)
    }

    /// Absolute frames (anchor applied) of every still-visible particle.
    pub fn frames(&self, now: Instant) -> Vec<ParticleFrame> {
        let elapsed = now.saturating_duration_since(self.started_at);
        self.particles
            .iter()
            .filter_map(|particle| particle.sample(elapsed))
            .map(|frame| ParticleFrame {
                x: self.anchor.x + frame.x,
                y: self.anchor.y + frame.y,
                ..frame
            })
            .collect()
    }
}
