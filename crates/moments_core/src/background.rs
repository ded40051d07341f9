//! Background ambience: parallax particle layers and occasional streaks.
//!
//! # Responsibility
//! - Advance the particle field once per frame, regardless of view state.
//! - Ramp a speed multiplier toward 0 (paused) or 1 (running).
//! - Reinitialize every layer when the field is resized.
//!
//! # Invariants
//! - The multiplier never snaps; it moves 2% of the gap per frame.
//! - Particle coordinates stay inside `[-10, height + 10]` vertically.

use rand::rngs::StdRng;
use rand::Rng;
use std::f32::consts::TAU;

const RAMP_RATE: f32 = 0.02;
const TIME_STEP: f32 = 0.008;
const SWAY: f32 = 0.15;
const WRAP_MARGIN: f32 = 10.0;
const BLUE_SHARE: f64 = 0.12;
const STREAK_CHANCE: f32 = 0.003;
const STREAK_MIN_SPEED: f32 = 0.1;
const STREAK_DECAY: f32 = 0.015;

/// Static parameters of one parallax layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerSpec {
    pub speed: f32,
    pub size: f32,
    pub opacity: f32,
    pub count: usize,
}

pub const LAYERS: [LayerSpec; 3] = [
    LayerSpec {
        speed: 0.015,
        size: 0.3,
        opacity: 0.08,
        count: 60,
    },
    LayerSpec {
        speed: 0.03,
        size: 0.5,
        opacity: 0.12,
        count: 40,
    },
    LayerSpec {
        speed: 0.06,
        size: 0.8,
        opacity: 0.18,
        count: 25,
    },
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientParticle {
    pub x: f32,
    pub y: f32,
    pub base_size: f32,
    pub phase: f32,
    pub is_blue: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub spec: LayerSpec,
    pub particles: Vec<AmbientParticle>,
}

/// A short diagonal light trail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Streak {
    pub x: f32,
    pub y: f32,
    pub length: f32,
    pub angle: f32,
    pub speed: f32,
    pub opacity: f32,
    pub life: f32,
}

impl Streak {
    /// Tail end of the visible segment.
    pub fn tail(&self) -> (f32, f32) {
        (
            self.x - self.angle.cos() * self.length * self.life,
            self.y - self.angle.sin() * self.length * self.life,
        )
    }
}

/// Drawable state of one particle for the current frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Speck {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub opacity: f32,
    pub is_blue: bool,
}

/// The animated particle field.
pub struct Ambience {
    rng: StdRng,
    width: f32,
    height: f32,
    time: f32,
    speed: f32,
    paused: bool,
    layers: Vec<Layer>,
    streaks: Vec<Streak>,
}

impl Ambience {
    pub fn new(width: f32, height: f32, rng: StdRng) -> Self {
        let mut ambience = Self {
            rng,
            width: 0.0,
            height: 0.0,
            time: 0.0,
            speed: 1.0,
            paused: false,
            layers: Vec::new(),
            streaks: Vec::new(),
        };
        ambience.resize(width, height);
        ambience
    }

    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    pub fn speed_multiplier(&self) -> f32 {
        self.speed
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn streaks(&self) -> &[Streak] {
        &self.streaks
    }

    /// Sets the pause target; the multiplier follows over the next frames.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Resizes the field and scatters every layer afresh.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width.max(1.0);
        self.height = height.max(1.0);
        let (w, h) = (self.width, self.height);
        let rng = &mut self.rng;
        self.layers = LAYERS
            .iter()
            .map(|spec| Layer {
                spec: *spec,
                particles: (0..spec.count)
                    .map(|_| AmbientParticle {
                        x: rng.gen::<f32>() * w,
                        y: rng.gen::<f32>() * h,
                        base_size: spec.size + rng.gen::<f32>() * 0.3,
                        phase: rng.gen::<f32>() * TAU,
                        is_blue: rng.gen_bool(BLUE_SHARE),
                    })
                    .collect(),
            })
            .collect();
    }

    /// Advances one animation frame.
    pub fn step(&mut self) {
        let target = if self.paused { 0.0 } else { 1.0 };
        self.speed += (target - self.speed) * RAMP_RATE;
        let m = self.speed;
        self.time += TIME_STEP * m;

        let (width, height, time) = (self.width, self.height, self.time);
        for layer in &mut self.layers {
            let rise = layer.spec.speed * m;
            for particle in &mut layer.particles {
                particle.y -= rise;
                particle.x += (time + particle.phase).sin() * SWAY * m;
                if particle.y < -WRAP_MARGIN {
                    particle.y = height + WRAP_MARGIN;
                    particle.x = self.rng.gen::<f32>() * width;
                }
            }
        }

        if m > STREAK_MIN_SPEED && self.rng.gen::<f32>() < STREAK_CHANCE * m {
            let streak = Streak {
                x: self.rng.gen::<f32>() * width,
                y: self.rng.gen::<f32>() * height * 0.5,
                length: 80.0 + self.rng.gen::<f32>() * 120.0,
                angle: std::f32::consts::PI * 0.15 + self.rng.gen::<f32>() * 0.2,
                speed: 2.0 + self.rng.gen::<f32>() * 2.0,
                opacity: 0.15 + self.rng.gen::<f32>() * 0.1,
                life: 1.0,
            };
            self.streaks.push(streak);
        }

        self.streaks.retain_mut(|streak| {
            streak.x += streak.angle.cos() * streak.speed * m;
            streak.y += streak.angle.sin() * streak.speed * m;
            streak.life -= STREAK_DECAY * m;
            streak.life > 0.0
        });
    }

    /// Per-particle size/opacity with breathing and twinkle applied.
    pub fn specks(&self) -> impl Iterator<Item = Speck> + '_ {
        let time = self.time;
        self.layers.iter().flat_map(move |layer| {
            layer.particles.iter().map(move |particle| {
                let breathe = 1.0 + (time * 0.5 + particle.phase).sin() * 0.3;
                let twinkle = 0.7 + (time * 2.0 + particle.phase * 3.0).sin() * 0.3;
                let opacity = layer.spec.opacity * twinkle;
                Speck {
                    x: particle.x,
                    y: particle.y,
                    size: particle.base_size * breathe,
                    opacity: if particle.is_blue {
                        opacity * 1.5
                    } else {
                        opacity
                    },
                    is_blue: particle.is_blue,
                }
            })
        })
    }
}
