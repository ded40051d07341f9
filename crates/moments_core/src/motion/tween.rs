//! Delayed, fixed-length progress curves.

use std::time::Duration;

/// Progress of one animated property: waits `delay`, then runs `duration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tween {
    pub delay: Duration,
    pub duration: Duration,
}

impl Tween {
    pub const fn new(delay_ms: u64, duration_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            duration: Duration::from_millis(duration_ms),
        }
    }

    /// Time from start until the tween has fully completed.
    pub fn end(&self) -> Duration {
        self.delay + self.duration
    }

    /// Linear progress in `[0, 1]` after `elapsed` since the tween started.
    pub fn progress(&self, elapsed: Duration) -> f32 {
        if elapsed <= self.delay {
            return 0.0;
        }
        if self.duration.is_zero() {
            return 1.0;
        }
        let running = (elapsed - self.delay).as_secs_f32();
        (running / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }
}

/// Cubic ease-out.
pub fn ease_out(t: f32) -> f32 {
    let inv = 1.0 - t.clamp(0.0, 1.0);
    1.0 - inv * inv * inv
}

#[cfg(test)]
mod tests {
    use super::{ease_out, Tween};
    use std::time::Duration;

    #[test]
    fn progress_waits_for_delay_then_clamps() {
        let tween = Tween::new(100, 400);
        assert_eq!(tween.progress(Duration::from_millis(50)), 0.0);
        assert!((tween.progress(Duration::from_millis(300)) - 0.5).abs() < 1e-6);
        assert_eq!(tween.progress(Duration::from_millis(900)), 1.0);
        assert_eq!(tween.end(), Duration::from_millis(500));
    }

    #[test]
    fn ease_out_hits_endpoints() {
        assert_eq!(ease_out(0.0), 0.0);
        assert!((ease_out(1.0) - 1.0).abs() < 1e-6);
        assert!(ease_out(0.5) > 0.5);
    }
}
