use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Horloge de frames : delta entre frames et FPS par fenêtre glissante.
///
/// # Example
/// ```
/// use ex_render::fps::FrameClock;
/// let mut clock = FrameClock::new(30);
/// assert_eq!(clock.tick(), 0.0);
/// assert!(clock.fps() >= 0.0);
/// ```
pub struct FrameClock {
    timestamps: VecDeque<Instant>,
    window: usize,
    fps: f64,
    /// Last frame delta, in milliseconds.
    pub frame_time_ms: f64,
}

impl FrameClock {
    /// Create a clock averaging FPS over `window` frames.
    #[must_use]
    pub fn new(window: usize) -> Self {
        Self {
            timestamps: VecDeque::with_capacity(window + 1),
            window: window.max(2),
            fps: 0.0,
            frame_time_ms: 0.0,
        }
    }

    /// Record a frame now. Returns the seconds elapsed since the previous
    /// frame (0 on the first call).
    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> f32 {
        let dt = self
            .timestamps
            .back()
            .map_or(Duration::ZERO, |&last| now.saturating_duration_since(last));
        self.frame_time_ms = dt.as_secs_f64() * 1000.0;

        self.timestamps.push_back(now);
        if self.timestamps.len() > self.window {
            self.timestamps.pop_front();
        }
        if let Some(&first) = self.timestamps.front() {
            let span = now.saturating_duration_since(first).as_secs_f64();
            if span > 0.0 {
                self.fps = (self.timestamps.len() - 1) as f64 / span;
            }
        }
        dt.as_secs_f32()
    }

    /// FPS moyen sur la fenêtre.
    #[must_use]
    pub fn fps(&self) -> f64 {
        self.fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deltas_and_rate_follow_timestamps() {
        let mut clock = FrameClock::new(4);
        let t0 = Instant::now();
        assert_eq!(clock.tick_at(t0), 0.0);
        let dt = clock.tick_at(t0 + Duration::from_millis(50));
        assert!((dt - 0.05).abs() < 1e-6);
        clock.tick_at(t0 + Duration::from_millis(100));
        assert!((clock.fps() - 20.0).abs() < 1e-6);
        assert!((clock.frame_time_ms - 50.0).abs() < 1e-6);
    }

    #[test]
    fn window_is_bounded() {
        let mut clock = FrameClock::new(3);
        let t0 = Instant::now();
        for i in 0..10 {
            clock.tick_at(t0 + Duration::from_millis(i * 10));
        }
        assert_eq!(clock.timestamps.len(), 3);
        assert!((clock.fps() - 100.0).abs() < 1e-3);
    }
}
