use std::time::{Duration, Instant};

/// Timing of one rendered frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    /// Seconds since the clock started.
    pub elapsed: f32,
    /// Seconds since the previous frame.
    pub delta: f32,
    /// Frame counter, starting at 1 for the first tick.
    pub frame: u64,
}

impl FrameTick {
    /// Tick number `frame` of a fixed-rate loop, as used by headless runs.
    pub fn fixed(frame: u64, fps: f32) -> Self {
        let delta = 1.0 / fps;
        Self {
            elapsed: frame as f32 * delta,
            delta,
            frame,
        }
    }
}

/// Frame clock started when a scene mounts.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
    frame: u64,
}

impl FrameClock {
    pub fn start_at(now: Instant) -> Self {
        Self {
            start: now,
            last: now,
            frame: 0,
        }
    }

    pub fn start() -> Self {
        Self::start_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> FrameTick {
        let delta = now.saturating_duration_since(self.last).as_secs_f32();
        self.last = now;
        self.frame += 1;
        FrameTick {
            elapsed: now.saturating_duration_since(self.start).as_secs_f32(),
            delta,
            frame: self.frame,
        }
    }

    pub fn tick(&mut self) -> FrameTick {
        self.tick_at(Instant::now())
    }

    pub fn elapsed(&self) -> Duration {
        self.last.saturating_duration_since(self.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_measure_from_start() {
        let t0 = Instant::now();
        let mut clock = FrameClock::start_at(t0);
        let a = clock.tick_at(t0 + Duration::from_millis(16));
        let b = clock.tick_at(t0 + Duration::from_millis(48));
        assert_eq!(a.frame, 1);
        assert_eq!(b.frame, 2);
        assert!((a.delta - 0.016).abs() < 1e-4);
        assert!((b.delta - 0.032).abs() < 1e-4);
        assert!((b.elapsed - 0.048).abs() < 1e-4);
        assert_eq!(clock.elapsed(), Duration::from_millis(48));
    }

    #[test]
    fn long_stalls_pass_their_full_delta() {
        let t0 = Instant::now();
        let mut clock = FrameClock::start_at(t0);
        let tick = clock.tick_at(t0 + Duration::from_secs(3));
        assert!((tick.delta - 3.0).abs() < 1e-4);
        assert!((tick.elapsed - 3.0).abs() < 1e-4);
    }

    #[test]
    fn fixed_ticks() {
        let tick = FrameTick::fixed(30, 60.0);
        assert!((tick.elapsed - 0.5).abs() < 1e-6);
        assert!((tick.delta - 1.0 / 60.0).abs() < 1e-6);
    }
}
