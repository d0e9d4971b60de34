use std::collections::VecDeque;
use std::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_secs(1);

/// Frame-rate counter over a sliding one-second window.
#[derive(Debug, Default)]
pub struct FrameStats {
    frames: VecDeque<Instant>,
    last_frame_time: Option<Duration>,
}

impl FrameStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_at(&mut self, now: Instant) {
        if let Some(&prev) = self.frames.back() {
            self.last_frame_time = Some(now.saturating_duration_since(prev));
        }
        self.frames.push_back(now);
        while let Some(&front) = self.frames.front() {
            if now.saturating_duration_since(front) > WINDOW {
                self.frames.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn record(&mut self) {
        self.record_at(Instant::now());
    }

    /// Frames recorded in the last second.
    pub fn fps(&self) -> usize {
        self.frames.len()
    }

    /// Duration of the most recent frame in milliseconds.
    pub fn frame_ms(&self) -> Option<f32> {
        self.last_frame_time.map(|d| d.as_secs_f32() * 1000.0)
    }

    pub fn text(&self) -> String {
        match self.frame_ms() {
            Some(ms) => format!("{} FPS ({ms:.1} ms)", self.fps()),
            None => format!("{} FPS", self.fps()),
        }
    }
}
