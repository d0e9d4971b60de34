use crate::format::fixed2;
use glam::Vec3;
use std::fmt;
use std::time::{Duration, Instant};
use wingspan_common::PositionFeed;

/// Position copied out of the feed at one sample.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DebugSnapshot {
    pub position: Vec3,
}

impl fmt::Display for DebugSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.position;
        write!(
            f,
            "Position: x: {}, y: {}, z: {}",
            fixed2(p.x),
            fixed2(p.y),
            fixed2(p.z)
        )
    }
}

/// Position read-out that samples the feed on a fixed interval.
///
/// The first sample is taken one interval after creation; until then the
/// panel shows the origin. Dropping the panel stops sampling.
#[derive(Debug)]
pub struct DebugPanel {
    feed: PositionFeed,
    interval: Duration,
    next_sample: Instant,
    snapshot: DebugSnapshot,
}

impl DebugPanel {
    pub fn start_at(feed: PositionFeed, interval: Duration, now: Instant) -> Self {
        tracing::debug!(interval_ms = interval.as_millis() as u64, "debug panel started");
        Self {
            feed,
            interval,
            next_sample: now + interval,
            snapshot: DebugSnapshot::default(),
        }
    }

    pub fn start(feed: PositionFeed, interval: Duration) -> Self {
        Self::start_at(feed, interval, Instant::now())
    }

    /// Take a sample if one is due. Returns whether the snapshot changed.
    ///
    /// A late call takes a single sample; missed ticks are not replayed.
    pub fn poll_at(&mut self, now: Instant) -> bool {
        if now < self.next_sample {
            return false;
        }
        while self.next_sample <= now && !self.interval.is_zero() {
            self.next_sample += self.interval;
        }
        if self.interval.is_zero() {
            self.next_sample = now;
        }
        self.sample()
    }

    pub fn poll(&mut self) -> bool {
        self.poll_at(Instant::now())
    }

    /// Copy the feed into the snapshot now. Unset feed reads as the origin.
    pub fn sample(&mut self) -> bool {
        let next = DebugSnapshot {
            position: self.feed.latest_or_origin(),
        };
        let changed = next != self.snapshot;
        self.snapshot = next;
        changed
    }

    pub fn snapshot(&self) -> DebugSnapshot {
        self.snapshot
    }

    pub fn text(&self) -> String {
        self.snapshot.to_string()
    }
}
