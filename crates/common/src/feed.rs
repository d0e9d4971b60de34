use glam::Vec3;
use std::cell::Cell;
use std::rc::Rc;

/// Observable slot carrying the last published entity position.
///
/// Clones share the same slot. The publisher and every reader are injected
/// with a clone at construction time, and `Rc` keeps all of them on the
/// frame-loop thread. Last writer wins.
#[derive(Debug, Clone, Default)]
pub struct PositionFeed {
    slot: Rc<Cell<Option<Vec3>>>,
}

impl PositionFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the slot with a new position.
    pub fn publish(&self, position: Vec3) {
        self.slot.set(Some(position));
    }

    /// Last published value, if any.
    pub fn latest(&self) -> Option<Vec3> {
        self.slot.get()
    }

    /// Last published value, or the origin when nothing has been published.
    pub fn latest_or_origin(&self) -> Vec3 {
        self.latest().unwrap_or(Vec3::ZERO)
    }
}
