//! Overlay UI state: what the screen-space panels show.
//!
//! Panels here hold no drawing code; the desktop app lays them out with
//! egui and the CLI prints them.
//!
//! # Invariants
//! - The debug panel reads entity state only through the position feed.
//! - The debug panel samples on its own interval, independent of frames.

mod debug;
mod format;
mod panels;
mod stats;

pub use debug::{DebugPanel, DebugSnapshot};
pub use format::fixed2;
pub use panels::{Instructions, loader_label};
pub use stats::FrameStats;

pub fn crate_info() -> &'static str {
    "wingspan-overlay v0.1.0"
}
