//! Renderer-agnostic interface over the scene graph.
//!
//! # Invariants
//! - Renderers never mutate scene state; they read a graph and a view.
//! - Every frame is rendered from a freshly built graph.
//!
//! The debug text renderer prints a frame instead of drawing it. The CLI and
//! tests use it; the desktop app uses the wgpu backend behind the same trait.

mod renderer;

pub use renderer::{DebugTextRenderer, RenderView, Renderer};

pub fn crate_info() -> &'static str {
    "wingspan-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
