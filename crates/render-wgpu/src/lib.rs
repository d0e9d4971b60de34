//! wgpu render backend for the scene graph.
//!
//! Draws loaded models with ambient, directional and point lighting, the
//! wireframe terrain and axes as line lists, and the star field as
//! camera-facing quads. The clear colour comes from the sky.
//!
//! # Invariants
//! - The renderer never mutates scene state.
//! - Model geometry is uploaded once per `ModelId` and drawn by id.

mod gpu;
mod shaders;

pub use gpu::WgpuRenderer;
