//! Model loading: glTF/GLB import into CPU-side model data.
//!
//! Renderers consume models by [`ModelId`](wingspan_common::ModelId), never
//! by file path. Loading runs off the frame loop and reports progress.
//!
//! # Invariants
//! - Node indices in a `ModelData` match the source document.
//! - Every primitive references an existing node.

mod import;
mod loader;
mod model;

#[cfg(test)]
mod fixtures;

pub use import::{import_file, import_slice};
pub use loader::{LoadProgress, ModelLoader, PendingModel};
pub use model::{
    Aabb, AnimationClip, Interpolation, MeshPrimitive, MeshVertex, ModelData, NodeData, Skin,
    SkinBinding, TrackQuat, TrackVec3,
};

/// Errors from model loading.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("no triangle geometry in {0}")]
    NoGeometry(String),
    #[error("loader thread for {0} exited without a result")]
    LoaderLost(String),
}

pub fn crate_info() -> &'static str {
    "wingspan-assets v0.1.0"
}
