//! Animation Player: drives one clip of a loaded model.
//!
//! # Invariants
//! - A handle is created once per mounted model and advanced by frame delta.
//! - Sampling never mutates the model; poses are recomputed every frame.

mod player;
mod sample;

pub use player::AnimationHandle;
pub use sample::{sample_clip_locals, sample_quat, sample_vec3};
