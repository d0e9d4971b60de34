//! Scene composition: entity controllers, cameras, picking and the
//! declarative scene graph handed to renderers.
//!
//! # Invariants
//! - Procedural offsets (bob, wing tilt) are pure functions of state and
//!   elapsed time; they are never written back into entity state.
//! - The butterfly camera follows rigidly; the city camera lerps.
//! - Everything here runs on the frame-loop thread.

pub mod butterfly;
pub mod camera;
pub mod city;
pub mod clock;
pub mod composer;
pub mod environment;
pub mod graph;
pub mod motion;
pub mod orbit;
pub mod picking;

pub use butterfly::Butterfly;
pub use camera::{Camera, CameraPose, FollowCamera, LerpCamera};
pub use city::CityModel;
pub use clock::{FrameClock, FrameTick};
pub use composer::{
    ButterflyScene, CityScene, ModelSlot, OverlayLayout, Scene, SceneAssets, SceneKind,
    UnknownScene, compose,
};
pub use environment::{Environment, Ground, Light, Sky, StarPoint, Stars};
pub use graph::{Label, NodeKind, SceneGraph, SceneNode};
pub use orbit::{DragMode, OrbitControls};
pub use picking::{HoverEvent, HoverTracker, Ray, pick_model};

pub fn crate_info() -> &'static str {
    "wingspan-scene v0.1.0"
}
