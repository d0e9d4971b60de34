use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use uuid::Uuid;

/// Unique identifier for a loaded model.
///
/// Renderers cache GPU buffers by this id, never by file path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModelId(pub Uuid);

impl ModelId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First eight hex digits, for logs and debug output.
    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for ModelId {
    fn default() -> Self {
        Self::new()
    }
}

/// Euler orientation in radians, applied as intrinsic X, then Y, then Z.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    /// Rotation about X.
    pub pitch: f32,
    /// Rotation about Y.
    pub yaw: f32,
    /// Rotation about Z.
    pub roll: f32,
}

impl Orientation {
    /// Facing away from the default camera (yaw of half a turn).
    pub const FORWARD: Self = Self {
        pitch: 0.0,
        yaw: PI,
        roll: 0.0,
    };

    pub const fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }

    pub fn to_quat(self) -> Quat {
        Quat::from_rotation_x(self.pitch)
            * Quat::from_rotation_y(self.yaw)
            * Quat::from_rotation_z(self.roll)
    }
}

impl Default for Orientation {
    fn default() -> Self {
        Self::FORWARD
    }
}

/// Position and orientation of a controlled entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntityTransform {
    pub position: Vec3,
    pub orientation: Orientation,
}

impl EntityTransform {
    pub fn new(position: Vec3, orientation: Orientation) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Model matrix with a uniform scale.
    pub fn matrix(&self, scale: f32) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(scale),
            self.orientation.to_quat(),
            self.position,
        )
    }
}

impl Default for EntityTransform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Orientation::FORWARD,
        }
    }
}
