//! Procedural motion as pure functions of (base state, elapsed time).

use crate::camera::CameraPose;
use glam::Vec3;
use wingspan_common::EntityTransform;

const BOB_FREQUENCY: f32 = 2.0;
const BOB_AMPLITUDE: f32 = 0.01;
const TILT_FREQUENCY: f32 = 10.0;
const TILT_AMPLITUDE: f32 = 0.2;

/// Camera offset of the third-person follow camera.
pub const FOLLOW_OFFSET: Vec3 = Vec3::new(0.0, 3.0, 8.0);

/// Vertical floating offset.
pub fn bob_offset(elapsed: f32) -> f32 {
    (elapsed * BOB_FREQUENCY).sin() * BOB_AMPLITUDE
}

/// Wing-tilt roll. Replaces any input roll for the frame.
pub fn wing_tilt(elapsed: f32) -> f32 {
    (elapsed * TILT_FREQUENCY).sin() * TILT_AMPLITUDE
}

/// Pose to draw this frame. `base` is left untouched.
pub fn animated_pose(base: EntityTransform, elapsed: f32) -> EntityTransform {
    let mut pose = base;
    pose.position.y += bob_offset(elapsed);
    pose.orientation.roll = wing_tilt(elapsed);
    pose
}

/// Rigid follow: fixed offset from the subject, aimed at the subject.
pub fn follow_pose(subject: Vec3, offset: Vec3) -> CameraPose {
    CameraPose {
        eye: subject + offset,
        target: subject,
    }
}
