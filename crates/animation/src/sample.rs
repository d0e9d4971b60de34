//! CPU-side sampling of node keyframe tracks.

use glam::{Mat4, Quat, Vec3};
use wingspan_assets::{AnimationClip, Interpolation, ModelData, TrackQuat, TrackVec3};

/// Index of the keyframe segment containing `t` and the blend factor.
///
/// `times` must be non-empty and ascending; `t` outside the range clamps to
/// the first or last keyframe.
fn segment(times: &[f32], t: f32) -> (usize, usize, f32) {
    let last = times.len() - 1;
    if t <= times[0] {
        return (0, 0, 0.0);
    }
    if t >= times[last] {
        return (last, last, 0.0);
    }
    // First keyframe strictly after t.
    let next = times.partition_point(|&k| k <= t);
    let prev = next - 1;
    let span = times[next] - times[prev];
    let f = if span > 0.0 { (t - times[prev]) / span } else { 0.0 };
    (prev, next, f)
}

pub fn sample_vec3(track: &TrackVec3, t: f32, default: Vec3) -> Vec3 {
    if track.times.is_empty() || track.values.is_empty() {
        return default;
    }
    let (a, b, f) = segment(&track.times, t);
    match track.interpolation {
        Interpolation::Step => track.values[a],
        Interpolation::Linear => track.values[a].lerp(track.values[b], f),
    }
}

pub fn sample_quat(track: &TrackQuat, t: f32, default: Quat) -> Quat {
    if track.times.is_empty() || track.values.is_empty() {
        return default;
    }
    let (a, b, f) = segment(&track.times, t);
    match track.interpolation {
        Interpolation::Step => track.values[a],
        Interpolation::Linear => track.values[a].slerp(track.values[b], f),
    }
}

/// Local node matrices for `clip` at time `t`; untouched nodes keep their
/// rest transform.
pub fn sample_clip_locals(model: &ModelData, clip: &AnimationClip, t: f32) -> Vec<Mat4> {
    model
        .nodes
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let translation = clip
                .translations
                .get(&i)
                .map_or(node.translation, |tr| sample_vec3(tr, t, node.translation));
            let rotation = clip
                .rotations
                .get(&i)
                .map_or(node.rotation, |tr| sample_quat(tr, t, node.rotation));
            let scale = clip
                .scales
                .get(&i)
                .map_or(node.scale, |tr| sample_vec3(tr, t, node.scale));
            Mat4::from_scale_rotation_translation(scale, rotation, translation)
        })
        .collect()
}
