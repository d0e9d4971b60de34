use crate::sample::sample_clip_locals;
use glam::Mat4;
use std::sync::Arc;
use wingspan_assets::{AnimationClip, ModelData};

/// One clip of a loaded model, playing.
///
/// Created once after the model loads, advanced every frame with the frame
/// delta, dropped with the entity that owns it.
#[derive(Debug, Clone)]
pub struct AnimationHandle {
    model: Arc<ModelData>,
    clip: usize,
    time: f32,
}

impl AnimationHandle {
    /// Start clip `clip`; `None` if the model has no such clip.
    pub fn new(model: Arc<ModelData>, clip: usize) -> Option<Self> {
        if clip >= model.clips.len() {
            return None;
        }
        tracing::debug!(
            model = %model.name,
            clip = %model.clips[clip].name,
            "animation started"
        );
        Some(Self {
            model,
            clip,
            time: 0.0,
        })
    }

    /// Start the model's first clip, if it has any.
    pub fn play_first(model: Arc<ModelData>) -> Option<Self> {
        Self::new(model, 0)
    }

    pub fn clip(&self) -> &AnimationClip {
        &self.model.clips[self.clip]
    }

    /// Playhead in seconds, within the clip.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Advance the playhead by `delta` seconds, wrapping at the clip's end.
    pub fn update(&mut self, delta: f32) {
        let duration = self.clip().duration;
        let t = self.time + delta.max(0.0);
        self.time = if duration > 0.0 { t.rem_euclid(duration) } else { 0.0 };
    }

    /// Local node matrices at the playhead.
    pub fn locals(&self) -> Vec<Mat4> {
        sample_clip_locals(&self.model, self.clip(), self.time)
    }

    /// Model-space node matrices at the playhead.
    pub fn globals(&self) -> Vec<Mat4> {
        self.model.global_matrices(&self.locals())
    }
}
