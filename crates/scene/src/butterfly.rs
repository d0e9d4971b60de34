use crate::camera::{Camera, FollowCamera};
use crate::clock::FrameTick;
use crate::graph::{NodeKind, SceneNode};
use crate::motion::animated_pose;
use glam::Vec3;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use wingspan_animation::AnimationHandle;
use wingspan_assets::ModelData;
use wingspan_common::{EntityTransform, Orientation, PositionFeed};
use wingspan_input::{InputController, KeyboardHub};

pub const START_POSITION: Vec3 = Vec3::new(0.0, 2.0, 0.0);
pub const MODEL_SCALE: f32 = 0.8;

/// Keyboard-steered butterfly.
///
/// Owns the entity transform and the input controller bound to it. The
/// camera follows the stored position and the position is published to the
/// feed every frame, whether or not the model has finished loading.
pub struct Butterfly {
    transform: Rc<RefCell<EntityTransform>>,
    input: InputController,
    feed: PositionFeed,
    follow: FollowCamera,
    model: Option<Arc<ModelData>>,
    animation: Option<AnimationHandle>,
    pose: EntityTransform,
}

impl Butterfly {
    pub fn new(hub: &KeyboardHub, feed: PositionFeed) -> Self {
        let start = EntityTransform::new(START_POSITION, Orientation::FORWARD);
        let transform = Rc::new(RefCell::new(start));
        let input = InputController::attach(hub, Rc::clone(&transform));
        Self {
            transform,
            input,
            feed,
            follow: FollowCamera::default(),
            model: None,
            animation: None,
            pose: start,
        }
    }

    /// Attach the loaded model and start its first clip, if any.
    pub fn mount(&mut self, model: Arc<ModelData>) {
        self.animation = AnimationHandle::play_first(Arc::clone(&model));
        if self.animation.is_none() {
            tracing::debug!(model = %model.name, "butterfly model has no clips");
        }
        tracing::info!(model = %model.name, "butterfly mounted");
        self.model = Some(model);
    }

    pub fn is_mounted(&self) -> bool {
        self.model.is_some()
    }

    /// Stored state, without procedural offsets.
    pub fn transform(&self) -> EntityTransform {
        *self.transform.borrow()
    }

    /// Pose drawn on the last frame.
    pub fn pose(&self) -> EntityTransform {
        self.pose
    }

    pub fn animation(&self) -> Option<&AnimationHandle> {
        self.animation.as_ref()
    }

    pub fn input(&self) -> &InputController {
        &self.input
    }

    pub fn frame(&mut self, tick: &FrameTick, camera: &mut Camera) -> EntityTransform {
        let base = self.transform();
        self.pose = animated_pose(base, tick.elapsed);
        if let Some(animation) = self.animation.as_mut() {
            animation.update(tick.delta);
        }
        self.follow.place(camera, base.position);
        self.feed.publish(base.position);
        self.pose
    }

    /// Scene node for the last drawn pose; `None` until mounted.
    pub fn node(&self) -> Option<SceneNode> {
        let model = self.model.as_ref()?;
        let pose = match &self.animation {
            Some(animation) => animation.globals(),
            None => model.rest_globals(),
        };
        Some(SceneNode {
            name: "butterfly".into(),
            transform: self.pose.matrix(MODEL_SCALE),
            kind: NodeKind::Model {
                model: Arc::clone(model),
                pose,
            },
        })
    }
}
