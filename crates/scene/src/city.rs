use crate::graph::{NodeKind, SceneNode};
use crate::picking::{HoverEvent, HoverTracker, Ray, pick_model};
use glam::{Mat4, Quat, Vec3};
use std::sync::Arc;
use wingspan_assets::ModelData;

/// Yaw added every frame, radians.
pub const SPIN_PER_FRAME: f32 = 0.001;
pub const HOVER_SCALE: f32 = 1.1;

/// The city: spins slowly and grows while hovered.
#[derive(Debug, Default)]
pub struct CityModel {
    yaw: f32,
    hover: HoverTracker,
    model: Option<Arc<ModelData>>,
    globals: Vec<Mat4>,
}

impl CityModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mount(&mut self, model: Arc<ModelData>) {
        self.globals = model.rest_globals();
        tracing::info!(
            model = %model.name,
            triangles = model.triangle_count(),
            "city mounted"
        );
        self.model = Some(model);
    }

    pub fn is_mounted(&self) -> bool {
        self.model.is_some()
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn is_hovered(&self) -> bool {
        self.hover.is_hovered()
    }

    pub fn scale(&self) -> f32 {
        if self.hover.is_hovered() {
            HOVER_SCALE
        } else {
            1.0
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scale()),
            Quat::from_rotation_y(self.yaw),
            Vec3::ZERO,
        )
    }

    /// Advance the spin by one frame.
    pub fn frame(&mut self) {
        self.yaw += SPIN_PER_FRAME;
    }

    /// Hit-test the pointer ray, if any, and report hover transitions.
    /// An unmounted model is never hovered.
    pub fn pointer(&mut self, ray: Option<&Ray>) -> Option<HoverEvent> {
        let hit = match (ray, &self.model) {
            (Some(ray), Some(model)) => {
                pick_model(ray, model, self.matrix(), &self.globals).is_some()
            }
            _ => false,
        };
        let event = self.hover.update(hit);
        if let Some(event) = event {
            tracing::debug!(?event, "city hover");
        }
        event
    }

    pub fn node(&self) -> Option<SceneNode> {
        let model = self.model.as_ref()?;
        Some(SceneNode {
            name: "city".into(),
            transform: self.matrix(),
            kind: NodeKind::Model {
                model: Arc::clone(model),
                pose: self.globals.clone(),
            },
        })
    }
}
