//! Declarative per-frame description of what to draw.

use crate::environment::{Environment, Ground};
use glam::{Mat4, Vec3};
use std::sync::Arc;
use wingspan_assets::ModelData;

#[derive(Debug, Clone)]
pub enum NodeKind {
    /// A loaded model with its node matrices for this frame.
    Model {
        model: Arc<ModelData>,
        pose: Vec<Mat4>,
    },
    Ground(Ground),
    /// RGB axis lines of the given length.
    Axes { size: f32 },
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    /// Object-to-world matrix.
    pub transform: Mat4,
    pub kind: NodeKind,
}

/// Text anchored at a world position, drawn over the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    pub position: Vec3,
    pub color: [f32; 3],
    /// Glyph height in world units.
    pub font_size: f32,
}

#[derive(Debug, Clone)]
pub struct SceneGraph {
    pub environment: Environment,
    pub nodes: Vec<SceneNode>,
    pub labels: Vec<Label>,
}

impl SceneGraph {
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            nodes: Vec::new(),
            labels: Vec::new(),
        }
    }

    pub fn push(&mut self, name: impl Into<String>, transform: Mat4, kind: NodeKind) {
        self.nodes.push(SceneNode {
            name: name.into(),
            transform,
            kind,
        });
    }

    pub fn node(&self, name: &str) -> Option<&SceneNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn models(&self) -> impl Iterator<Item = (&SceneNode, &Arc<ModelData>)> {
        self.nodes.iter().filter_map(|n| match &n.kind {
            NodeKind::Model { model, .. } => Some((n, model)),
            _ => None,
        })
    }
}
