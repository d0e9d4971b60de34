use glam::Vec3;
use wingspan_scene::{Camera, Ground, Light, NodeKind, SceneGraph};

/// Camera/view configuration for rendering.
#[derive(Debug, Clone, Copy)]
pub struct RenderView {
    /// Camera position in world space.
    pub eye: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
}

impl Default for RenderView {
    fn default() -> Self {
        Self::from(&Camera::default())
    }
}

impl From<&Camera> for RenderView {
    fn from(camera: &Camera) -> Self {
        Self {
            eye: camera.eye,
            target: camera.target,
            fov_degrees: camera.fov_y.to_degrees(),
        }
    }
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads a scene graph and a view configuration, then produces
/// output. It never touches the entities the graph was built from.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame from the given scene graph and view.
    fn render(&self, graph: &SceneGraph, view: &RenderView) -> Self::Output;
}

/// Renders a frame as human-readable text.
///
/// Useful for CLI output, logging, and testing the render interface.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

fn vec3(v: Vec3) -> String {
    format!("({:.2}, {:.2}, {:.2})", v.x, v.y, v.z)
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, graph: &SceneGraph, view: &RenderView) -> String {
        let mut out = String::new();
        let env = &graph.environment;
        out.push_str(&format!(
            "=== Scene (nodes={}, labels={}) ===\n",
            graph.nodes.len(),
            graph.labels.len()
        ));
        out.push_str(&format!(
            "Camera: eye={} target={} fov={:.0}\n",
            vec3(view.eye),
            vec3(view.target),
            view.fov_degrees
        ));
        let [r, g, b] = env.sky.clear_color();
        out.push_str(&format!(
            "Sky: sun={} clear=({r:.2}, {g:.2}, {b:.2})\n",
            vec3(env.sky.sun_position)
        ));
        out.push_str(&format!(
            "Stars: count={} radius={:.0} depth={:.0}{}\n",
            env.stars.count,
            env.stars.radius,
            env.stars.depth,
            if env.stars.fade { " fade" } else { "" }
        ));
        for light in &env.lights {
            let line = match light {
                Light::Ambient { intensity } => format!("ambient {intensity:.2}"),
                Light::Directional {
                    position,
                    intensity,
                    cast_shadow,
                } => format!(
                    "directional {} {intensity:.2}{}",
                    vec3(*position),
                    if *cast_shadow { " shadow" } else { "" }
                ),
                Light::Point {
                    position,
                    intensity,
                } => format!("point {} {intensity:.2}", vec3(*position)),
            };
            out.push_str(&format!("Light: {line}\n"));
        }

        for node in &graph.nodes {
            let (scale, _, position) = node.transform.to_scale_rotation_translation();
            let detail = match &node.kind {
                NodeKind::Model { model, pose } => format!(
                    "model '{}' [{}] nodes={} vertices={} scale={:.2}",
                    model.name,
                    model.id.short(),
                    pose.len(),
                    model.vertex_count(),
                    scale.x
                ),
                NodeKind::Ground(Ground::WireframePlane { size, segments, .. }) => {
                    format!("wireframe plane {:.0}x{:.0}/{segments}", size.x, size.y)
                }
                NodeKind::Ground(Ground::Disk { radius, .. }) => format!("disk r={radius:.1}"),
                NodeKind::Axes { size } => format!("axes size={size:.1}"),
            };
            out.push_str(&format!("  [{}] {detail} pos={}\n", node.name, vec3(position)));
        }
        for label in &graph.labels {
            out.push_str(&format!("  label '{}' at {}\n", label.text, vec3(label.position)));
        }
        out
    }
}
