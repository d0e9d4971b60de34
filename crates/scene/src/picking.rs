//! Pointer picking against loaded models.
//!
//! A ray is first rejected against the model's bounding box, then tested
//! against every triangle in model space.

use glam::{Mat4, Vec3};
use wingspan_assets::{Aabb, ModelData};

const EPSILON: f32 = 1e-7;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit direction.
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self {
            origin,
            dir: dir.normalize_or(Vec3::NEG_Z),
        }
    }

    /// The same ray expressed in the space `world_to_local` maps into. The
    /// direction is not renormalized so hit distances stay comparable.
    pub fn transformed(&self, world_to_local: Mat4) -> Ray {
        Ray {
            origin: world_to_local.transform_point3(self.origin),
            dir: world_to_local.transform_vector3(self.dir),
        }
    }

    /// Slab test. Entry distance, clamped to zero when the origin is inside.
    pub fn intersect_aabb(&self, aabb: &Aabb) -> Option<f32> {
        let mut t_min = 0.0f32;
        let mut t_max = f32::INFINITY;
        for axis in 0..3 {
            let o = self.origin[axis];
            let d = self.dir[axis];
            let (lo, hi) = (aabb.min[axis], aabb.max[axis]);
            if d.abs() < EPSILON {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d;
            let (mut t0, mut t1) = ((lo - o) * inv, (hi - o) * inv);
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }
        Some(t_min)
    }

    /// Möller–Trumbore, double-sided. Distance along the ray on a hit.
    pub fn intersect_triangle(&self, a: Vec3, b: Vec3, c: Vec3) -> Option<f32> {
        let e1 = b - a;
        let e2 = c - a;
        let p = self.dir.cross(e2);
        let det = e1.dot(p);
        if det.abs() < EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;
        let s = self.origin - a;
        let u = s.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let q = s.cross(e1);
        let v = self.dir.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = e2.dot(q) * inv_det;
        (t > EPSILON).then_some(t)
    }
}

/// Nearest hit of `ray` (world space) on `model` drawn with `model_matrix`
/// and node matrices `globals`. Skinned primitives are tested in their
/// posed shape.
pub fn pick_model(
    ray: &Ray,
    model: &ModelData,
    model_matrix: Mat4,
    globals: &[Mat4],
) -> Option<f32> {
    let world_to_model = model_matrix.inverse();
    let local = ray.transformed(world_to_model);
    let bounds = model.bounds_with(globals).unwrap_or(model.bounds);
    local.intersect_aabb(&bounds)?;

    let mut nearest: Option<f32> = None;
    for prim in &model.primitives {
        let posed = model.posed_vertices(prim, globals);
        let corner = |i: u32| posed.get(i as usize).map(|v| Vec3::from(v.position));
        for tri in prim.indices.chunks_exact(3) {
            let (Some(a), Some(b), Some(c)) = (corner(tri[0]), corner(tri[1]), corner(tri[2]))
            else {
                continue;
            };
            if let Some(t) = local.intersect_triangle(a, b, c) {
                nearest = Some(nearest.map_or(t, |n| n.min(t)));
            }
        }
    }
    nearest
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverEvent {
    Enter,
    Exit,
}

/// Turns per-frame hit results into enter/exit transitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct HoverTracker {
    hovered: bool,
}

impl HoverTracker {
    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    pub fn update(&mut self, hit: bool) -> Option<HoverEvent> {
        let event = match (self.hovered, hit) {
            (false, true) => Some(HoverEvent::Enter),
            (true, false) => Some(HoverEvent::Exit),
            _ => None,
        };
        self.hovered = hit;
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wingspan_assets::{MeshPrimitive, MeshVertex, NodeData, Skin, SkinBinding};
    use wingspan_common::ModelId;

    fn quad_model() -> ModelData {
        let v = |x: f32, y: f32| MeshVertex {
            position: [x, y, 0.0],
            normal: [0.0, 0.0, 1.0],
        };
        ModelData {
            id: ModelId::new(),
            name: "quad".into(),
            nodes: vec![NodeData {
                name: None,
                parent: None,
                children: vec![],
                translation: Vec3::ZERO,
                rotation: glam::Quat::IDENTITY,
                scale: Vec3::ONE,
            }],
            roots: vec![0],
            primitives: vec![MeshPrimitive {
                node: 0,
                vertices: vec![v(-1.0, -1.0), v(1.0, -1.0), v(1.0, 1.0), v(-1.0, 1.0)],
                indices: vec![0, 1, 2, 0, 2, 3],
                base_color: [1.0; 4],
                skin: None,
            }],
            skins: vec![],
            clips: vec![],
            bounds: Aabb::new(Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, 1.0, 0.0)),
        }
    }

    #[test]
    fn ray_hits_box_from_outside() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        let aabb = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let t = ray.intersect_aabb(&aabb).unwrap();
        assert!((t - 4.0).abs() < 1e-5);
    }

    #[test]
    fn ray_misses_box() {
        let ray = Ray::new(Vec3::new(3.0, 0.0, 5.0), Vec3::NEG_Z);
        let aabb = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        assert!(ray.intersect_aabb(&aabb).is_none());
    }

    #[test]
    fn triangle_hit_and_miss() {
        let ray = Ray::new(Vec3::new(0.2, 0.2, 1.0), Vec3::NEG_Z);
        let (a, b, c) = (Vec3::ZERO, Vec3::X, Vec3::Y);
        assert!((ray.intersect_triangle(a, b, c).unwrap() - 1.0).abs() < 1e-5);
        let away = Ray::new(Vec3::new(0.2, 0.2, 1.0), Vec3::Z);
        assert!(away.intersect_triangle(a, b, c).is_none());
        let outside = Ray::new(Vec3::new(0.9, 0.9, 1.0), Vec3::NEG_Z);
        assert!(outside.intersect_triangle(a, b, c).is_none());
    }

    #[test]
    fn picks_scaled_and_moved_model() {
        let model = quad_model();
        let globals = model.rest_globals();
        let matrix = Mat4::from_scale_rotation_translation(
            Vec3::splat(1.1),
            glam::Quat::IDENTITY,
            Vec3::new(5.0, 0.0, 0.0),
        );
        let hit = Ray::new(Vec3::new(5.5, 0.5, 3.0), Vec3::NEG_Z);
        assert!(pick_model(&hit, &model, matrix, &globals).is_some());
        let miss = Ray::new(Vec3::new(0.0, 0.0, 3.0), Vec3::NEG_Z);
        assert!(pick_model(&miss, &model, matrix, &globals).is_none());
    }

    #[test]
    fn picks_skinned_quad_where_its_joint_put_it() {
        let mut model = quad_model();
        let joint = model.nodes[0].clone();
        model.nodes.push(joint);
        model.roots = vec![0, 1];
        model.primitives[0].skin = Some(SkinBinding {
            skin: 0,
            joints: vec![[0; 4]; 4],
            weights: vec![[1.0, 0.0, 0.0, 0.0]; 4],
        });
        model.skins.push(Skin {
            name: None,
            joints: vec![1],
            inverse_bind: vec![Mat4::IDENTITY],
        });
        let mut locals = model.rest_locals();
        locals[1] = Mat4::from_translation(Vec3::new(0.0, 5.0, 0.0));
        let globals = model.global_matrices(&locals);

        let raised = Ray::new(Vec3::new(0.3, 5.2, 3.0), Vec3::NEG_Z);
        assert!(pick_model(&raised, &model, Mat4::IDENTITY, &globals).is_some());
        let rest = Ray::new(Vec3::new(0.3, -0.2, 3.0), Vec3::NEG_Z);
        assert!(pick_model(&rest, &model, Mat4::IDENTITY, &globals).is_none());
    }

    #[test]
    fn hover_transitions() {
        let mut hover = HoverTracker::default();
        assert_eq!(hover.update(false), None);
        assert_eq!(hover.update(true), Some(HoverEvent::Enter));
        assert_eq!(hover.update(true), None);
        assert!(hover.is_hovered());
        assert_eq!(hover.update(false), Some(HoverEvent::Exit));
    }
}
