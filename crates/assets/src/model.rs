use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};
use std::collections::BTreeMap;
use wingspan_common::ModelId;

/// Vertex layout shared with the GPU mesh pipeline.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// One triangle list attached to a node.
#[derive(Debug, Clone)]
pub struct MeshPrimitive {
    pub node: usize,
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
    pub base_color: [f32; 4],
    pub skin: Option<SkinBinding>,
}

impl MeshPrimitive {
    pub fn is_skinned(&self) -> bool {
        self.skin.is_some()
    }
}

/// Four joint influences per vertex, indexing into a [`Skin`]'s joint list.
#[derive(Debug, Clone)]
pub struct SkinBinding {
    pub skin: usize,
    pub joints: Vec<[u16; 4]>,
    pub weights: Vec<[f32; 4]>,
}

/// Joint nodes of a skeleton with their inverse bind matrices.
#[derive(Debug, Clone)]
pub struct Skin {
    pub name: Option<String>,
    pub joints: Vec<usize>,
    pub inverse_bind: Vec<Mat4>,
}

/// Node of the model hierarchy with its rest-pose local transform.
#[derive(Debug, Clone)]
pub struct NodeData {
    pub name: Option<String>,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl NodeData {
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Linear,
    Step,
}

#[derive(Debug, Clone)]
pub struct TrackVec3 {
    pub times: Vec<f32>,
    pub values: Vec<Vec3>,
    pub interpolation: Interpolation,
}

#[derive(Debug, Clone)]
pub struct TrackQuat {
    pub times: Vec<f32>,
    pub values: Vec<Quat>,
    pub interpolation: Interpolation,
}

/// A named set of per-node keyframe tracks.
#[derive(Debug, Clone)]
pub struct AnimationClip {
    pub name: String,
    pub duration: f32,
    pub translations: BTreeMap<usize, TrackVec3>,
    pub rotations: BTreeMap<usize, TrackQuat>,
    pub scales: BTreeMap<usize, TrackVec3>,
}

impl AnimationClip {
    pub fn track_count(&self) -> usize {
        self.translations.len() + self.rotations.len() + self.scales.len()
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box containing all points, or `None` for no points.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
        Some(Self { min, max })
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// Bounds of this box after an affine transform.
    pub fn transformed(&self, m: Mat4) -> Aabb {
        let corners = self.corners().map(|c| m.transform_point3(c));
        // Eight corners, never empty.
        Aabb::from_points(corners).unwrap_or(*self)
    }
}

/// CPU-side model: node hierarchy, geometry and animation clips.
#[derive(Debug, Clone)]
pub struct ModelData {
    pub id: ModelId,
    pub name: String,
    pub nodes: Vec<NodeData>,
    /// Nodes without a parent, in scene order.
    pub roots: Vec<usize>,
    pub primitives: Vec<MeshPrimitive>,
    pub skins: Vec<Skin>,
    pub clips: Vec<AnimationClip>,
    /// Model-space bounds in the rest pose.
    pub bounds: Aabb,
}

impl ModelData {
    /// Rest-pose local matrices, one per node.
    pub fn rest_locals(&self) -> Vec<Mat4> {
        self.nodes.iter().map(NodeData::local_matrix).collect()
    }

    /// Model-space matrices from per-node local matrices.
    ///
    /// `locals` must hold one matrix per node.
    pub fn global_matrices(&self, locals: &[Mat4]) -> Vec<Mat4> {
        let mut globals = vec![Mat4::IDENTITY; self.nodes.len()];
        let mut stack: Vec<(usize, Mat4)> = self
            .roots
            .iter()
            .rev()
            .map(|&root| (root, Mat4::IDENTITY))
            .collect();
        while let Some((node, parent)) = stack.pop() {
            let Some(local) = locals.get(node) else {
                continue;
            };
            let global = parent * *local;
            globals[node] = global;
            for &child in self.nodes[node].children.iter().rev() {
                stack.push((child, global));
            }
        }
        globals
    }

    pub fn rest_globals(&self) -> Vec<Mat4> {
        self.global_matrices(&self.rest_locals())
    }

    pub fn vertex_count(&self) -> usize {
        self.primitives.iter().map(|p| p.vertices.len()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.primitives.iter().map(|p| p.indices.len() / 3).sum()
    }

    /// Skinning matrices of one skin, `joint global * inverse bind` per joint.
    pub fn joint_matrices(&self, skin: usize, globals: &[Mat4]) -> Vec<Mat4> {
        let Some(skin) = self.skins.get(skin) else {
            return Vec::new();
        };
        skin.joints
            .iter()
            .enumerate()
            .map(|(i, &joint)| {
                let global = globals.get(joint).copied().unwrap_or(Mat4::IDENTITY);
                let inverse_bind = skin.inverse_bind.get(i).copied().unwrap_or(Mat4::IDENTITY);
                global * inverse_bind
            })
            .collect()
    }

    /// Model-space vertices of a primitive under the given node matrices.
    ///
    /// Rigid primitives follow their node. Skinned primitives blend their
    /// joint matrices and ignore the node they hang from.
    pub fn posed_vertices(&self, prim: &MeshPrimitive, globals: &[Mat4]) -> Vec<MeshVertex> {
        let node = globals.get(prim.node).copied().unwrap_or(Mat4::IDENTITY);
        let Some(binding) = &prim.skin else {
            return prim.vertices.iter().map(|v| pose_vertex(v, node)).collect();
        };
        let joints = self.joint_matrices(binding.skin, globals);
        prim.vertices
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let influences = binding.joints.get(i).zip(binding.weights.get(i));
                let m = influences
                    .and_then(|(j, w)| blend(&joints, j, w))
                    .unwrap_or(node);
                pose_vertex(v, m)
            })
            .collect()
    }

    /// Bounds of the geometry under the given node matrices.
    pub fn bounds_with(&self, globals: &[Mat4]) -> Option<Aabb> {
        self.primitives
            .iter()
            .filter_map(|prim| {
                let posed = self.posed_vertices(prim, globals);
                Aabb::from_points(posed.iter().map(|v| Vec3::from_array(v.position)))
            })
            .reduce(|a, b| a.union(&b))
    }
}

fn pose_vertex(v: &MeshVertex, m: Mat4) -> MeshVertex {
    MeshVertex {
        position: m.transform_point3(Vec3::from_array(v.position)).to_array(),
        normal: m
            .transform_vector3(Vec3::from_array(v.normal))
            .normalize_or_zero()
            .to_array(),
    }
}

/// Weighted sum of joint matrices; `None` when no weight lands on a known joint.
fn blend(joints: &[Mat4], indices: &[u16; 4], weights: &[f32; 4]) -> Option<Mat4> {
    let mut sum = Mat4::ZERO;
    let mut total = 0.0;
    for (&j, &w) in indices.iter().zip(weights) {
        if w <= 0.0 {
            continue;
        }
        let Some(m) = joints.get(j as usize) else {
            continue;
        };
        sum += *m * w;
        total += w;
    }
    (total > 0.0).then(|| sum * (1.0 / total))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(parent: Option<usize>, children: Vec<usize>, translation: Vec3) -> NodeData {
        NodeData {
            name: None,
            parent,
            children,
            translation,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    fn two_level_model() -> ModelData {
        ModelData {
            id: ModelId::new(),
            name: "test".into(),
            nodes: vec![
                node(None, vec![1], Vec3::new(1.0, 0.0, 0.0)),
                node(Some(0), vec![], Vec3::new(0.0, 2.0, 0.0)),
            ],
            roots: vec![0],
            primitives: vec![MeshPrimitive {
                node: 1,
                vertices: vec![
                    MeshVertex {
                        position: [0.0, 0.0, 0.0],
                        normal: [0.0, 1.0, 0.0],
                    },
                    MeshVertex {
                        position: [1.0, 1.0, 1.0],
                        normal: [0.0, 1.0, 0.0],
                    },
                ],
                indices: vec![0, 1, 0],
                base_color: [1.0; 4],
                skin: None,
            }],
            skins: vec![],
            clips: vec![],
            bounds: Aabb::new(Vec3::ZERO, Vec3::ONE),
        }
    }

    #[test]
    fn globals_compose_parent_first() {
        let model = two_level_model();
        let globals = model.rest_globals();
        let child_origin = globals[1].transform_point3(Vec3::ZERO);
        assert!(child_origin.abs_diff_eq(Vec3::new(1.0, 2.0, 0.0), 1e-6));
    }

    #[test]
    fn bounds_follow_node_transforms() {
        let model = two_level_model();
        let bounds = model.bounds_with(&model.rest_globals()).unwrap();
        assert!(bounds.min.abs_diff_eq(Vec3::new(1.0, 2.0, 0.0), 1e-6));
        assert!(bounds.max.abs_diff_eq(Vec3::new(2.0, 3.0, 1.0), 1e-6));
    }

    fn skinned_model() -> ModelData {
        let vertex = |position: [f32; 3]| MeshVertex {
            position,
            normal: [0.0, 1.0, 0.0],
        };
        ModelData {
            id: ModelId::new(),
            name: "skinned".into(),
            nodes: vec![
                node(None, vec![], Vec3::new(5.0, 0.0, 0.0)),
                node(None, vec![], Vec3::new(0.0, 1.0, 0.0)),
            ],
            roots: vec![0, 1],
            primitives: vec![MeshPrimitive {
                node: 0,
                vertices: vec![vertex([0.0, 0.0, 0.0]), vertex([1.0, 0.0, 0.0])],
                indices: vec![0, 1, 0],
                base_color: [1.0; 4],
                skin: Some(SkinBinding {
                    skin: 0,
                    joints: vec![[0; 4], [0; 4]],
                    weights: vec![[1.0, 0.0, 0.0, 0.0], [0.5, 0.0, 0.0, 0.0]],
                }),
            }],
            skins: vec![Skin {
                name: None,
                joints: vec![1],
                inverse_bind: vec![Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0))],
            }],
            clips: vec![],
            bounds: Aabb::new(Vec3::ZERO, Vec3::ONE),
        }
    }

    #[test]
    fn skinned_rest_pose_matches_bind_pose() {
        let model = skinned_model();
        let posed = model.posed_vertices(&model.primitives[0], &model.rest_globals());
        assert_eq!(posed[0].position, [0.0, 0.0, 0.0]);
        assert_eq!(posed[1].position, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn skinned_vertices_follow_their_joint() {
        let model = skinned_model();
        let mut locals = model.rest_locals();
        locals[1] = Mat4::from_translation(Vec3::new(0.0, 3.0, 0.0));
        let globals = model.global_matrices(&locals);
        let posed = model.posed_vertices(&model.primitives[0], &globals);
        assert!(Vec3::from_array(posed[0].position).abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), 1e-6));
        // Partial weights are normalised.
        assert!(Vec3::from_array(posed[1].position).abs_diff_eq(Vec3::new(1.0, 2.0, 0.0), 1e-6));
        let bounds = model.bounds_with(&globals).unwrap();
        assert!((bounds.max.y - 2.0).abs() < 1e-6);
    }

    #[test]
    fn unknown_joint_falls_back_to_node() {
        let mut model = skinned_model();
        if let Some(binding) = model.primitives[0].skin.as_mut() {
            binding.joints[0] = [7; 4];
        }
        let posed = model.posed_vertices(&model.primitives[0], &model.rest_globals());
        assert_eq!(posed[0].position, [5.0, 0.0, 0.0]);
    }

    #[test]
    fn aabb_transform_covers_rotated_box() {
        let b = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let rotated = b.transformed(Mat4::from_rotation_y(std::f32::consts::FRAC_PI_4));
        let r = 2.0_f32.sqrt();
        assert!((rotated.max.x - r).abs() < 1e-5);
        assert!((rotated.min.z + r).abs() < 1e-5);
        assert!(rotated.center().abs_diff_eq(Vec3::ZERO, 1e-5));
    }

    #[test]
    fn aabb_from_no_points_is_none() {
        assert!(Aabb::from_points(Vec::<Vec3>::new()).is_none());
    }

    #[test]
    fn counts() {
        let model = two_level_model();
        assert_eq!(model.vertex_count(), 2);
        assert_eq!(model.triangle_count(), 1);
        assert!(model.clips.is_empty());
    }
}
