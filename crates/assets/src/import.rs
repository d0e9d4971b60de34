//! glTF/GLB import into [`ModelData`].
//!
//! Triangle primitives, node TRS hierarchy, skins and node animation
//! channels are read. Cubic-spline channels keep their keyframe values and
//! are sampled linearly. Morph target channels are dropped with a warning.

use crate::AssetError;
use crate::model::{
    Aabb, AnimationClip, Interpolation, MeshPrimitive, MeshVertex, ModelData, NodeData, Skin,
    SkinBinding, TrackQuat, TrackVec3,
};
use glam::{Mat4, Quat, Vec3};
use gltf::animation::util::ReadOutputs;
use std::collections::BTreeMap;
use std::path::Path;
use wingspan_common::ModelId;

/// Import a model from a file on disk.
pub fn import_file(path: impl AsRef<Path>) -> Result<ModelData, AssetError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    import_slice(&bytes, &display_name(path), path.parent())
}

/// Import a model from GLB or glTF JSON bytes.
///
/// `base` resolves external buffer URIs; GLB files with an embedded binary
/// chunk need none.
pub fn import_slice(
    bytes: &[u8],
    name: &str,
    base: Option<&Path>,
) -> Result<ModelData, AssetError> {
    let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(bytes)?;
    let buffers = gltf::import_buffers(&document, base, blob)?;
    build_model(&document, &buffers, name)
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn build_model(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
    name: &str,
) -> Result<ModelData, AssetError> {
    let nodes = read_nodes(document);
    let roots = scene_roots(document, &nodes);
    let reachable = reachable_nodes(&nodes, &roots);
    let primitives = read_primitives(document, buffers, &reachable);
    let skins = read_skins(document, buffers);
    let clips = read_clips(document, buffers);

    let mut model = ModelData {
        id: ModelId::new(),
        name: name.to_string(),
        nodes,
        roots,
        primitives,
        skins,
        clips,
        bounds: Aabb::new(Vec3::ZERO, Vec3::ZERO),
    };
    model.bounds = model
        .bounds_with(&model.rest_globals())
        .ok_or_else(|| AssetError::NoGeometry(name.to_string()))?;

    tracing::info!(
        model = name,
        id = %model.id.short(),
        nodes = model.nodes.len(),
        primitives = model.primitives.len(),
        skins = model.skins.len(),
        clips = model.clips.len(),
        "model imported"
    );
    Ok(model)
}

fn read_nodes(document: &gltf::Document) -> Vec<NodeData> {
    let mut nodes: Vec<NodeData> = document
        .nodes()
        .map(|node| {
            let (t, r, s) = node.transform().decomposed();
            NodeData {
                name: node.name().map(str::to_owned),
                parent: None,
                children: node.children().map(|c| c.index()).collect(),
                translation: Vec3::from_array(t),
                rotation: Quat::from_array(r).normalize(),
                scale: Vec3::from_array(s),
            }
        })
        .collect();
    for i in 0..nodes.len() {
        for child in nodes[i].children.clone() {
            if let Some(c) = nodes.get_mut(child) {
                c.parent = Some(i);
            }
        }
    }
    nodes
}

fn scene_roots(document: &gltf::Document, nodes: &[NodeData]) -> Vec<usize> {
    match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => scene.nodes().map(|n| n.index()).collect(),
        None => (0..nodes.len()).filter(|&i| nodes[i].parent.is_none()).collect(),
    }
}

fn reachable_nodes(nodes: &[NodeData], roots: &[usize]) -> Vec<bool> {
    let mut seen = vec![false; nodes.len()];
    let mut stack: Vec<usize> = roots.to_vec();
    while let Some(n) = stack.pop() {
        if n >= nodes.len() || seen[n] {
            continue;
        }
        seen[n] = true;
        stack.extend(nodes[n].children.iter().copied());
    }
    seen
}

fn read_primitives(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
    reachable: &[bool],
) -> Vec<MeshPrimitive> {
    let mut out = Vec::new();
    for node in document.nodes() {
        if !reachable.get(node.index()).copied().unwrap_or(false) {
            continue;
        }
        let Some(mesh) = node.mesh() else {
            continue;
        };
        for prim in mesh.primitives() {
            if prim.mode() != gltf::mesh::Mode::Triangles {
                tracing::warn!(mode = ?prim.mode(), "skipping non-triangle primitive");
                continue;
            }
            let reader = prim.reader(|b| buffers.get(b.index()).map(|d| d.0.as_slice()));
            let Some(positions) = reader.read_positions() else {
                continue;
            };
            let positions: Vec<[f32; 3]> = positions.collect();
            let normals: Vec<[f32; 3]> = match reader.read_normals() {
                Some(it) => it.collect(),
                None => vec![[0.0, 1.0, 0.0]; positions.len()],
            };
            let indices: Vec<u32> = match reader.read_indices() {
                Some(it) => it.into_u32().collect(),
                None => (0..positions.len() as u32).collect(),
            };
            let vertices = positions
                .iter()
                .zip(normals.iter().chain(std::iter::repeat(&[0.0, 1.0, 0.0])))
                .map(|(p, n)| MeshVertex {
                    position: *p,
                    normal: *n,
                })
                .collect();
            let skin = node
                .skin()
                .and_then(|skin| read_binding(&reader, skin.index(), positions.len()));
            let targets = prim.morph_targets().count();
            if targets > 0 {
                tracing::warn!(
                    node = node.index(),
                    targets,
                    "morph targets are not supported, using base geometry"
                );
            }
            out.push(MeshPrimitive {
                node: node.index(),
                vertices,
                indices,
                base_color: prim.material().pbr_metallic_roughness().base_color_factor(),
                skin,
            });
        }
    }
    out
}

fn read_binding<'a, 's, F>(
    reader: &gltf::mesh::Reader<'a, 's, F>,
    skin: usize,
    vertex_count: usize,
) -> Option<SkinBinding>
where
    F: Clone + Fn(gltf::Buffer<'a>) -> Option<&'s [u8]>,
{
    let (Some(joints), Some(weights)) = (reader.read_joints(0), reader.read_weights(0)) else {
        tracing::warn!(skin, "skinned primitive without JOINTS_0/WEIGHTS_0, drawing it rigid");
        return None;
    };
    let joints: Vec<[u16; 4]> = joints.into_u16().collect();
    let weights: Vec<[f32; 4]> = weights.into_f32().collect();
    if joints.len() != vertex_count || weights.len() != vertex_count {
        tracing::warn!(
            skin,
            vertices = vertex_count,
            joints = joints.len(),
            weights = weights.len(),
            "skin attribute count mismatch"
        );
    }
    Some(SkinBinding {
        skin,
        joints,
        weights,
    })
}

fn read_skins(document: &gltf::Document, buffers: &[gltf::buffer::Data]) -> Vec<Skin> {
    document
        .skins()
        .map(|skin| {
            let joints: Vec<usize> = skin.joints().map(|j| j.index()).collect();
            let reader = skin.reader(|b| buffers.get(b.index()).map(|d| d.0.as_slice()));
            let inverse_bind = match reader.read_inverse_bind_matrices() {
                Some(it) => it.map(|m| Mat4::from_cols_array_2d(&m)).collect(),
                None => vec![Mat4::IDENTITY; joints.len()],
            };
            Skin {
                name: skin.name().map(str::to_owned),
                joints,
                inverse_bind,
            }
        })
        .collect()
}

fn read_clips(document: &gltf::Document, buffers: &[gltf::buffer::Data]) -> Vec<AnimationClip> {
    document
        .animations()
        .enumerate()
        .map(|(i, anim)| {
            let mut clip = AnimationClip {
                name: anim
                    .name()
                    .map(str::to_owned)
                    .unwrap_or_else(|| format!("clip_{i}")),
                duration: 0.0,
                translations: BTreeMap::new(),
                rotations: BTreeMap::new(),
                scales: BTreeMap::new(),
            };
            for channel in anim.channels() {
                let node = channel.target().node().index();
                let (interpolation, cubic) = match channel.sampler().interpolation() {
                    gltf::animation::Interpolation::Linear => (Interpolation::Linear, false),
                    gltf::animation::Interpolation::Step => (Interpolation::Step, false),
                    gltf::animation::Interpolation::CubicSpline => (Interpolation::Linear, true),
                };
                let reader = channel.reader(|b| buffers.get(b.index()).map(|d| d.0.as_slice()));
                let (Some(inputs), Some(outputs)) = (reader.read_inputs(), reader.read_outputs())
                else {
                    continue;
                };
                let times: Vec<f32> = inputs.collect();
                if let Some(&last) = times.last() {
                    clip.duration = clip.duration.max(last);
                }
                match outputs {
                    ReadOutputs::Translations(it) => {
                        let values = keyframes(it.map(Vec3::from_array).collect(), cubic);
                        if let Some((times, values)) = matched(&clip.name, times, values) {
                            clip.translations.insert(
                                node,
                                TrackVec3 {
                                    times,
                                    values,
                                    interpolation,
                                },
                            );
                        }
                    }
                    ReadOutputs::Rotations(it) => {
                        let values = keyframes(
                            it.into_f32().map(|q| Quat::from_array(q).normalize()).collect(),
                            cubic,
                        );
                        if let Some((times, values)) = matched(&clip.name, times, values) {
                            clip.rotations.insert(
                                node,
                                TrackQuat {
                                    times,
                                    values,
                                    interpolation,
                                },
                            );
                        }
                    }
                    ReadOutputs::Scales(it) => {
                        let values = keyframes(it.map(Vec3::from_array).collect(), cubic);
                        if let Some((times, values)) = matched(&clip.name, times, values) {
                            clip.scales.insert(
                                node,
                                TrackVec3 {
                                    times,
                                    values,
                                    interpolation,
                                },
                            );
                        }
                    }
                    ReadOutputs::MorphTargetWeights(_) => {
                        tracing::warn!(
                            clip = %clip.name,
                            node,
                            "morph target weights are not supported, channel dropped"
                        );
                    }
                }
            }
            clip
        })
        .collect()
}

/// Cubic-spline outputs come as (in-tangent, value, out-tangent) triples.
fn keyframes<T: Copy>(values: Vec<T>, cubic: bool) -> Vec<T> {
    if cubic {
        values.chunks_exact(3).map(|c| c[1]).collect()
    } else {
        values
    }
}

fn matched<T>(clip: &str, mut times: Vec<f32>, mut values: Vec<T>) -> Option<(Vec<f32>, Vec<T>)> {
    if times.len() != values.len() {
        tracing::warn!(
            clip,
            times = times.len(),
            values = values.len(),
            "keyframe count mismatch, truncating"
        );
        let n = times.len().min(values.len());
        times.truncate(n);
        values.truncate(n);
    }
    (!times.is_empty()).then_some((times, values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn imports_fixture_glb() {
        let model = import_slice(&fixtures::triangle_glb(), "fixture.glb", None).unwrap();
        assert_eq!(model.name, "fixture.glb");
        assert_eq!(model.nodes.len(), 1);
        assert_eq!(model.roots, vec![0]);
        assert_eq!(model.nodes[0].name.as_deref(), Some("wing"));
        assert_eq!(model.primitives.len(), 1);
        assert_eq!(model.primitives[0].indices, vec![0, 1, 2]);
        assert_eq!(model.primitives[0].base_color, [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn bounds_include_node_translation() {
        let model = import_slice(&fixtures::triangle_glb(), "fixture.glb", None).unwrap();
        assert!(model.bounds.min.abs_diff_eq(Vec3::new(0.0, 1.0, 0.0), 1e-6));
        assert!(model.bounds.max.abs_diff_eq(Vec3::new(1.0, 2.0, 0.0), 1e-6));
    }

    #[test]
    fn reads_translation_clip() {
        let model = import_slice(&fixtures::triangle_glb(), "fixture.glb", None).unwrap();
        let clip = &model.clips[0];
        assert_eq!(clip.name, "flap");
        assert!((clip.duration - 1.0).abs() < 1e-6);
        let track = &clip.translations[&0];
        assert_eq!(track.times, vec![0.0, 1.0]);
        assert_eq!(track.values[1], Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(track.interpolation, Interpolation::Linear);
    }

    #[test]
    fn reads_skin_and_vertex_influences() {
        let model = import_slice(&fixtures::skinned_glb(), "skinned.glb", None).unwrap();
        assert_eq!(model.skins.len(), 1);
        assert_eq!(model.skins[0].name.as_deref(), Some("rig"));
        assert_eq!(model.skins[0].joints, vec![1]);
        assert_eq!(model.skins[0].inverse_bind, vec![Mat4::IDENTITY]);
        let binding = model.primitives[0].skin.as_ref().unwrap();
        assert_eq!(binding.skin, 0);
        assert_eq!(binding.joints, vec![[0; 4]; 3]);
        assert_eq!(binding.weights[2], [1.0, 0.0, 0.0, 0.0]);
        assert!(model.clips[0].translations.contains_key(&1));
    }

    #[test]
    fn skinned_mesh_moves_with_its_joint() {
        let model = import_slice(&fixtures::skinned_glb(), "skinned.glb", None).unwrap();
        assert!(model.bounds.max.abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), 1e-6));
        let mut locals = model.rest_locals();
        locals[1] = Mat4::from_translation(Vec3::new(0.0, 1.98, 0.0));
        let bounds = model.bounds_with(&model.global_matrices(&locals)).unwrap();
        assert!(bounds.min.abs_diff_eq(Vec3::new(0.0, 1.98, 0.0), 1e-5));
        assert!(bounds.max.abs_diff_eq(Vec3::new(1.0, 2.98, 0.0), 1e-5));
    }

    #[test]
    fn unskinned_fixture_has_no_binding() {
        let model = import_slice(&fixtures::triangle_glb(), "fixture.glb", None).unwrap();
        assert!(model.skins.is_empty());
        assert!(!model.primitives[0].is_skinned());
    }

    #[test]
    fn garbage_bytes_fail() {
        let err = import_slice(b"not a model", "junk", None).unwrap_err();
        assert!(matches!(err, AssetError::Gltf(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = import_file("/no/such/model.glb").unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }

    #[test]
    fn cubic_keyframes_keep_middle_values() {
        let v = keyframes(vec![0, 1, 2, 3, 4, 5], true);
        assert_eq!(v, vec![1, 4]);
    }
}
