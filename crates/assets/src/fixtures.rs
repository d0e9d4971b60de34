//! Hand-built GLBs used by the import and loader tests.

/// One node "wing" at (0, 1, 0) holding a single triangle, plus a clip
/// "flap" that moves the node from the origin to (0, 2, 0) over one second.
pub(crate) fn triangle_glb() -> Vec<u8> {
    let mut bin: Vec<u8> = Vec::new();
    // positions: 36 bytes at 0
    for v in [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
        for c in v {
            bin.extend_from_slice(&c.to_le_bytes());
        }
    }
    // indices: 6 bytes at 36, padded to 44
    for i in [0u16, 1, 2] {
        bin.extend_from_slice(&i.to_le_bytes());
    }
    bin.extend_from_slice(&[0, 0]);
    // key times: 8 bytes at 44
    for t in [0.0f32, 1.0] {
        bin.extend_from_slice(&t.to_le_bytes());
    }
    // translations: 24 bytes at 52
    for v in [[0.0f32, 0.0, 0.0], [0.0, 2.0, 0.0]] {
        for c in v {
            bin.extend_from_slice(&c.to_le_bytes());
        }
    }
    assert_eq!(bin.len(), 76);

    let json = r#"{
        "asset": {"version": "2.0"},
        "scene": 0,
        "scenes": [{"nodes": [0]}],
        "nodes": [{"name": "wing", "mesh": 0, "translation": [0.0, 1.0, 0.0]}],
        "meshes": [{"primitives": [{"attributes": {"POSITION": 0}, "indices": 1}]}],
        "buffers": [{"byteLength": 76}],
        "bufferViews": [
            {"buffer": 0, "byteOffset": 0, "byteLength": 36, "target": 34962},
            {"buffer": 0, "byteOffset": 36, "byteLength": 6, "target": 34963},
            {"buffer": 0, "byteOffset": 44, "byteLength": 8},
            {"buffer": 0, "byteOffset": 52, "byteLength": 24}
        ],
        "accessors": [
            {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
             "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]},
            {"bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR"},
            {"bufferView": 2, "componentType": 5126, "count": 2, "type": "SCALAR",
             "min": [0.0], "max": [1.0]},
            {"bufferView": 3, "componentType": 5126, "count": 2, "type": "VEC3"}
        ],
        "animations": [{
            "name": "flap",
            "channels": [{"sampler": 0, "target": {"node": 0, "path": "translation"}}],
            "samplers": [{"input": 2, "output": 3, "interpolation": "LINEAR"}]
        }]
    }"#;

    container(json, &bin)
}

/// Node 0 holds a triangle skinned entirely to joint node 1. Clip "lift"
/// moves the joint from the origin to (0, 2, 0) over one second.
pub(crate) fn skinned_glb() -> Vec<u8> {
    let mut bin: Vec<u8> = Vec::new();
    // positions: 36 bytes at 0
    floats(&mut bin, &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    // indices: 6 bytes at 36, padded to 44
    for i in [0u16, 1, 2] {
        bin.extend_from_slice(&i.to_le_bytes());
    }
    bin.extend_from_slice(&[0, 0]);
    // joints: 24 bytes at 44
    bin.extend_from_slice(&[0u8; 24]);
    // weights: 48 bytes at 68
    for _ in 0..3 {
        floats(&mut bin, &[1.0, 0.0, 0.0, 0.0]);
    }
    // inverse bind matrix: 64 bytes at 116
    floats(&mut bin, &glam::Mat4::IDENTITY.to_cols_array());
    // key times: 8 bytes at 180
    floats(&mut bin, &[0.0, 1.0]);
    // translations: 24 bytes at 188
    floats(&mut bin, &[0.0, 0.0, 0.0, 0.0, 2.0, 0.0]);
    assert_eq!(bin.len(), 212);

    let json = r#"{
        "asset": {"version": "2.0"},
        "scene": 0,
        "scenes": [{"nodes": [0, 1]}],
        "nodes": [
            {"name": "body", "mesh": 0, "skin": 0},
            {"name": "joint"}
        ],
        "skins": [{"name": "rig", "joints": [1], "inverseBindMatrices": 4}],
        "meshes": [{"primitives": [{
            "attributes": {"POSITION": 0, "JOINTS_0": 2, "WEIGHTS_0": 3},
            "indices": 1
        }]}],
        "buffers": [{"byteLength": 212}],
        "bufferViews": [
            {"buffer": 0, "byteOffset": 0, "byteLength": 36, "target": 34962},
            {"buffer": 0, "byteOffset": 36, "byteLength": 6, "target": 34963},
            {"buffer": 0, "byteOffset": 44, "byteLength": 24, "target": 34962},
            {"buffer": 0, "byteOffset": 68, "byteLength": 48, "target": 34962},
            {"buffer": 0, "byteOffset": 116, "byteLength": 64},
            {"buffer": 0, "byteOffset": 180, "byteLength": 8},
            {"buffer": 0, "byteOffset": 188, "byteLength": 24}
        ],
        "accessors": [
            {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
             "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]},
            {"bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR"},
            {"bufferView": 2, "componentType": 5123, "count": 3, "type": "VEC4"},
            {"bufferView": 3, "componentType": 5126, "count": 3, "type": "VEC4"},
            {"bufferView": 4, "componentType": 5126, "count": 1, "type": "MAT4"},
            {"bufferView": 5, "componentType": 5126, "count": 2, "type": "SCALAR",
             "min": [0.0], "max": [1.0]},
            {"bufferView": 6, "componentType": 5126, "count": 2, "type": "VEC3"}
        ],
        "animations": [{
            "name": "lift",
            "channels": [{"sampler": 0, "target": {"node": 1, "path": "translation"}}],
            "samplers": [{"input": 5, "output": 6, "interpolation": "LINEAR"}]
        }]
    }"#;
    container(json, &bin)
}

fn floats(bin: &mut Vec<u8>, values: &[f32]) {
    for c in values {
        bin.extend_from_slice(&c.to_le_bytes());
    }
}

fn container(json: &str, bin: &[u8]) -> Vec<u8> {
    let mut json_bytes = json.as_bytes().to_vec();
    while json_bytes.len() % 4 != 0 {
        json_bytes.push(b' ');
    }

    let total = 12 + 8 + json_bytes.len() + 8 + bin.len();
    let mut glb = Vec::with_capacity(total);
    glb.extend_from_slice(b"glTF");
    glb.extend_from_slice(&2u32.to_le_bytes());
    glb.extend_from_slice(&(total as u32).to_le_bytes());
    glb.extend_from_slice(&(json_bytes.len() as u32).to_le_bytes());
    glb.extend_from_slice(b"JSON");
    glb.extend_from_slice(&json_bytes);
    glb.extend_from_slice(&(bin.len() as u32).to_le_bytes());
    glb.extend_from_slice(b"BIN\0");
    glb.extend_from_slice(bin);
    glb
}
