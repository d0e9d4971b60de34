/// Shared uniform block. Every pipeline binds the same buffer.
const UNIFORMS: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    // rgb = colour, w = ambient intensity
    ambient: vec4<f32>,
    // xyz = direction towards the light, w = intensity
    sun: vec4<f32>,
    // xyz = position, w = intensity
    point: vec4<f32>,
    // x, y = viewport size in pixels, z = seconds, w = 1 for soft stars
    viewport: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;
"#;

const MESH_BODY: &str = r#"
struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(2) model_0: vec4<f32>,
    @location(3) model_1: vec4<f32>,
    @location(4) model_2: vec4<f32>,
    @location(5) model_3: vec4<f32>,
    @location(6) color: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) color: vec4<f32>,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    let world_pos = model * vec4<f32>(vertex.position, 1.0);
    let world_normal = (model * vec4<f32>(vertex.normal, 0.0)).xyz;

    var out: VertexOutput;
    out.clip_position = uniforms.view_proj * world_pos;
    out.world_pos = world_pos.xyz;
    out.world_normal = normalize(world_normal);
    out.color = instance.color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput, @builtin(front_facing) front: bool) -> @location(0) vec4<f32> {
    var n = normalize(in.world_normal);
    if !front {
        n = -n;
    }
    let sun = max(dot(n, normalize(uniforms.sun.xyz)), 0.0) * uniforms.sun.w;
    let to_point = uniforms.point.xyz - in.world_pos;
    let point = max(dot(n, normalize(to_point)), 0.0) * uniforms.point.w;
    let lighting = uniforms.ambient.rgb * uniforms.ambient.w + vec3<f32>(sun + point);
    return vec4<f32>(in.color.rgb * lighting, in.color.a);
}
"#;

const LINE_BODY: &str = r#"
struct LineVertex {
    @location(0) position: vec3<f32>,
    @location(1) color: vec4<f32>,
};

struct InstanceInput {
    @location(2) model_0: vec4<f32>,
    @location(3) model_1: vec4<f32>,
    @location(4) model_2: vec4<f32>,
    @location(5) model_3: vec4<f32>,
    @location(6) tint: vec4<f32>,
};

struct LineOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_line(vertex: LineVertex, instance: InstanceInput) -> LineOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    var out: LineOutput;
    out.clip_position = uniforms.view_proj * model * vec4<f32>(vertex.position, 1.0);
    out.color = vertex.color * instance.tint;
    return out;
}

@fragment
fn fs_line(in: LineOutput) -> @location(0) vec4<f32> {
    return in.color;
}
"#;

const STAR_BODY: &str = r#"
struct StarInput {
    @location(0) position: vec3<f32>,
    @location(1) color: vec3<f32>,
    @location(2) size: f32,
};

struct StarOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec3<f32>,
    @location(1) corner: vec2<f32>,
};

// Two triangles per star, expanded in clip space.
var<private> CORNERS: array<vec2<f32>, 6> = array<vec2<f32>, 6>(
    vec2<f32>(-1.0, -1.0), vec2<f32>(1.0, -1.0), vec2<f32>(1.0, 1.0),
    vec2<f32>(-1.0, -1.0), vec2<f32>(1.0, 1.0), vec2<f32>(-1.0, 1.0),
);

@vertex
fn vs_star(@builtin(vertex_index) index: u32, star: StarInput) -> StarOutput {
    let corner = CORNERS[index];
    var clip = uniforms.view_proj * vec4<f32>(star.position, 1.0);
    let twinkle = 3.0 + sin(uniforms.viewport.z + 100.0);
    let pixels = star.size * (30.0 / max(clip.w, 0.001)) * twinkle;
    let half_ndc = vec2<f32>(pixels, pixels) / uniforms.viewport.xy;
    clip = vec4<f32>(clip.xy + corner * half_ndc * clip.w, clip.zw);

    var out: StarOutput;
    out.clip_position = clip;
    out.color = star.color;
    out.corner = corner;
    return out;
}

@fragment
fn fs_star(in: StarOutput) -> @location(0) vec4<f32> {
    let d = length(in.corner) * 0.5;
    if d > 0.5 {
        discard;
    }
    var opacity = 1.0;
    if uniforms.viewport.w > 0.5 {
        opacity = 1.0 / (1.0 + exp(16.0 * (d - 0.25)));
    }
    return vec4<f32>(in.color, opacity);
}
"#;

pub fn mesh_shader() -> String {
    format!("{UNIFORMS}{MESH_BODY}")
}

pub fn line_shader() -> String {
    format!("{UNIFORMS}{LINE_BODY}")
}

pub fn star_shader() -> String {
    format!("{UNIFORMS}{STAR_BODY}")
}
