use crate::shaders;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use std::collections::BTreeMap;
use wgpu::util::DeviceExt;
use wingspan_assets::{MeshVertex, ModelData};
use wingspan_common::ModelId;
use wingspan_scene::{Camera, Environment, Ground, Light, NodeKind, SceneGraph, StarPoint, Stars};

/// Stars are generated from a fixed seed so the sky is stable across runs.
const STAR_SEED: u64 = 0x5eed_0f_57a2;
const MAX_INSTANCES: u32 = 4096;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    ambient: [f32; 4],
    sun: [f32; 4],
    point: [f32; 4],
    viewport: [f32; 4],
}

impl Uniforms {
    fn new(env: &Environment, camera: &Camera, viewport: [f32; 2], seconds: f32) -> Self {
        let sun = env.lights.iter().find_map(|l| match l {
            Light::Directional {
                position,
                intensity,
                ..
            } => Some(position.normalize_or(Vec3::Y).extend(*intensity)),
            _ => None,
        });
        let point = env.lights.iter().find_map(|l| match l {
            Light::Point {
                position,
                intensity,
            } => Some(position.extend(*intensity)),
            _ => None,
        });
        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            ambient: [1.0, 1.0, 1.0, env.ambient_intensity()],
            sun: sun.map_or([0.0, 1.0, 0.0, 0.0], |v| v.to_array()),
            point: point.map_or([0.0; 4], |v| v.to_array()),
            viewport: [
                viewport[0].max(1.0),
                viewport[1].max(1.0),
                seconds,
                if env.stars.fade { 1.0 } else { 0.0 },
            ],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct InstanceData {
    model_0: [f32; 4],
    model_1: [f32; 4],
    model_2: [f32; 4],
    model_3: [f32; 4],
    color: [f32; 4],
}

impl InstanceData {
    fn new(model: Mat4, color: [f32; 4]) -> Self {
        let cols = model.to_cols_array_2d();
        Self {
            model_0: cols[0],
            model_1: cols[1],
            model_2: cols[2],
            model_3: cols[3],
            color,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct LineVertex {
    position: [f32; 3],
    color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct StarInstance {
    position: [f32; 3],
    color: [f32; 3],
    size: f32,
}

impl From<&StarPoint> for StarInstance {
    fn from(star: &StarPoint) -> Self {
        Self {
            position: star.position.to_array(),
            color: star.color,
            size: star.size,
        }
    }
}

/// Red, green and blue lines along +X, +Y and +Z.
fn axes_vertices(size: f32) -> Vec<LineVertex> {
    [
        (Vec3::X, [1.0, 0.0, 0.0, 1.0]),
        (Vec3::Y, [0.0, 1.0, 0.0, 1.0]),
        (Vec3::Z, [0.0, 0.0, 1.0, 1.0]),
    ]
    .into_iter()
    .flat_map(|(axis, color)| {
        [
            LineVertex {
                position: [0.0; 3],
                color,
            },
            LineVertex {
                position: (axis * size).to_array(),
                color,
            },
        ]
    })
    .collect()
}

fn wire_vertices(lines: &[[Vec3; 2]], color: [f32; 3]) -> Vec<LineVertex> {
    let color = [color[0], color[1], color[2], 1.0];
    lines
        .iter()
        .flatten()
        .map(|p| LineVertex {
            position: p.to_array(),
            color,
        })
        .collect()
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl GpuMesh {
    /// Skinned meshes pass `COPY_DST` so their vertices can be rewritten per frame.
    fn upload(
        device: &wgpu::Device,
        label: &str,
        vertices: &[MeshVertex],
        indices: &[u32],
        extra_usage: wgpu::BufferUsages,
    ) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_vertices")),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX | extra_usage,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_indices")),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }
}

struct GpuPrimitive {
    mesh: GpuMesh,
    node: usize,
    color: [f32; 4],
    skinned: bool,
}

struct LineBatch {
    buffer: wgpu::Buffer,
    vertex_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum LineSource {
    Ground(Ground),
    Axes(f32),
}

enum Draw {
    Mesh {
        model: ModelId,
        primitive: usize,
        instance: u32,
    },
    Disk {
        ground: usize,
        instance: u32,
    },
    Lines {
        batch: usize,
        instance: u32,
    },
}

/// wgpu renderer for scene graphs: lit meshes, wire lines and stars.
pub struct WgpuRenderer {
    mesh_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    star_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    instance_buffer: wgpu::Buffer,
    models: BTreeMap<ModelId, Vec<GpuPrimitive>>,
    disks: Vec<(Ground, GpuMesh)>,
    lines: Vec<(LineSource, LineBatch)>,
    stars: Option<(Stars, wgpu::Buffer, u32)>,
    depth_texture: wgpu::TextureView,
    viewport: [f32; 2],
}

fn depth_state(write: bool) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: wgpu::TextureFormat::Depth32Float,
        depth_write_enabled: write,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: Default::default(),
        bias: Default::default(),
    }
}

const INSTANCE_ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
    2 => Float32x4,
    3 => Float32x4,
    4 => Float32x4,
    5 => Float32x4,
    6 => Float32x4,
];

fn instance_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<InstanceData>() as u64,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &INSTANCE_ATTRIBUTES,
    }
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("uniform_buffer"),
            size: std::mem::size_of::<Uniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let color_target = |blend: wgpu::BlendState| {
            [Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })]
        };
        let opaque = color_target(wgpu::BlendState::REPLACE);
        let blended = color_target(wgpu::BlendState::ALPHA_BLENDING);

        // Mesh pipeline. Double-sided: glTF models and the ground disk are
        // viewed from both sides.
        let mesh_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mesh_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::mesh_shader().into()),
        });
        let mesh_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("mesh_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &mesh_shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<MeshVertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![
                            0 => Float32x3,
                            1 => Float32x3,
                        ],
                    },
                    instance_layout(),
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &mesh_shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &opaque,
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(depth_state(true)),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        // Line pipeline: terrain wireframe and axes.
        let line_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("line_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::line_shader().into()),
        });
        let line_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("line_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &line_shader,
                entry_point: Some("vs_line"),
                compilation_options: Default::default(),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<LineVertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![
                            0 => Float32x3,
                            1 => Float32x4,
                        ],
                    },
                    instance_layout(),
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &line_shader,
                entry_point: Some("fs_line"),
                compilation_options: Default::default(),
                targets: &opaque,
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: Some(depth_state(true)),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        // Star pipeline: one camera-facing quad per star instance.
        let star_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("star_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::star_shader().into()),
        });
        let star_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("star_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &star_shader,
                entry_point: Some("vs_star"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<StarInstance>() as u64,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x3,
                        2 => Float32,
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &star_shader,
                entry_point: Some("fs_star"),
                compilation_options: Default::default(),
                targets: &blended,
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: Some(depth_state(false)),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("instance_buffer"),
            size: (MAX_INSTANCES as u64) * std::mem::size_of::<InstanceData>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let depth_texture = Self::create_depth_texture(device, width, height);

        Self {
            mesh_pipeline,
            line_pipeline,
            star_pipeline,
            uniform_buffer,
            uniform_bind_group,
            instance_buffer,
            models: BTreeMap::new(),
            disks: Vec::new(),
            lines: Vec::new(),
            stars: None,
            depth_texture,
            viewport: [width.max(1) as f32, height.max(1) as f32],
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
        self.viewport = [width.max(1) as f32, height.max(1) as f32];
    }

    /// Upload a loaded model's geometry. Uploading the same model twice is a
    /// no-op.
    pub fn upload_model(&mut self, device: &wgpu::Device, model: &ModelData) {
        if self.models.contains_key(&model.id) {
            return;
        }
        let primitives: Vec<GpuPrimitive> = model
            .primitives
            .iter()
            .enumerate()
            .map(|(i, prim)| {
                let extra_usage = if prim.is_skinned() {
                    wgpu::BufferUsages::COPY_DST
                } else {
                    wgpu::BufferUsages::empty()
                };
                GpuPrimitive {
                    mesh: GpuMesh::upload(
                        device,
                        &format!("{}_{i}", model.name),
                        &prim.vertices,
                        &prim.indices,
                        extra_usage,
                    ),
                    node: prim.node,
                    color: prim.base_color,
                    skinned: prim.is_skinned(),
                }
            })
            .collect();
        tracing::debug!(
            model = %model.name,
            primitives = primitives.len(),
            "model uploaded"
        );
        self.models.insert(model.id, primitives);
    }

    fn disk_index(&mut self, device: &wgpu::Device, ground: Ground) -> usize {
        if let Some(i) = self.disks.iter().position(|(g, _)| *g == ground) {
            return i;
        }
        let (vertices, indices) = ground.disk_mesh();
        let mesh = GpuMesh::upload(
            device,
            "disk",
            &vertices,
            &indices,
            wgpu::BufferUsages::empty(),
        );
        self.disks.push((ground, mesh));
        self.disks.len() - 1
    }

    fn line_index(&mut self, device: &wgpu::Device, source: LineSource) -> usize {
        if let Some(i) = self.lines.iter().position(|(s, _)| *s == source) {
            return i;
        }
        let vertices = match source {
            LineSource::Ground(ground) => wire_vertices(&ground.wire_lines(), ground.color()),
            LineSource::Axes(size) => axes_vertices(size),
        };
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("line_vertices"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        self.lines.push((
            source,
            LineBatch {
                buffer,
                vertex_count: vertices.len() as u32,
            },
        ));
        self.lines.len() - 1
    }

    fn ensure_stars(&mut self, device: &wgpu::Device, stars: &Stars) {
        if matches!(&self.stars, Some((cached, _, _)) if cached == stars) {
            return;
        }
        let instances: Vec<StarInstance> = stars.points(STAR_SEED).iter().map(Into::into).collect();
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("star_instances"),
            contents: bytemuck::cast_slice(&instances),
            usage: wgpu::BufferUsages::VERTEX,
        });
        self.stars = Some((*stars, buffer, instances.len() as u32));
    }

    /// Render one frame of `graph` seen through `camera`.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        graph: &SceneGraph,
        camera: &Camera,
        seconds: f32,
    ) {
        let env = &graph.environment;
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&Uniforms::new(env, camera, self.viewport, seconds)),
        );
        self.ensure_stars(device, &env.stars);

        let mut instances: Vec<InstanceData> = Vec::new();
        let mut draws: Vec<Draw> = Vec::new();
        for node in &graph.nodes {
            match &node.kind {
                NodeKind::Model { model, pose } => {
                    let Some(primitives) = self.models.get(&model.id) else {
                        tracing::warn!(model = %model.name, "model drawn before upload");
                        continue;
                    };
                    for (i, prim) in primitives.iter().enumerate() {
                        let local = match model.primitives.get(i) {
                            Some(source) if prim.skinned => {
                                // Skinned vertices land in model space.
                                let posed = model.posed_vertices(source, pose);
                                let bytes = bytemuck::cast_slice(&posed);
                                queue.write_buffer(&prim.mesh.vertex_buffer, 0, bytes);
                                Mat4::IDENTITY
                            }
                            _ => pose.get(prim.node).copied().unwrap_or(Mat4::IDENTITY),
                        };
                        draws.push(Draw::Mesh {
                            model: model.id,
                            primitive: i,
                            instance: instances.len() as u32,
                        });
                        instances.push(InstanceData::new(node.transform * local, prim.color));
                    }
                }
                NodeKind::Ground(ground @ Ground::Disk { color, .. }) => {
                    let ground = self.disk_index(device, *ground);
                    draws.push(Draw::Disk {
                        ground,
                        instance: instances.len() as u32,
                    });
                    instances.push(InstanceData::new(
                        node.transform,
                        [color[0], color[1], color[2], 1.0],
                    ));
                }
                NodeKind::Ground(ground @ Ground::WireframePlane { .. }) => {
                    let batch = self.line_index(device, LineSource::Ground(*ground));
                    draws.push(Draw::Lines {
                        batch,
                        instance: instances.len() as u32,
                    });
                    instances.push(InstanceData::new(node.transform, [1.0; 4]));
                }
                NodeKind::Axes { size } => {
                    let batch = self.line_index(device, LineSource::Axes(*size));
                    draws.push(Draw::Lines {
                        batch,
                        instance: instances.len() as u32,
                    });
                    instances.push(InstanceData::new(node.transform, [1.0; 4]));
                }
            }
        }
        if instances.len() > MAX_INSTANCES as usize {
            tracing::warn!(count = instances.len(), "instance budget exceeded, dropping draws");
            instances.truncate(MAX_INSTANCES as usize);
        }
        if !instances.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

        let [r, g, b] = env.sky.clear_color();
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            pass.set_bind_group(0, &self.uniform_bind_group, &[]);

            for draw in &draws {
                let instance = match draw {
                    Draw::Mesh { instance, .. }
                    | Draw::Disk { instance, .. }
                    | Draw::Lines { instance, .. } => *instance,
                };
                if instance >= MAX_INSTANCES {
                    continue;
                }
                let instances = instance..instance + 1;
                match draw {
                    Draw::Mesh {
                        model, primitive, ..
                    } => {
                        let Some(prim) = self.models.get(model).and_then(|p| p.get(*primitive))
                        else {
                            continue;
                        };
                        self.draw_mesh(&mut pass, &prim.mesh, instances);
                    }
                    Draw::Disk { ground, .. } => {
                        let (_, mesh) = &self.disks[*ground];
                        self.draw_mesh(&mut pass, mesh, instances);
                    }
                    Draw::Lines { batch, .. } => {
                        let (_, batch) = &self.lines[*batch];
                        pass.set_pipeline(&self.line_pipeline);
                        pass.set_vertex_buffer(0, batch.buffer.slice(..));
                        pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
                        pass.draw(0..batch.vertex_count, instances);
                    }
                }
            }

            // Stars last: they blend and do not write depth.
            if let Some((_, buffer, count)) = &self.stars {
                if *count > 0 {
                    pass.set_pipeline(&self.star_pipeline);
                    pass.set_vertex_buffer(0, buffer.slice(..));
                    pass.draw(0..6, 0..*count);
                }
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn draw_mesh(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        mesh: &GpuMesh,
        instances: std::ops::Range<u32>,
    ) {
        pass.set_pipeline(&self.mesh_pipeline);
        pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
        pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..mesh.index_count, 0, instances);
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}
