use crate::camera::OrbitCamera;
use crate::shaders;
use bytemuck::{Pod, Zeroable};
use cubeview_scene::{BoxGeometry, Scene};
use glam::{Mat4, Quat};
use tracing::debug;
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    /// xyz: unit vector toward the light, w unused.
    light_dir: [f32; 4],
    /// rgb: light color, w: intensity.
    light_color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Vertex {
    position: [f32; 3],
    normal: [f32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct InstanceData {
    model_0: [f32; 4],
    model_1: [f32; 4],
    model_2: [f32; 4],
    model_3: [f32; 4],
    color: [f32; 4],
}

/// Generate box vertices and indices with per-face normals.
fn box_mesh(geometry: &BoxGeometry) -> (Vec<Vertex>, Vec<u16>) {
    let x = geometry.width * 0.5;
    let y = geometry.height * 0.5;
    let z = geometry.depth * 0.5;
    #[rustfmt::skip]
    let vertices = vec![
        // +Z face
        Vertex { position: [-x, -y,  z], normal: [0.0, 0.0, 1.0] },
        Vertex { position: [ x, -y,  z], normal: [0.0, 0.0, 1.0] },
        Vertex { position: [ x,  y,  z], normal: [0.0, 0.0, 1.0] },
        Vertex { position: [-x,  y,  z], normal: [0.0, 0.0, 1.0] },
        // -Z face
        Vertex { position: [ x, -y, -z], normal: [0.0, 0.0, -1.0] },
        Vertex { position: [-x, -y, -z], normal: [0.0, 0.0, -1.0] },
        Vertex { position: [-x,  y, -z], normal: [0.0, 0.0, -1.0] },
        Vertex { position: [ x,  y, -z], normal: [0.0, 0.0, -1.0] },
        // +X face
        Vertex { position: [ x, -y,  z], normal: [1.0, 0.0, 0.0] },
        Vertex { position: [ x, -y, -z], normal: [1.0, 0.0, 0.0] },
        Vertex { position: [ x,  y, -z], normal: [1.0, 0.0, 0.0] },
        Vertex { position: [ x,  y,  z], normal: [1.0, 0.0, 0.0] },
        // -X face
        Vertex { position: [-x, -y, -z], normal: [-1.0, 0.0, 0.0] },
        Vertex { position: [-x, -y,  z], normal: [-1.0, 0.0, 0.0] },
        Vertex { position: [-x,  y,  z], normal: [-1.0, 0.0, 0.0] },
        Vertex { position: [-x,  y, -z], normal: [-1.0, 0.0, 0.0] },
        // +Y face
        Vertex { position: [-x,  y,  z], normal: [0.0, 1.0, 0.0] },
        Vertex { position: [ x,  y,  z], normal: [0.0, 1.0, 0.0] },
        Vertex { position: [ x,  y, -z], normal: [0.0, 1.0, 0.0] },
        Vertex { position: [-x,  y, -z], normal: [0.0, 1.0, 0.0] },
        // -Y face
        Vertex { position: [-x, -y, -z], normal: [0.0, -1.0, 0.0] },
        Vertex { position: [ x, -y, -z], normal: [0.0, -1.0, 0.0] },
        Vertex { position: [ x, -y,  z], normal: [0.0, -1.0, 0.0] },
        Vertex { position: [-x, -y,  z], normal: [0.0, -1.0, 0.0] },
    ];
    #[rustfmt::skip]
    let indices: Vec<u16> = vec![
        0,1,2, 2,3,0,       // +Z
        4,5,6, 6,7,4,       // -Z
        8,9,10, 10,11,8,    // +X
        12,13,14, 14,15,12, // -X
        16,17,18, 18,19,16, // +Y
        20,21,22, 22,23,20, // -Y
    ];
    (vertices, indices)
}

/// True when the surface configuration no longer matches the window's
/// client size. Zero dimensions clamp to one pixel, the same as the
/// configuration itself does.
pub fn needs_resize(config: &wgpu::SurfaceConfiguration, width: u32, height: u32) -> bool {
    config.width != width.max(1) || config.height != height.max(1)
}

struct MeshBuffers {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

/// wgpu scene renderer: one instanced, depth-tested pass over the cubes.
///
/// Buffers are sized once from the scene, which never changes shape after
/// construction; per-frame work is two buffer writes and one pass.
pub struct SceneRenderer {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    meshes: Vec<MeshBuffers>,
    instance_buffer: wgpu::Buffer,
    max_instances: u32,
    depth_texture: wgpu::TextureView,
}

impl SceneRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        scene: &Scene,
    ) -> Self {
        // Uniform buffer
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("uniform_buffer"),
            contents: bytemuck::bytes_of(&Uniforms {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
                light_dir: [0.0, 1.0, 0.0, 0.0],
                light_color: [1.0, 1.0, 1.0, 1.0],
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
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

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("cube_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SCENE_SHADER.into()),
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("cube_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![
                            0 => Float32x3,
                            1 => Float32x3,
                        ],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<InstanceData>() as u64,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &wgpu::vertex_attr_array![
                            2 => Float32x4,
                            3 => Float32x4,
                            4 => Float32x4,
                            5 => Float32x4,
                            6 => Float32x4,
                        ],
                    },
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        // One vertex/index buffer pair per geometry table entry.
        let meshes = scene
            .geometries()
            .iter()
            .map(|geometry| {
                let (vertices, indices) = box_mesh(geometry);
                let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("cube_vertex_buffer"),
                    contents: bytemuck::cast_slice(&vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("cube_index_buffer"),
                    contents: bytemuck::cast_slice(&indices),
                    usage: wgpu::BufferUsages::INDEX,
                });
                MeshBuffers {
                    vertex_buffer,
                    index_buffer,
                    index_count: indices.len() as u32,
                }
            })
            .collect();

        // The scene's cube count is fixed, so the instance buffer is exact.
        let max_instances = scene.cube_count().max(1) as u32;
        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("instance_buffer"),
            size: (max_instances as u64) * std::mem::size_of::<InstanceData>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let depth_texture = Self::create_depth_texture(device, width, height);

        debug!(
            cubes = scene.cube_count(),
            geometries = scene.geometries().len(),
            "scene renderer ready"
        );

        Self {
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            meshes,
            instance_buffer,
            max_instances,
            depth_texture,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    /// Render one frame of the scene into `view`.
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        camera: &OrbitCamera,
        scene: &Scene,
    ) {
        let light = scene.light();
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&Uniforms {
                view_proj: camera.view_projection().to_cols_array_2d(),
                light_dir: light.direction().extend(0.0).to_array(),
                light_color: {
                    let [r, g, b, _] = light.color.to_array();
                    [r, g, b, light.intensity]
                },
            }),
        );

        // Build instance data grouped by geometry, so each mesh draws its
        // cubes as one contiguous instance range.
        let mut instances: Vec<InstanceData> = Vec::with_capacity(scene.cube_count());
        let mut ranges: Vec<std::ops::Range<u32>> = Vec::with_capacity(self.meshes.len());
        for geometry_index in 0..self.meshes.len() {
            let start = instances.len() as u32;
            for cube in scene.cubes() {
                if cube.geometry.0 as usize != geometry_index {
                    continue;
                }
                if instances.len() >= self.max_instances as usize {
                    break;
                }
                let t = &cube.transform;
                let model =
                    Mat4::from_scale_rotation_translation(t.scale, Quat::IDENTITY, t.position);
                let cols = model.to_cols_array_2d();
                instances.push(InstanceData {
                    model_0: cols[0],
                    model_1: cols[1],
                    model_2: cols[2],
                    model_3: cols[3],
                    color: cube.material.color.to_array(),
                });
            }
            ranges.push(start..instances.len() as u32);
        }

        if !instances.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

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
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
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

            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            for (mesh, range) in self.meshes.iter().zip(&ranges) {
                if range.is_empty() {
                    continue;
                }
                pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                pass.draw_indexed(0..mesh.index_count, 0, range.clone());
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn config(width: u32, height: u32) -> wgpu::SurfaceConfiguration {
        wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: wgpu::TextureFormat::Bgra8UnormSrgb,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        }
    }

    #[test]
    fn resize_detection() {
        let cfg = config(800, 600);
        assert!(!needs_resize(&cfg, 800, 600));
        assert!(needs_resize(&cfg, 801, 600));
        assert!(needs_resize(&cfg, 800, 599));
    }

    #[test]
    fn minimized_window_counts_as_one_pixel() {
        let cfg = config(1, 1);
        assert!(!needs_resize(&cfg, 0, 0));
        let cfg = config(800, 600);
        assert!(needs_resize(&cfg, 0, 0));
    }

    #[test]
    fn box_mesh_respects_dimensions() {
        let (vertices, indices) = box_mesh(&BoxGeometry {
            width: 2.0,
            height: 4.0,
            depth: 6.0,
        });
        assert_eq!(vertices.len(), 24);
        assert_eq!(indices.len(), 36);
        for v in &vertices {
            assert!(v.position[0].abs() <= 1.0);
            assert!(v.position[1].abs() <= 2.0);
            assert!(v.position[2].abs() <= 3.0);
        }
    }
}
