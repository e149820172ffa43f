use crate::camera::OrbitCamera;
use crate::shaders;
use bytemuck::{Pod, Zeroable};
use lanternfield_common::{Palette, RenderConfig, Rgb};
use lanternfield_motion::{LanternInstance, Population};
use lanternfield_render::{MeshError, lantern_mesh};
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Errors from building the GPU-side scene.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("mesh error: {0}")]
    Mesh(#[from] MeshError),
    #[error("population of {0} lanterns exceeds the instance range")]
    TooManyInstances(usize),
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    light: [f32; 4],
    color: [f32; 4],
    fire: [f32; 4],
    /// x: elapsed seconds, y: flame threshold, z: mesh scale.
    params: [f32; 4],
}

impl Uniforms {
    fn new(
        camera: &OrbitCamera,
        palette: &Palette,
        elapsed: f32,
        flame_threshold: f32,
        mesh_scale: f32,
    ) -> Self {
        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            light: palette.light.to_vec4(),
            color: palette.color.to_vec4(),
            fire: palette.fire.to_vec4(),
            params: [elapsed, flame_threshold, mesh_scale, 0.0],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Vertex {
    position: [f32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct InstanceData {
    base: [f32; 3],
    speed: f32,
    phase: [f32; 2],
}

impl From<&LanternInstance> for InstanceData {
    fn from(inst: &LanternInstance) -> Self {
        Self {
            base: inst.base.to_array(),
            speed: inst.speed,
            phase: [inst.orbit_phase, inst.vertical_phase],
        }
    }
}

/// Clear color for `format`. Palette colors are linear; a non-sRGB target
/// stores what it is given, so the background is encoded first.
fn clear_color(background: Rgb, format: wgpu::TextureFormat) -> wgpu::Color {
    let c = if format.is_srgb() {
        background
    } else {
        background.to_srgb()
    };
    wgpu::Color {
        r: c.r as f64,
        g: c.g as f64,
        b: c.b as f64,
        a: 1.0,
    }
}

/// wgpu renderer drawing the whole lantern population in one instanced call.
///
/// Mesh and instance buffers are uploaded once at construction; per frame
/// only the uniform block (camera + elapsed time) is rewritten.
pub struct LanternRenderer {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    instance_buffer: wgpu::Buffer,
    instance_count: u32,
    depth_texture: wgpu::TextureView,
    msaa_texture: Option<wgpu::TextureView>,
    sample_count: u32,
    surface_format: wgpu::TextureFormat,
    palette: Palette,
    flame_threshold: f32,
    mesh_scale: f32,
}

impl LanternRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        population: &Population,
        palette: Palette,
        render: &RenderConfig,
    ) -> Result<Self, RenderError> {
        let instance_count = u32::try_from(population.len())
            .map_err(|_| RenderError::TooManyInstances(population.len()))?;
        let sample_count = render.msaa_samples.max(1);

        // Uniform buffer
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lantern_uniform_buffer"),
            contents: bytemuck::bytes_of(&Uniforms::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lantern_bind_group_layout"),
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
            label: Some("lantern_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lantern_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("lantern_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::LANTERN_SHADER.into()),
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("lantern_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![0 => Float32x3],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<InstanceData>() as u64,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &wgpu::vertex_attr_array![
                            1 => Float32x3,
                            2 => Float32,
                            3 => Float32x2,
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
                // Lanterns are open shells, so both faces are drawn.
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: sample_count,
                ..Default::default()
            },
            multiview: None,
            cache: None,
        });

        // Lantern mesh
        let mesh = lantern_mesh();
        let vertices: Vec<Vertex> = mesh
            .positions_array()
            .into_iter()
            .map(|position| Vertex { position })
            .collect();
        let indices = mesh.indices_u16()?;
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lantern_vertex_buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lantern_index_buffer"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let index_count = indices.len() as u32;

        // Instances never change, so they are uploaded once.
        let instances: Vec<InstanceData> =
            population.instances().iter().map(InstanceData::from).collect();
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lantern_instance_buffer"),
            contents: bytemuck::cast_slice(&instances),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let depth_texture = Self::create_depth_texture(device, width, height, sample_count);
        let msaa_texture =
            Self::create_msaa_texture(device, surface_format, width, height, sample_count);

        tracing::debug!(
            instances = instance_count,
            indices = index_count,
            sample_count,
            "lantern renderer ready"
        );

        Ok(Self {
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            vertex_buffer,
            index_buffer,
            index_count,
            instance_buffer,
            instance_count,
            depth_texture,
            msaa_texture,
            sample_count,
            surface_format,
            palette,
            flame_threshold: render.flame_threshold,
            mesh_scale: render.mesh_scale,
        })
    }

    /// Recreate size-dependent render targets.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height, self.sample_count);
        self.msaa_texture = Self::create_msaa_texture(
            device,
            self.surface_format,
            width,
            height,
            self.sample_count,
        );
        tracing::debug!(width, height, "lantern render targets resized");
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Render one frame of every lantern at `elapsed` seconds.
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        camera: &OrbitCamera,
        elapsed: f32,
    ) {
        let uniforms = Uniforms::new(
            camera,
            &self.palette,
            elapsed,
            self.flame_threshold,
            self.mesh_scale,
        );
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("lantern_encoder"),
        });

        let clear = clear_color(self.palette.background, self.surface_format);
        let (target, resolve_target, store) = match &self.msaa_texture {
            Some(msaa) => (msaa, Some(view), wgpu::StoreOp::Discard),
            None => (view, None, wgpu::StoreOp::Store),
        };

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("lantern_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear),
                        store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            if self.instance_count > 0 {
                pass.set_pipeline(&self.pipeline);
                pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
                pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
                pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                pass.draw_indexed(0..self.index_count, 0, 0..self.instance_count);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        sample_count: u32,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("lantern_depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }

    fn create_msaa_texture(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        sample_count: u32,
    ) -> Option<wgpu::TextureView> {
        if sample_count <= 1 {
            return None;
        }
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("lantern_msaa_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        Some(texture.create_view(&Default::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn gpu_struct_sizes() {
        assert_eq!(std::mem::size_of::<Uniforms>(), 128);
        assert_eq!(std::mem::size_of::<Vertex>(), 12);
        assert_eq!(std::mem::size_of::<InstanceData>(), 24);
    }

    #[test]
    fn instance_data_from_lantern() {
        let inst = LanternInstance::new(Vec3::new(1.0, 2.0, 3.0), 0.5, 0.25, 4.0);
        let data = InstanceData::from(&inst);
        assert_eq!(data.base, [1.0, 2.0, 3.0]);
        assert_eq!(data.speed, 0.5);
        assert_eq!(data.phase, [0.25, 4.0]);
    }

    #[test]
    fn clear_color_matches_hex_on_unorm_target() {
        let bg = Palette::default().background;
        let unorm = clear_color(bg, wgpu::TextureFormat::Bgra8Unorm);
        assert!((unorm.r - 0x18 as f64 / 255.0).abs() < 1e-4);
        assert!((unorm.b - 0x05 as f64 / 255.0).abs() < 1e-4);

        let srgb = clear_color(bg, wgpu::TextureFormat::Bgra8UnormSrgb);
        assert_eq!(srgb.r, bg.r as f64);
    }

    #[test]
    fn uniforms_carry_time_and_palette() {
        let camera = OrbitCamera::default();
        let palette = Palette::default();
        let u = Uniforms::new(&camera, &palette, 12.5, 0.2, 2.0);
        assert_eq!(u.params, [12.5, 0.2, 2.0, 0.0]);
        assert!((u.light[0] - 1.5).abs() < 1e-5);
        assert_eq!(u.light[3], 1.0);
        assert_eq!(u.fire, [1.0, 0.75, 0.0, 1.0]);
        assert_eq!(u.view_proj, camera.view_projection().to_cols_array_2d());
    }
}
