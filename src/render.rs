use crate::backend::{Effect, FieldHandle, FieldKind, RenderBackend};
use crate::buffer_util::{
    make_uniform_buffer, make_uniform_slice_buffer, make_vertex_buffer, uniform_layout_entry,
    SizedBuffer,
};
use crate::camera::{PerspectiveCamera, CAMERA_UNIFORM_LEN};
use crate::particle_field::ParticleField;
use crate::test_cube::TestCube;
use crate::viewport::clamp_pixel_ratio;
use log::{error, info, trace};
use std::borrow::Cow;
use std::collections::HashMap;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

// This should match the `Field` struct in the particle shaders.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FieldUniforms {
    // xyz origin, w elapsed time.
    pub origin: [f32; 4],
    // radius, height, lowest vertical offset, speed factor.
    pub shape: [f32; 4],
    // rgb, w point size.
    pub primary: [f32; 4],
    pub secondary: [f32; 4],
    pub wind: [f32; 4],
    // amplitude, period.
    pub wave: [f32; 4],
}

fn rgba(rgb: [f32; 3], w: f32) -> [f32; 4] {
    [rgb[0], rgb[1], rgb[2], w]
}

impl FieldUniforms {
    pub fn new(effect: &Effect) -> Self {
        let (field, primary, secondary, wind, wave) = match effect {
            Effect::Flame(flame) => (
                flame.field,
                flame.inner_color,
                flame.outer_color,
                [0.0; 3],
                [0.0; 4],
            ),
            Effect::Smoke(smoke) => (
                smoke.field,
                smoke.color,
                smoke.color,
                smoke.wind,
                [smoke.wave_amplitude, smoke.wave_period, 0.0, 0.0],
            ),
        };
        FieldUniforms {
            origin: rgba(field.origin, 0.0),
            shape: [
                field.radius,
                field.height,
                field.vertical.lower_bound(field.height),
                field.speed_factor,
            ],
            primary: rgba(primary, field.point_size),
            secondary: rgba(secondary, 1.0),
            wind: rgba(wind, 0.0),
            wave,
        }
    }

    pub fn set_time(&mut self, time: f32) {
        self.origin[3] = time;
    }
}

// Surface extent in physical pixels, which always follows the window, and the
// clamped pixel ratio the particle shaders size points with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceState {
    extent: (u32, u32),
    pixel_ratio: f64,
    dirty: bool,
}

impl SurfaceState {
    pub fn new(width: u32, height: u32, device_pixel_ratio: f64) -> Self {
        SurfaceState {
            extent: (width.max(1), height.max(1)),
            pixel_ratio: clamp_pixel_ratio(device_pixel_ratio),
            dirty: false,
        }
    }

    pub fn extent(&self) -> (u32, u32) {
        self.extent
    }

    pub fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    // Whether the surface must be reconfigured before the next frame.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    // Empty extents (minimized windows) cannot be configured and are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 || (width, height) == self.extent {
            return;
        }
        self.extent = (width, height);
        self.dirty = true;
    }

    // Only point sizing depends on this, so the surface stays as is.
    pub fn set_pixel_ratio(&mut self, device_pixel_ratio: f64) {
        self.pixel_ratio = clamp_pixel_ratio(device_pixel_ratio);
    }

    pub fn mark_configured(&mut self) {
        self.dirty = false;
    }
}

struct FieldResources {
    kind: FieldKind,
    count: u32,
    uniforms: FieldUniforms,
    uniform_buffer: SizedBuffer,
    positions: SizedBuffer,
    scales: SizedBuffer,
    bind_group: wgpu::BindGroup,
}

impl FieldResources {
    fn destroy(&self) {
        self.uniform_buffer.destroy();
        self.positions.destroy();
        self.scales.destroy();
    }
}

// Renders the scene to a window surface.
pub struct WgpuBackend {
    surface: wgpu::Surface,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    surface_state: SurfaceState,
    depth_view: wgpu::TextureView,

    camera_uniform_buf: SizedBuffer,
    camera_bind_group: wgpu::BindGroup,
    field_bind_group_layout: wgpu::BindGroupLayout,
    flame_pipeline: wgpu::RenderPipeline,
    smoke_pipeline: wgpu::RenderPipeline,

    test_cube: TestCube,
    show_test_cube: bool,

    fields: HashMap<FieldHandle, FieldResources>,
    next_handle: u32,
    frame_num: i64,
}

impl WgpuBackend {
    pub fn init(
        surface: wgpu::Surface,
        device: wgpu::Device,
        queue: wgpu::Queue,
        format: wgpu::TextureFormat,
        surface_state: SurfaceState,
    ) -> Self {
        let (width, height) = surface_state.extent();
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
        };
        surface.configure(&device, &config);
        let depth_view = make_depth_view(&device, width, height);

        let raw_uniforms = [0f32; CAMERA_UNIFORM_LEN];
        let camera_uniform_buf =
            make_uniform_slice_buffer(&device, "Camera uniform buffer", &raw_uniforms);
        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Camera bind group layout"),
                entries: &[uniform_layout_entry(
                    0,
                    wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    camera_uniform_buf.size,
                )],
            });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera bind group"),
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_uniform_buf.buffer.as_entire_binding(),
            }],
        });

        let field_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Field bind group layout"),
                entries: &[uniform_layout_entry(
                    0,
                    wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    std::mem::size_of::<FieldUniforms>() as wgpu::BufferAddress,
                )],
            });
        let field_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Field pipeline layout"),
                bind_group_layouts: &[&camera_bind_group_layout, &field_bind_group_layout],
                push_constant_ranges: &[],
            });

        // Flames add light; smoke occludes what is behind it.
        let additive = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent::OVER,
        };
        let flame_pipeline = make_field_pipeline(
            &device,
            &field_pipeline_layout,
            "Flame",
            include_str!("shaders/flame.wgsl"),
            format,
            additive,
        );
        let smoke_pipeline = make_field_pipeline(
            &device,
            &field_pipeline_layout,
            "Smoke",
            include_str!("shaders/smoke.wgsl"),
            format,
            wgpu::BlendState::ALPHA_BLENDING,
        );

        let test_cube = TestCube::init(&device, &camera_bind_group_layout, format, DEPTH_FORMAT);
        info!("Surface configured: {}x{} {:?}", width, height, format);

        WgpuBackend {
            surface,
            device,
            queue,
            config,
            surface_state,
            depth_view,
            camera_uniform_buf,
            camera_bind_group,
            field_bind_group_layout,
            flame_pipeline,
            smoke_pipeline,
            test_cube,
            show_test_cube: false,
            fields: HashMap::new(),
            next_handle: 0,
            frame_num: 0,
        }
    }

    // Physical size of the window, as reported by the windowing system.
    pub fn set_surface_size(&mut self, width: u32, height: u32) {
        self.surface_state.resize(width, height);
    }

    // Size the surface is currently configured at; points are sized against it.
    fn config_extent(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn reconfigure(&mut self) {
        let (width, height) = self.surface_state.extent();
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_view = make_depth_view(&self.device, width, height);
        self.surface_state.mark_configured();
        info!("Surface reconfigured: {}x{}", width, height);
    }

    fn draw_fields<'a>(
        &'a self,
        rpass: &mut wgpu::RenderPass<'a>,
        kind: FieldKind,
        pipeline: &'a wgpu::RenderPipeline,
    ) {
        let mut pipeline_set = false;
        for resources in self.fields.values().filter(|f| f.kind == kind) {
            if !pipeline_set {
                rpass.set_pipeline(pipeline);
                rpass.set_bind_group(0, &self.camera_bind_group, &[]);
                pipeline_set = true;
            }
            rpass.set_bind_group(1, &resources.bind_group, &[]);
            rpass.set_vertex_buffer(0, resources.positions.buffer.slice(..));
            rpass.set_vertex_buffer(1, resources.scales.buffer.slice(..));
            rpass.draw(0..4, 0..resources.count);
        }
    }
}

fn make_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    device
        .create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        })
        .create_view(&wgpu::TextureViewDescriptor::default())
}

// Camera-facing quads, one instance per particle. Depth tested against the
// scene but never written, so overlapping particles all blend.
fn make_field_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    label: &str,
    source: &'static str,
    format: wgpu::TextureFormat,
    blend: wgpu::BlendState,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(&wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(source)),
    });
    let instance_buffers = [
        // Particle position.
        wgpu::VertexBufferLayout {
            array_stride: (3 * std::mem::size_of::<f32>()) as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 0,
                shader_location: 0,
            }],
        },
        // Particle scale.
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<f32>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32,
                offset: 0,
                shader_location: 1,
            }],
        },
    ];
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: "vs_main",
            buffers: &instance_buffers,
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: "fs_main",
            targets: &[wgpu::ColorTargetState {
                format,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            }],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleStrip,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: false,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    })
}

impl RenderBackend for WgpuBackend {
    fn upload_field(&mut self, effect: &Effect, field: &ParticleField) -> FieldHandle {
        let handle = FieldHandle(self.next_handle);
        self.next_handle += 1;
        let uniforms = FieldUniforms::new(effect);
        let uniform_buffer = make_uniform_buffer(&self.device, "Field uniform buffer", &uniforms);
        let positions = make_vertex_buffer(&self.device, "Particle positions", &field.positions);
        let scales = make_vertex_buffer(&self.device, "Particle scales", &field.scales);
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Field bind group"),
            layout: &self.field_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.buffer.as_entire_binding(),
            }],
        });
        info!(
            "Uploaded {:?} field {:?}: {} particles",
            effect.kind(),
            handle,
            field.count()
        );
        self.fields.insert(
            handle,
            FieldResources {
                kind: effect.kind(),
                count: field.count(),
                uniforms,
                uniform_buffer,
                positions,
                scales,
                bind_group,
            },
        );
        handle
    }

    fn release_field(&mut self, handle: FieldHandle) {
        if let Some(resources) = self.fields.remove(&handle) {
            resources.destroy();
            info!("Released {:?} field {:?}", resources.kind, handle);
        }
    }

    fn set_field_time(&mut self, handle: FieldHandle, time: f32) {
        if let Some(resources) = self.fields.get_mut(&handle) {
            resources.uniforms.set_time(time);
            self.queue.write_buffer(
                &resources.uniform_buffer.buffer,
                0,
                bytemuck::bytes_of(&resources.uniforms),
            );
        }
    }

    fn set_test_cube(&mut self, visible: bool) {
        self.show_test_cube = visible;
    }

    // The surface follows the window's physical size instead, see `set_surface_size`.
    fn set_size(&mut self, _width: u32, _height: u32) {}

    fn set_pixel_ratio(&mut self, pixel_ratio: f64) {
        self.surface_state.set_pixel_ratio(pixel_ratio);
    }

    fn render(&mut self, camera: &PerspectiveCamera) {
        if self.surface_state.is_dirty() {
            self.reconfigure();
        }
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost) | Err(wgpu::SurfaceError::Outdated) => {
                error!("Surface lost, reconfiguring");
                self.reconfigure();
                return;
            }
            Err(e) => {
                error!("Dropped frame: {:?}", e);
                return;
            }
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let raw_uniforms =
            camera.to_uniform_data(self.config_extent(), self.surface_state.pixel_ratio() as f32);
        self.queue.write_buffer(
            &self.camera_uniform_buf.buffer,
            0,
            bytemuck::cast_slice(&raw_uniforms),
        );

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene"),
                color_attachments: &[wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: true,
                    },
                }],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: false,
                    }),
                    stencil_ops: None,
                }),
            });
            if self.show_test_cube {
                self.test_cube.render(&mut rpass, &self.camera_bind_group);
            }
            self.draw_fields(&mut rpass, FieldKind::Flame, &self.flame_pipeline);
            self.draw_fields(&mut rpass, FieldKind::Smoke, &self.smoke_pipeline);
        }
        self.queue.submit(Some(encoder.finish()));
        frame.present();

        self.frame_num += 1;
        trace!("Presented frame {}", self.frame_num);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene_params::{FlameParams, SmokeParams, VerticalPolicy};

    #[test]
    fn uniform_size_matches_shader() {
        // Six vec4<f32> in the `Field` struct.
        assert_eq!(std::mem::size_of::<FieldUniforms>(), 6 * 16);
    }

    #[test]
    fn surface_follows_physical_size() {
        // A 3x display: the surface covers the whole window while points use
        // the clamped ratio.
        let mut state = SurfaceState::new(2400, 1800, 3.0);
        assert_eq!(state.extent(), (2400, 1800));
        assert_eq!(state.pixel_ratio(), 2.0);
        assert!(!state.is_dirty());

        state.set_pixel_ratio(1.5);
        assert_eq!(state.pixel_ratio(), 1.5);
        assert!(!state.is_dirty());

        state.resize(2400, 1800);
        assert!(!state.is_dirty());
        state.resize(3000, 1500);
        assert!(state.is_dirty());
        assert_eq!(state.extent(), (3000, 1500));
        state.mark_configured();
        assert!(!state.is_dirty());
    }

    #[test]
    fn surface_ignores_empty_extent() {
        let mut state = SurfaceState::new(800, 600, 1.0);
        state.resize(0, 600);
        state.resize(800, 0);
        assert_eq!(state.extent(), (800, 600));
        assert!(!state.is_dirty());
    }

    #[test]
    fn flame_uniforms() {
        let flame = FlameParams::default();
        let mut uniforms = FieldUniforms::new(&Effect::Flame(flame));
        assert_eq!(&uniforms.origin[..3], &flame.field.origin[..]);
        assert_eq!(uniforms.primary[3], flame.field.point_size);
        assert_eq!(&uniforms.secondary[..3], &flame.outer_color[..]);
        assert_eq!(uniforms.shape[2], 0.0);
        uniforms.set_time(2.5);
        assert_eq!(uniforms.origin[3], 2.5);
    }

    #[test]
    fn smoke_uniforms() {
        let mut smoke = SmokeParams::default();
        smoke.field.vertical = VerticalPolicy::Centered;
        smoke.field.height = 3.0;
        let uniforms = FieldUniforms::new(&Effect::Smoke(smoke));
        assert_eq!(uniforms.shape[1], 3.0);
        assert_eq!(uniforms.shape[2], -1.5);
        assert_eq!(&uniforms.wind[..3], &smoke.wind[..]);
        assert_eq!(uniforms.wave[0], smoke.wave_amplitude);
        assert_eq!(uniforms.wave[1], smoke.wave_period);
    }
}
