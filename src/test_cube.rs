use crate::buffer_util::{make_vertex_buffer, SizedBuffer};
use bytemuck::{Pod, Zeroable};
use std::borrow::Cow;
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct Vertex {
    _pos: [f32; 4],
    _normal: [f32; 4],
}

fn vertex(pos: [f32; 3], normal: [f32; 3]) -> Vertex {
    Vertex {
        _pos: [pos[0], pos[1], pos[2], 1.0],
        _normal: [normal[0], normal[1], normal[2], 0.0],
    }
}

// Unit cube centered on the origin, four vertices per face so each face gets a flat normal.
pub fn create_vertices() -> (Vec<Vertex>, Vec<u16>) {
    let h = 0.5;
    let vertex_data = [
        // top (0, 1, 0)
        vertex([-h, h, -h], [0.0, 1.0, 0.0]),
        vertex([-h, h, h], [0.0, 1.0, 0.0]),
        vertex([h, h, h], [0.0, 1.0, 0.0]),
        vertex([h, h, -h], [0.0, 1.0, 0.0]),
        // bottom (0, -1, 0)
        vertex([-h, -h, h], [0.0, -1.0, 0.0]),
        vertex([-h, -h, -h], [0.0, -1.0, 0.0]),
        vertex([h, -h, -h], [0.0, -1.0, 0.0]),
        vertex([h, -h, h], [0.0, -1.0, 0.0]),
        // right (1, 0, 0)
        vertex([h, -h, -h], [1.0, 0.0, 0.0]),
        vertex([h, h, -h], [1.0, 0.0, 0.0]),
        vertex([h, h, h], [1.0, 0.0, 0.0]),
        vertex([h, -h, h], [1.0, 0.0, 0.0]),
        // left (-1, 0, 0)
        vertex([-h, -h, h], [-1.0, 0.0, 0.0]),
        vertex([-h, h, h], [-1.0, 0.0, 0.0]),
        vertex([-h, h, -h], [-1.0, 0.0, 0.0]),
        vertex([-h, -h, -h], [-1.0, 0.0, 0.0]),
        // front (0, 0, 1)
        vertex([-h, -h, h], [0.0, 0.0, 1.0]),
        vertex([h, -h, h], [0.0, 0.0, 1.0]),
        vertex([h, h, h], [0.0, 0.0, 1.0]),
        vertex([-h, h, h], [0.0, 0.0, 1.0]),
        // back (0, 0, -1)
        vertex([h, -h, -h], [0.0, 0.0, -1.0]),
        vertex([-h, -h, -h], [0.0, 0.0, -1.0]),
        vertex([-h, h, -h], [0.0, 0.0, -1.0]),
        vertex([h, h, -h], [0.0, 0.0, -1.0]),
    ];
    let mut index_data = Vec::with_capacity(36);
    for face in 0..6u16 {
        let base = face * 4;
        index_data.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
    (vertex_data.to_vec(), index_data)
}

// The red box lit by an ambient and a directional light, used to check the
// camera and surface setup without any particles.
pub struct TestCube {
    vertex_buf: SizedBuffer,
    index_buf: wgpu::Buffer,
    index_count: usize,
    pipeline: wgpu::RenderPipeline,
}

impl TestCube {
    pub fn init(
        device: &wgpu::Device,
        camera_bind_group_layout: &wgpu::BindGroupLayout,
        format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
    ) -> Self {
        let (vertex_data, index_data) = create_vertices();
        let vertex_buf = make_vertex_buffer(device, "Cube vertex buffer", &vertex_data);
        let index_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Cube index buffer"),
            contents: bytemuck::cast_slice(&index_data),
            usage: wgpu::BufferUsages::INDEX,
        });

        let vertex_size = std::mem::size_of::<Vertex>();
        let vertex_buffers = [wgpu::VertexBufferLayout {
            array_stride: vertex_size as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // Vertex position.
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x4,
                    offset: 0,
                    shader_location: 0,
                },
                // Normal.
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x4,
                    offset: 4 * 4,
                    shader_location: 1,
                },
            ],
        }];

        let shader = device.create_shader_module(&wgpu::ShaderModuleDescriptor {
            label: Some("Cube shader module"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("shaders/cube.wgsl"))),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Cube pipeline layout"),
            bind_group_layouts: &[camera_bind_group_layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Cube"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &vertex_buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[format.into()],
            }),
            primitive: wgpu::PrimitiveState {
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: depth_format,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        TestCube {
            vertex_buf,
            index_buf,
            index_count: index_data.len(),
            pipeline,
        }
    }

    pub fn render<'a>(
        &'a self,
        rpass: &mut wgpu::RenderPass<'a>,
        camera_bind_group: &'a wgpu::BindGroup,
    ) {
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, camera_bind_group, &[]);
        rpass.set_index_buffer(self.index_buf.slice(..), wgpu::IndexFormat::Uint16);
        rpass.set_vertex_buffer(0, self.vertex_buf.buffer.slice(..));
        rpass.draw_indexed(0..self.index_count as u32, 0, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_geometry() {
        let (vertices, indices) = create_vertices();
        assert_eq!(vertices.len(), 24);
        assert_eq!(indices.len(), 36);
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
    }

    #[test]
    fn faces_wind_counter_clockwise_outward() {
        let (vertices, indices) = create_vertices();
        for tri in indices.chunks(3) {
            let p = |i: u16| {
                let v = vertices[i as usize]._pos;
                cgmath::Vector3::new(v[0], v[1], v[2])
            };
            let n = vertices[tri[0] as usize]._normal;
            let normal = cgmath::Vector3::new(n[0], n[1], n[2]);
            let face = (p(tri[1]) - p(tri[0])).cross(p(tri[2]) - p(tri[0]));
            assert!(cgmath::InnerSpace::dot(face, normal) > 0.0);
        }
    }
}
