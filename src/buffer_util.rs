use wgpu::util::DeviceExt;

pub struct SizedBuffer {
    pub buffer: wgpu::Buffer,
    pub size: wgpu::BufferAddress,
}

impl SizedBuffer {
    pub fn destroy(&self) {
        self.buffer.destroy();
    }
}

pub fn make_uniform_buffer<T: bytemuck::Pod>(
    device: &wgpu::Device,
    label: &str,
    data: &T,
) -> SizedBuffer {
    let bytes = bytemuck::bytes_of(data);
    SizedBuffer {
        buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytes,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        }),
        size: bytes.len() as _,
    }
}

pub fn make_uniform_slice_buffer<T: bytemuck::Pod>(
    device: &wgpu::Device,
    label: &str,
    data: &[T],
) -> SizedBuffer {
    let bytes: &[u8] = bytemuck::cast_slice(data);
    SizedBuffer {
        buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytes,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        }),
        size: bytes.len() as _,
    }
}

pub fn make_vertex_buffer<T: bytemuck::Pod>(
    device: &wgpu::Device,
    label: &str,
    data: &[T],
) -> SizedBuffer {
    let bytes: &[u8] = bytemuck::cast_slice(data);
    SizedBuffer {
        buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytes,
            usage: wgpu::BufferUsages::VERTEX,
        }),
        size: bytes.len() as _,
    }
}

pub fn uniform_layout_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    size: wgpu::BufferAddress,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: wgpu::BufferSize::new(size),
        },
        count: None,
    }
}
