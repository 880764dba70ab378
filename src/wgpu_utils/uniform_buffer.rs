// src/wgpu_utils/uniform_buffer.rs
use std::marker::PhantomData;

use wgpu::util::DeviceExt;

/// Uniform buffer holding exactly one `Content` value
///
/// Remembers the bytes it last wrote so unchanged frames cost no upload.
pub struct UniformBuffer<Content> {
    buffer: wgpu::Buffer,
    last_written: Vec<u8>,
    content_type: PhantomData<Content>,
}

impl<Content: bytemuck::Pod> UniformBuffer<Content> {
    const USAGE: wgpu::BufferUsages = wgpu::BufferUsages::UNIFORM.union(wgpu::BufferUsages::COPY_DST);

    /// Short type name used as the buffer label
    fn label() -> String {
        let type_name = std::any::type_name::<Content>();
        let short = type_name.rsplit("::").next().unwrap_or(type_name);
        format!("{} Uniform", short)
    }

    /// Zero-initialised buffer
    pub fn new(device: &wgpu::Device) -> Self {
        Self::new_with_data(device, &<Content as bytemuck::Zeroable>::zeroed())
    }

    pub fn new_with_data(device: &wgpu::Device, initial_content: &Content) -> Self {
        let bytes = bytemuck::bytes_of(initial_content);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&Self::label()),
            contents: bytes,
            usage: Self::USAGE,
        });

        Self {
            buffer,
            last_written: bytes.to_vec(),
            content_type: PhantomData,
        }
    }

    /// Writes `content` unless it equals what was last written
    ///
    /// Returns whether an upload happened.
    pub fn update_content(&mut self, queue: &wgpu::Queue, content: Content) -> bool {
        if self.last_written.as_slice() == bytemuck::bytes_of(&content) {
            return false;
        }
        self.force_update_content(queue, content);
        true
    }

    pub fn force_update_content(&mut self, queue: &wgpu::Queue, content: Content) {
        let bytes = bytemuck::bytes_of(&content);
        queue.write_buffer(&self.buffer, 0, bytes);
        self.last_written.clear();
        self.last_written.extend_from_slice(bytes);
    }

    pub fn binding_resource(&self) -> wgpu::BindingResource<'_> {
        self.buffer.as_entire_binding()
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }
}
