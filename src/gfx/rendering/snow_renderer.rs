//! Instanced snow rendering
//!
//! Every flake shares one cone mesh; per-flake model matrices live in a
//! single instance buffer that is rewritten each frame, so the whole field
//! is one draw call.

use wgpu::{Buffer, Device, Queue, RenderPass};

use crate::gfx::geometry::primitives::generate_cone;
use crate::gfx::scene::{object::DrawObject, snow::SnowField, Mesh, SnowInstance};

/// Flake cone: radius, height and radial segments
pub const FLAKE_RADIUS: f32 = 0.012;
pub const FLAKE_HEIGHT: f32 = 0.001;
pub const FLAKE_SEGMENTS: u32 = 7;

pub struct SnowRenderer {
    flake_mesh: Mesh,
    instance_buffer: Buffer,
    capacity: u32,
    instance_count: u32,
}

impl SnowRenderer {
    pub fn new(device: &Device, capacity: u32) -> Self {
        let mut flake_mesh = Mesh::from_geometry(&generate_cone(FLAKE_RADIUS, FLAKE_HEIGHT, FLAKE_SEGMENTS));
        flake_mesh.init_gpu_resources(device, "Snow Flake");

        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Snow Instance Buffer"),
            size: (capacity.max(1) as u64) * std::mem::size_of::<SnowInstance>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            flake_mesh,
            instance_buffer,
            capacity,
            instance_count: 0,
        }
    }

    /// Uploads the current flake matrices
    pub fn update(&mut self, queue: &Queue, snow: &SnowField) {
        let mut instances = snow.instance_data();
        if instances.len() > self.capacity as usize {
            log::warn!(
                "Snow field has {} flakes but the buffer holds {}; extra flakes are not drawn",
                instances.len(),
                self.capacity
            );
            instances.truncate(self.capacity as usize);
        }

        self.instance_count = instances.len() as u32;
        if !instances.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }
    }

    /// Draws every flake; the caller sets the pipeline and bind groups
    pub fn render<'a>(&'a self, render_pass: &mut RenderPass<'a>) {
        if self.instance_count == 0 {
            return;
        }

        render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
        render_pass.draw_mesh_instanced(&self.flake_mesh, 0..self.instance_count);
    }
}
