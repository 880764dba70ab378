use std::ops::Range;

use wgpu::Device;

use crate::gfx::geometry::GeometryData;
use crate::gfx::resources::material::MaterialId;
use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
    binding_types,
    uniform_buffer::UniformBuffer,
};

use super::transform::Transform;
use super::vertex::Vertex3D;

pub struct Mesh {
    vertices: Vec<Vertex3D>,
    indices: Vec<u32>,
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
    pub index_count: u32,
    pub vertex_count: u32,
}

impl Mesh {
    /// Builds a mesh from flat position/normal/uv arrays as produced by OBJ loaders
    ///
    /// Missing normals are computed from the faces; missing UVs become zero.
    pub fn new(positions: &[f32], normals: &[f32], tex_coords: &[f32], indices: Vec<u32>) -> Self {
        let vertex_count = positions.len() / 3;
        let computed;
        let normals = if normals.len() == positions.len() {
            normals
        } else {
            computed = Self::calculate_vertex_normals(positions, &indices);
            computed.as_slice()
        };
        let has_uvs = tex_coords.len() == vertex_count * 2;

        let vertices = (0..vertex_count)
            .map(|i| Vertex3D {
                position: [positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2]],
                normal: [normals[i * 3], normals[i * 3 + 1], normals[i * 3 + 2]],
                // OBJ puts v = 0 at the bottom of the image
                tex_coords: if has_uvs {
                    [tex_coords[i * 2], 1.0 - tex_coords[i * 2 + 1]]
                } else {
                    [0.0, 0.0]
                },
            })
            .collect();

        Self::from_vertices(vertices, indices)
    }

    pub fn from_geometry(geometry: &GeometryData) -> Self {
        Self::from_vertices(geometry.to_vertices(), geometry.indices.clone())
    }

    pub fn from_vertices(vertices: Vec<Vertex3D>, indices: Vec<u32>) -> Self {
        Self {
            index_count: indices.len() as u32,
            vertex_count: vertices.len() as u32,
            vertices,
            indices,
            vertex_buffer: None,
            index_buffer: None,
        }
    }

    pub fn vertices(&self) -> &[Vertex3D] {
        &self.vertices
    }

    /// Area-weighted vertex normals from triangle faces
    pub fn calculate_vertex_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
        let mut normals = vec![0.0; positions.len()];
        let corner = |i: usize| [positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2]];

        for triangle in indices.chunks_exact(3) {
            let ids = [triangle[0] as usize, triangle[1] as usize, triangle[2] as usize];
            let (v0, v1, v2) = (corner(ids[0]), corner(ids[1]), corner(ids[2]));

            let edge1 = [v1[0] - v0[0], v1[1] - v0[1], v1[2] - v0[2]];
            let edge2 = [v2[0] - v0[0], v2[1] - v0[1], v2[2] - v0[2]];
            let face_normal = [
                edge1[1] * edge2[2] - edge1[2] * edge2[1],
                edge1[2] * edge2[0] - edge1[0] * edge2[2],
                edge1[0] * edge2[1] - edge1[1] * edge2[0],
            ];

            for &id in &ids {
                for axis in 0..3 {
                    normals[id * 3 + axis] += face_normal[axis];
                }
            }
        }

        for normal in normals.chunks_exact_mut(3) {
            let length = (normal[0] * normal[0] + normal[1] * normal[1] + normal[2] * normal[2]).sqrt();
            if length > 0.0 {
                normal.iter_mut().for_each(|n| *n /= length);
            }
        }

        normals
    }

    pub fn init_gpu_resources(&mut self, device: &Device, label: &str) {
        use wgpu::util::DeviceExt;

        self.vertex_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", label)),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        }));
        self.index_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", label)),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        }));
    }
}

/// Per-object uniform data
///
/// MUST match `ObjectUniform` in `common.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub receive_shadow: f32,
    _padding: [f32; 3],
}

/// Bind group layout for [`ObjectUniform`]
pub struct ObjectBindings;

impl ObjectBindings {
    pub fn create_layout(device: &Device) -> BindGroupLayoutWithDesc {
        BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .create(device, "Object Bind Group Layout")
    }
}

pub struct ObjectGpuResources {
    ubo: UniformBuffer<ObjectUniform>,
    bind_group: wgpu::BindGroup,
}

pub struct Object {
    pub name: String,
    pub meshes: Vec<Mesh>,
    pub transform: Transform,
    pub visible: bool,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    material_id: Option<MaterialId>,
    pub gpu_resources: Option<ObjectGpuResources>, // None until init_gpu_resources called
}

impl Object {
    /// Create a new Object with identity transformation
    pub fn new(meshes: Vec<Mesh>) -> Self {
        Self {
            name: "Object".to_string(),
            meshes,
            transform: Transform::default(),
            visible: true,
            cast_shadow: false,
            receive_shadow: false,
            material_id: None,
            gpu_resources: None,
        }
    }

    pub fn from_geometry(name: &str, geometry: &GeometryData) -> Self {
        let mut object = Self::new(vec![Mesh::from_geometry(geometry)]);
        object.set_name(name.to_string());
        object
    }

    pub fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn set_material(&mut self, material_id: &str) {
        self.material_id = Some(material_id.to_string());
    }

    pub fn get_material_id(&self) -> Option<&MaterialId> {
        self.material_id.as_ref()
    }

    /// Builder pattern: place the object
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_material(mut self, material_id: &str) -> Self {
        self.set_material(material_id);
        self
    }

    pub fn casting_shadow(mut self) -> Self {
        self.cast_shadow = true;
        self
    }

    pub fn receiving_shadow(mut self) -> Self {
        self.receive_shadow = true;
        self
    }

    pub fn uniform(&self) -> ObjectUniform {
        ObjectUniform {
            model: self.transform.matrix().into(),
            receive_shadow: if self.receive_shadow { 1.0 } else { 0.0 },
            _padding: [0.0; 3],
        }
    }

    pub fn init_gpu_resources(&mut self, device: &Device, layout: &BindGroupLayoutWithDesc) {
        for mesh in self.meshes.iter_mut() {
            mesh.init_gpu_resources(device, &self.name);
        }

        let ubo = UniformBuffer::new_with_data(device, &self.uniform());
        let bind_group = BindGroupBuilder::new(layout)
            .resource(ubo.binding_resource())
            .create(device, &format!("{} Object Bind Group", self.name));

        log::debug!(
            "Uploaded object '{}' ({} meshes)",
            self.name,
            self.meshes.len()
        );
        self.gpu_resources = Some(ObjectGpuResources { ubo, bind_group });
    }

    /// Sync the transform to the GPU if resources exist
    pub fn update_transform(&mut self, queue: &wgpu::Queue) {
        let uniform = self.uniform();
        if let Some(gpu_resources) = &mut self.gpu_resources {
            gpu_resources.ubo.update_content(queue, uniform);
        }
    }

    /// Get the object bind group for rendering
    pub fn get_bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.gpu_resources.as_ref().map(|res| &res.bind_group)
    }

    pub fn triangle_count(&self) -> u32 {
        self.meshes.iter().map(|m| m.index_count / 3).sum()
    }
}

pub trait DrawObject<'a> {
    fn draw_mesh(&mut self, mesh: &'a Mesh);
    fn draw_mesh_instanced(&mut self, mesh: &'a Mesh, instances: Range<u32>);
    fn draw_object(&mut self, object: &'a Object);
}

impl<'a, 'b> DrawObject<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh(&mut self, mesh: &'b Mesh) {
        self.draw_mesh_instanced(mesh, 0..1);
    }

    fn draw_mesh_instanced(&mut self, mesh: &'b Mesh, instances: Range<u32>) {
        let (Some(vertex_buffer), Some(index_buffer)) = (&mesh.vertex_buffer, &mesh.index_buffer)
        else {
            return; // Skip drawing if not uploaded
        };

        self.set_vertex_buffer(0, vertex_buffer.slice(..));
        self.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..mesh.index_count, 0, instances);
    }

    /// Binds the object's uniform at group 1 and draws every mesh
    fn draw_object(&mut self, object: &'b Object) {
        let Some(bind_group) = object.get_bind_group() else {
            return;
        };
        self.set_bind_group(1, bind_group, &[]);
        for mesh in &object.meshes {
            self.draw_mesh(mesh);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::geometry::primitives::generate_cube;
    use cgmath::Vector3;

    #[test]
    fn test_mesh_computes_missing_normals() {
        let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let mesh = Mesh::new(&positions, &[], &[], vec![0, 1, 2]);
        assert_eq!(mesh.vertex_count, 3);
        for vertex in mesh.vertices() {
            assert_eq!(vertex.normal, [0.0, 0.0, 1.0]);
            assert_eq!(vertex.tex_coords, [0.0, 0.0]);
        }
    }

    #[test]
    fn test_mesh_flips_obj_uvs() {
        let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let uvs = [0.0, 0.0, 1.0, 0.25, 0.0, 1.0];
        let mesh = Mesh::new(&positions, &[], &uvs, vec![0, 1, 2]);
        assert_eq!(mesh.vertices()[0].tex_coords, [0.0, 1.0]);
        assert_eq!(mesh.vertices()[1].tex_coords, [1.0, 0.75]);
    }

    #[test]
    fn test_object_uniform_carries_shadow_flag() {
        let object = Object::from_geometry("floor", &generate_cube())
            .with_transform(Transform::from_position(Vector3::new(1.0, 2.0, 3.0)))
            .receiving_shadow();
        let uniform = object.uniform();
        assert_eq!(uniform.receive_shadow, 1.0);
        assert_eq!(uniform.model[3][..3], [1.0, 2.0, 3.0]);
        assert_eq!(object.triangle_count(), 12);
        assert!(object.gpu_resources.is_none());
        assert_eq!(std::mem::size_of::<ObjectUniform>(), 80);
    }

    #[test]
    fn test_material_assignment() {
        let object = Object::from_geometry("cube", &generate_cube()).with_material("cube");
        assert_eq!(object.get_material_id().map(String::as_str), Some("cube"));
        assert!(!object.cast_shadow);
    }
}
