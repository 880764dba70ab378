use std::path::{Path, PathBuf};

use wgpu::Device;

use crate::error::{Result, SceneError};
use crate::gfx::{
    camera::camera_utils::CameraManager,
    resources::material::{Material, MaterialId, MaterialManager},
    scene::object::Mesh,
};
use crate::wgpu_utils::binding_builder::BindGroupLayoutWithDesc;

use super::lights::LightRig;
use super::model::model_stem;
use super::object::Object;
use super::snow::SnowField;
use super::transform::Transform;

/// Output settings read by the render engine every frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    /// Tone-mapping exposure, already curved
    pub exposure: f32,
    pub shadow_map_enabled: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            exposure: 1.0,
            shadow_map_enabled: true,
        }
    }
}

/// Result of importing a model file
#[derive(Debug, Default)]
pub struct ModelImport {
    /// Indices into `Scene::objects` of the imported parts
    pub objects: Vec<usize>,
    /// Diffuse textures named by an OBJ's MTL file, resolved against its directory;
    /// glTF images arrive already attached to their materials
    pub diffuse_textures: Vec<(MaterialId, PathBuf)>,
}

/// Main scene containing objects, materials, lights, snow and camera
pub struct Scene {
    pub camera_manager: CameraManager,
    pub objects: Vec<Object>,
    pub material_manager: MaterialManager, // Centralized material storage
    pub lights: LightRig,
    pub snow: SnowField,
    pub snow_material: Option<MaterialId>,
    pub settings: RenderSettings,
    /// Emitter mesh that follows the point light, with its material
    bulb: Option<(usize, MaterialId)>,
    /// Materials whose shading depends on the shadow map
    shadow_dependent_materials: Vec<MaterialId>,
}

impl Scene {
    pub fn new(camera_manager: CameraManager) -> Self {
        Self {
            camera_manager,
            objects: Vec::new(),
            material_manager: MaterialManager::new(), // Initialize with default material
            lights: LightRig::default(),
            snow: SnowField::default(),
            snow_material: None,
            settings: RenderSettings::default(),
            bulb: None,
            shadow_dependent_materials: Vec::new(),
        }
    }

    /// Adds an object and returns its index
    pub fn add_object(&mut self, object: Object) -> usize {
        self.objects.push(object);
        self.objects.len() - 1
    }

    pub fn find_object(&self, name: &str) -> Option<&Object> {
        self.objects.iter().find(|object| object.name == name)
    }

    /// Makes the object at `index` the point light's visible emitter
    pub fn attach_bulb(&mut self, index: usize, material_id: &str) {
        self.bulb = Some((index, material_id.to_string()));
        self.sync_bulb();
    }

    pub fn bulb_material_mut(&mut self) -> Option<&mut Material> {
        let (_, id) = self.bulb.as_ref()?;
        self.material_manager.get_material_mut(id)
    }

    pub fn set_shadow_dependent_materials(&mut self, ids: Vec<MaterialId>) {
        self.shadow_dependent_materials = ids;
    }

    pub fn shadow_dependent_materials(&self) -> &[MaterialId] {
        &self.shadow_dependent_materials
    }

    /// Flags every shadow-dependent material for re-upload, returns how many were marked
    pub fn mark_shadow_dependent_materials(&mut self) -> usize {
        self.shadow_dependent_materials
            .iter()
            .filter(|id| self.material_manager.mark_needs_update(id))
            .count()
    }

    /// Updates the scene (camera matrices, bulb placement)
    pub fn update(&mut self) {
        self.camera_manager.camera.update_view_proj();
        self.sync_bulb();
    }

    fn sync_bulb(&mut self) {
        if let Some((index, _)) = &self.bulb {
            if let Some(object) = self.objects.get_mut(*index) {
                object.transform.position = self.lights.point.position;
            }
        }
    }

    /// Loads an OBJ file, one object per model, placed with `transform`
    ///
    /// MTL materials are registered under `<file stem>/<material name>`.
    pub fn load_obj(&mut self, path: &Path, transform: Transform) -> Result<ModelImport> {
        let (models, materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )
        .map_err(|source| SceneError::Model {
            path: path.to_path_buf(),
            source,
        })?;

        if models.is_empty() {
            return Err(SceneError::EmptyModel {
                path: path.to_path_buf(),
            });
        }

        let materials = materials.unwrap_or_else(|err| {
            log::debug!("No usable MTL for '{}': {}", path.display(), err);
            Vec::new()
        });

        let stem = model_stem(path);
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        let mut import = ModelImport::default();

        let material_ids: Vec<MaterialId> = materials
            .iter()
            .enumerate()
            .map(|(i, mtl)| {
                let name = if mtl.name.is_empty() {
                    format!("{}/material_{}", stem, i)
                } else {
                    format!("{}/{}", stem, mtl.name)
                };

                let diffuse = mtl.diffuse.unwrap_or([0.8, 0.8, 0.8]);
                let roughness = 1.0 - (mtl.shininess.unwrap_or(32.0) / 128.0).clamp(0.0, 1.0);
                let material = Material::new(
                    &name,
                    [diffuse[0], diffuse[1], diffuse[2], mtl.dissolve.unwrap_or(1.0)],
                    0.0,
                    roughness,
                );
                self.material_manager.add_material(material);

                if let Some(texture) = mtl.diffuse_texture.as_ref().filter(|t| !t.is_empty()) {
                    import
                        .diffuse_textures
                        .push((name.clone(), base_dir.join(texture)));
                }
                name
            })
            .collect();

        for (i, model) in models.iter().enumerate() {
            let mesh = &model.mesh;
            let mut object = Object::new(vec![Mesh::new(
                &mesh.positions,
                &mesh.normals,
                &mesh.texcoords,
                mesh.indices.clone(),
            )])
            .with_transform(transform);

            object.set_name(if model.name.is_empty() {
                format!("{}/part_{}", stem, i)
            } else {
                format!("{}/{}", stem, model.name)
            });

            if let Some(id) = mesh.material_id.and_then(|id| material_ids.get(id)) {
                object.set_material(id);
            }

            import.objects.push(self.add_object(object));
        }

        log::info!(
            "Loaded model '{}': {} parts, {} materials",
            path.display(),
            import.objects.len(),
            material_ids.len()
        );
        Ok(import)
    }

    /// Creates GPU resources for objects that have none yet
    pub fn init_gpu_resources(&mut self, device: &Device, object_layout: &BindGroupLayoutWithDesc) {
        for object in self.objects.iter_mut() {
            if object.gpu_resources.is_none() {
                object.init_gpu_resources(device, object_layout);
            }
        }
    }

    /// Syncs all object transforms to the GPU
    pub fn update_all_transforms(&mut self, queue: &wgpu::Queue) {
        for object in &mut self.objects {
            object.update_transform(queue);
        }
    }

    /// The object's material, falling back to the default one
    pub fn get_material_for_object(&self, object: &Object) -> &Material {
        self.material_manager
            .get_material_for_object(object.get_material_id())
    }

    pub fn get_statistics(&self) -> SceneStatistics {
        let total_triangles: u32 = self.objects.iter().map(Object::triangle_count).sum();

        let total_vertices: u32 = self
            .objects
            .iter()
            .map(|obj| obj.meshes.iter().map(|m| m.vertex_count).sum::<u32>())
            .sum();

        SceneStatistics {
            object_count: self.objects.len(),
            material_count: self.material_manager.list_materials().len(),
            total_triangles,
            total_vertices,
            flake_count: self.snow.len(),
        }
    }
}

/// Counts shown in the light-rig panel
#[derive(Debug)]
pub struct SceneStatistics {
    pub object_count: usize,
    pub material_count: usize,
    pub total_triangles: u32,
    pub total_vertices: u32,
    pub flake_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::camera::{CameraController, OrbitCamera};
    use crate::gfx::geometry::primitives::generate_sphere;
    use cgmath::Vector3;

    fn empty_scene() -> Scene {
        let camera = OrbitCamera::looking_at(Vector3::new(-4.0, 2.0, 4.0), Vector3::new(0.0, 0.0, 0.0), 1.0);
        Scene::new(CameraManager::new(camera, CameraController::new(0.005, 0.1)))
    }

    #[test]
    fn test_bulb_follows_point_light() {
        let mut scene = empty_scene();
        scene.material_manager.add_material(Material::new("bulb", [0.0, 0.0, 0.0, 1.0], 0.0, 1.0));
        let index = scene.add_object(Object::from_geometry("bulb", &generate_sphere(0.02, 16, 8)));
        scene.attach_bulb(index, "bulb");

        scene.lights.point.position.y = 0.5;
        scene.update();
        assert_eq!(scene.objects[index].transform.position, Vector3::new(0.0, 0.5, 0.0));
        assert!(scene.bulb_material_mut().is_some());
    }

    #[test]
    fn test_load_missing_obj_fails() {
        let mut scene = empty_scene();
        let err = scene
            .load_obj(Path::new("no/such/scene.obj"), Transform::default())
            .unwrap_err();
        assert!(matches!(err, SceneError::Model { .. }));
        assert!(scene.objects.is_empty());
    }

    #[test]
    fn test_load_obj_from_disk() {
        let dir = std::env::temp_dir().join(format!("snowlight-obj-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("tri.obj");
        std::fs::write(&path, "o tri\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();

        let mut scene = empty_scene();
        let transform = Transform::from_position(Vector3::new(1.0, -0.5, 0.0)).with_uniform_scale(0.05);
        let import = scene.load_obj(&path, transform).unwrap();

        assert_eq!(import.objects.len(), 1);
        let object = &scene.objects[import.objects[0]];
        assert_eq!(object.name, "tri/tri");
        assert_eq!(object.transform, transform);
        assert!(!object.cast_shadow);
        assert_eq!(scene.get_statistics().total_triangles, 1);

        std::fs::remove_dir_all(&dir).ok();
    }
}
