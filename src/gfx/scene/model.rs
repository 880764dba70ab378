//! Model import by file extension: glTF 2.0 (`.gltf`, `.glb`) or OBJ
//!
//! glTF node transforms are baked into the vertices, so every imported part
//! shares the placement transform handed to [`Scene::load_model`].

use std::path::Path;

use cgmath::{InnerSpace, Matrix, Matrix3, Matrix4, SquareMatrix, Vector3, Vector4};

use crate::error::{Result, SceneError};
use crate::gfx::resources::{Material, MaterialId, TextureImage, TextureSettings, TextureSlot, WrapMode};

use super::object::{Mesh, Object};
use super::scene::{ModelImport, Scene};
use super::transform::Transform;
use super::vertex::Vertex3D;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Gltf,
    Obj,
}

impl ModelFormat {
    /// Format from the file extension, case-insensitive
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "gltf" | "glb" => Some(ModelFormat::Gltf),
            "obj" => Some(ModelFormat::Obj),
            _ => None,
        }
    }
}

pub(crate) fn model_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string())
}

impl Scene {
    /// Loads a model with the importer matching its extension
    pub fn load_model(&mut self, path: &Path, transform: Transform) -> Result<ModelImport> {
        match ModelFormat::from_path(path) {
            Some(ModelFormat::Gltf) => self.load_gltf(path, transform),
            Some(ModelFormat::Obj) => self.load_obj(path, transform),
            None => Err(SceneError::UnsupportedModel {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Loads the default scene of a glTF file, one object per triangle primitive
    ///
    /// Materials are registered under `<file stem>/<material name>` with their
    /// base color and metallic-roughness images already attached.
    pub fn load_gltf(&mut self, path: &Path, transform: Transform) -> Result<ModelImport> {
        let (document, buffers, images) = gltf::import(path).map_err(|source| SceneError::Gltf {
            path: path.to_path_buf(),
            source,
        })?;

        let stem = model_stem(path);
        let material_ids: Vec<MaterialId> = document
            .materials()
            .enumerate()
            .map(|(index, material)| {
                let material = gltf_material(&stem, index, &material, &images);
                let id = material.name.clone();
                self.material_manager.add_material(material);
                id
            })
            .collect();

        let Some(root) = document.default_scene().or_else(|| document.scenes().next()) else {
            return Err(SceneError::EmptyModel {
                path: path.to_path_buf(),
            });
        };

        let mut import = ModelImport::default();
        let mut pending: Vec<(gltf::Node, Matrix4<f32>)> =
            root.nodes().map(|node| (node, Matrix4::identity())).collect();

        while let Some((node, parent)) = pending.pop() {
            let world = parent * Matrix4::from(node.transform().matrix());

            if let Some(mesh) = node.mesh() {
                let node_name = node
                    .name()
                    .map(str::to_owned)
                    .unwrap_or_else(|| format!("node_{}", node.index()));
                let primitive_count = mesh.primitives().len();

                for (i, primitive) in mesh.primitives().enumerate() {
                    let Some(part) = primitive_mesh(&primitive, &buffers, world) else {
                        continue;
                    };
                    let mut object = Object::new(vec![part]).with_transform(transform);
                    object.set_name(if primitive_count == 1 {
                        format!("{}/{}", stem, node_name)
                    } else {
                        format!("{}/{}/{}", stem, node_name, i)
                    });
                    if let Some(id) = primitive.material().index().and_then(|i| material_ids.get(i)) {
                        object.set_material(id);
                    }
                    import.objects.push(self.add_object(object));
                }
            }

            pending.extend(node.children().map(|child| (child, world)));
        }

        if import.objects.is_empty() {
            return Err(SceneError::EmptyModel {
                path: path.to_path_buf(),
            });
        }

        log::info!(
            "Loaded glTF '{}': {} parts, {} materials",
            path.display(),
            import.objects.len(),
            material_ids.len()
        );
        Ok(import)
    }
}

fn gltf_material(stem: &str, index: usize, source: &gltf::Material, images: &[gltf::image::Data]) -> Material {
    let name = match source.name() {
        Some(name) => format!("{}/{}", stem, name),
        None => format!("{}/material_{}", stem, index),
    };
    let pbr = source.pbr_metallic_roughness();
    let mut material = Material::new(
        &name,
        pbr.base_color_factor(),
        pbr.metallic_factor(),
        pbr.roughness_factor(),
    )
    .with_emission(source.emissive_factor());

    if let Some(info) = pbr.base_color_texture() {
        let settings = texture_settings(&info.texture()).with_srgb();
        if let Some(image) = texture_image(&info.texture(), images, settings) {
            material.set_texture(TextureSlot::Map, image);
        }
    }

    // Roughness in G, metalness in B, as the lit shader samples them
    if let Some(info) = pbr.metallic_roughness_texture() {
        let settings = texture_settings(&info.texture());
        if let Some(image) = texture_image(&info.texture(), images, settings) {
            material.set_texture(TextureSlot::RoughnessMap, image.clone());
            material.set_texture(TextureSlot::MetalnessMap, image);
        }
    }

    material
}

fn texture_settings(texture: &gltf::Texture) -> TextureSettings {
    let wrap = match texture.sampler().wrap_s() {
        gltf::texture::WrappingMode::ClampToEdge => WrapMode::ClampToEdge,
        _ => WrapMode::Repeat,
    };
    TextureSettings {
        wrap,
        ..TextureSettings::default().with_anisotropy(4)
    }
}

fn texture_image(
    texture: &gltf::Texture,
    images: &[gltf::image::Data],
    settings: TextureSettings,
) -> Option<TextureImage> {
    use gltf::image::Format;

    let data = images.get(texture.source().index())?;
    let rgba: Vec<u8> = match data.format {
        Format::R8G8B8A8 => data.pixels.clone(),
        Format::R8G8B8 => data
            .pixels
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        Format::R8G8 => data
            .pixels
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[1], 0, 255])
            .collect(),
        Format::R8 => data.pixels.iter().flat_map(|&p| [p, p, p, 255]).collect(),
        other => {
            log::warn!("Skipping glTF image {}: unsupported format {:?}", texture.source().index(), other);
            return None;
        }
    };

    Some(TextureImage {
        width: data.width,
        height: data.height,
        rgba,
        settings,
    })
}

/// Inverse-transpose of the upper 3x3, for transforming normals
fn normal_matrix(world: Matrix4<f32>) -> Matrix3<f32> {
    let linear = Matrix3::from_cols(world.x.truncate(), world.y.truncate(), world.z.truncate());
    linear
        .invert()
        .map(|inverse| inverse.transpose())
        .unwrap_or(linear)
}

/// Triangle primitive with `world` baked in; other topologies are skipped
fn primitive_mesh(
    primitive: &gltf::Primitive,
    buffers: &[gltf::buffer::Data],
    world: Matrix4<f32>,
) -> Option<Mesh> {
    if primitive.mode() != gltf::mesh::Mode::Triangles {
        log::debug!("Skipping glTF primitive with mode {:?}", primitive.mode());
        return None;
    }

    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));
    let positions: Vec<f32> = reader
        .read_positions()?
        .flat_map(|p| {
            let baked = world * Vector4::new(p[0], p[1], p[2], 1.0);
            [baked.x, baked.y, baked.z]
        })
        .collect();
    let vertex_count = positions.len() / 3;

    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..vertex_count as u32).collect(),
    };
    if indices.iter().any(|&index| index as usize >= vertex_count) {
        log::warn!("Skipping glTF primitive with out-of-range indices");
        return None;
    }

    let normals: Vec<f32> = match reader.read_normals() {
        Some(normals) => {
            let to_world = normal_matrix(world);
            normals
                .flat_map(|n| {
                    let mut normal = to_world * Vector3::from(n);
                    if normal.magnitude2() > 0.0 {
                        normal = normal.normalize();
                    }
                    [normal.x, normal.y, normal.z]
                })
                .collect()
        }
        None => Mesh::calculate_vertex_normals(&positions, &indices),
    };

    // glTF already puts v = 0 on the top row
    let tex_coords: Vec<[f32; 2]> = reader
        .read_tex_coords(0)
        .map(|coords| coords.into_f32().collect())
        .unwrap_or_default();

    let vertices = (0..vertex_count)
        .map(|i| Vertex3D {
            position: [positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2]],
            normal: [normals[i * 3], normals[i * 3 + 1], normals[i * 3 + 2]],
            tex_coords: tex_coords.get(i).copied().unwrap_or_default(),
        })
        .collect();

    Some(Mesh::from_vertices(vertices, indices))
}

/// Writes a one-triangle glTF with an external buffer, lifted 2 units by its node
#[cfg(test)]
pub(crate) fn write_triangle_gltf(dir: &Path, file_name: &str) -> std::path::PathBuf {
    let mut bin = Vec::new();
    for value in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
        bin.extend_from_slice(&value.to_le_bytes());
    }
    for index in [0u16, 1, 2] {
        bin.extend_from_slice(&index.to_le_bytes());
    }
    bin.extend_from_slice(&[0, 0]);
    std::fs::write(dir.join("tri.bin"), &bin).unwrap();

    let json = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "name": "tri", "mesh": 0, "translation": [0.0, 2.0, 0.0] }],
        "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1, "material": 0 }] }],
        "materials": [{
            "name": "stone",
            "pbrMetallicRoughness": {
                "baseColorFactor": [0.5, 0.25, 1.0, 1.0],
                "metallicFactor": 0.25,
                "roughnessFactor": 0.75
            }
        }],
        "buffers": [{ "uri": "tri.bin", "byteLength": 44 }],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36, "target": 34962 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 6, "target": 34963 }
        ],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
              "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
            { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
        ]
    }"#;
    let path = dir.join(file_name);
    std::fs::write(&path, json).unwrap();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::camera::{CameraController, CameraManager, OrbitCamera};

    fn empty_scene() -> Scene {
        let camera = OrbitCamera::looking_at(Vector3::new(-4.0, 2.0, 4.0), Vector3::new(0.0, 0.0, 0.0), 1.0);
        Scene::new(CameraManager::new(camera, CameraController::new(0.005, 0.1)))
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ModelFormat::from_path(Path::new("objects/scene.gltf")), Some(ModelFormat::Gltf));
        assert_eq!(ModelFormat::from_path(Path::new("scene.GLB")), Some(ModelFormat::Gltf));
        assert_eq!(ModelFormat::from_path(Path::new("scene.obj")), Some(ModelFormat::Obj));
        assert_eq!(ModelFormat::from_path(Path::new("scene.fbx")), None);
        assert_eq!(ModelFormat::from_path(Path::new("scene")), None);
    }

    #[test]
    fn test_unsupported_extension_is_rejected() {
        let mut scene = empty_scene();
        let err = scene
            .load_model(Path::new("objects/scene.fbx"), Transform::default())
            .unwrap_err();
        assert!(matches!(err, SceneError::UnsupportedModel { .. }));
    }

    #[test]
    fn test_missing_gltf_fails() {
        let mut scene = empty_scene();
        let err = scene
            .load_model(Path::new("no/such/scene.gltf"), Transform::default())
            .unwrap_err();
        assert!(matches!(err, SceneError::Gltf { .. }));
        assert!(scene.objects.is_empty());
    }

    #[test]
    fn test_load_gltf_from_disk() {
        let dir = std::env::temp_dir().join(format!("snowlight-gltf-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = write_triangle_gltf(&dir, "tri.gltf");

        let mut scene = empty_scene();
        let placement = Transform::from_position(Vector3::new(1.0, -0.5, 0.0)).with_uniform_scale(0.05);
        let import = scene.load_model(&path, placement).unwrap();

        assert_eq!(import.objects.len(), 1);
        let object = &scene.objects[import.objects[0]];
        assert_eq!(object.name, "tri/tri");
        assert_eq!(object.transform, placement);
        assert!(!object.cast_shadow);
        assert_eq!(object.get_material_id().map(String::as_str), Some("tri/stone"));

        // Node translation is baked into the vertices
        let vertices = object.meshes[0].vertices();
        assert_eq!(vertices[0].position, [0.0, 2.0, 0.0]);
        assert_eq!(vertices[2].position, [0.0, 3.0, 0.0]);
        assert!((vertices[0].normal[2] - 1.0).abs() < 1e-6);

        let material = scene.material_manager.get_material("tri/stone").unwrap();
        assert_eq!(material.base_color, [0.5, 0.25, 1.0, 1.0]);
        assert_eq!(material.metallic, 0.25);
        assert_eq!(material.roughness, 0.75);
        assert_eq!(scene.get_statistics().total_triangles, 1);

        std::fs::remove_dir_all(&dir).ok();
    }
}
