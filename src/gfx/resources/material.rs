//! Surface materials, keyed by name in a [`MaterialManager`]
//!
//! A material carries a `needs_update` flag. Setting it (directly, through a
//! texture load, or through [`MaterialManager::mark_needs_update`]) makes the
//! next [`MaterialManager::sync_gpu_resources`] rebuild the material's bind
//! group before it is drawn again.

use std::collections::HashMap;
use wgpu::Device;

use crate::gfx::resources::texture_resource::{
    DefaultTextures, TextureImage, TextureResource, TextureSettings,
};
use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
    binding_types,
    uniform_buffer::UniformBuffer,
};

pub type MaterialId = String;

pub const FALLBACK_MATERIAL: &str = "default";

/// Named texture slots of a material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    Map,
    BumpMap,
    RoughnessMap,
    MetalnessMap,
}

impl TextureSlot {
    pub const ALL: [TextureSlot; 4] = [
        TextureSlot::Map,
        TextureSlot::BumpMap,
        TextureSlot::RoughnessMap,
        TextureSlot::MetalnessMap,
    ];

    fn index(self) -> usize {
        match self {
            TextureSlot::Map => 0,
            TextureSlot::BumpMap => 1,
            TextureSlot::RoughnessMap => 2,
            TextureSlot::MetalnessMap => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TextureSlot::Map => "map",
            TextureSlot::BumpMap => "bump map",
            TextureSlot::RoughnessMap => "roughness map",
            TextureSlot::MetalnessMap => "metalness map",
        }
    }
}

/// Must match `MaterialUniform` in `pbr.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub base_color: [f32; 4],
    pub emissive: [f32; 3],
    pub emissive_intensity: f32,
    pub metallic: f32,
    pub roughness: f32,
    pub bump_scale: f32,
    _padding0: f32,
    pub uv_repeat: [f32; 2],
    _padding1: [f32; 2],
}

type MaterialUBO = UniformBuffer<MaterialUniform>;

/// Material bind group layout
///
/// Binding order: uniform, map, bump map, roughness map, metalness map, sampler.
pub struct MaterialBindings;

impl MaterialBindings {
    pub fn create_layout(device: &Device) -> BindGroupLayoutWithDesc {
        BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
            .create(device, "Material Bind Group Layout")
    }
}

struct MaterialGpu {
    ubo: MaterialUBO,
    textures: [Option<TextureResource>; 4],
    _sampler: wgpu::Sampler,
    bind_group: wgpu::BindGroup,
    uploaded_revision: u64,
}

/// Surface parameters plus the texture images and GPU state built from them
pub struct Material {
    pub name: String,
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    pub bump_scale: f32,
    pub emissive: [f32; 3],
    pub emissive_intensity: f32,
    pub needs_update: bool,

    textures: [Option<TextureImage>; 4],
    texture_revision: u64,

    gpu: Option<MaterialGpu>,
}

impl Default for Material {
    fn default() -> Self {
        Self::new("Default", [0.8, 0.8, 0.8, 1.0], 0.0, 0.5)
    }
}

impl Material {
    /// New materials start dirty so their first sync builds a bind group
    pub fn new(name: &str, base_color: [f32; 4], metallic: f32, roughness: f32) -> Self {
        Self {
            name: name.to_string(),
            base_color,
            metallic: metallic.clamp(0.0, 1.0),
            roughness: roughness.clamp(0.0, 1.0),
            bump_scale: 1.0,
            emissive: [0.0, 0.0, 0.0],
            emissive_intensity: 1.0,
            needs_update: true,
            textures: Default::default(),
            texture_revision: 0,
            gpu: None,
        }
    }

    /// Emitted color before `emissive_intensity` scaling
    pub fn with_emission(mut self, rgb: [f32; 3]) -> Self {
        self.emissive = rgb;
        self
    }

    pub fn with_emissive_intensity(mut self, intensity: f32) -> Self {
        self.emissive_intensity = intensity;
        self
    }

    /// How strongly the bump map tilts normals
    pub fn with_bump_scale(mut self, bump_scale: f32) -> Self {
        self.bump_scale = bump_scale;
        self
    }

    /// Assigns a decoded image to a slot and flags the material for re-upload
    pub fn set_texture(&mut self, slot: TextureSlot, image: TextureImage) {
        self.textures[slot.index()] = Some(image);
        self.texture_revision += 1;
        self.needs_update = true;
    }

    pub fn texture(&self, slot: TextureSlot) -> Option<&TextureImage> {
        self.textures[slot.index()].as_ref()
    }

    /// Settings that drive the shared sampler and UV tiling
    ///
    /// The base color map wins; otherwise the first loaded slot is used.
    pub fn texture_settings(&self) -> TextureSettings {
        self.textures
            .iter()
            .flatten()
            .map(|image| image.settings)
            .next()
            .unwrap_or_default()
    }

    pub fn uniform(&self) -> MaterialUniform {
        MaterialUniform {
            base_color: self.base_color,
            emissive: self.emissive,
            emissive_intensity: self.emissive_intensity,
            metallic: self.metallic,
            roughness: self.roughness,
            bump_scale: self.bump_scale,
            _padding0: 0.0,
            uv_repeat: self.texture_settings().repeat,
            _padding1: [0.0; 2],
        }
    }

    /// Whether the GPU copy is missing or stale
    pub fn is_dirty(&self) -> bool {
        self.needs_update
            || match &self.gpu {
                Some(gpu) => gpu.uploaded_revision != self.texture_revision,
                None => true,
            }
    }

    /// Syncs GPU resources, rebuilding the bind group when dirty
    ///
    /// Returns true when the bind group was rebuilt.
    pub fn update_gpu_resources(
        &mut self,
        device: &Device,
        queue: &wgpu::Queue,
        layout: &BindGroupLayoutWithDesc,
        defaults: &DefaultTextures,
    ) -> bool {
        let rebuilt = if self.is_dirty() {
            self.rebuild_gpu_resources(device, queue, layout, defaults);
            true
        } else {
            false
        };

        let uniform = self.uniform();
        if let Some(gpu) = &mut self.gpu {
            gpu.ubo.update_content(queue, uniform);
        }

        rebuilt
    }

    fn upload_textures(&self, device: &Device, queue: &wgpu::Queue) -> [Option<TextureResource>; 4] {
        std::array::from_fn(|i| {
            self.textures[i].as_ref().map(|image| {
                let label = format!("{} {}", self.name, TextureSlot::ALL[i].name());
                TextureResource::from_image(device, queue, image, &label)
            })
        })
    }

    fn rebuild_gpu_resources(
        &mut self,
        device: &Device,
        queue: &wgpu::Queue,
        layout: &BindGroupLayoutWithDesc,
        defaults: &DefaultTextures,
    ) {
        let (ubo, textures) = match self.gpu.take() {
            Some(gpu) if gpu.uploaded_revision == self.texture_revision => (gpu.ubo, gpu.textures),
            Some(gpu) => (gpu.ubo, self.upload_textures(device, queue)),
            None => (MaterialUBO::new(device), self.upload_textures(device, queue)),
        };

        let sampler = device.create_sampler(&self.texture_settings().sampler_descriptor());

        let map_view = textures[0]
            .as_ref()
            .map_or(&defaults.white_srgb.view, |t| &t.view);
        let bump_view = textures[1]
            .as_ref()
            .map_or(&defaults.white_linear.view, |t| &t.view);
        let roughness_view = textures[2]
            .as_ref()
            .map_or(&defaults.white_linear.view, |t| &t.view);
        let metalness_view = textures[3]
            .as_ref()
            .map_or(&defaults.white_linear.view, |t| &t.view);

        let bind_group = BindGroupBuilder::new(layout)
            .resource(ubo.binding_resource())
            .texture(map_view)
            .texture(bump_view)
            .texture(roughness_view)
            .texture(metalness_view)
            .sampler(&sampler)
            .create(device, &format!("{} Bind Group", self.name));

        let mut ubo = ubo;
        ubo.force_update_content(queue, self.uniform());

        self.gpu = Some(MaterialGpu {
            ubo,
            textures,
            _sampler: sampler,
            bind_group,
            uploaded_revision: self.texture_revision,
        });
        self.needs_update = false;
    }

    /// `None` until the first sync
    pub fn get_bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.gpu.as_ref().map(|gpu| &gpu.bind_group)
    }
}

/// Materials by name, plus a grey fallback for objects without one
pub struct MaterialManager {
    materials: HashMap<MaterialId, Material>,
    fallback_id: MaterialId,
}

impl MaterialManager {
    pub fn new() -> Self {
        let mut manager = Self {
            materials: HashMap::new(),
            fallback_id: FALLBACK_MATERIAL.to_string(),
        };
        manager.add_material(Material::new(FALLBACK_MATERIAL, [0.8, 0.8, 0.8, 1.0], 0.0, 0.5));
        manager
    }

    /// Adds a material, replacing any material with the same name
    pub fn add_material(&mut self, material: Material) {
        self.materials.insert(material.name.clone(), material);
    }

    pub fn get_material(&self, id: &str) -> Option<&Material> {
        self.materials.get(id)
    }

    pub fn get_material_mut(&mut self, id: &str) -> Option<&mut Material> {
        self.materials.get_mut(id)
    }

    pub fn get_default_material(&self) -> &Material {
        &self.materials[&self.fallback_id]
    }

    /// The named material, or the fallback when the name is absent or unknown
    pub fn get_material_for_object(&self, material_id: Option<&MaterialId>) -> &Material {
        material_id
            .and_then(|id| self.get_material(id))
            .unwrap_or_else(|| self.get_default_material())
    }

    /// Flags a material for re-upload; returns false for unknown IDs
    pub fn mark_needs_update(&mut self, id: &str) -> bool {
        match self.materials.get_mut(id) {
            Some(material) => {
                material.needs_update = true;
                true
            }
            None => false,
        }
    }

    /// Clears every `needs_update` flag without touching the GPU
    pub fn clear_update_flags(&mut self) {
        for material in self.materials.values_mut() {
            material.needs_update = false;
        }
    }

    /// Names of materials whose `needs_update` flag is set
    pub fn pending_updates(&self) -> Vec<&MaterialId> {
        let mut ids: Vec<&MaterialId> = self
            .materials
            .iter()
            .filter(|(_, material)| material.needs_update)
            .map(|(id, _)| id)
            .collect();
        ids.sort();
        ids
    }

    pub fn list_materials(&self) -> Vec<&MaterialId> {
        self.materials.keys().collect()
    }

    /// Uploads uniforms for every material and returns the number of materials whose bind group was rebuilt.
    pub fn sync_gpu_resources(
        &mut self,
        device: &Device,
        queue: &wgpu::Queue,
        layout: &BindGroupLayoutWithDesc,
        defaults: &DefaultTextures,
    ) -> usize {
        let mut rebuilt = 0;
        for material in self.materials.values_mut() {
            if material.update_gpu_resources(device, queue, layout, defaults) {
                log::debug!("Uploaded material '{}'", material.name);
                rebuilt += 1;
            }
        }
        rebuilt
    }
}

impl Default for MaterialManager {
    fn default() -> Self {
        Self::new()
    }
}
