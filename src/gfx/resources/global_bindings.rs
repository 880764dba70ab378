//! Global uniform bindings for camera, lights and output settings
//!
//! Manages the GPU uniform buffer and bind group for per-frame state that is
//! shared by every pipeline: camera matrices, the whole light rig, the
//! shadow-map projection and the tone-mapping exposure.

use crate::{
    gfx::{
        camera::camera_utils::CameraUniform,
        scene::{lights::LightRig, scene::RenderSettings},
    },
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

/// Global uniform buffer content structure
///
/// MUST match the `GlobalUniform` struct in `common.wgsl` exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUBOContent {
    // Camera
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
    light_view_proj: [[f32; 4]; 4],

    // Point light
    point_position: [f32; 3],
    point_intensity: f32,
    point_color: [f32; 3],
    point_distance: f32,
    point_decay: f32,
    shadows_enabled: f32,
    exposure: f32,
    ambient_intensity: f32,

    // Hemisphere and ambient
    sky_color: [f32; 3],
    hemisphere_intensity: f32,
    ground_color: [f32; 3],
    _padding0: f32,
    ambient_color: [f32; 3],
    _padding1: f32,

    // Spot light
    spot_position: [f32; 3],
    spot_intensity: f32,
    spot_direction: [f32; 3],
    spot_cos_outer: f32,
    spot_color: [f32; 3],
    spot_cos_inner: f32,
    spot_distance: f32,
    spot_decay: f32,
    _padding2: [f32; 2],
}

impl GlobalUBOContent {
    pub fn new(camera: CameraUniform, lights: &LightRig, settings: RenderSettings) -> Self {
        let point = &lights.point;
        let spot = &lights.spot;
        let (spot_cos_outer, spot_cos_inner) = spot.cone_cosines();

        Self {
            view_position: camera.view_position,
            view_proj: camera.view_proj,
            light_view_proj: point.shadow_view_proj().into(),

            point_position: point.position.into(),
            point_intensity: point.intensity,
            point_color: point.color,
            point_distance: point.distance,
            point_decay: point.decay,
            shadows_enabled: if settings.shadow_map_enabled && point.cast_shadow {
                1.0
            } else {
                0.0
            },
            exposure: settings.exposure,
            ambient_intensity: lights.ambient.intensity,

            sky_color: lights.hemisphere.sky_color,
            hemisphere_intensity: lights.hemisphere.intensity,
            ground_color: lights.hemisphere.ground_color,
            _padding0: 0.0,
            ambient_color: lights.ambient.color,
            _padding1: 0.0,

            spot_position: spot.position.into(),
            spot_intensity: spot.intensity,
            spot_direction: spot.direction().into(),
            spot_cos_outer,
            spot_color: spot.color,
            spot_cos_inner,
            spot_distance: spot.distance,
            spot_decay: spot.decay,
            _padding2: [0.0; 2],
        }
    }

    pub fn exposure(&self) -> f32 {
        self.exposure
    }

    pub fn shadows_enabled(&self) -> bool {
        self.shadows_enabled > 0.5
    }
}

/// Type alias for the global uniform buffer
pub type GlobalUBO = UniformBuffer<GlobalUBOContent>;

/// Writes this frame's camera, light and output state to the global uniform buffer
pub fn update_global_ubo(
    ubo: &mut GlobalUBO,
    queue: &wgpu::Queue,
    camera: CameraUniform,
    lights: &LightRig,
    settings: RenderSettings,
) {
    ubo.update_content(queue, GlobalUBOContent::new(camera, lights, settings));
}

/// Manages bind group layouts and bind groups for global uniforms
///
/// This is bound to slot 0 in all render pipelines.
pub struct GlobalBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: wgpu::BindGroup,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device, ubo: &GlobalUBO) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform()) // Global uniforms (camera + lights)
            .create(device, "Globals Bind Group Layout");

        let bind_group = BindGroupBuilder::new(&bind_group_layout)
            .resource(ubo.binding_resource())
            .create(device, "Global Bind Group");

        GlobalBindings {
            bind_group_layout,
            bind_group,
        }
    }

    /// Used when creating render pipelines that need access to global uniforms.
    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_size_matches_shader() {
        assert_eq!(std::mem::size_of::<GlobalUBOContent>(), 304);
    }

    #[test]
    fn test_shadow_flag_needs_setting_and_light() {
        let mut lights = LightRig::default();
        let settings = RenderSettings {
            exposure: 0.145,
            shadow_map_enabled: true,
        };

        let content = GlobalUBOContent::new(CameraUniform::default(), &lights, settings);
        assert!(content.shadows_enabled());
        assert_eq!(content.exposure(), 0.145);

        lights.point.cast_shadow = false;
        let content = GlobalUBOContent::new(CameraUniform::default(), &lights, settings);
        assert!(!content.shadows_enabled());
    }
}
