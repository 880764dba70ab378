// src/wgpu_utils/binding_types.rs
//! Binding types used by the scene's bind group layouts

/// Plain uniform buffer without dynamic offsets
pub fn uniform() -> wgpu::BindingType {
    wgpu::BindingType::Buffer {
        ty: wgpu::BufferBindingType::Uniform,
        has_dynamic_offset: false,
        min_binding_size: None,
    }
}

pub fn sampler(kind: wgpu::SamplerBindingType) -> wgpu::BindingType {
    wgpu::BindingType::Sampler(kind)
}

fn single_sample_2d(sample_type: wgpu::TextureSampleType) -> wgpu::BindingType {
    wgpu::BindingType::Texture {
        sample_type,
        view_dimension: wgpu::TextureViewDimension::D2,
        multisampled: false,
    }
}

/// Filterable color texture (material maps)
pub fn texture_2d() -> wgpu::BindingType {
    single_sample_2d(wgpu::TextureSampleType::Float { filterable: true })
}

/// Depth texture read through a comparison sampler (shadow map)
pub fn depth_texture_2d() -> wgpu::BindingType {
    single_sample_2d(wgpu::TextureSampleType::Depth)
}
