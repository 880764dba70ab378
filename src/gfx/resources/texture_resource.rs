//! Texture resource management for wgpu
//!
//! CPU-side decoded images ([`TextureImage`]) with their sampling settings,
//! and the GPU-side bundle ([`TextureResource`]) they are uploaded into.
//! Depth buffers and the shadow map are created here as well.

use std::path::Path;

use crate::error::{Result, SceneError};

/// How texture coordinates outside 0..1 are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapMode {
    Repeat,
    ClampToEdge,
}

impl WrapMode {
    fn address_mode(self) -> wgpu::AddressMode {
        match self {
            WrapMode::Repeat => wgpu::AddressMode::Repeat,
            WrapMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        }
    }
}

/// Sampling settings applied when a texture is uploaded
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureSettings {
    pub wrap: WrapMode,
    /// UV repeat factors (u, v)
    pub repeat: [f32; 2],
    pub anisotropy: u16,
    /// Color data stored in sRGB (diffuse maps); data maps stay linear
    pub srgb: bool,
}

impl Default for TextureSettings {
    fn default() -> Self {
        Self {
            wrap: WrapMode::ClampToEdge,
            repeat: [1.0, 1.0],
            anisotropy: 1,
            srgb: false,
        }
    }
}

impl TextureSettings {
    /// Repeat-wrapped texture with the given tiling and anisotropy 4
    pub fn tiled(repeat_u: f32, repeat_v: f32) -> Self {
        Self {
            wrap: WrapMode::Repeat,
            repeat: [repeat_u, repeat_v],
            anisotropy: 4,
            srgb: false,
        }
    }

    /// Marks the texture as sRGB-encoded color data
    pub fn with_srgb(mut self) -> Self {
        self.srgb = true;
        self
    }

    pub fn with_anisotropy(mut self, anisotropy: u16) -> Self {
        self.anisotropy = anisotropy;
        self
    }

    fn format(&self) -> wgpu::TextureFormat {
        if self.srgb {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        }
    }

    /// Sampler descriptor honouring wrap mode and anisotropy
    pub fn sampler_descriptor(&self) -> wgpu::SamplerDescriptor<'static> {
        let address_mode = self.wrap.address_mode();
        wgpu::SamplerDescriptor {
            label: Some("Material Sampler"),
            address_mode_u: address_mode,
            address_mode_v: address_mode,
            address_mode_w: address_mode,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            anisotropy_clamp: self.anisotropy.clamp(1, 16),
            ..Default::default()
        }
    }
}

/// A decoded RGBA8 image waiting to be uploaded
#[derive(Debug, Clone)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
    pub settings: TextureSettings,
}

impl TextureImage {
    /// Decodes an image file into RGBA8
    pub fn decode(path: &Path, settings: TextureSettings) -> Result<Self> {
        let image = image::open(path).map_err(|source| SceneError::Texture {
            path: path.to_path_buf(),
            source,
        })?;
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();

        Ok(Self {
            width,
            height,
            rgba: rgba.into_raw(),
            settings,
        })
    }

    /// A single-pixel image of one color
    pub fn solid(rgba: [u8; 4], settings: TextureSettings) -> Self {
        Self {
            width: 1,
            height: 1,
            rgba: rgba.to_vec(),
            settings,
        }
    }

    /// Number of levels in a full mip chain down to 1x1
    pub fn mip_level_count(&self) -> u32 {
        32 - self.width.max(self.height).max(1).leading_zeros()
    }

    /// Full mip chain, level 0 first, each level filtered down from the previous one
    pub fn mip_chain(&self) -> Vec<MipLevel> {
        let Some(base) = image::RgbaImage::from_raw(self.width, self.height, self.rgba.clone()) else {
            log::warn!(
                "Image data does not match {}x{}, uploading without mips",
                self.width,
                self.height
            );
            return vec![MipLevel {
                width: self.width,
                height: self.height,
                rgba: self.rgba.clone(),
            }];
        };

        let mut levels = Vec::with_capacity(self.mip_level_count() as usize);
        let mut current = base;
        loop {
            let (width, height) = current.dimensions();
            let next = (width > 1 || height > 1).then(|| {
                image::imageops::resize(
                    &current,
                    (width / 2).max(1),
                    (height / 2).max(1),
                    image::imageops::FilterType::Triangle,
                )
            });
            levels.push(MipLevel {
                width,
                height,
                rgba: current.into_raw(),
            });
            match next {
                Some(next) => current = next,
                None => break,
            }
        }
        levels
    }
}

/// One level of a mip chain, tightly packed RGBA8
#[derive(Debug, Clone)]
pub struct MipLevel {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// GPU texture resource containing texture, view, and sampler
#[derive(Clone)]
pub struct TextureResource {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl TextureResource {
    /// Standard depth buffer format used throughout the engine
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Creates a depth texture matching the surface configuration
    pub fn create_depth_texture(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            lod_min_clamp: 0.0,
            lod_max_clamp: 100.0,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Creates the square depth map the point light renders into
    pub fn create_shadow_map(device: &wgpu::Device, size: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Shadow Map"),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        // Shadow lookups go through a comparison sampler
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            lod_min_clamp: 0.0,
            lod_max_clamp: 100.0,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Uploads a decoded image with its full mip chain, using its settings for format and sampler
    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &TextureImage,
        label: &str,
    ) -> Self {
        let levels = image.mip_chain();

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: image.width,
                height: image.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: levels.len() as u32,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: image.settings.format(),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (mip_level, level) in levels.iter().enumerate() {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: mip_level as u32,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                &level.rgba,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * level.width),
                    rows_per_image: Some(level.height),
                },
                wgpu::Extent3d {
                    width: level.width,
                    height: level.height,
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&image.settings.sampler_descriptor());

        Self {
            texture,
            view,
            sampler,
        }
    }
}

/// Fallback textures bound to empty material slots
pub struct DefaultTextures {
    /// White, sRGB: neutral for base color maps
    pub white_srgb: TextureResource,
    /// White, linear: neutral for roughness, metalness and bump maps
    pub white_linear: TextureResource,
}

impl DefaultTextures {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let white = [255, 255, 255, 255];
        Self {
            white_srgb: TextureResource::from_image(
                device,
                queue,
                &TextureImage::solid(white, TextureSettings::default().with_srgb()),
                "Default White sRGB",
            ),
            white_linear: TextureResource::from_image(
                device,
                queue,
                &TextureImage::solid(white, TextureSettings::default()),
                "Default White Linear",
            ),
        }
    }
}
