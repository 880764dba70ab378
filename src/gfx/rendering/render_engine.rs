//! WGPU-based rendering engine
//!
//! Owns the surface, device and every GPU resource that is not tied to a
//! single object or material. A frame is a shadow pass from the point light,
//! the main lit pass with the instanced snow, and an optional UI overlay.

use std::sync::Arc;

use anyhow::Context;
use wgpu::TextureFormat;

use crate::gfx::{
    resources::{
        global_bindings::{update_global_ubo, GlobalBindings, GlobalUBO},
        material::MaterialBindings,
        texture_resource::{DefaultTextures, TextureResource},
    },
    scene::{object::DrawObject, snow::SnowInstance, ObjectBindings, Scene},
};
use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
    binding_types,
};

use super::pipeline_manager::{PassKind, PipelineDesc, PipelineManager};
use super::snow_renderer::SnowRenderer;

const SHADOW_MAP_SIZE: u32 = 2048;

/// Surface, device and the frame-wide GPU resources
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    format: TextureFormat,
    pipeline_manager: PipelineManager,
    global_ubo: GlobalUBO,
    global_bindings: GlobalBindings,
    object_layout: BindGroupLayoutWithDesc,
    material_layout: BindGroupLayoutWithDesc,
    default_textures: DefaultTextures,

    shadow_map: TextureResource,
    shadow_bind_group: wgpu::BindGroup,

    snow_renderer: SnowRenderer,
}

impl RenderEngine {
    /// Opens a device on `window` and builds every pipeline
    ///
    /// `snow_capacity` bounds the flakes drawn per frame.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        snow_capacity: u32,
    ) -> anyhow::Result<RenderEngine> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .context("failed to create a window surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no compatible GPU adapter")?;
        log::info!("Using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: 4096,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to open a GPU device")?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        // Tone-mapped output is linear; an sRGB surface encodes it on write
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .context("surface reports no supported formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_capabilities.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            TextureResource::create_depth_texture(&device, &config, "depth_texture");

        let shadow_map = TextureResource::create_shadow_map(&device, SHADOW_MAP_SIZE);
        let shadow_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::depth_texture_2d())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Comparison))
            .create(&device, "Shadow Bind Group Layout");
        let shadow_bind_group = BindGroupBuilder::new(&shadow_layout)
            .texture(&shadow_map.view)
            .sampler(&shadow_map.sampler)
            .create(&device, "Shadow Bind Group");

        let global_ubo = GlobalUBO::new(&device);
        let global_bindings = GlobalBindings::new(&device, &global_ubo);
        let object_layout = ObjectBindings::create_layout(&device);
        let material_layout = MaterialBindings::create_layout(&device);
        let default_textures = DefaultTextures::new(&device, &queue);
        let snow_renderer = SnowRenderer::new(&device, snow_capacity);

        let globals = global_bindings.bind_group_layout().clone();
        let mut pipeline_manager = PipelineManager::new();

        // Both faces go into the shadow map
        pipeline_manager.build(
            &device,
            PassKind::Shadow,
            include_str!("shaders/shadow_pass.wgsl"),
            &PipelineDesc::new(
                TextureResource::DEPTH_FORMAT,
                vec![globals.clone(), object_layout.layout.clone()],
            )
            .depth_bias(2, 2.0),
        );

        // Planes are visible from both sides; the shader flips back-facing normals
        pipeline_manager.build(
            &device,
            PassKind::Lit,
            include_str!("shaders/pbr.wgsl"),
            &PipelineDesc::new(
                TextureResource::DEPTH_FORMAT,
                vec![
                    globals.clone(),
                    object_layout.layout.clone(),
                    material_layout.layout.clone(),
                    shadow_layout.layout.clone(),
                ],
            )
            .color(format),
        );

        pipeline_manager.build(
            &device,
            PassKind::Snow,
            include_str!("shaders/snow.wgsl"),
            &PipelineDesc::new(
                TextureResource::DEPTH_FORMAT,
                vec![globals, material_layout.layout.clone()],
            )
            .color(format)
            .instanced(SnowInstance::desc()),
        );

        let missing = pipeline_manager.missing();
        if !missing.is_empty() {
            anyhow::bail!("render pipelines missing: {:?}", missing);
        }

        let device: Arc<wgpu::Device> = Arc::new(device);
        let queue: Arc<wgpu::Queue> = Arc::new(queue);

        log::info!(
            "Render engine ready: {}x{} {:?}, shadow map {}",
            config.width,
            config.height,
            format,
            SHADOW_MAP_SIZE
        );

        Ok(RenderEngine {
            surface,
            device,
            queue,
            config,
            depth_texture,
            format,
            pipeline_manager,
            global_ubo,
            global_bindings,
            object_layout,
            material_layout,
            default_textures,
            shadow_map,
            shadow_bind_group,
            snow_renderer,
        })
    }

    /// Pushes scene state to the GPU before drawing
    ///
    /// Creates missing object buffers, re-uploads dirty materials (clearing
    /// their `needs_update` flag), writes transforms, the global uniform and
    /// the snow instances.
    pub fn prepare(&mut self, scene: &mut Scene) {
        scene.init_gpu_resources(&self.device, &self.object_layout);
        scene.update_all_transforms(&self.queue);

        let uploaded = scene.material_manager.sync_gpu_resources(
            &self.device,
            &self.queue,
            &self.material_layout,
            &self.default_textures,
        );
        if uploaded > 0 {
            log::debug!("Re-uploaded {} materials", uploaded);
        }

        let camera = scene.camera_manager.update_uniform();
        update_global_ubo(
            &mut self.global_ubo,
            &self.queue,
            camera,
            &scene.lights,
            scene.settings,
        );

        self.snow_renderer.update(&self.queue, &scene.snow);
    }

    /// Renders a frame with an optional UI overlay
    ///
    /// Returns false when the frame was skipped because the surface was
    /// unavailable. A lost or outdated surface is reconfigured in place.
    pub fn render_frame<F>(&self, scene: &Scene, ui_callback: Option<F>) -> bool
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return false;
            }
            Err(err) => {
                log::error!("Failed to acquire surface texture: {}", err);
                return false;
            }
        };

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        // PASS 1: Shadow map from the point light
        if scene.settings.shadow_map_enabled && scene.lights.point.cast_shadow {
            let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Depth Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.shadow_map.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(shadow_pipeline) = self.pipeline_manager.get(PassKind::Shadow) {
                shadow_pass.set_pipeline(shadow_pipeline);
                shadow_pass.set_bind_group(0, self.global_bindings.bind_group(), &[]);

                for object in scene.objects.iter().filter(|o| o.visible && o.cast_shadow) {
                    shadow_pass.draw_object(object);
                }
            }
        }

        // PASS 2: Lit scene and snow
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(pipeline) = self.pipeline_manager.get(PassKind::Lit) {
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, self.global_bindings.bind_group(), &[]);
                render_pass.set_bind_group(3, &self.shadow_bind_group, &[]);

                for object in scene.objects.iter().filter(|o| o.visible) {
                    let material = scene.get_material_for_object(object);

                    if let Some(material_bind_group) = material.get_bind_group() {
                        render_pass.set_bind_group(2, material_bind_group, &[]);
                        render_pass.draw_object(object);
                    } else {
                        log::trace!(
                            "Skipping '{}' - material '{}' has no GPU resources",
                            object.name,
                            material.name
                        );
                    }
                }
            }

            let snow_material = scene
                .material_manager
                .get_material_for_object(scene.snow_material.as_ref());
            if let (Some(pipeline), Some(material_bind_group)) = (
                self.pipeline_manager.get(PassKind::Snow),
                snow_material.get_bind_group(),
            ) {
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, self.global_bindings.bind_group(), &[]);
                render_pass.set_bind_group(1, material_bind_group, &[]);
                self.snow_renderer.render(&mut render_pass);
            }
        }

        // PASS 3: UI overlay
        if let Some(ui_callback) = ui_callback {
            ui_callback(
                &self.device,
                &self.queue,
                &mut encoder,
                &surface_texture_view,
            );
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        true
    }

    /// Reconfigures the surface and depth buffer
    ///
    /// Zero-sized requests (minimised window) are ignored. The shadow map
    /// has a fixed resolution and is left alone.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);

        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, &self.config, "depth_texture");
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }
}
