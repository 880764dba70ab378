//! Render pipelines for the three passes of a frame
//!
//! Every shader gets [`COMMON_WGSL`] prepended, so the global uniform and
//! lighting helpers are declared once.

use std::collections::HashMap;
use wgpu::*;

use crate::gfx::scene::vertex::Vertex3D;

/// WGSL prepended to every shader compiled by [`PipelineManager`]
pub const COMMON_WGSL: &str = include_str!("shaders/common.wgsl");

/// Which pass a pipeline draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    /// Depth only, from the point light
    Shadow,
    /// Meshes with materials, lights and shadows
    Lit,
    /// Instanced snow flakes
    Snow,
}

impl PassKind {
    pub const ALL: [PassKind; 3] = [PassKind::Shadow, PassKind::Lit, PassKind::Snow];

    pub fn label(self) -> &'static str {
        match self {
            PassKind::Shadow => "Shadow Pipeline",
            PassKind::Lit => "Lit Pipeline",
            PassKind::Snow => "Snow Pipeline",
        }
    }
}

/// Render state of one pipeline
///
/// A pipeline without a color format is depth only and has no fragment stage.
#[derive(Debug, Clone)]
pub struct PipelineDesc {
    pub bind_group_layouts: Vec<BindGroupLayout>,
    pub vertex_buffers: Vec<VertexBufferLayout<'static>>,
    pub color_format: Option<TextureFormat>,
    pub depth_format: TextureFormat,
    pub depth_bias: DepthBiasState,
    pub cull_mode: Option<Face>,
}

impl PipelineDesc {
    /// Mesh vertices, no culling, depth tested against `depth_format`
    pub fn new(depth_format: TextureFormat, layouts: Vec<BindGroupLayout>) -> Self {
        Self {
            bind_group_layouts: layouts,
            vertex_buffers: vec![Vertex3D::desc()],
            color_format: None,
            depth_format,
            depth_bias: DepthBiasState::default(),
            cull_mode: None,
        }
    }

    pub fn color(mut self, format: TextureFormat) -> Self {
        self.color_format = Some(format);
        self
    }

    pub fn depth_bias(mut self, constant: i32, slope_scale: f32) -> Self {
        self.depth_bias = DepthBiasState {
            constant,
            slope_scale,
            clamp: 0.0,
        };
        self
    }

    pub fn instanced(mut self, instance: VertexBufferLayout<'static>) -> Self {
        self.vertex_buffers.push(instance);
        self
    }

    pub fn is_depth_only(&self) -> bool {
        self.color_format.is_none()
    }

    fn color_targets(&self) -> Vec<Option<ColorTargetState>> {
        self.color_format
            .map(|format| ColorTargetState {
                format,
                blend: Some(BlendState::REPLACE),
                write_mask: ColorWrites::ALL,
            })
            .into_iter()
            .map(Some)
            .collect()
    }
}

/// Compiled pipelines, one per [`PassKind`]
pub struct PipelineManager {
    pipelines: HashMap<PassKind, RenderPipeline>,
}

impl PipelineManager {
    pub fn new() -> Self {
        Self {
            pipelines: HashMap::new(),
        }
    }

    /// Compiles `shader_body` and builds the pipeline for `kind`, replacing any previous one
    pub fn build(&mut self, device: &Device, kind: PassKind, shader_body: &str, desc: &PipelineDesc) {
        let module = device.create_shader_module(ShaderModuleDescriptor {
            label: Some(kind.label()),
            source: ShaderSource::Wgsl(compose_shader(shader_body).into()),
        });

        let layout_refs: Vec<&BindGroupLayout> = desc.bind_group_layouts.iter().collect();
        let layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some(kind.label()),
            bind_group_layouts: &layout_refs,
            push_constant_ranges: &[],
        });

        let targets = desc.color_targets();
        let fragment = (!desc.is_depth_only()).then(|| FragmentState {
            module: &module,
            entry_point: Some("fs_main"),
            targets: &targets,
            compilation_options: PipelineCompilationOptions::default(),
        });

        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some(kind.label()),
            layout: Some(&layout),
            vertex: VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                buffers: &desc.vertex_buffers,
                compilation_options: PipelineCompilationOptions::default(),
            },
            fragment,
            primitive: PrimitiveState {
                topology: PrimitiveTopology::TriangleList,
                front_face: FrontFace::Ccw,
                cull_mode: desc.cull_mode,
                ..Default::default()
            },
            depth_stencil: Some(DepthStencilState {
                format: desc.depth_format,
                depth_write_enabled: true,
                depth_compare: CompareFunction::Less,
                stencil: StencilState::default(),
                bias: desc.depth_bias,
            }),
            multisample: MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        log::debug!("Built {}", kind.label());
        self.pipelines.insert(kind, pipeline);
    }

    pub fn get(&self, kind: PassKind) -> Option<&RenderPipeline> {
        self.pipelines.get(&kind)
    }

    /// Passes that have no pipeline yet
    pub fn missing(&self) -> Vec<PassKind> {
        PassKind::ALL
            .into_iter()
            .filter(|kind| !self.pipelines.contains_key(kind))
            .collect()
    }
}

impl Default for PipelineManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Prepends the shared declarations to a shader body
pub fn compose_shader(source: &str) -> String {
    format!("{}\n{}", COMMON_WGSL, source)
}
