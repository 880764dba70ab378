//! Core rendering functionality
//!
//! Handles render pipelines, GPU resource management, and frame rendering.

pub mod pipeline_manager;
pub mod render_engine;
pub mod snow_renderer;

// Re-export main types
pub use pipeline_manager::{PassKind, PipelineDesc, PipelineManager};
pub use render_engine::RenderEngine;
pub use snow_renderer::SnowRenderer;
