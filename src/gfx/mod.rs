//! # Graphics Module
//!
//! Camera, geometry, scene, GPU resources and the renderer.
//!
//! - **Camera System** ([`camera`]) - Orbit camera with rotate, zoom and pan controls
//! - **Geometry** ([`geometry`]) - Procedural plane, box, sphere, torus and cone meshes
//! - **Scene Management** ([`scene`]) - Objects, lights and the snow field
//! - **Resource Management** ([`resources`]) - Materials, textures and global uniforms
//! - **Rendering Pipeline** ([`rendering`]) - Shadow pass, lit pass, instanced snow
//!
//! The renderer reads a [`Scene`](scene::Scene) every frame:
//!
//! ```no_run
//! use snowlight::gfx::{RenderEngine, scene::Scene};
//!
//! fn frame(engine: &mut RenderEngine, scene: &mut Scene) {
//!     engine.prepare(scene);
//!     engine.render_frame(
//!         scene,
//!         None::<fn(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView)>,
//!     );
//! }
//! ```

pub mod camera;
pub mod geometry;
pub mod rendering;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use camera::orbit_camera::OrbitCamera;
pub use rendering::render_engine::RenderEngine;
