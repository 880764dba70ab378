//! # Scene Management Module
//!
//! Everything that lives in the rendered world: objects and their meshes,
//! transforms, the light rig and the snow field.
//!
//! ## Key Components
//!
//! - [`Scene`] - Container for objects, materials, lights, snow and camera
//! - [`Object`] - Meshes with a material, a transform and shadow flags
//! - [`LightRig`] - Point, hemisphere, ambient and spot lights
//! - [`SnowField`] - Falling snow flakes drawn with one instanced call
//! - [`Vertex3D`] - Vertex format with position, normal and texture coordinates

pub mod lights;
pub mod model;
pub mod object;
pub mod scene;
pub mod snow;
pub mod transform;
pub mod vertex;

// Re-export main types
pub use lights::{color_from_hex, AmbientLight, HemisphereLight, LightRig, PointLight, SpotLight};
pub use model::ModelFormat;
pub use object::{DrawObject, Mesh, Object, ObjectBindings};
pub use scene::{ModelImport, RenderSettings, Scene, SceneStatistics};
pub use snow::{SnowField, SnowFlake, SnowInstance};
pub use transform::Transform;
pub use vertex::Vertex3D;
