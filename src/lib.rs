// src/lib.rs
//! snowlight
//!
//! A small wgpu scene: textured primitives and an imported model under a
//! tunable light rig, with twelve thousand falling snow flakes.
//!
//! The pieces, bottom up:
//!
//! - [`gfx`] - camera, geometry, scene, GPU resources and the renderer
//! - [`scene_builder`] - assembles the stock scene
//! - [`texture_pipeline`] - decodes textures on worker threads
//! - [`animation`] - per-frame light, material and snow updates
//! - [`app`] - the winit application host

pub mod animation;
pub mod app;
pub mod config;
pub mod error;
pub mod gfx;
pub mod scene_builder;
pub mod texture_pipeline;
pub mod ui;
pub mod viewport;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::SnowlightApp;
pub use config::{SceneConfig, Tunables};
pub use error::{Result, SceneError};
