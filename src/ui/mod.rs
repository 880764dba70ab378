//! # User Interface Module
//!
//! Dear ImGui overlay drawn on top of the scene.
//!
//! - [`UiManager`] - ImGui integration with winit and wgpu, input capture
//! - [`light_rig_panel`] - Shadows, exposure, bulb power and sky irradiance controls
//!
//! When the UI wants the mouse or keyboard, camera input is not processed.

pub mod manager;
pub mod panel;

// Re-export main types
pub use manager::{InputCapture, UiManager};
pub use panel::{light_rig_panel, PanelInfo};
