//! Dear ImGui overlay: winit input in, wgpu draw calls out

use imgui::{FontConfig, FontSource, MouseCursor};
use imgui_wgpu::{Renderer, RendererConfig};
use imgui_winit_support::{HiDpiMode, WinitPlatform};
use std::time::Instant;
use wgpu::{CommandEncoder, Device, Queue, TextureFormat, TextureView};
use winit::{
    event::{Event, WindowEvent},
    window::{Window, WindowId},
};

const FONT_SIZE: f32 = 20.0;

/// What the overlay currently wants for itself
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputCapture {
    pub mouse: bool,
    pub keyboard: bool,
}

impl InputCapture {
    /// Camera input is ignored while the overlay holds either device
    pub fn blocks_camera(self) -> bool {
        self.mouse || self.keyboard
    }
}

/// Renderer settings for a target of `format`
///
/// On an sRGB target the hardware encodes on write, so the shader must not.
pub fn renderer_config_for(format: TextureFormat) -> RendererConfig<'static> {
    let base = if format.is_srgb() {
        RendererConfig::new()
    } else {
        RendererConfig::new_srgb()
    };
    RendererConfig {
        texture_format: format,
        ..base
    }
}

fn forwards_to_ui(event: &WindowEvent) -> bool {
    matches!(
        event,
        WindowEvent::CursorMoved { .. }
            | WindowEvent::MouseInput { .. }
            | WindowEvent::MouseWheel { .. }
            | WindowEvent::KeyboardInput { .. }
            | WindowEvent::ModifiersChanged(_)
            | WindowEvent::Focused(_)
    )
}

pub struct UiManager {
    imgui: imgui::Context,
    platform: WinitPlatform,
    renderer: Renderer,
    last_frame: Instant,
    cursor: Option<MouseCursor>,
}

impl UiManager {
    pub fn new(device: &Device, queue: &Queue, target_format: TextureFormat, window: &Window) -> Self {
        let mut imgui = imgui::Context::create();
        imgui.set_ini_filename(None);

        // Locked DPI keeps the panel the same pixel size on every monitor
        let mut platform = WinitPlatform::new(&mut imgui);
        platform.attach_window(imgui.io_mut(), window, HiDpiMode::Locked(1.0));

        imgui.fonts().add_font(&[FontSource::DefaultFontData {
            config: Some(FontConfig {
                oversample_h: 1,
                pixel_snap_h: true,
                size_pixels: FONT_SIZE,
                ..Default::default()
            }),
        }]);

        let renderer = Renderer::new(&mut imgui, device, queue, renderer_config_for(target_format));
        log::debug!("UI overlay ready for {:?}", target_format);

        Self {
            imgui,
            platform,
            renderer,
            last_frame: Instant::now(),
            cursor: None,
        }
    }

    pub fn input_capture(&self) -> InputCapture {
        let io = self.imgui.io();
        InputCapture {
            mouse: io.want_capture_mouse,
            keyboard: io.want_capture_keyboard,
        }
    }

    /// Feeds pointer, keyboard and focus events to the overlay
    ///
    /// Returns `true` when the overlay consumed the event.
    pub fn handle_window_event(&mut self, window: &Window, window_id: WindowId, event: &WindowEvent) -> bool {
        if !forwards_to_ui(event) {
            return false;
        }
        let wrapped: Event<()> = Event::WindowEvent {
            window_id,
            event: event.clone(),
        };
        self.platform.handle_event(self.imgui.io_mut(), window, &wrapped);
        self.input_capture().blocks_camera()
    }

    /// Builds the overlay with `build_ui` and draws it over `target`
    pub fn draw<F>(
        &mut self,
        device: &Device,
        queue: &Queue,
        encoder: &mut CommandEncoder,
        window: &Window,
        target: &TextureView,
        build_ui: F,
    ) where
        F: FnOnce(&imgui::Ui),
    {
        let now = Instant::now();
        self.imgui.io_mut().update_delta_time(now - self.last_frame);
        self.last_frame = now;

        if let Err(err) = self.platform.prepare_frame(self.imgui.io_mut(), window) {
            log::warn!("Skipping UI frame: {}", err);
            return;
        }

        let ui = self.imgui.frame();
        build_ui(ui);
        if self.cursor != ui.mouse_cursor() {
            self.cursor = ui.mouse_cursor();
            self.platform.prepare_render(ui, window);
        }

        let draw_data = self.imgui.render();
        let [width, height] = draw_data.display_size;
        if width <= 0.0 || height <= 0.0 {
            return;
        }

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("UI Overlay Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        if let Err(err) = self.renderer.render(draw_data, queue, device, &mut pass) {
            log::error!("UI overlay failed to render: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_blocks_camera() {
        assert!(!InputCapture::default().blocks_camera());
        assert!(InputCapture {
            mouse: true,
            keyboard: false
        }
        .blocks_camera());
        assert!(InputCapture {
            mouse: false,
            keyboard: true
        }
        .blocks_camera());
    }

    #[test]
    fn test_renderer_config_keeps_target_format() {
        for format in [TextureFormat::Bgra8UnormSrgb, TextureFormat::Bgra8Unorm] {
            assert_eq!(renderer_config_for(format).texture_format, format);
        }
    }

    #[test]
    fn test_only_input_events_are_forwarded() {
        assert!(forwards_to_ui(&WindowEvent::Focused(true)));
        assert!(!forwards_to_ui(&WindowEvent::CloseRequested));
        assert!(!forwards_to_ui(&WindowEvent::RedrawRequested));
    }
}
