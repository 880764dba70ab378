use winit::{
    dpi::PhysicalPosition,
    event::{DeviceEvent, ElementState, KeyEvent, MouseScrollDelta},
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use super::orbit_camera::OrbitCamera;

/// Left mouse button as reported by raw device events
const PRIMARY_BUTTON: u32 = 0;

/// What a mouse drag currently does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    Idle,
    /// Orbit around the target
    Rotate,
    /// Shift + drag: move the target in the view plane
    Pan,
}

/// Turns raw mouse and keyboard input into orbit camera moves
pub struct CameraController {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    button_down: bool,
    shift_down: bool,
}

impl CameraController {
    pub fn new(rotate_speed: f32, zoom_speed: f32) -> Self {
        Self {
            rotate_speed,
            zoom_speed,
            pan_speed: 0.01,
            button_down: false,
            shift_down: false,
        }
    }

    pub fn drag_mode(&self) -> DragMode {
        match (self.button_down, self.shift_down) {
            (false, _) => DragMode::Idle,
            (true, false) => DragMode::Rotate,
            (true, true) => DragMode::Pan,
        }
    }

    pub fn process_events(&mut self, event: &DeviceEvent, window: &Window, camera: &mut OrbitCamera) {
        let moved = match event {
            DeviceEvent::Button {
                button: PRIMARY_BUTTON,
                state,
            } => {
                self.button_down = *state == ElementState::Pressed;
                false
            }
            DeviceEvent::MouseWheel { delta } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(PhysicalPosition { y, .. }) => *y as f32,
                };
                self.scroll(lines, camera);
                true
            }
            DeviceEvent::MouseMotion { delta } => self.drag((delta.0 as f32, delta.1 as f32), camera),
            _ => false,
        };

        if moved {
            window.request_redraw();
        }
    }

    pub fn process_keyed_events(&mut self, event: &KeyEvent, camera: &mut OrbitCamera) {
        if let PhysicalKey::Code(code) = event.physical_key {
            self.key(code, event.state == ElementState::Pressed, camera);
        }
    }

    /// Zooms in for positive amounts
    pub fn scroll(&self, amount: f32, camera: &mut OrbitCamera) {
        camera.add_distance(-amount * self.zoom_speed);
    }

    /// Applies a mouse motion, returns whether the camera moved
    pub fn drag(&self, delta: (f32, f32), camera: &mut OrbitCamera) -> bool {
        match self.drag_mode() {
            DragMode::Idle => false,
            DragMode::Rotate => {
                camera.add_yaw(-delta.0 * self.rotate_speed);
                camera.add_pitch(delta.1 * self.rotate_speed);
                true
            }
            DragMode::Pan => {
                camera.pan((-delta.0 * self.pan_speed, delta.1 * self.pan_speed));
                true
            }
        }
    }

    /// Tracks shift and handles Shift+C (reset to the initial pose)
    pub fn key(&mut self, code: KeyCode, pressed: bool, camera: &mut OrbitCamera) {
        match code {
            KeyCode::ShiftLeft | KeyCode::ShiftRight => self.shift_down = pressed,
            KeyCode::KeyC if pressed && self.shift_down => {
                log::info!("Resetting camera to its initial pose");
                camera.reset_to_default();
            }
            _ => (),
        }
    }

    pub fn press_button(&mut self, pressed: bool) {
        self.button_down = pressed;
    }

    pub fn is_shift_held(&self) -> bool {
        self.shift_down
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector3;

    fn camera() -> OrbitCamera {
        OrbitCamera::looking_at(Vector3::new(-4.0, 2.0, 4.0), Vector3::new(0.0, 0.0, 0.0), 1.0)
    }

    #[test]
    fn test_drag_modes() {
        let mut controller = CameraController::new(0.005, 0.1);
        let mut camera = camera();
        assert_eq!(controller.drag_mode(), DragMode::Idle);
        assert!(!controller.drag((10.0, 0.0), &mut camera));

        controller.press_button(true);
        assert_eq!(controller.drag_mode(), DragMode::Rotate);
        let yaw = camera.yaw;
        assert!(controller.drag((10.0, 0.0), &mut camera));
        assert!((camera.yaw - (yaw - 0.05)).abs() < 1e-6);

        controller.key(KeyCode::ShiftLeft, true, &mut camera);
        assert_eq!(controller.drag_mode(), DragMode::Pan);
        let target = camera.target;
        controller.drag((10.0, 0.0), &mut camera);
        assert_ne!(camera.target, target);
    }

    #[test]
    fn test_shift_c_resets() {
        let mut controller = CameraController::new(0.005, 0.1);
        let mut camera = camera();
        let home_eye = camera.eye;

        controller.press_button(true);
        controller.drag((100.0, 40.0), &mut camera);
        controller.key(KeyCode::KeyC, true, &mut camera);
        assert_ne!(camera.eye, home_eye);

        controller.key(KeyCode::ShiftRight, true, &mut camera);
        controller.key(KeyCode::KeyC, true, &mut camera);
        assert!((camera.eye - home_eye).x.abs() < 1e-5);
        assert!((camera.eye - home_eye).z.abs() < 1e-5);
        assert!(controller.is_shift_held());
    }

    #[test]
    fn test_scroll_zooms_in() {
        let controller = CameraController::new(0.005, 0.1);
        let mut camera = camera();
        let distance = camera.distance;
        controller.scroll(1.0, &mut camera);
        assert!(camera.distance < distance);
    }
}
