/// Output size of the render surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Stores the new size; zero-sized events (minimised window) are ignored
    ///
    /// Returns `true` when the size changed.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        let changed = (width, height) != (self.width, self.height);
        self.width = width;
        self.height = height;
        changed
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_updates_aspect() {
        let mut viewport = Viewport::new(1280, 720);
        assert!(viewport.resize(1000, 500));
        assert_eq!(viewport.aspect(), 2.0);
        assert!(!viewport.resize(1000, 500));
    }

    #[test]
    fn test_zero_size_ignored() {
        let mut viewport = Viewport::new(800, 600);
        assert!(!viewport.resize(0, 600));
        assert!(!viewport.resize(800, 0));
        assert_eq!(viewport, Viewport::new(800, 600));
    }

    #[test]
    fn test_new_never_zero() {
        let viewport = Viewport::new(0, 0);
        assert_eq!(viewport.aspect(), 1.0);
    }
}
