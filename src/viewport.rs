// Device pixel ratios above this are clamped to keep the surface size bounded
// on very dense displays.
pub const MAX_PIXEL_RATIO: f64 = 2.0;

// Logical size of the output surface plus the pixel ratio it is rendered at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f64,
}

impl Viewport {
    pub fn new(width: u32, height: u32, device_pixel_ratio: f64) -> Self {
        Viewport {
            width,
            height,
            pixel_ratio: clamp_pixel_ratio(device_pixel_ratio),
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    // Size of the surface in physical pixels.
    pub fn drawable_size(&self) -> (u32, u32) {
        (
            ((self.width as f64 * self.pixel_ratio).round() as u32).max(1),
            ((self.height as f64 * self.pixel_ratio).round() as u32).max(1),
        )
    }

    // Returns whether anything changed.
    pub fn resize(&mut self, width: u32, height: u32, device_pixel_ratio: f64) -> bool {
        let next = Viewport::new(width, height, device_pixel_ratio);
        if next == *self {
            return false;
        }
        *self = next;
        true
    }
}

pub fn clamp_pixel_ratio(device_pixel_ratio: f64) -> f64 {
    if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
        device_pixel_ratio.min(MAX_PIXEL_RATIO)
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_pixel_ratio() {
        assert_eq!(clamp_pixel_ratio(1.0), 1.0);
        assert_eq!(clamp_pixel_ratio(1.5), 1.5);
        assert_eq!(clamp_pixel_ratio(3.0), 2.0);
        assert_eq!(clamp_pixel_ratio(f64::NAN), 1.0);
        assert_eq!(clamp_pixel_ratio(0.0), 1.0);
    }

    #[test]
    fn drawable_size() {
        let viewport = Viewport::new(800, 600, 3.0);
        assert_eq!(viewport.drawable_size(), (1600, 1200));
        let viewport = Viewport::new(800, 600, 1.0);
        assert_eq!(viewport.drawable_size(), (800, 600));
    }

    #[test]
    fn resize_reports_changes() {
        let mut viewport = Viewport::new(640, 360, 1.0);
        assert!(viewport.resize(800, 600, 1.0));
        assert!((viewport.aspect() - 800.0 / 600.0).abs() < 1e-6);
        assert!(!viewport.resize(800, 600, 1.0));
        // 2.5 and 3.0 both clamp to 2.0.
        assert!(viewport.resize(800, 600, 2.5));
        assert!(!viewport.resize(800, 600, 3.0));
    }
}
