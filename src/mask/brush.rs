use image::{Rgba, RgbaImage};

pub const BRUSH_MIN: u32 = 10;
pub const BRUSH_MAX: u32 = 100;

/// Marker color for painted mask pixels. Kept semi-transparent so the photo
/// stays visible underneath and the flattened composite reads as an annotation
/// rather than an occlusion.
pub const MASK_COLOR: Rgba<u8> = Rgba([244, 67, 54, 140]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrushMode {
    Paint,
    Erase,
}

#[derive(Debug, Clone, Copy)]
pub struct Brush {
    size_px: u32,
    pub mode: BrushMode,
}

impl Brush {
    pub fn new(size_px: u32, mode: BrushMode) -> Self {
        Self {
            size_px: size_px.clamp(BRUSH_MIN, BRUSH_MAX),
            mode,
        }
    }

    pub fn size(&self) -> u32 {
        self.size_px
    }

    pub fn set_size(&mut self, size_px: u32) {
        self.size_px = size_px.clamp(BRUSH_MIN, BRUSH_MAX);
    }

    fn radius(&self) -> f32 {
        self.size_px as f32 / 2.0
    }

    /// Stamps a dab at a single point in overlay (native-resolution) space.
    pub fn stamp(&self, overlay: &mut RgbaImage, center: (f32, f32)) {
        let r = self.radius();
        let (w, h) = overlay.dimensions();
        let x_lo = (center.0 - r).floor().max(0.0) as u32;
        let y_lo = (center.1 - r).floor().max(0.0) as u32;
        let x_hi = ((center.0 + r).ceil() as i64).clamp(0, w as i64) as u32;
        let y_hi = ((center.1 + r).ceil() as i64).clamp(0, h as i64) as u32;

        for y in y_lo..y_hi {
            for x in x_lo..x_hi {
                let dx = x as f32 + 0.5 - center.0;
                let dy = y as f32 + 0.5 - center.1;
                if dx * dx + dy * dy > r * r {
                    continue;
                }
                let px = overlay.get_pixel_mut(x, y);
                *px = match self.mode {
                    // The path is rendered once per stroke in the browser
                    // original, so repeated coverage must not deepen the tint:
                    // painted pixels are set to the marker color, not blended.
                    BrushMode::Paint => MASK_COLOR,
                    // Clears only overlay pixels; the photo lives in a
                    // separate buffer and cannot be touched from here.
                    BrushMode::Erase => Rgba([0, 0, 0, 0]),
                };
            }
        }
    }

    /// Stamps dabs along a segment, close enough together that the result has
    /// round caps and round joins at the brush radius.
    pub fn stamp_segment(&self, overlay: &mut RgbaImage, from: (f32, f32), to: (f32, f32)) {
        let dx = to.0 - from.0;
        let dy = to.1 - from.1;
        let dist = (dx * dx + dy * dy).sqrt();
        let spacing = (self.radius() / 2.0).max(0.5);
        let steps = (dist / spacing).ceil().max(1.0) as u32;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            self.stamp(overlay, (from.0 + dx * t, from.1 + dy * t));
        }
    }
}

impl Default for Brush {
    fn default() -> Self {
        Self::new(40, BrushMode::Paint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_is_clamped_to_valid_range() {
        assert_eq!(Brush::new(3, BrushMode::Paint).size(), BRUSH_MIN);
        assert_eq!(Brush::new(500, BrushMode::Paint).size(), BRUSH_MAX);
        let mut b = Brush::default();
        b.set_size(0);
        assert_eq!(b.size(), BRUSH_MIN);
    }

    #[test]
    fn paint_stamp_marks_pixels_within_radius() {
        let mut overlay = RgbaImage::new(60, 60);
        let brush = Brush::new(20, BrushMode::Paint);
        brush.stamp(&mut overlay, (30.0, 30.0));

        assert_eq!(overlay.get_pixel(30, 30), &MASK_COLOR);
        // A pixel well outside the 10px radius stays transparent.
        assert_eq!(overlay.get_pixel(30, 45), &Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn erase_clears_painted_pixels() {
        let mut overlay = RgbaImage::new(40, 40);
        Brush::new(20, BrushMode::Paint).stamp(&mut overlay, (20.0, 20.0));
        Brush::new(30, BrushMode::Erase).stamp(&mut overlay, (20.0, 20.0));
        assert!(overlay.pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn segment_covers_both_endpoints() {
        let mut overlay = RgbaImage::new(100, 40);
        let brush = Brush::new(10, BrushMode::Paint);
        brush.stamp_segment(&mut overlay, (10.0, 20.0), (90.0, 20.0));
        assert_eq!(overlay.get_pixel(10, 20), &MASK_COLOR);
        assert_eq!(overlay.get_pixel(50, 20), &MASK_COLOR);
        assert_eq!(overlay.get_pixel(90, 20), &MASK_COLOR);
    }

    #[test]
    fn repeated_paint_does_not_deepen_tint() {
        let mut overlay = RgbaImage::new(40, 40);
        let brush = Brush::new(20, BrushMode::Paint);
        brush.stamp(&mut overlay, (20.0, 20.0));
        brush.stamp(&mut overlay, (20.0, 20.0));
        assert_eq!(overlay.get_pixel(20, 20), &MASK_COLOR);
    }
}
