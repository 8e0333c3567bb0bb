use super::{Rect, Vec2};

/// Drawable size in physical pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    /// Returns the GUI-to-clip mapping for this viewport.
    ///
    /// Degenerate viewports (minimized windows) map to a 1x1 projection.
    pub fn projection(self) -> Projection {
        let (w, h) = if self.is_valid() { (self.width, self.height) } else { (1.0, 1.0) };
        let short = w.min(h);
        Projection {
            aspect: Vec2::new(short / w, short / h),
            pixel: Vec2::splat(2.0 / short),
        }
    }

    /// Converts a physical-pixel position (top-left origin, +Y down) to GUI units.
    pub fn to_gui(self, x: f32, y: f32) -> Vec2 {
        let proj = self.projection();
        let w = self.width.max(1.0);
        let h = self.height.max(1.0);
        let ndc = Vec2::new(2.0 * x / w - 1.0, 1.0 - 2.0 * y / h);
        ndc / proj.aspect
    }
}

/// Mapping between GUI units and clip space for one frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Projection {
    /// Multiply GUI coordinates by this to obtain clip-space coordinates.
    pub aspect: Vec2,
    /// Size of one device pixel in GUI units; the tolerance for geometry diffs.
    pub pixel: Vec2,
}

impl Projection {
    /// The whole visible area in GUI units.
    pub fn visible(self) -> Rect {
        let half = Vec2::new(1.0 / self.aspect.x, 1.0 / self.aspect.y);
        Rect::from_min_max(-half, half)
    }

    #[inline]
    pub fn to_clip(self, p: Vec2) -> Vec2 {
        p * self.aspect
    }
}

impl Default for Projection {
    fn default() -> Self {
        Viewport::new(1.0, 1.0).projection()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn square_viewport_has_unit_aspect() {
        let p = Viewport::new(400.0, 400.0).projection();
        assert_eq!(p.aspect, Vec2::new(1.0, 1.0));
        assert_relative_eq!(p.pixel.x, 2.0 / 400.0);
    }

    #[test]
    fn wide_viewport_extends_x() {
        let p = Viewport::new(800.0, 400.0).projection();
        assert_relative_eq!(p.aspect.x, 0.5);
        assert_relative_eq!(p.aspect.y, 1.0);
        assert_eq!(p.visible(), Rect::new(-2.0, -1.0, 4.0, 2.0));
    }

    #[test]
    fn to_gui_maps_corners_and_center() {
        let vp = Viewport::new(800.0, 400.0);
        let c = vp.to_gui(400.0, 200.0);
        assert_relative_eq!(c.x, 0.0);
        assert_relative_eq!(c.y, 0.0);

        let tl = vp.to_gui(0.0, 0.0);
        assert_relative_eq!(tl.x, -2.0);
        assert_relative_eq!(tl.y, 1.0);
    }

    #[test]
    fn degenerate_viewport_falls_back() {
        let p = Viewport::new(0.0, 300.0).projection();
        assert_eq!(p.aspect, Vec2::new(1.0, 1.0));
    }
}
