/// Linear premultiplied RGBA color.
///
/// Invariant:
/// - `rgb` components are expected to be multiplied by `a` (premultiplied alpha).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Color {
    pub r: f32, // premultiplied
    pub g: f32, // premultiplied
    pub b: f32, // premultiplied
    pub a: f32,
}

/// Alpha at or above this is treated as fully opaque.
pub const OPAQUE_ALPHA: f32 = 0.996;

/// Per-channel tolerance for color diffs (one 8-bit step).
pub const COLOR_TOLERANCE: f32 = 1.0 / 256.0;

impl Color {
    pub const WHITE: Color = Color::from_premul(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::from_premul(0.0, 0.0, 0.0, 1.0);

    #[inline]
    pub const fn transparent() -> Self {
        Self { r: 0.0, g: 0.0, b: 0.0, a: 0.0 }
    }

    /// Creates a premultiplied color from straight sRGB bytes (`0`–`255`).
    #[inline]
    pub fn from_srgb_u8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::from_straight(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, a as f32 / 255.0)
    }

    /// Creates a premultiplied color from premultiplied components.
    #[inline]
    pub const fn from_premul(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates a premultiplied color from straight alpha components.
    #[inline]
    pub fn from_straight(r: f32, g: f32, b: f32, a: f32) -> Self {
        let a = a.clamp(0.0, 1.0);
        Self {
            r: (r.clamp(0.0, 1.0)) * a,
            g: (g.clamp(0.0, 1.0)) * a,
            b: (b.clamp(0.0, 1.0)) * a,
            a,
        }
    }

    /// Returns the same hue with alpha scaled by `factor`.
    #[inline]
    pub fn with_alpha_scaled(self, factor: f32) -> Self {
        let f = factor.clamp(0.0, 1.0);
        Self { r: self.r * f, g: self.g * f, b: self.b * f, a: self.a * f }
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }

    /// Opaque colors can be drawn in any order relative to their neighbors.
    #[inline]
    pub fn is_opaque(self) -> bool {
        self.a >= OPAQUE_ALPHA
    }

    /// Channel-wise equality within [`COLOR_TOLERANCE`].
    #[inline]
    pub fn approx_eq(self, other: Color) -> bool {
        (self.r - other.r).abs() <= COLOR_TOLERANCE
            && (self.g - other.g).abs() <= COLOR_TOLERANCE
            && (self.b - other.b).abs() <= COLOR_TOLERANCE
            && (self.a - other.a).abs() <= COLOR_TOLERANCE
    }

    /// Packs the color into normalized bytes for the color vertex stream.
    #[inline]
    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_straight_premultiplies() {
        let c = Color::from_straight(1.0, 0.5, 0.0, 0.5);
        assert_eq!(c, Color::from_premul(0.5, 0.25, 0.0, 0.5));
    }

    #[test]
    fn opacity_threshold() {
        assert!(Color::WHITE.is_opaque());
        assert!(Color::from_straight(1.0, 1.0, 1.0, 0.997).is_opaque());
        assert!(!Color::from_straight(1.0, 1.0, 1.0, 0.99).is_opaque());
    }

    #[test]
    fn approx_eq_tolerates_sub_step_noise() {
        let a = Color::from_premul(0.5, 0.5, 0.5, 1.0);
        let b = Color::from_premul(0.502, 0.499, 0.5, 1.0);
        assert!(a.approx_eq(b));
        assert!(!a.approx_eq(Color::from_premul(0.51, 0.5, 0.5, 1.0)));
    }

    #[test]
    fn to_rgba8_rounds_and_clamps() {
        assert_eq!(Color::WHITE.to_rgba8(), [255, 255, 255, 255]);
        assert_eq!(Color::from_premul(0.5, -1.0, 2.0, 0.0).to_rgba8(), [128, 0, 255, 0]);
    }
}
