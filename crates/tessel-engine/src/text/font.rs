use std::collections::HashMap;

use crate::coords::Vec2;
use crate::texture::{TextureId, UvRect};

/// Layout and atlas data for one codepoint.
///
/// Metrics are in font raster units relative to the pen position on the
/// baseline (+Y up). The quad includes any SDF padding.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Glyph {
    /// No visible quad (whitespace); still advances the pen.
    pub empty: bool,
    pub advance: f32,
    pub x1: f32,
    pub x2: f32,
    pub y1: f32,
    pub y2: f32,
    pub uv: UvRect,
}

/// Immutable glyph table bound to one atlas texture.
#[derive(Debug, Clone)]
pub struct Font {
    topline: f32,
    bottomline: f32,
    texture: TextureId,
    glyphs: HashMap<char, Glyph>,
    kerning: HashMap<(char, char), f32>,
}

impl Font {
    /// `topline` and `bottomline` bound a line box (ascent and descent, in raster units).
    pub fn new(topline: f32, bottomline: f32, texture: TextureId) -> Self {
        Self {
            topline,
            bottomline,
            texture,
            glyphs: HashMap::new(),
            kerning: HashMap::new(),
        }
    }

    pub fn insert_glyph(&mut self, c: char, glyph: Glyph) {
        self.glyphs.insert(c, glyph);
    }

    pub fn set_kerning(&mut self, left: char, right: char, amount: f32) {
        if amount == 0.0 {
            self.kerning.remove(&(left, right));
        } else {
            self.kerning.insert((left, right), amount);
        }
    }

    #[inline]
    pub fn texture(&self) -> TextureId {
        self.texture
    }

    #[inline]
    pub fn topline(&self) -> f32 {
        self.topline
    }

    #[inline]
    pub fn bottomline(&self) -> f32 {
        self.bottomline
    }

    /// Whether `c` has an entry in the glyph table.
    #[inline]
    pub fn contains(&self, c: char) -> bool {
        self.glyphs.contains_key(&c)
    }

    /// Whether every codepoint of `text` has an entry.
    pub fn supports(&self, text: &str) -> bool {
        text.chars().all(|c| self.contains(c))
    }

    /// Glyph data for `c`.
    ///
    /// # Panics
    /// If `c` is missing; callers check [`Font::contains`] for untrusted input.
    pub fn glyph(&self, c: char) -> &Glyph {
        self.glyphs
            .get(&c)
            .unwrap_or_else(|| panic!("font has no glyph for {c:?} (U+{:04X})", c as u32))
    }

    /// Kerning adjustment between `left` and `right`; zero for the first glyph.
    #[inline]
    pub fn kerning(&self, left: Option<char>, right: char) -> f32 {
        left.and_then(|l| self.kerning.get(&(l, right)).copied()).unwrap_or(0.0)
    }

    /// Factor turning raster units into GUI units for a line of height `scale`.
    #[inline]
    pub fn unit_scale(&self, scale: f32) -> f32 {
        scale / (self.topline - self.bottomline)
    }

    /// Number of quads `text` produces.
    pub fn quad_count(&self, text: &str) -> usize {
        text.chars().filter(|&c| !self.glyph(c).empty).count()
    }

    /// Size of `text` drawn at line height `scale`, plus how many glyphs fit.
    ///
    /// Without limits the count covers visible glyphs only. With `max_width`
    /// (GUI units) or `max_glyphs`, layout stops before the first glyph that
    /// would exceed either limit and whitespace counts too, which makes the
    /// result usable as a caret index.
    pub fn measure(
        &self,
        text: &str,
        scale: f32,
        max_width: Option<f32>,
        max_glyphs: Option<usize>,
    ) -> (Vec2, usize) {
        let Some(first) = text.chars().next() else {
            return (Vec2::zero(), 0);
        };

        let with_empty = max_width.is_some() || max_glyphs.is_some();
        let s = self.unit_scale(scale);
        let mut w = -self.glyph(first).x1;
        let mut count = 0usize;
        let mut last = None;

        for c in text.chars() {
            let g = self.glyph(c);
            let a = g.advance + self.kerning(last, c);

            if max_width.is_some_and(|mw| (w + a) * s > mw)
                || max_glyphs.is_some_and(|mg| count >= mg)
            {
                break;
            }

            if !g.empty || with_empty {
                count += 1;
            }
            w += a;
            last = Some(c);
        }

        if let Some(c) = last {
            let g = self.glyph(c);
            if !g.empty {
                w += g.x2 - g.advance;
            }
        }

        (Vec2::new(w * s, scale), count)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Unit-height font: `a` is a 1x1 box advancing 1, space advances 0.5,
    /// and `aa` kerns by -0.25.
    pub(crate) fn unit_font(texture: TextureId) -> Font {
        let mut f = Font::new(1.0, 0.0, texture);
        f.insert_glyph(
            'a',
            Glyph {
                empty: false,
                advance: 1.0,
                x1: 0.0,
                x2: 1.0,
                y1: 0.0,
                y2: 1.0,
                uv: UvRect::new(0.0, 0.5, 0.5, 0.0),
            },
        );
        f.insert_glyph(' ', Glyph { empty: true, advance: 0.5, ..Glyph::default() });
        f.set_kerning('a', 'a', -0.25);
        f
    }

    // ── lookup ────────────────────────────────────────────────────────────

    #[test]
    fn contains_and_supports() {
        let f = unit_font(TextureId::from_raw(0));
        assert!(f.contains('a'));
        assert!(!f.contains('b'));
        assert!(f.supports("a a"));
        assert!(!f.supports("ab"));
    }

    #[test]
    #[should_panic(expected = "no glyph")]
    fn missing_glyph_panics() {
        unit_font(TextureId::from_raw(0)).glyph('z');
    }

    #[test]
    fn kerning_ignores_first_glyph() {
        let f = unit_font(TextureId::from_raw(0));
        assert_eq!(f.kerning(None, 'a'), 0.0);
        assert_eq!(f.kerning(Some('a'), 'a'), -0.25);
        assert_eq!(f.kerning(Some(' '), 'a'), 0.0);
    }

    // ── measure ───────────────────────────────────────────────────────────

    #[test]
    fn measure_applies_kerning() {
        let f = unit_font(TextureId::from_raw(0));
        let (size, n) = f.measure("aa", 1.0, None, None);
        assert_relative_eq!(size.x, 1.75);
        assert_relative_eq!(size.y, 1.0);
        assert_eq!(n, 2);
    }

    #[test]
    fn measure_skips_whitespace_in_count() {
        let f = unit_font(TextureId::from_raw(0));
        let (size, n) = f.measure("a a", 2.0, None, None);
        assert_relative_eq!(size.x, 5.0);
        assert_eq!(n, 2);
        assert_eq!(f.quad_count("a a"), 2);
    }

    #[test]
    fn measure_stops_at_max_width() {
        let f = unit_font(TextureId::from_raw(0));
        let (size, n) = f.measure("aaa", 1.0, Some(1.5), None);
        assert_relative_eq!(size.x, 1.0);
        assert_eq!(n, 1);
    }

    #[test]
    fn measure_stops_at_max_glyphs_counting_whitespace() {
        let f = unit_font(TextureId::from_raw(0));
        let (size, n) = f.measure("a a", 1.0, None, Some(2));
        assert_relative_eq!(size.x, 1.5);
        assert_eq!(n, 2);
    }

    #[test]
    fn measure_empty_text() {
        let f = unit_font(TextureId::from_raw(0));
        assert_eq!(f.measure("", 1.0, None, None), (Vec2::zero(), 0));
    }
}
