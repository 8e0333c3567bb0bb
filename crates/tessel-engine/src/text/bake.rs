use std::collections::HashMap;

use crate::texture::{AtlasImage, PixelFormat, ShelfPacker, TextureId, UvRect};

use super::{Font, FontError, Glyph};

/// Parameters for baking a font into a signed-distance atlas.
#[derive(Debug, Clone)]
pub struct SdfSettings {
    /// Raster size in pixels per em.
    pub raster_px: f32,
    /// Distance range in pixels encoded on each side of the outline.
    pub spread: u32,
    /// Atlas edge length in pixels.
    pub atlas_size: u32,
    /// Gap between packed glyphs.
    pub padding: u32,
}

impl Default for SdfSettings {
    fn default() -> Self {
        Self {
            raster_px: 48.0,
            spread: 6,
            atlas_size: 1024,
            padding: 1,
        }
    }
}

/// Output of [`bake_font`]: the R8 distance atlas plus the glyph table.
///
/// Register `image` with the renderer, then bind the returned id with
/// [`BakedFont::into_font`].
#[derive(Debug, Clone)]
pub struct BakedFont {
    pub image: AtlasImage,
    topline: f32,
    bottomline: f32,
    glyphs: HashMap<char, Glyph>,
    kerning: Vec<(char, char, f32)>,
}

impl BakedFont {
    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    pub fn into_font(self, texture: TextureId) -> Font {
        let mut font = Font::new(self.topline, self.bottomline, texture);
        for (c, g) in self.glyphs {
            font.insert_glyph(c, g);
        }
        for (l, r, k) in self.kerning {
            font.set_kerning(l, r, k);
        }
        font
    }
}

/// Rasterizes every codepoint of `charset` with fontdue, converts coverage to
/// signed distance and packs the result into one atlas.
///
/// Codepoints the font does not map are skipped (check [`Font::contains`]).
pub fn bake_font(
    bytes: &[u8],
    charset: impl IntoIterator<Item = char>,
    settings: &SdfSettings,
) -> Result<BakedFont, FontError> {
    let px = settings.raster_px;
    let font = fontdue::Font::from_bytes(
        bytes,
        fontdue::FontSettings { scale: px, ..fontdue::FontSettings::default() },
    )
    .map_err(|e| FontError::Parse(e.to_string()))?;

    let line = font.horizontal_line_metrics(px).ok_or(FontError::MissingLineMetrics)?;

    let mut chars: Vec<char> = charset
        .into_iter()
        .filter(|&c| c == ' ' || font.lookup_glyph_index(c) != 0)
        .collect();
    chars.sort_unstable();
    chars.dedup();
    if chars.is_empty() {
        return Err(FontError::EmptyCharset);
    }

    let spread = settings.spread;
    let mut rasters = Vec::with_capacity(chars.len());
    for &c in &chars {
        let (metrics, coverage) = font.rasterize(c, px);
        let distance = (metrics.width > 0 && metrics.height > 0)
            .then(|| signed_distance(&coverage, metrics.width as u32, metrics.height as u32, spread));
        rasters.push((c, metrics, distance));
    }

    // Tallest first keeps shelves tight.
    rasters.sort_by(|a, b| b.1.height.cmp(&a.1.height));

    let size = settings.atlas_size;
    let mut packer = ShelfPacker::new(size, size, settings.padding);
    let mut image = AtlasImage::new(size, size, PixelFormat::R8);
    let mut glyphs = HashMap::with_capacity(rasters.len());

    for (c, m, distance) in rasters {
        let s = spread as f32;
        let mut glyph = Glyph {
            empty: distance.is_none(),
            advance: m.advance_width,
            x1: m.xmin as f32 - s,
            x2: m.xmin as f32 + m.width as f32 + s,
            y1: m.ymin as f32 - s,
            y2: m.ymin as f32 + m.height as f32 + s,
            uv: UvRect::default(),
        };

        if let Some(sdf) = distance {
            let (x, y) = packer.place(sdf.width, sdf.height).ok_or(
                crate::texture::AtlasError::Full { width: size, height: size, w: sdf.width, h: sdf.height },
            )?;
            image.blit(&sdf, x, y);
            glyph.uv = UvRect::from_pixels(x, y, sdf.width, sdf.height, size, size);
        }

        glyphs.insert(c, glyph);
    }

    let mut kerning = Vec::new();
    for &l in &chars {
        for &r in &chars {
            if let Some(k) = font.horizontal_kern(l, r, px) {
                if k != 0.0 {
                    kerning.push((l, r, k));
                }
            }
        }
    }

    log::debug!(
        "baked {} glyphs ({} kerning pairs) into a {size}x{size} SDF atlas",
        glyphs.len(),
        kerning.len()
    );

    Ok(BakedFont {
        image,
        topline: line.ascent,
        bottomline: line.descent,
        glyphs,
        kerning,
    })
}

/// Converts an 8-bit coverage bitmap into a distance field padded by `spread`.
///
/// 0.5 (128) lies on the outline; values rise inside and fall outside, reaching
/// the ends of the range at `spread` pixels.
fn signed_distance(coverage: &[u8], w: u32, h: u32, spread: u32) -> AtlasImage {
    let s = spread as i32;
    let (w, h) = (w as i32, h as i32);
    let inside = |x: i32, y: i32| -> bool {
        x >= 0 && y >= 0 && x < w && y < h && coverage[(y * w + x) as usize] >= 128
    };

    let out_w = w + 2 * s;
    let out_h = h + 2 * s;
    let mut out = AtlasImage::new(out_w as u32, out_h as u32, PixelFormat::R8);
    let range = spread.max(1) as f32;

    for oy in 0..out_h {
        for ox in 0..out_w {
            let (px, py) = (ox - s, oy - s);
            let here = inside(px, py);
            let mut best = range;

            for dy in -s..=s {
                for dx in -s..=s {
                    if inside(px + dx, py + dy) != here {
                        best = best.min(((dx * dx + dy * dy) as f32).sqrt());
                    }
                }
            }

            let signed = if here { best } else { -best };
            let v = (0.5 + signed / (2.0 * range)).clamp(0.0, 1.0);
            out.pixels[(oy * out_w + ox) as usize] = (v * 255.0).round() as u8;
        }
    }

    out
}
