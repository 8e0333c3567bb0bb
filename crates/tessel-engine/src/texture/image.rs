/// Texel layout of an [`AtlasImage`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PixelFormat {
    /// Single channel; used for SDF glyph atlases.
    R8,
    /// Straight RGBA.
    Rgba8,
}

impl PixelFormat {
    #[inline]
    pub const fn channels(self) -> usize {
        match self {
            PixelFormat::R8 => 1,
            PixelFormat::Rgba8 => 4,
        }
    }

    pub fn wgpu_format(self) -> wgpu::TextureFormat {
        match self {
            PixelFormat::R8 => wgpu::TextureFormat::R8Unorm,
            PixelFormat::Rgba8 => wgpu::TextureFormat::Rgba8Unorm,
        }
    }
}

/// Owned texel buffer, rows top-down.
#[derive(Debug, Clone, PartialEq)]
pub struct AtlasImage {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub pixels: Vec<u8>,
}

impl AtlasImage {
    /// Zero-filled image.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let len = width as usize * height as usize * format.channels();
        Self { width, height, format, pixels: vec![0; len] }
    }

    /// Wraps existing texels; returns `None` if the buffer length does not match.
    pub fn from_pixels(width: u32, height: u32, format: PixelFormat, pixels: Vec<u8>) -> Option<Self> {
        let len = width as usize * height as usize * format.channels();
        (pixels.len() == len).then_some(Self { width, height, format, pixels })
    }

    #[inline]
    pub fn has_alpha(&self) -> bool {
        self.format.channels() > 3
    }

    #[inline]
    pub fn bytes_per_row(&self) -> u32 {
        self.width * self.format.channels() as u32
    }

    /// Copies `src` into this image with its top-left corner at `(x, y)`.
    ///
    /// Both images must share a format and `src` must fit.
    pub fn blit(&mut self, src: &AtlasImage, x: u32, y: u32) {
        assert_eq!(self.format, src.format, "blit between mismatched formats");
        assert!(
            x + src.width <= self.width && y + src.height <= self.height,
            "blit out of bounds"
        );

        let ch = self.format.channels();
        let row = src.width as usize * ch;
        for sy in 0..src.height as usize {
            let s = sy * row;
            let d = ((y as usize + sy) * self.width as usize + x as usize) * ch;
            self.pixels[d..d + row].copy_from_slice(&src.pixels[s..s + row]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_pixels_checks_length() {
        assert!(AtlasImage::from_pixels(2, 2, PixelFormat::R8, vec![0; 4]).is_some());
        assert!(AtlasImage::from_pixels(2, 2, PixelFormat::Rgba8, vec![0; 4]).is_none());
    }

    #[test]
    fn blit_copies_rows() {
        let mut dst = AtlasImage::new(4, 4, PixelFormat::R8);
        let src = AtlasImage::from_pixels(2, 2, PixelFormat::R8, vec![1, 2, 3, 4]).unwrap();
        dst.blit(&src, 1, 2);
        assert_eq!(dst.pixels[2 * 4 + 1], 1);
        assert_eq!(dst.pixels[2 * 4 + 2], 2);
        assert_eq!(dst.pixels[3 * 4 + 1], 3);
        assert_eq!(dst.pixels[3 * 4 + 2], 4);
        assert_eq!(dst.pixels[0], 0);
    }

    #[test]
    fn alpha_follows_channel_count() {
        assert!(AtlasImage::new(1, 1, PixelFormat::Rgba8).has_alpha());
        assert!(!AtlasImage::new(1, 1, PixelFormat::R8).has_alpha());
    }
}
