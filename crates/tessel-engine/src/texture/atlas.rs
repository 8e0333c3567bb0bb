use std::collections::HashMap;
use std::hash::Hash;

use super::{AtlasImage, AtlasRegion, PixelFormat, ShelfPacker, TextureId, UvRect};

/// Failure while packing images into an atlas.
#[derive(Debug, thiserror::Error)]
pub enum AtlasError {
    #[error("atlas of {width}x{height} cannot fit a {w}x{h} block")]
    Full { width: u32, height: u32, w: u32, h: u32 },
    #[error("atlas image format {found:?} does not match {expected:?}")]
    FormatMismatch { expected: PixelFormat, found: PixelFormat },
}

/// Collects same-format images and packs them into one texture.
pub struct AtlasBuilder<K> {
    width: u32,
    height: u32,
    padding: u32,
    format: PixelFormat,
    entries: Vec<(K, AtlasImage)>,
}

impl<K: Eq + Hash> AtlasBuilder<K> {
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        Self { width, height, padding: 1, format, entries: Vec::new() }
    }

    pub fn with_padding(mut self, padding: u32) -> Self {
        self.padding = padding;
        self
    }

    pub fn add(&mut self, key: K, image: AtlasImage) -> Result<(), AtlasError> {
        if image.format != self.format {
            return Err(AtlasError::FormatMismatch { expected: self.format, found: image.format });
        }
        self.entries.push((key, image));
        Ok(())
    }

    /// Packs tallest-first to keep shelves tight.
    pub fn build(mut self) -> Result<PackedAtlas<K>, AtlasError> {
        self.entries.sort_by(|a, b| b.1.height.cmp(&a.1.height));

        let mut packer = ShelfPacker::new(self.width, self.height, self.padding);
        let mut image = AtlasImage::new(self.width, self.height, self.format);
        let mut uvs = HashMap::with_capacity(self.entries.len());

        for (key, src) in self.entries {
            let (x, y) = packer.place(src.width, src.height).ok_or(AtlasError::Full {
                width: self.width,
                height: self.height,
                w: src.width,
                h: src.height,
            })?;
            image.blit(&src, x, y);
            uvs.insert(key, UvRect::from_pixels(x, y, src.width, src.height, self.width, self.height));
        }

        log::debug!("packed {} images into a {}x{} atlas", uvs.len(), self.width, self.height);
        Ok(PackedAtlas { image, uvs })
    }
}

/// Result of [`AtlasBuilder::build`]: the texels plus one UV quad per key.
#[derive(Debug, Clone)]
pub struct PackedAtlas<K> {
    pub image: AtlasImage,
    pub uvs: HashMap<K, UvRect>,
}

impl<K: Eq + Hash + Clone> PackedAtlas<K> {
    /// Binds every UV quad to the texture the image was registered as.
    pub fn regions(&self, texture: TextureId) -> HashMap<K, AtlasRegion> {
        let has_alpha = self.image.has_alpha();
        self.uvs
            .iter()
            .map(|(k, uv)| (k.clone(), AtlasRegion { uv: *uv, texture, has_alpha }))
            .collect()
    }
}
