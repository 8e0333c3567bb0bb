//! Texture registry: CPU images handed out as [`TextureId`]s, uploaded lazily.

use crate::texture::{AtlasImage, TextureId};

use super::RenderCtx;

struct Entry {
    /// Pixels waiting for upload; dropped once on the GPU.
    pending: Option<AtlasImage>,
    bind_group: Option<wgpu::BindGroup>,
    _texture: Option<wgpu::Texture>,
}

#[derive(Default)]
pub(crate) struct TextureRegistry {
    entries: Vec<Entry>,
    sampler: Option<wgpu::Sampler>,
}

impl TextureRegistry {
    pub(crate) fn add(&mut self, image: AtlasImage) -> TextureId {
        let id = TextureId(self.entries.len() as u32);
        self.entries.push(Entry { pending: Some(image), bind_group: None, _texture: None });
        id
    }

    /// Replaces the pixels behind `id`; the next frame re-uploads them.
    pub(crate) fn replace(&mut self, id: TextureId, image: AtlasImage) -> bool {
        let Some(entry) = self.entries.get_mut(id.0 as usize) else { return false };
        entry.pending = Some(image);
        true
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn bind_group(&self, id: TextureId) -> Option<&wgpu::BindGroup> {
        self.entries.get(id.0 as usize)?.bind_group.as_ref()
    }

    /// Uploads every pending image.
    pub(crate) fn ensure_uploaded(&mut self, ctx: &RenderCtx<'_>, layout: &wgpu::BindGroupLayout) {
        if self.entries.iter().all(|e| e.pending.is_none()) {
            return;
        }
        self.ensure_sampler(ctx);
        let Some(sampler) = self.sampler.as_ref() else { return };

        for (i, entry) in self.entries.iter_mut().enumerate() {
            let Some(image) = entry.pending.take() else { continue };
            log::debug!(
                "ui textures: uploading #{i} ({}x{} {:?})",
                image.width,
                image.height,
                image.format
            );

            let size = wgpu::Extent3d {
                width: image.width.max(1),
                height: image.height.max(1),
                depth_or_array_layers: 1,
            };
            let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
                label: Some("tessel ui texture"),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: image.format.wgpu_format(),
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            });

            if image.width > 0 && image.height > 0 {
                ctx.queue.write_texture(
                    wgpu::TexelCopyTextureInfo {
                        texture: &texture,
                        mip_level: 0,
                        origin: wgpu::Origin3d::ZERO,
                        aspect: wgpu::TextureAspect::All,
                    },
                    &image.pixels,
                    wgpu::TexelCopyBufferLayout {
                        offset: 0,
                        bytes_per_row: Some(image.bytes_per_row()),
                        rows_per_image: Some(image.height),
                    },
                    size,
                );
            }

            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            entry.bind_group = Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("tessel ui texture bind group"),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                ],
            }));
            entry._texture = Some(texture);
        }
    }

    fn ensure_sampler(&mut self, ctx: &RenderCtx<'_>) {
        if self.sampler.is_some() {
            return;
        }
        self.sampler = Some(ctx.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("tessel ui sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        }));
    }
}
