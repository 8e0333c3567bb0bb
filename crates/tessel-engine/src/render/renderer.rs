use crate::scene::{DiffState, DrawList, Program};
use crate::texture::{AtlasImage, TextureId};

use super::buffers::{BufferKind, WgpuBuffers};
use super::compositor::Compositor;
use super::pipeline::{Pipelines, ProgramKind};
use super::textures::TextureRegistry;
use super::{RenderCtx, RenderTarget};

/// Renderer tuning.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Distinct depth values available to draw calls; also the per-frame call limit.
    ///
    /// At most [`MAX_DEPTH_LEVELS`](super::MAX_DEPTH_LEVELS), which keeps every level exact in half precision.
    pub depth_levels: usize,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self { depth_levels: 1000 }
    }
}

/// Draws a [`DrawList`] with one indexed draw per batch.
///
/// Opaque batches are drawn first with blending disabled, relying on the
/// depth test; ordered batches follow with premultiplied-alpha blending.
#[derive(Default)]
pub struct UiRenderer {
    compositor: Compositor,
    buffers: WgpuBuffers,
    pipelines: Pipelines,
    textures: TextureRegistry,
}

impl UiRenderer {
    /// # Panics
    /// If `config.depth_levels` is zero or above the supported maximum.
    pub fn new(config: RendererConfig) -> Self {
        Self {
            compositor: Compositor::new(config.depth_levels),
            ..Self::default()
        }
    }

    /// Registers an atlas image; it is uploaded before the next render.
    pub fn add_texture(&mut self, image: AtlasImage) -> TextureId {
        self.textures.add(image)
    }

    /// Replaces the pixels of a registered texture.
    ///
    /// Returns `false` for an id this renderer never handed out.
    pub fn replace_texture(&mut self, id: TextureId, image: AtlasImage) -> bool {
        self.textures.replace(id, image)
    }

    #[inline]
    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    /// Applies `list`'s changes, uploads dirty buffers and records the UI pass.
    ///
    /// Returns the buffers that changed this frame.
    pub fn render(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>, list: &mut DrawList) -> DiffState {
        let changed = self.compositor.prepare(list);
        self.compositor.flush(&mut self.buffers.uploader(ctx.device, ctx.queue));

        let draws = self.compositor.draws();
        if draws.is_empty() {
            return changed;
        }

        self.pipelines.ensure_layout(ctx);
        for d in draws {
            self.pipelines.ensure(ctx, d.program.into(), d.ordered);
        }
        if let Some(layout) = self.pipelines.texture_layout() {
            self.textures.ensure_uploaded(ctx, layout);
        }

        let Some(index) = self.buffers.get(BufferKind::Index) else { return changed };
        let Some(xyzw) = self.buffers.get(BufferKind::Position) else { return changed };
        let Some(rgba) = self.buffers.get(BufferKind::Color) else { return changed };
        let Some(uv) = self.buffers.get(BufferKind::TexCoord) else { return changed };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("tessel ui pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: target.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_index_buffer(index.slice(..), wgpu::IndexFormat::Uint16);
        rpass.set_vertex_buffer(0, xyzw.slice(..));
        rpass.set_vertex_buffer(1, rgba.slice(..));
        rpass.set_vertex_buffer(2, uv.slice(..));

        for d in draws {
            if d.indices.is_empty() {
                continue;
            }
            let Some(pipeline) = self.pipelines.get(ProgramKind::from(d.program), d.ordered) else { continue };

            match d.program {
                Program::Flat => {}
                Program::Sprite(tex) | Program::Text(tex) => {
                    let Some(bind_group) = self.textures.bind_group(tex) else {
                        log::warn!("ui renderer: batch uses unknown texture {tex:?}, skipped");
                        continue;
                    };
                    rpass.set_bind_group(0, bind_group, &[]);
                }
            }

            rpass.set_pipeline(pipeline);
            rpass.draw_indexed(d.indices.clone(), 0, 0..1);
        }

        changed
    }
}
