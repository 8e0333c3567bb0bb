//! Render pipelines for the three UI programs.

use std::collections::HashMap;

use crate::scene::Program;

use super::RenderCtx;

// ── blend ─────────────────────────────────────────────────────────────────

fn premul_alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

// ── vertex streams ────────────────────────────────────────────────────────

const POSITION_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float16x4];
const COLOR_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Unorm8x4];
const UV_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![2 => Float16x2];

/// One buffer per stream, matching the shared mirrors.
fn vertex_layouts() -> [wgpu::VertexBufferLayout<'static>; 3] {
    [
        wgpu::VertexBufferLayout {
            array_stride: 8,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &POSITION_ATTRS,
        },
        wgpu::VertexBufferLayout {
            array_stride: 4,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &COLOR_ATTRS,
        },
        wgpu::VertexBufferLayout {
            array_stride: 4,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &UV_ATTRS,
        },
    ]
}

// ── pipelines ─────────────────────────────────────────────────────────────

/// Program without its texture binding; pipelines are shared per kind.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub(crate) enum ProgramKind {
    Flat,
    Sprite,
    Text,
}

impl From<Program> for ProgramKind {
    fn from(p: Program) -> Self {
        match p {
            Program::Flat => ProgramKind::Flat,
            Program::Sprite(_) => ProgramKind::Sprite,
            Program::Text(_) => ProgramKind::Text,
        }
    }
}

impl ProgramKind {
    fn source(self) -> &'static str {
        match self {
            ProgramKind::Flat => include_str!("shaders/rect.wgsl"),
            ProgramKind::Sprite => include_str!("shaders/sprite.wgsl"),
            ProgramKind::Text => include_str!("shaders/text.wgsl"),
        }
    }

    fn textured(self) -> bool {
        !matches!(self, ProgramKind::Flat)
    }
}

/// Lazily built pipelines keyed by program kind and blending.
///
/// Rebuilt when the surface or depth format changes.
#[derive(Default)]
pub(crate) struct Pipelines {
    formats: Option<(wgpu::TextureFormat, wgpu::TextureFormat)>,
    texture_layout: Option<wgpu::BindGroupLayout>,
    pipelines: HashMap<(ProgramKind, bool), wgpu::RenderPipeline>,
}

impl Pipelines {
    pub(crate) fn texture_layout(&self) -> Option<&wgpu::BindGroupLayout> {
        self.texture_layout.as_ref()
    }

    pub(crate) fn get(&self, kind: ProgramKind, blended: bool) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(&(kind, blended))
    }

    pub(crate) fn ensure_layout(&mut self, ctx: &RenderCtx<'_>) {
        if self.texture_layout.is_some() {
            return;
        }

        self.texture_layout = Some(ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tessel texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        }));
    }

    pub(crate) fn ensure(&mut self, ctx: &RenderCtx<'_>, kind: ProgramKind, blended: bool) {
        let formats = (ctx.surface_format, ctx.depth_format);
        if self.formats != Some(formats) {
            if self.formats.is_some() {
                log::debug!("ui pipelines: target formats changed to {formats:?}, rebuilding");
            }
            self.pipelines.clear();
            self.formats = Some(formats);
        }
        if self.pipelines.contains_key(&(kind, blended)) {
            return;
        }

        self.ensure_layout(ctx);
        let Some(texture_layout) = self.texture_layout.as_ref() else { return };

        log::debug!("ui pipelines: creating {kind:?} (blended: {blended})");

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("tessel ui shader"),
            source: wgpu::ShaderSource::Wgsl(kind.source().into()),
        });

        let textured = [texture_layout];
        let bind_group_layouts: &[&wgpu::BindGroupLayout] = if kind.textured() { &textured } else { &[] };

        let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("tessel ui pipeline layout"),
            bind_group_layouts,
            immediate_size: 0,
        });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("tessel ui pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &vertex_layouts(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: blended.then(premul_alpha_blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Opaque batches are stored reversed, which flips their winding.
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: ctx.depth_format,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        self.pipelines.insert((kind, blended), pipeline);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::TextureId;

    #[test]
    fn textured_programs_share_a_kind() {
        assert_eq!(ProgramKind::from(Program::Sprite(TextureId::from_raw(3))), ProgramKind::Sprite);
        assert_eq!(ProgramKind::from(Program::Text(TextureId::from_raw(3))), ProgramKind::Text);
        assert!(!ProgramKind::Flat.textured());
    }

    #[test]
    fn vertex_strides_match_mirrors() {
        use crate::scene::mesh::{RGBA_DIM, UV_DIM, XYZW_DIM};
        let [pos, color, uv] = vertex_layouts();
        assert_eq!(pos.array_stride as usize, XYZW_DIM * 2);
        assert_eq!(color.array_stride as usize, RGBA_DIM);
        assert_eq!(uv.array_stride as usize, UV_DIM * 2);
    }
}
