mod widgets;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};

use tessel_engine::coords::{Rect, Vec2};
use tessel_engine::core::{App, AppControl, FrameCtx};
use tessel_engine::device::GpuInit;
use tessel_engine::input::{Action, InputEvent, Key};
use tessel_engine::interact::{LogicId, Router};
use tessel_engine::logging::{init_logging, LoggingConfig};
use tessel_engine::paint::Color;
use tessel_engine::render::{RendererConfig, UiRenderer};
use tessel_engine::scene::DrawList;
use tessel_engine::text::{bake_font, Font, SdfSettings};
use tessel_engine::texture::{AtlasBuilder, AtlasImage, AtlasRegion, PackedAtlas, PixelFormat, TextureId};
use tessel_engine::window::{CursorIcon, Runtime, RuntimeConfig};

use widgets::Widgets;

const FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

const CARD_COUNT: usize = 6;
const CHECKER_CELL: u32 = 8;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let bytes = FONT_PATHS
        .iter()
        .find_map(|p| std::fs::read(p).ok())
        .context("no usable system font found")?;

    let mut renderer = UiRenderer::new(RendererConfig::default());

    let baked = bake_font(&bytes, (' '..='~').chain("éèàüöäß".chars()), &SdfSettings::default())
        .context("failed to bake font")?;
    log::info!("baked {} glyphs", baked.glyph_count());
    let font_texture = renderer.add_texture(baked.image.clone());
    let font = Arc::new(baked.into_font(font_texture));

    let packed = sprite_atlas(CHECKER_CELL)?;
    let sprite_texture = renderer.add_texture(packed.image.clone());
    let sprites = packed.regions(sprite_texture);

    let studio = Studio::new(renderer, font, sprites, sprite_texture);
    let config = RuntimeConfig { title: "tessel studio".to_string(), ..RuntimeConfig::default() };
    Runtime::run(config, GpuInit::default(), studio)
}

struct Studio {
    list: DrawList,
    renderer: UiRenderer,
    router: Router,
    font: Arc<Font>,
    sprites: HashMap<&'static str, AtlasRegion>,
    sprite_texture: TextureId,
    widgets: Widgets,
    /// Clear count the sprite atlas was last baked for.
    baked_clicks: u32,

    field_id: LogicId,
    clear_id: LogicId,
}

impl Studio {
    fn new(
        renderer: UiRenderer,
        font: Arc<Font>,
        sprites: HashMap<&'static str, AtlasRegion>,
        sprite_texture: TextureId,
    ) -> Self {
        let mut router = Router::new();
        let field_id = router.allocate_id();
        let clear_id = router.allocate_id();
        Self {
            list: DrawList::new(),
            renderer,
            router,
            font,
            sprites,
            sprite_texture,
            widgets: Widgets::default(),
            baked_clicks: 0,
            field_id,
            clear_id,
        }
    }
}

impl App for Studio {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let events = ctx.take_events();
        self.list.begin_frame(ctx.viewport());

        let list = &mut self.list;
        let font = &self.font;
        let state = &self.widgets;
        let mut frame = self.router.begin_frame(events);

        // ── backdrop ─────────────────────────────────────────────────────
        let visible = list.projection().visible();
        frame.logic(visible, None, |w: &mut Widgets, ev: &InputEvent| {
            if let InputEvent::PointerMoved(p) = ev {
                w.pointer = *p;
            }
            false
        });

        let top = visible.max().y;
        let left = visible.min().x;
        list.rect(Vec2::new(left, top - 0.2), Vec2::new(visible.size.x, 0.2), Color::from_srgb_u8(32, 32, 40, 255));
        list.text(Vec2::new(left + 0.05, top - 0.14), "tessel studio", font, 0.09, Color::WHITE);
        let status = format!("{} clears, {} chars", state.clicks, state.field.text.chars().count());
        list.text(Vec2::new(left + 0.05, -0.9), status, font, 0.06, Color::from_srgb_u8(150, 150, 160, 255));

        // ── card strip: overlapping translucent sprites, clipped and scrollable ──
        let strip = Rect::new(-0.9, -0.55, 1.8, 0.6);
        list.rect(strip.origin, strip.size, Color::from_straight(0.1, 0.1, 0.12, 0.8));
        list.push_clip(strip);
        for i in 0..CARD_COUNT {
            let x = strip.origin.x + 0.05 + i as f32 * 0.3 - state.scroll;
            let pos = Vec2::new(x, strip.origin.y + 0.08);
            let (key, tint) = if i % 2 == 0 {
                ("checker", Color::from_straight(1.0, 0.8, 0.6, 0.85))
            } else {
                ("disc", Color::from_straight(0.6, 0.8, 1.0, 0.9))
            };
            if let Some(region) = self.sprites.get(key) {
                list.sprite(pos, Vec2::splat(0.44), region, tint);
            }
            list.text(pos + Vec2::new(0.02, 0.02), format!("#{i}"), font, 0.05, Color::WHITE);
        }
        list.pop_clip();
        frame.logic(strip, None, |w: &mut Widgets, ev: &InputEvent| {
            if let InputEvent::Scroll(d) = ev {
                w.scroll = (w.scroll - d.y * 0.05).clamp(0.0, 0.6);
                return true;
            }
            false
        });

        // ── form ─────────────────────────────────────────────────────────
        let field = Rect::new(-0.9, 0.2, 1.3, 0.14);
        widgets::line_edit(list, &mut frame, state, self.field_id, field, font);

        let clear = Rect::new(0.5, 0.2, 0.4, 0.14);
        widgets::button(list, &mut frame, self.clear_id, clear, "Clear", font, |w| {
            w.field.clear();
            w.clicks += 1;
        });

        let cursor = if frame.hovered(field) { CursorIcon::Text } else { CursorIcon::Default };
        ctx.window.set_cursor(cursor);

        let unclaimed = frame.dispatch(&mut self.widgets);
        let quit = unclaimed.iter().any(|ev| {
            matches!(ev, InputEvent::Key { key: Key::Escape, action: Action::Press, .. })
        });
        if quit {
            log::info!("escape pressed, exiting");
            return AppControl::Exit;
        }

        if self.widgets.clicks != self.baked_clicks {
            self.rebake_sprites();
        }

        let renderer = &mut self.renderer;
        let list = &mut self.list;
        ctx.render(Color::from_srgb_u8(18, 18, 22, 255), |rctx, target| {
            renderer.render(rctx, target, list);
        })
    }
}

impl Studio {
    /// Swaps the checker pattern in place; the regions keep their UVs.
    fn rebake_sprites(&mut self) {
        self.baked_clicks = self.widgets.clicks;
        let cell = checker_cell(self.baked_clicks);
        match sprite_atlas(cell) {
            Ok(packed) => {
                if !self.renderer.replace_texture(self.sprite_texture, packed.image) {
                    log::warn!("sprite texture {:?} is not registered", self.sprite_texture);
                }
                log::debug!("checker rebaked with {cell}px cells");
            }
            Err(e) => log::error!("failed to rebake sprites: {e:#}"),
        }
    }
}

// ── procedural sprites ──────────────────────────────────────────────────────

fn checker_cell(clicks: u32) -> u32 {
    CHECKER_CELL >> (clicks % 3)
}

fn sprite_atlas(cell: u32) -> Result<PackedAtlas<&'static str>> {
    let mut atlas = AtlasBuilder::new(256, 256, PixelFormat::Rgba8);
    atlas.add("checker", checker(64, cell))?;
    atlas.add("disc", disc(64))?;
    atlas.build().context("failed to pack sprite atlas")
}

fn checker(size: u32, cell: u32) -> AtlasImage {
    let mut px = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let on = (x / cell + y / cell) % 2 == 0;
            let v = if on { 235 } else { 60 };
            px.extend_from_slice(&[v, v, v, 255]);
        }
    }
    AtlasImage { width: size, height: size, format: PixelFormat::Rgba8, pixels: px }
}

fn disc(size: u32) -> AtlasImage {
    let r = size as f32 * 0.5;
    let mut px = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let dx = x as f32 + 0.5 - r;
            let dy = y as f32 + 0.5 - r;
            let a = (r - (dx * dx + dy * dy).sqrt()).clamp(0.0, 1.0);
            px.extend_from_slice(&[255, 255, 255, (a * 255.0) as u8]);
        }
    }
    AtlasImage { width: size, height: size, format: PixelFormat::Rgba8, pixels: px }
}
