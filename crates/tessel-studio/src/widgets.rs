//! Demo widgets: a single-line text field and a push button.
//!
//! Each widget draws itself into the list and registers its logic with the
//! router frame; the logic mutates [`Widgets`] when the frame is dispatched.

use std::sync::Arc;

use tessel_engine::coords::{Rect, Vec2};
use tessel_engine::input::{Action, InputEvent, Key};
use tessel_engine::interact::{LogicId, RouterFrame};
use tessel_engine::paint::Color;
use tessel_engine::scene::DrawList;
use tessel_engine::text::Font;

pub const TEXT_SCALE: f32 = 0.08;
const PAD: f32 = 0.02;

/// State the widget logic mutates.
#[derive(Debug, Default)]
pub struct Widgets {
    pub field: LineEdit,
    pub clicks: u32,
    pub scroll: f32,
    /// Last pointer position seen by the backdrop.
    pub pointer: Vec2,
}

// ── line edit ─────────────────────────────────────────────────────────────

/// Editable single line; `caret` counts chars, not bytes.
#[derive(Debug, Default)]
pub struct LineEdit {
    pub text: String,
    pub caret: usize,
}

impl LineEdit {
    fn byte_at(&self, caret: usize) -> usize {
        self.text.char_indices().nth(caret).map_or(self.text.len(), |(i, _)| i)
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_at(self.caret);
        self.text.insert(at, c);
        self.caret += 1;
    }

    pub fn backspace(&mut self) {
        if self.caret == 0 {
            return;
        }
        self.caret -= 1;
        let at = self.byte_at(self.caret);
        self.text.remove(at);
    }

    pub fn delete(&mut self) {
        if self.caret < self.text.chars().count() {
            let at = self.byte_at(self.caret);
            self.text.remove(at);
        }
    }

    pub fn move_caret(&mut self, delta: isize) {
        let len = self.text.chars().count();
        self.caret = self.caret.saturating_add_signed(delta).min(len);
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.caret = 0;
    }

    /// Text before the caret.
    pub fn head(&self) -> &str {
        &self.text[..self.byte_at(self.caret)]
    }
}

/// Draws the field in `bbox` and wires its editing logic.
pub fn line_edit<'f>(
    list: &mut DrawList,
    frame: &mut RouterFrame<'f, Widgets>,
    state: &Widgets,
    id: LogicId,
    bbox: Rect,
    font: &Arc<Font>,
) {
    let focused = frame.is_focused(id);
    let hovered = frame.hovered(bbox);

    let border = if focused {
        Color::from_srgb_u8(90, 150, 255, 255)
    } else if hovered {
        Color::from_srgb_u8(120, 120, 130, 255)
    } else {
        Color::from_srgb_u8(70, 70, 80, 255)
    };
    list.rect(bbox.origin - Vec2::splat(0.005), bbox.size + Vec2::splat(0.01), border);
    list.rect(bbox.origin, bbox.size, Color::from_srgb_u8(24, 24, 30, 255));

    let origin = bbox.origin + Vec2::new(PAD, (bbox.size.y - TEXT_SCALE) * 0.5);
    list.push_clip(bbox);
    if state.field.text.is_empty() && !focused {
        list.text(origin, "type here", font, TEXT_SCALE, Color::from_srgb_u8(110, 110, 120, 255));
    } else if !state.field.text.is_empty() {
        list.text(origin, state.field.text.as_str(), font, TEXT_SCALE, Color::WHITE);
    }
    if focused {
        let (head, _) = font.measure(state.field.head(), TEXT_SCALE, None, None);
        let x = if state.field.caret == 0 { 0.0 } else { head.x };
        list.rect(origin + Vec2::new(x, 0.0), Vec2::new(0.006, TEXT_SCALE), Color::WHITE);
    }
    list.pop_clip();

    let font = Arc::clone(font);
    frame.logic(bbox, Some(id), move |w: &mut Widgets, ev: &InputEvent| match ev {
        InputEvent::Char(c) if font.contains(*c) => {
            w.field.insert(*c);
            true
        }
        InputEvent::Key { key, action: Action::Press | Action::Repeat, .. } => {
            match key {
                Key::Backspace => w.field.backspace(),
                Key::Delete => w.field.delete(),
                Key::ArrowLeft => w.field.move_caret(-1),
                Key::ArrowRight => w.field.move_caret(1),
                Key::Home => w.field.caret = 0,
                Key::End => w.field.caret = w.field.text.chars().count(),
                _ => return false,
            }
            true
        }
        InputEvent::PointerButton { action: Action::Press, .. } => {
            let dx = w.pointer.x - origin.x;
            let (_, fit) = font.measure(&w.field.text, TEXT_SCALE, Some(dx.max(0.0)), None);
            w.field.caret = fit;
            true
        }
        InputEvent::Defocus => {
            log::debug!("field defocused with {:?}", w.field.text);
            true
        }
        _ => false,
    });
}

// ── button ────────────────────────────────────────────────────────────────

/// Draws a push button; `on_press` runs when it is clicked.
pub fn button<'f>(
    list: &mut DrawList,
    frame: &mut RouterFrame<'f, Widgets>,
    id: LogicId,
    bbox: Rect,
    label: &str,
    font: &Arc<Font>,
    mut on_press: impl FnMut(&mut Widgets) + 'f,
) {
    let fill = if frame.hovered(bbox) {
        Color::from_srgb_u8(70, 110, 200, 255)
    } else {
        Color::from_srgb_u8(50, 80, 160, 255)
    };
    list.rect(bbox.origin, bbox.size, fill);

    let (size, _) = font.measure(label, TEXT_SCALE, None, None);
    let origin = bbox.origin + (bbox.size - Vec2::new(size.x, TEXT_SCALE)) * 0.5;
    list.text(origin, label, font, TEXT_SCALE, Color::WHITE);

    frame.logic(bbox, Some(id), move |w: &mut Widgets, ev: &InputEvent| {
        if ev.is_press() {
            on_press(w);
            return true;
        }
        false
    });
}
