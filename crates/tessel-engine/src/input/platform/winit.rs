use winit::event::{ElementState, Ime, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};

use crate::coords::{Vec2, Viewport};
use crate::input::{Action, InputEvent, InputState, Key, Modifiers, MouseButton};

/// Physical pixels per wheel line for high-precision scroll devices.
const PIXELS_PER_LINE: f32 = 20.0;

/// Translates a winit `WindowEvent` into zero or more engine events.
///
/// `viewport` is the window's physical size, used to map the cursor into GUI
/// units. `state` is updated with every emitted event and supplies the
/// modifiers winit reports separately.
pub fn translate_window_event(
    viewport: Viewport,
    state: &mut InputState,
    event: &WindowEvent,
    out: &mut Vec<InputEvent>,
) {
    let start = out.len();
    let modifiers = state.modifiers;
    let mut emit = |ev: InputEvent| out.push(ev);

    match event {
        WindowEvent::ModifiersChanged(m) => {
            state.modifiers = map_modifiers(m.state());
        }

        WindowEvent::Focused(true) => state.focused = true,
        WindowEvent::Focused(false) => emit(InputEvent::Defocus),

        WindowEvent::CursorLeft { .. } => state.pointer = None,

        WindowEvent::CursorMoved { position, .. } => {
            emit(InputEvent::PointerMoved(viewport.to_gui(position.x as f32, position.y as f32)));
        }

        WindowEvent::MouseInput { state: st, button, .. } => {
            let action = match st {
                ElementState::Pressed => Action::Press,
                ElementState::Released => Action::Release,
            };
            emit(InputEvent::PointerButton { button: map_mouse_button(*button), action, modifiers });
        }

        WindowEvent::MouseWheel { delta, .. } => {
            let lines = match delta {
                MouseScrollDelta::LineDelta(x, y) => Vec2::new(*x, *y),
                MouseScrollDelta::PixelDelta(p) => Vec2::new(p.x as f32, p.y as f32) / PIXELS_PER_LINE,
            };
            emit(InputEvent::Scroll(lines));
        }

        WindowEvent::KeyboardInput { event, .. } => {
            let action = match (event.state, event.repeat) {
                (ElementState::Pressed, false) => Action::Press,
                (ElementState::Pressed, true) => Action::Repeat,
                (ElementState::Released, _) => Action::Release,
            };
            emit(InputEvent::Key { key: map_key(event.physical_key), action, modifiers });

            // Shortcuts are keys, not text.
            if action != Action::Release && !modifiers.ctrl && !modifiers.meta {
                if let Some(text) = event.text.as_ref() {
                    for c in text.chars().filter(|c| !c.is_control()) {
                        emit(InputEvent::Char(c));
                    }
                }
            }
        }

        WindowEvent::Ime(Ime::Commit(text)) => {
            for c in text.chars().filter(|c| !c.is_control()) {
                emit(InputEvent::Char(c));
            }
        }

        _ => {}
    }

    for ev in &out[start..] {
        state.apply(ev);
    }
}

fn map_modifiers(m: ModifiersState) -> Modifiers {
    Modifiers {
        shift: m.shift_key(),
        ctrl: m.control_key(),
        alt: m.alt_key(),
        meta: m.super_key(),
    }
}

fn map_mouse_button(b: WinitMouseButton) -> MouseButton {
    match b {
        WinitMouseButton::Left => MouseButton::Left,
        WinitMouseButton::Right => MouseButton::Right,
        WinitMouseButton::Middle => MouseButton::Middle,
        WinitMouseButton::Back => MouseButton::Back,
        WinitMouseButton::Forward => MouseButton::Forward,
        WinitMouseButton::Other(v) => MouseButton::Other(v),
    }
}

const LETTERS: [(KeyCode, char); 26] = [
    (KeyCode::KeyA, 'A'), (KeyCode::KeyB, 'B'), (KeyCode::KeyC, 'C'), (KeyCode::KeyD, 'D'),
    (KeyCode::KeyE, 'E'), (KeyCode::KeyF, 'F'), (KeyCode::KeyG, 'G'), (KeyCode::KeyH, 'H'),
    (KeyCode::KeyI, 'I'), (KeyCode::KeyJ, 'J'), (KeyCode::KeyK, 'K'), (KeyCode::KeyL, 'L'),
    (KeyCode::KeyM, 'M'), (KeyCode::KeyN, 'N'), (KeyCode::KeyO, 'O'), (KeyCode::KeyP, 'P'),
    (KeyCode::KeyQ, 'Q'), (KeyCode::KeyR, 'R'), (KeyCode::KeyS, 'S'), (KeyCode::KeyT, 'T'),
    (KeyCode::KeyU, 'U'), (KeyCode::KeyV, 'V'), (KeyCode::KeyW, 'W'), (KeyCode::KeyX, 'X'),
    (KeyCode::KeyY, 'Y'), (KeyCode::KeyZ, 'Z'),
];

fn map_key(pk: PhysicalKey) -> Key {
    let PhysicalKey::Code(code) = pk else {
        return Key::Other(0);
    };

    match code {
        KeyCode::Escape => Key::Escape,
        KeyCode::Enter | KeyCode::NumpadEnter => Key::Enter,
        KeyCode::Tab => Key::Tab,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Space => Key::Space,

        KeyCode::Insert => Key::Insert,
        KeyCode::Delete => Key::Delete,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,

        KeyCode::ArrowUp => Key::ArrowUp,
        KeyCode::ArrowDown => Key::ArrowDown,
        KeyCode::ArrowLeft => Key::ArrowLeft,
        KeyCode::ArrowRight => Key::ArrowRight,

        KeyCode::ShiftLeft | KeyCode::ShiftRight => Key::Shift,
        KeyCode::ControlLeft | KeyCode::ControlRight => Key::Control,
        KeyCode::AltLeft | KeyCode::AltRight => Key::Alt,
        KeyCode::SuperLeft | KeyCode::SuperRight => Key::Meta,

        other => LETTERS
            .iter()
            .find(|(k, _)| *k == other)
            .map_or(Key::Other(other as u32), |&(_, c)| Key::Letter(c)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_map_by_physical_position() {
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::KeyQ)), Key::Letter('Q'));
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::NumpadEnter)), Key::Enter);
        assert!(matches!(map_key(PhysicalKey::Code(KeyCode::F5)), Key::Other(_)));
    }

    #[test]
    fn cursor_moves_arrive_in_gui_units() {
        let mut state = InputState::default();
        let mut out = Vec::new();
        let ev = WindowEvent::CursorMoved {
            // SAFETY: the id is only compared, never handed back to the platform.
            device_id: unsafe { winit::event::DeviceId::dummy() },
            position: winit::dpi::PhysicalPosition::new(300.0, 100.0),
        };
        translate_window_event(Viewport::new(400.0, 200.0), &mut state, &ev, &mut out);

        assert_eq!(out, vec![InputEvent::PointerMoved(Vec2::new(1.0, 0.0))]);
        assert_eq!(state.pointer, Some(Vec2::new(1.0, 0.0)));
    }

    #[test]
    fn ime_commit_becomes_chars() {
        let mut state = InputState::default();
        let mut out = Vec::new();
        let ev = WindowEvent::Ime(Ime::Commit("é\u{7}ü".to_string()));
        translate_window_event(Viewport::new(1.0, 1.0), &mut state, &ev, &mut out);

        assert_eq!(out, vec![InputEvent::Char('é'), InputEvent::Char('ü')]);
    }

    #[test]
    fn blur_emits_defocus() {
        let mut state = InputState { focused: true, ..Default::default() };
        let mut out = Vec::new();
        translate_window_event(Viewport::new(1.0, 1.0), &mut state, &WindowEvent::Focused(false), &mut out);

        assert_eq!(out, vec![InputEvent::Defocus]);
        assert!(!state.focused);
    }
}
