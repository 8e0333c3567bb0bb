use std::collections::HashSet;

use crate::coords::Vec2;

use super::types::{Action, InputEvent, Key, Modifiers, MouseButton};

/// Current input state for a single window.
///
/// Holds "is down" information, the tracked modifiers and the pointer
/// position. The platform layer reads it to fill in fields its events lack.
#[derive(Debug, Default)]
pub struct InputState {
    pub modifiers: Modifiers,

    /// Whether the window has keyboard focus.
    pub focused: bool,

    /// Pointer position in GUI units; `None` while outside the window.
    pub pointer: Option<Vec2>,

    pub keys_down: HashSet<Key>,
    pub buttons_down: HashSet<MouseButton>,
}

impl InputState {
    /// Folds `ev` into the held state.
    pub fn apply(&mut self, ev: &InputEvent) {
        match ev {
            InputEvent::PointerMoved(p) => self.pointer = Some(*p),

            InputEvent::PointerButton { button, action, modifiers } => {
                self.modifiers = *modifiers;
                match action {
                    Action::Press | Action::Repeat => {
                        self.buttons_down.insert(*button);
                    }
                    Action::Release => {
                        self.buttons_down.remove(button);
                    }
                }
            }

            InputEvent::Key { key, action, modifiers } => {
                self.modifiers = *modifiers;
                match action {
                    Action::Press | Action::Repeat => {
                        self.keys_down.insert(*key);
                    }
                    Action::Release => {
                        self.keys_down.remove(key);
                    }
                }
            }

            InputEvent::Defocus => {
                // Releases are not delivered to an unfocused window.
                self.focused = false;
                self.keys_down.clear();
                self.buttons_down.clear();
                self.modifiers = Modifiers::NONE;
            }

            InputEvent::Scroll(_) | InputEvent::Char(_) => {}
        }
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    pub fn button_down(&self, btn: MouseButton) -> bool {
        self.buttons_down.contains(&btn)
    }
}
