use std::fmt;

use crate::coords::Vec2;

/// Keyboard key identifier.
///
/// Covers the keys widgets react to directly. Letters are reported by their
/// physical position on a US layout; text entry uses [`InputEvent::Char`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Tab,
    Backspace,
    Space,

    Insert,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,

    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,

    Shift,
    Control,
    Alt,
    Meta,

    /// `A`..=`Z`, uppercase.
    Letter(char),

    /// Platform key code with no variant here.
    Other(u32),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Letter(c) => write!(f, "{c}"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Transition carried by key and button events.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Action {
    Press,
    Release,
    /// Auto-repeat of a held key.
    Repeat,
}

impl Action {
    #[inline]
    pub fn is_press(self) -> bool {
        matches!(self, Action::Press)
    }
}

/// Mouse button identifier.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Back,
    Forward,
    Other(u16),
}

/// Modifier keys held when an event was produced.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const SHIFT: u8 = 1;
    pub const CTRL: u8 = 2;
    pub const ALT: u8 = 4;
    pub const META: u8 = 8;

    pub const NONE: Modifiers = Modifiers { shift: false, ctrl: false, alt: false, meta: false };

    pub fn any(&self) -> bool {
        self.shift || self.ctrl || self.alt || self.meta
    }

    /// Packs the flags as `SHIFT | CTRL | ALT | META`.
    pub fn bits(&self) -> u8 {
        let mut bits = 0;
        if self.shift {
            bits |= Self::SHIFT;
        }
        if self.ctrl {
            bits |= Self::CTRL;
        }
        if self.alt {
            bits |= Self::ALT;
        }
        if self.meta {
            bits |= Self::META;
        }
        bits
    }

    pub fn from_bits(bits: u8) -> Self {
        Self {
            shift: bits & Self::SHIFT != 0,
            ctrl: bits & Self::CTRL != 0,
            alt: bits & Self::ALT != 0,
            meta: bits & Self::META != 0,
        }
    }
}

/// Platform-agnostic input event, positions in GUI units.
///
/// The runtime translates window system events into these and hands them to
/// the app once per frame, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerMoved(Vec2),

    PointerButton {
        button: MouseButton,
        action: Action,
        modifiers: Modifiers,
    },

    Key {
        key: Key,
        action: Action,
        modifiers: Modifiers,
    },

    /// Wheel delta in lines; +Y scrolls up.
    Scroll(Vec2),

    /// Committed text, one event per character.
    Char(char),

    /// Keyboard focus left: the window blurred, or the router moved focus
    /// away from the receiving logic.
    Defocus,
}

impl InputEvent {
    /// Whether this is a mouse button press.
    #[inline]
    pub fn is_press(&self) -> bool {
        matches!(self, InputEvent::PointerButton { action: Action::Press, .. })
    }

    /// Whether this is any transition of the Escape key.
    #[inline]
    pub fn is_escape(&self) -> bool {
        matches!(self, InputEvent::Key { key: Key::Escape, .. })
    }
}
