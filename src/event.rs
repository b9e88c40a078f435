//! Input event types (C8), and the crossterm conversions a live backend uses
//! to produce them.

use std::fmt;

use crate::color::ColorTier;

/// A terminal input event.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum Event {
    /// A key was pressed.
    Key(KeyEvent),
    /// A mouse event occurred.
    Mouse(MouseEvent),
    /// Text was pasted (bracketed paste mode).
    Paste(String),
    /// The terminal gained or lost focus.
    FocusChange(bool),
    /// The terminal was resized.
    Resize(u16, u16),
    /// The backend's detected capabilities changed (e.g. a deferred
    /// capability probe resolved after startup).
    CapabilityUpdate(CapabilityUpdate),
}

/// A reported change in backend capabilities.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CapabilityUpdate {
    /// The newly detected color tier.
    pub tier: ColorTier,
    /// Whether the kitty keyboard protocol is available.
    pub kitty_keyboard: bool,
}

/// A keyboard event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key code.
    pub code: KeyCode,
    /// Active modifiers.
    pub modifiers: Modifiers,
    /// Whether this is an auto-repeat of a held key (kitty keyboard
    /// protocol only; always `false` on backends that can't report it).
    pub repeat: bool,
}

impl KeyEvent {
    /// Create a new key event.
    pub fn new(code: KeyCode, modifiers: Modifiers) -> Self {
        Self { code, modifiers, repeat: false }
    }

    /// Create a plain key event with no modifiers.
    pub fn plain(code: KeyCode) -> Self {
        Self { code, modifiers: Modifiers::NONE, repeat: false }
    }

    /// Check if Ctrl is held.
    pub fn ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    /// Check if Alt is held.
    pub fn alt(&self) -> bool {
        self.modifiers.contains(Modifiers::ALT)
    }

    /// Check if Shift is held.
    pub fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }

    /// A normalized name for this key, used as the `key_name_string_ref`
    /// interned string in the wire event format and as the lookup key for
    /// keybinding chords (e.g. `"ctrl+shift+a"`, `"f1"`, `"enter"`).
    pub fn normalized_name(&self) -> String {
        let mut parts = Vec::new();
        if self.modifiers.contains(Modifiers::CTRL) {
            parts.push("ctrl");
        }
        if self.modifiers.contains(Modifiers::ALT) {
            parts.push("alt");
        }
        if self.modifiers.contains(Modifiers::SHIFT) {
            parts.push("shift");
        }
        if self.modifiers.contains(Modifiers::SUPER) {
            parts.push("super");
        }
        let key = self.code.to_string().to_lowercase();
        if parts.is_empty() {
            key
        } else {
            format!("{}+{}", parts.join("+"), key)
        }
    }
}

/// A key code.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum KeyCode {
    /// A character key.
    Char(char),
    /// Enter / Return.
    Enter,
    /// Tab.
    Tab,
    /// Backspace.
    Backspace,
    /// Delete.
    Delete,
    /// Escape.
    Escape,
    /// Arrow up.
    Up,
    /// Arrow down.
    Down,
    /// Arrow left.
    Left,
    /// Arrow right.
    Right,
    /// Home.
    Home,
    /// End.
    End,
    /// Page up.
    PageUp,
    /// Page down.
    PageDown,
    /// Insert.
    Insert,
    /// Function key (F1-F12).
    F(u8),
}

/// Keyboard modifier flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Modifiers(u8);

impl Modifiers {
    /// No modifiers.
    pub const NONE: Self = Self(0);
    /// Shift modifier.
    pub const SHIFT: Self = Self(1);
    /// Ctrl modifier.
    pub const CTRL: Self = Self(2);
    /// Alt/Option modifier.
    pub const ALT: Self = Self(4);
    /// Super/Command modifier.
    pub const SUPER: Self = Self(8);

    /// Check if this modifier set contains the given modifier.
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0 && other.0 != 0
    }

    /// Combine two modifier sets.
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// The raw bitmask, as stored in the ZREV wire format's `modifiers: u16`.
    pub const fn bits(self) -> u16 {
        self.0 as u16
    }

    /// Reconstruct from a raw bitmask.
    pub const fn from_bits(bits: u16) -> Self {
        Self((bits & 0xff) as u8)
    }
}

impl std::ops::BitOr for Modifiers {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// The kind of mouse event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum MouseEventKind {
    /// A button was pressed.
    Press,
    /// A button was released.
    Release,
    /// The mouse was moved while a button is held.
    Drag,
    /// The mouse was moved with no button held.
    Move,
    /// The scroll wheel moved; `MouseEvent::wheel_delta` carries direction
    /// and magnitude.
    Wheel,
}

/// Which mouse button a press/release/drag event concerns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    /// No button is meaningful for this event kind (move, wheel).
    None,
}

/// A mouse event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MouseEvent {
    /// The kind of mouse event.
    pub kind: MouseEventKind,
    /// Column position (0-based).
    pub x: u16,
    /// Row position (0-based).
    pub y: u16,
    /// The button involved, if any.
    pub button: MouseButton,
    /// Active modifiers.
    pub modifiers: Modifiers,
    /// Wheel movement: positive scrolls down, negative scrolls up. Zero for
    /// non-wheel events.
    pub wheel_delta: i16,
}

// Crossterm conversions

impl From<crossterm::event::Event> for Event {
    fn from(ct: crossterm::event::Event) -> Self {
        match ct {
            crossterm::event::Event::Key(key) => Event::Key(key.into()),
            crossterm::event::Event::Mouse(mouse) => Event::Mouse(mouse.into()),
            crossterm::event::Event::Resize(w, h) => Event::Resize(w, h),
            crossterm::event::Event::Paste(text) => Event::Paste(text),
            crossterm::event::Event::FocusGained => Event::FocusChange(true),
            crossterm::event::Event::FocusLost => Event::FocusChange(false),
        }
    }
}

impl From<crossterm::event::KeyEvent> for KeyEvent {
    fn from(ct: crossterm::event::KeyEvent) -> Self {
        Self {
            code: ct.code.into(),
            modifiers: ct.modifiers.into(),
            repeat: ct.kind == crossterm::event::KeyEventKind::Repeat,
        }
    }
}

impl From<crossterm::event::KeyCode> for KeyCode {
    fn from(ct: crossterm::event::KeyCode) -> Self {
        match ct {
            crossterm::event::KeyCode::Char(c) => KeyCode::Char(c),
            crossterm::event::KeyCode::Enter => KeyCode::Enter,
            crossterm::event::KeyCode::Tab => KeyCode::Tab,
            crossterm::event::KeyCode::Backspace => KeyCode::Backspace,
            crossterm::event::KeyCode::Delete => KeyCode::Delete,
            crossterm::event::KeyCode::Esc => KeyCode::Escape,
            crossterm::event::KeyCode::Up => KeyCode::Up,
            crossterm::event::KeyCode::Down => KeyCode::Down,
            crossterm::event::KeyCode::Left => KeyCode::Left,
            crossterm::event::KeyCode::Right => KeyCode::Right,
            crossterm::event::KeyCode::Home => KeyCode::Home,
            crossterm::event::KeyCode::End => KeyCode::End,
            crossterm::event::KeyCode::PageUp => KeyCode::PageUp,
            crossterm::event::KeyCode::PageDown => KeyCode::PageDown,
            crossterm::event::KeyCode::Insert => KeyCode::Insert,
            crossterm::event::KeyCode::F(n) => KeyCode::F(n),
            _ => KeyCode::Escape, // fallback for media keys etc.
        }
    }
}

impl From<crossterm::event::KeyModifiers> for Modifiers {
    fn from(ct: crossterm::event::KeyModifiers) -> Self {
        let mut m = Modifiers::NONE;
        if ct.contains(crossterm::event::KeyModifiers::SHIFT) {
            m = m | Modifiers::SHIFT;
        }
        if ct.contains(crossterm::event::KeyModifiers::CONTROL) {
            m = m | Modifiers::CTRL;
        }
        if ct.contains(crossterm::event::KeyModifiers::ALT) {
            m = m | Modifiers::ALT;
        }
        if ct.contains(crossterm::event::KeyModifiers::SUPER) {
            m = m | Modifiers::SUPER;
        }
        m
    }
}

impl From<crossterm::event::MouseEvent> for MouseEvent {
    fn from(ct: crossterm::event::MouseEvent) -> Self {
        let (kind, button, wheel_delta) = match ct.kind {
            crossterm::event::MouseEventKind::Down(b) => (MouseEventKind::Press, b.into(), 0),
            crossterm::event::MouseEventKind::Up(b) => (MouseEventKind::Release, b.into(), 0),
            crossterm::event::MouseEventKind::Drag(b) => (MouseEventKind::Drag, b.into(), 0),
            crossterm::event::MouseEventKind::Moved => (MouseEventKind::Move, MouseButton::None, 0),
            crossterm::event::MouseEventKind::ScrollUp => (MouseEventKind::Wheel, MouseButton::None, -1),
            crossterm::event::MouseEventKind::ScrollDown => (MouseEventKind::Wheel, MouseButton::None, 1),
            crossterm::event::MouseEventKind::ScrollLeft => (MouseEventKind::Wheel, MouseButton::None, -1),
            crossterm::event::MouseEventKind::ScrollRight => (MouseEventKind::Wheel, MouseButton::None, 1),
        };
        Self {
            kind,
            x: ct.column,
            y: ct.row,
            button,
            modifiers: ct.modifiers.into(),
            wheel_delta,
        }
    }
}

impl From<crossterm::event::MouseButton> for MouseButton {
    fn from(ct: crossterm::event::MouseButton) -> Self {
        match ct {
            crossterm::event::MouseButton::Left => MouseButton::Left,
            crossterm::event::MouseButton::Right => MouseButton::Right,
            crossterm::event::MouseButton::Middle => MouseButton::Middle,
        }
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyCode::Char(c) => write!(f, "{c}"),
            KeyCode::Enter => write!(f, "Enter"),
            KeyCode::Tab => write!(f, "Tab"),
            KeyCode::Backspace => write!(f, "Backspace"),
            KeyCode::Delete => write!(f, "Delete"),
            KeyCode::Escape => write!(f, "Escape"),
            KeyCode::Up => write!(f, "Up"),
            KeyCode::Down => write!(f, "Down"),
            KeyCode::Left => write!(f, "Left"),
            KeyCode::Right => write!(f, "Right"),
            KeyCode::Home => write!(f, "Home"),
            KeyCode::End => write!(f, "End"),
            KeyCode::PageUp => write!(f, "PageUp"),
            KeyCode::PageDown => write!(f, "PageDown"),
            KeyCode::Insert => write!(f, "Insert"),
            KeyCode::F(n) => write!(f, "F{n}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_event_plain() {
        let k = KeyEvent::plain(KeyCode::Char('a'));
        assert!(!k.ctrl());
        assert!(!k.alt());
        assert!(!k.shift());
    }

    #[test]
    fn key_event_with_modifiers() {
        let k = KeyEvent::new(KeyCode::Char('c'), Modifiers::CTRL);
        assert!(k.ctrl());
        assert!(!k.alt());
    }

    #[test]
    fn modifier_union() {
        let m = Modifiers::CTRL | Modifiers::SHIFT;
        assert!(m.contains(Modifiers::CTRL));
        assert!(m.contains(Modifiers::SHIFT));
        assert!(!m.contains(Modifiers::ALT));
    }

    #[test]
    fn modifier_bits_round_trip() {
        let m = Modifiers::CTRL | Modifiers::ALT;
        assert_eq!(Modifiers::from_bits(m.bits()), m);
    }

    #[test]
    fn resize_event() {
        let e = Event::Resize(80, 24);
        assert!(matches!(e, Event::Resize(80, 24)));
    }

    #[test]
    fn paste_event() {
        let e = Event::Paste("hello".into());
        assert!(matches!(e, Event::Paste(ref s) if s == "hello"));
    }

    #[test]
    fn focus_change_event() {
        assert!(matches!(Event::FocusChange(true), Event::FocusChange(true)));
    }

    #[test]
    fn normalized_name_with_modifiers() {
        let k = KeyEvent::new(KeyCode::Char('a'), Modifiers::CTRL | Modifiers::SHIFT);
        assert_eq!(k.normalized_name(), "ctrl+shift+a");
    }

    #[test]
    fn normalized_name_plain() {
        let k = KeyEvent::plain(KeyCode::Enter);
        assert_eq!(k.normalized_name(), "enter");
    }

    #[test]
    fn keycode_display() {
        assert_eq!(format!("{}", KeyCode::Char('a')), "a");
        assert_eq!(format!("{}", KeyCode::Enter), "Enter");
        assert_eq!(format!("{}", KeyCode::F(1)), "F1");
    }

    #[test]
    fn crossterm_key_conversion() {
        let ct = crossterm::event::KeyEvent::new(
            crossterm::event::KeyCode::Char('x'),
            crossterm::event::KeyModifiers::CONTROL,
        );
        let k: KeyEvent = ct.into();
        assert_eq!(k.code, KeyCode::Char('x'));
        assert!(k.ctrl());
    }

    #[test]
    fn crossterm_resize_conversion() {
        let ct = crossterm::event::Event::Resize(120, 40);
        let e: Event = ct.into();
        assert!(matches!(e, Event::Resize(120, 40)));
    }

    #[test]
    fn crossterm_scroll_maps_to_wheel() {
        let ct = crossterm::event::MouseEvent {
            kind: crossterm::event::MouseEventKind::ScrollDown,
            column: 1,
            row: 1,
            modifiers: crossterm::event::KeyModifiers::NONE,
        };
        let m: MouseEvent = ct.into();
        assert_eq!(m.kind, MouseEventKind::Wheel);
        assert_eq!(m.wheel_delta, 1);
    }
}
