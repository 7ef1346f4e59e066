//! Input taxonomy and emitted editor events.
//!
//! The host translates its windowing events into these types and feeds them
//! to [`Editor::process_event`](crate::editor::Editor::process_event) in
//! delivery order. The core is single-threaded and non-reentrant: an event
//! must be fully processed before the next one is delivered.

use bitflags::bitflags;

use crate::geom::Point;

bitflags! {
    /// Keyboard modifier state.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const CTRL = 1 << 1;
        const ALT = 1 << 2;
        const META = 1 << 3;
    }
}

/// A key identity, independent of modifier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Enter,
    Tab,
    Backspace,
    Delete,
    Escape,
    Home,
    End,
    PageUp,
    PageDown,
    Left,
    Right,
    Up,
    Down,
}

/// A filtered key event bound to an editing command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn plain(key: Key) -> Self {
        Self::new(key, Modifiers::empty())
    }
}

/// Pointer event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Press,
    Release,
    Drag,
    Scroll,
    Hover,
}

/// A pointer event in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub position: Point,
    pub modifiers: Modifiers,
    /// Click count for press events (1 = single, 2 = double, ...).
    pub num_clicks: u8,
    /// Scroll delta for scroll events.
    pub scroll: Point,
}

impl PointerEvent {
    pub fn press(position: Point, modifiers: Modifiers, num_clicks: u8) -> Self {
        Self {
            kind: PointerKind::Press,
            position,
            modifiers,
            num_clicks,
            scroll: Point::default(),
        }
    }

    pub fn drag(position: Point) -> Self {
        Self {
            kind: PointerKind::Drag,
            position,
            modifiers: Modifiers::empty(),
            num_clicks: 0,
            scroll: Point::default(),
        }
    }

    pub fn release(position: Point) -> Self {
        Self {
            kind: PointerKind::Release,
            position,
            modifiers: Modifiers::empty(),
            num_clicks: 0,
            scroll: Point::default(),
        }
    }

    pub fn scroll(delta: Point) -> Self {
        Self {
            kind: PointerKind::Scroll,
            position: Point::default(),
            modifiers: Modifiers::empty(),
            num_clicks: 0,
            scroll: delta,
        }
    }

    pub fn hover(position: Point) -> Self {
        Self {
            kind: PointerKind::Hover,
            position,
            modifiers: Modifiers::empty(),
            num_clicks: 0,
            scroll: Point::default(),
        }
    }
}

/// A text-input event, possibly produced by IME composition. `range` is the
/// rune range the input replaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditEvent {
    pub range: (usize, usize),
    pub text: String,
}

impl EditEvent {
    pub fn new(start: usize, end: usize, text: impl Into<String>) -> Self {
        Self {
            range: (start, end),
            text: text.into(),
        }
    }
}

/// Any input the host can deliver.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Pointer(PointerEvent),
    Key(KeyEvent),
    Edit(EditEvent),
    /// Clipboard content arriving in response to a paste request.
    Paste(String),
    /// The editor lost focus.
    FocusLost,
}

/// Events the editor emits back to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// The document text changed.
    Change,
    /// The selection changed.
    Select,
    /// The pointer hovers a document position.
    Hover {
        line: usize,
        col: usize,
        runes: usize,
        pixel: Point,
    },
}
