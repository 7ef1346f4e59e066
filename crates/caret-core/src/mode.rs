//! Editor modes.
//!
//! The mode is a tagged variant carrying the state that only exists in that
//! mode: the snippet context, or the column-edit cursor set. Leaving a mode
//! drops its state with it, so stale contexts cannot survive a transition.

use crate::geom::Point;
use crate::snippet::SnippetContext;

/// One of several simultaneous editing positions in column-edit mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnCursor {
    /// Logical line (paragraph index).
    pub line: usize,
    /// Column in runes within the line.
    pub col: usize,
    /// Left edge of the dragged rectangle, viewport x.
    pub start_x: f32,
    /// Right edge of the dragged rectangle, viewport x.
    pub end_x: f32,
}

/// State of an active column selection.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnEditState {
    /// Pointer position that seeded the selection, viewport coordinates.
    pub anchor: Point,
    pub cursors: Vec<ColumnCursor>,
}

/// The editor's mode state machine.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Mode {
    /// Insert and select freely.
    #[default]
    Normal,
    /// Selection and copying work; mutation is rejected.
    ReadOnly,
    /// Snippet navigation: Tab and Shift-Tab move between tab stops.
    Snippet(SnippetContext),
    /// Rectangular multi-cursor editing.
    ColumnEdit(ColumnEditState),
}

impl Mode {
    pub fn is_read_only(&self) -> bool {
        matches!(self, Mode::ReadOnly)
    }

    pub fn is_snippet(&self) -> bool {
        matches!(self, Mode::Snippet(_))
    }

    pub fn is_column_edit(&self) -> bool {
        matches!(self, Mode::ColumnEdit(_))
    }
}
