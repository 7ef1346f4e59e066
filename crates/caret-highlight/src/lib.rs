//! Occurrence highlighters for the caret editing core.
//!
//! Two decoration plugins: [`WordHighlighter`] marks every occurrence of the
//! word under the caret, [`SelectionHighlighter`] marks every occurrence of
//! the selected text. Each owns a reserved decoration source tag and only
//! ever touches its own layer. Plugins hold no reference to the editor; the
//! host passes `&mut Editor` into each refresh call.

use caret_core::decorations::{Color, Decoration};
use caret_core::editor::Editor;
use log::trace;

const WORD_HIGHLIGHT_SOURCE: &str = "_word_highlight";
const SELECTION_HIGHLIGHT_SOURCE: &str = "_selection_highlight";

const DEFAULT_WORD_COLOR: Color = Color::rgba(0xdd, 0xdd, 0xdd, 0x80);
const DEFAULT_SELECTION_COLOR: Color = Color::rgba(0xdd, 0xdd, 0xdd, 0x60);

/// Highlights all occurrences of the word at the caret position. No
/// highlighting is performed while a selection exists.
#[derive(Debug, Default)]
pub struct WordHighlighter {
    last_caret: usize,
    dirty: bool,
}

impl WordHighlighter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The decoration source tag owned by this plugin.
    pub fn source() -> &'static str {
        WORD_HIGHLIGHT_SOURCE
    }

    /// Whether the caret moved since the last refresh.
    pub fn is_dirty(&self, editor: &Editor) -> bool {
        let (caret, _) = editor.selection();
        caret != self.last_caret || self.dirty
    }

    /// Request a refresh regardless of caret movement.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Remove all word highlight decorations.
    pub fn clear(&mut self, editor: &mut Editor) {
        editor.clear_decorations(WORD_HIGHLIGHT_SOURCE);
    }

    /// Re-highlight the word at the caret. A zero `color` selects the
    /// default light gray.
    pub fn highlight_at_caret(&mut self, editor: &mut Editor, color: Color) {
        editor.clear_decorations(WORD_HIGHLIGHT_SOURCE);

        let (caret, _) = editor.selection();
        self.last_caret = caret;
        self.dirty = false;

        if editor.view().selection_len() > 0 {
            return;
        }

        let (start, end) = editor.view_mut().word_boundaries_at(caret, false);
        if start >= end {
            // Caret is on a separator or the document is empty.
            return;
        }

        let occurrences = editor.view_mut().find_all_word_occurrences(start, end, false);
        if occurrences.is_empty() {
            return;
        }
        trace!("word highlight: {} occurrences", occurrences.len());

        let color = if color.is_set() { color } else { DEFAULT_WORD_COLOR };
        let decorations: Vec<Decoration> = occurrences
            .into_iter()
            .map(|(s, e)| Decoration::background(WORD_HIGHLIGHT_SOURCE, s, e, color))
            .collect();
        editor.add_decorations(decorations);
    }
}

/// Highlights all occurrences of the currently selected text. Nothing is
/// highlighted when the selection is empty.
#[derive(Debug, Default)]
pub struct SelectionHighlighter {
    last_selection: (usize, usize),
    dirty: bool,
}

impl SelectionHighlighter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The decoration source tag owned by this plugin.
    pub fn source() -> &'static str {
        SELECTION_HIGHLIGHT_SOURCE
    }

    /// Whether the selection changed since the last refresh.
    pub fn is_dirty(&self, editor: &Editor) -> bool {
        editor.selection() != self.last_selection || self.dirty
    }

    /// Request a refresh regardless of selection movement.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Remove all selection highlight decorations.
    pub fn clear(&mut self, editor: &mut Editor) {
        editor.clear_decorations(SELECTION_HIGHLIGHT_SOURCE);
    }

    /// Re-highlight occurrences of the selected text. A zero `color`
    /// selects the default.
    pub fn highlight_selection(&mut self, editor: &mut Editor, color: Color) {
        editor.clear_decorations(SELECTION_HIGHLIGHT_SOURCE);

        self.last_selection = editor.selection();
        self.dirty = false;

        if editor.view().selection_len() == 0 {
            return;
        }
        let (start, end) = editor.selection();
        let (start, end) = (start.min(end), start.max(end));

        let occurrences = editor.view_mut().find_all_text_occurrences(start, end);
        if occurrences.is_empty() {
            return;
        }
        trace!("selection highlight: {} occurrences", occurrences.len());

        let color = if color.is_set() {
            color
        } else {
            DEFAULT_SELECTION_COLOR
        };
        let decorations: Vec<Decoration> = occurrences
            .into_iter()
            .map(|(s, e)| Decoration::background(SELECTION_HIGHLIGHT_SOURCE, s, e, color))
            .collect();
        editor.add_decorations(decorations);
    }
}
