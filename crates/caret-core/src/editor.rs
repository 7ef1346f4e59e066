//! The event dispatcher tying the core together.
//!
//! `Editor` owns the document, the text view, the completion engine, the
//! decoration store, and the mode state machine. The host feeds it
//! [`InputEvent`]s in delivery order; the editor classifies each one,
//! mutates caret or text, and reports [`EditorEvent`]s back.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::completion::{
    Completion, CompletionContext, Completor, DocPosition, KeyBinding, TextFormat,
};
use crate::decorations::{Decoration, DecorationStore};
use crate::error::EditorError;
use crate::events::{
    EditEvent, EditorEvent, InputEvent, Key, KeyEvent, Modifiers, PointerEvent, PointerKind,
};
use crate::geom::Point;
use crate::gutter::{GutterContext, GutterManager, GutterParagraph};
use crate::line::Region;
use crate::mode::{ColumnCursor, ColumnEditState, Mode};
use crate::snippet::{SnippetContext, SnippetTemplate};
use crate::source::PieceTableReader;
use crate::view::{SelectionAction, SharedSource, TextView};

/// Host clipboard sink: the editor writes, the host owns transport.
pub trait Clipboard {
    fn write(&mut self, mime_type: &str, data: &str);
}

/// A plugin command bound to a key combination.
type CommandFn = Box<dyn FnMut(&mut Editor, KeyEvent)>;

struct Command {
    tag: String,
    binding: KeyBinding,
    action: CommandFn,
}

/// Component-scoped configuration, passed at construction time.
#[derive(Debug, Clone, Copy, Default)]
pub struct EditorOptions {
    /// Emit verbose event traces through the `log` facade.
    pub debug: bool,
}

/// The text editor core.
pub struct Editor {
    buffer: SharedSource,
    text: TextView,
    mode: Mode,
    completion: Completion,
    decorations: DecorationStore,
    gutter: GutterManager,

    /// Closing characters inserted by auto-pairing, keyed by the caret
    /// position they were inserted at. Consumed when the user types the
    /// closing character or backspaces over the pair.
    auto_insertions: HashMap<usize, char>,
    /// The most recent text input, handed to the completion engine.
    last_input: Option<EditEvent>,

    clipboard: Option<Box<dyn Clipboard>>,
    on_paste: Option<Box<dyn Fn(&str) -> String>>,
    commands: Vec<Command>,

    dragging: bool,
    options: EditorOptions,
}

impl Editor {
    /// Create an editor over an empty document.
    pub fn new() -> Self {
        Self::with_options(EditorOptions::default())
    }

    /// Create an editor with explicit options.
    pub fn with_options(options: EditorOptions) -> Self {
        let buffer: SharedSource = Rc::new(RefCell::new(PieceTableReader::new()));
        let text = TextView::new(Rc::clone(&buffer));
        Self {
            buffer,
            text,
            mode: Mode::Normal,
            completion: Completion::new(),
            decorations: DecorationStore::new(),
            gutter: GutterManager::new(),
            auto_insertions: HashMap::new(),
            last_input: None,
            clipboard: None,
            on_paste: None,
            commands: Vec::new(),
            dragging: false,
            options,
        }
    }

    /// Create an editor over `text`.
    pub fn with_text(text: &str) -> Self {
        let mut editor = Self::new();
        editor.set_text(text);
        editor
    }

    pub fn view(&self) -> &TextView {
        &self.text
    }

    pub fn view_mut(&mut self) -> &mut TextView {
        &mut self.text
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn gutter(&mut self) -> &mut GutterManager {
        &mut self.gutter
    }

    pub fn is_read_only(&self) -> bool {
        self.mode.is_read_only()
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn text(&self) -> String {
        self.text.text()
    }

    /// Replace the whole document, resetting caret, history, and sessions.
    pub fn set_text(&mut self, text: &str) {
        self.text.set_text(text);
        self.auto_insertions.clear();
        self.decorations.clear();
        self.completion.cancel();
        self.set_mode(Mode::Normal);
        // A programmatic reset is not an edit the host needs echoed back.
        self.buffer.borrow_mut().take_changed();
    }

    pub fn selection(&self) -> (usize, usize) {
        self.text.selection()
    }

    pub fn set_caret(&mut self, start: usize, end: usize) {
        self.text.set_caret(start, end);
    }

    pub fn selected_text(&mut self) -> String {
        self.text.selected_text()
    }

    pub fn set_clipboard(&mut self, clipboard: Box<dyn Clipboard>) {
        self.clipboard = Some(clipboard);
    }

    /// Install a hook that transforms pasted text before insertion.
    pub fn set_paste_hook(&mut self, hook: impl Fn(&str) -> String + 'static) {
        self.on_paste = Some(Box::new(hook));
    }

    /// Bind a plugin command to a key combination. `tag` groups commands for
    /// later removal. Plugin commands run before the built-in key handling;
    /// a command must not re-enter event processing.
    pub fn register_command(
        &mut self,
        tag: &str,
        binding: KeyBinding,
        action: impl FnMut(&mut Editor, KeyEvent) + 'static,
    ) {
        self.commands.push(Command {
            tag: tag.to_string(),
            binding,
            action: Box::new(action),
        });
    }

    /// Remove every plugin command registered under `tag`.
    pub fn unregister_commands(&mut self, tag: &str) {
        self.commands.retain(|c| c.tag != tag);
    }

    fn run_command(&mut self, ev: KeyEvent) -> bool {
        let Some(idx) = self
            .commands
            .iter()
            .position(|c| c.binding.key == ev.key && c.binding.modifiers == ev.modifiers)
        else {
            return false;
        };
        // Move the command out while it runs so it can borrow the editor.
        let mut command = self.commands.remove(idx);
        (command.action)(self, ev);
        self.commands.insert(idx.min(self.commands.len()), command);
        true
    }

    // ---- modes -----------------------------------------------------------

    /// Switch modes. Entering `Normal` or `ReadOnly` drops any snippet
    /// context or column-cursor set carried by the previous mode.
    pub fn set_mode(&mut self, mode: Mode) {
        if self.mode.is_column_edit() && !mode.is_column_edit() {
            debug!("column edit mode cleared");
        }
        self.mode = mode;
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        if read_only {
            self.set_mode(Mode::ReadOnly);
        } else if self.mode.is_read_only() {
            self.set_mode(Mode::Normal);
        }
    }

    // ---- completion ------------------------------------------------------

    /// Register a completor; fails on a duplicate key binding.
    pub fn add_completor(&mut self, completor: Box<dyn Completor>) -> Result<(), EditorError> {
        self.completion.add_completor(completor)
    }

    pub fn completion(&self) -> &Completion {
        &self.completion
    }

    pub fn completion_mut(&mut self) -> &mut Completion {
        &mut self.completion
    }

    pub fn cancel_completion(&mut self) {
        self.completion.cancel();
    }

    /// Context captured from the current caret position, for key-triggered
    /// completion.
    pub fn completion_context(&mut self) -> CompletionContext {
        let (_, end) = self.text.selection();
        let input = match &self.last_input {
            Some(ev) if ev.range.1 + ev.text.chars().count() == end => ev.text.clone(),
            _ => String::new(),
        };
        let (line, column) = self.text.caret_pos();
        let coords = self.text.caret_coords().add(self.text.scroll_off());
        self.last_input = None;
        CompletionContext {
            input,
            position: DocPosition {
                line,
                column,
                runes: end,
            },
            coords,
        }
    }

    /// Apply candidate `idx` of the active session: merge the candidate's
    /// edit range with the typed prefix range, replace it, and end the
    /// session (entering snippet mode for snippet-format candidates).
    pub fn confirm_completion(&mut self, idx: usize) -> bool {
        let Some(action) = self.completion.confirm(idx) else {
            return false;
        };

        let (mut start, mut end) = (action.range.start.runes, action.range.end.runes);
        if start == 0 && end == 0 {
            start = self
                .text
                .convert_pos(action.range.start.line as isize, action.range.start.column);
            end = self
                .text
                .convert_pos(action.range.end.line as isize, action.range.end.column);
        }
        self.text.set_caret(start, end);

        match action.format {
            TextFormat::Snippet => {
                if let Err(err) = self.insert_snippet(&action.new_text) {
                    debug!("insert snippet failed: {err}");
                }
            }
            TextFormat::PlainText => {
                self.insert(&action.new_text);
            }
        }
        self.completion.cancel();
        true
    }

    // ---- decorations -----------------------------------------------------

    /// Add decorations, clipped against the current document length.
    pub fn add_decorations(&mut self, decorations: Vec<Decoration>) -> usize {
        let len = self.text.len();
        self.decorations.add(len, decorations)
    }

    /// Remove every decoration with the given source tag.
    pub fn clear_decorations(&mut self, source: &str) {
        self.decorations.clear_source(source);
    }

    pub fn decorations(&self) -> &DecorationStore {
        &self.decorations
    }

    /// Visible rectangles for each decoration of `source`.
    pub fn decoration_regions(&mut self, source: &str) -> Vec<(Decoration, Vec<Region>)> {
        let matching: Vec<Decoration> = self
            .decorations
            .all()
            .iter()
            .filter(|d| d.source == source)
            .cloned()
            .collect();
        matching
            .into_iter()
            .map(|d| {
                let regions = self.text.regions(d.start, d.end);
                (d, regions)
            })
            .collect()
    }

    // ---- gutter ----------------------------------------------------------

    /// Build the gutter context for the current frame.
    pub fn gutter_context(&mut self) -> GutterContext {
        let viewport = self.text.viewport();
        let line_height = self.text.line_height();
        let total_lines = self.text.paragraph_count();

        let current_line = if self.text.selection_len() == 0 {
            let (start, _) = self.text.selection();
            Some(self.text.find_paragraph(start).0)
        } else {
            None
        };

        let paragraphs = self
            .text
            .paragraphs()
            .iter()
            .enumerate()
            .filter(|(_, p)| p.end_y + p.descent >= viewport.min.y && p.start_y - p.ascent <= viewport.max.y)
            .map(|(index, p)| GutterParagraph {
                index,
                start_y: p.start_y,
                end_y: p.end_y,
                ascent: p.ascent,
                descent: p.descent,
                rune_off: p.rune_off,
                runes: p.runes,
            })
            .collect();

        GutterContext {
            viewport,
            paragraphs,
            current_line,
            line_height,
            total_lines,
        }
    }

    // ---- event dispatch --------------------------------------------------

    /// Process one input event, returning the editor events it produced.
    pub fn process_event(&mut self, event: InputEvent) -> Vec<EditorEvent> {
        if self.options.debug {
            debug!("process_event: {event:?}");
        }
        let selection_before = self.text.selection();
        let mut out = Vec::new();

        match event {
            InputEvent::Pointer(ev) => {
                if let Some(hover) = self.process_pointer(ev) {
                    out.push(hover);
                }
            }
            InputEvent::Key(ev) => self.process_key(ev),
            InputEvent::Edit(ev) => self.on_text_input(ev),
            InputEvent::Paste(content) => self.on_paste_event(&content),
            InputEvent::FocusLost => self.completion.cancel(),
        }

        if self.buffer.borrow_mut().take_changed() {
            out.push(EditorEvent::Change);
        }
        if self.text.selection() != selection_before {
            out.push(EditorEvent::Select);
        }
        out
    }

    fn process_pointer(&mut self, ev: PointerEvent) -> Option<EditorEvent> {
        match ev.kind {
            PointerKind::Press => {
                self.on_pointer_press(ev);
                None
            }
            PointerKind::Drag => {
                if self.mode.is_column_edit() && self.dragging {
                    self.update_column_selection(ev.position);
                } else if self.dragging {
                    self.text.move_coord(ev.position);
                    self.text.scroll_to_caret();
                }
                None
            }
            PointerKind::Release => {
                self.dragging = false;
                None
            }
            PointerKind::Scroll => {
                self.text.scroll_rel(ev.scroll.x, ev.scroll.y);
                None
            }
            PointerKind::Hover => {
                let (line, col, runes) = self.text.query_pos(ev.position)?;
                Some(EditorEvent::Hover {
                    line,
                    col,
                    runes,
                    pixel: ev.position,
                })
            }
        }
    }

    fn on_pointer_press(&mut self, ev: PointerEvent) {
        // Column selection: either the mode is already active, or Alt+click
        // seeds it.
        if self.mode.is_column_edit() {
            let has_cursors = matches!(&self.mode, Mode::ColumnEdit(s) if !s.cursors.is_empty());
            if !has_cursors {
                self.start_column_selection(ev.position);
            }
            self.dragging = true;
            return;
        }
        if ev.modifiers.contains(Modifiers::ALT) {
            debug!("alt+click starts column selection");
            self.start_column_selection(ev.position);
            self.dragging = true;
            return;
        }

        let (prev_caret, _) = self.text.selection();
        self.text.move_coord(ev.position);

        if ev.modifiers == Modifiers::SHIFT {
            let (start, end) = self.text.selection();
            // If the click landed closer to the old caret than to the
            // selection end, swap the anchor so the selection pivots.
            if end.abs_diff(start) < start.abs_diff(prev_caret) {
                self.text.set_caret(start, prev_caret);
            }
        } else {
            self.text.clear_selection();
        }
        self.dragging = true;

        match ev.num_clicks {
            0 | 1 => {}
            2 => {
                self.text.move_words(-1, SelectionAction::Clear);
                self.text.move_words(1, SelectionAction::Extend);
                self.dragging = false;
            }
            _ => {
                self.text.move_line_start(SelectionAction::Clear);
                self.text.move_line_end(SelectionAction::Extend);
                self.dragging = false;
            }
        }

        self.completion.cancel();
        if self.mode.is_snippet() {
            self.set_mode(Mode::Normal);
        }
        self.text.scroll_to_caret();
    }

    fn process_key(&mut self, ev: KeyEvent) {
        // Key-triggered completion takes priority over built-in commands.
        if self.completion_key_matches(ev) {
            let ctx = self.completion_context();
            self.completion.on_key(ev, ctx);
            return;
        }
        if self.run_command(ev) {
            return;
        }

        let shift = ev.modifiers.contains(Modifiers::SHIFT);
        let action = if shift {
            SelectionAction::Extend
        } else {
            SelectionAction::Clear
        };
        let command = ev.modifiers.contains(Modifiers::CTRL) || ev.modifiers.contains(Modifiers::META);

        match ev.key {
            Key::Left | Key::Right => {
                let dir: isize = if ev.key == Key::Left { -1 } else { 1 };
                if command {
                    self.text.move_words(dir, action);
                } else if shift {
                    self.text.move_caret(dir, 0);
                } else {
                    self.text.move_caret(dir, dir);
                    self.text.clear_selection();
                }
                self.text.scroll_to_caret();
            }
            Key::Up | Key::Down => {
                let dir: isize = if ev.key == Key::Up { -1 } else { 1 };
                self.text.move_lines(dir, action);
                self.text.scroll_to_caret();
            }
            Key::PageUp | Key::PageDown => {
                let dir: isize = if ev.key == Key::PageUp { -1 } else { 1 };
                self.text.move_pages(dir, action);
                self.text.scroll_to_caret();
            }
            Key::Home => {
                if command {
                    self.text.move_text_start(action);
                } else {
                    self.text.move_line_start(action);
                }
                self.text.scroll_to_caret();
            }
            Key::End => {
                if command {
                    self.text.move_text_end(action);
                } else {
                    self.text.move_line_end(action);
                }
                self.text.scroll_to_caret();
            }
            Key::Enter => self.on_insert_line_break(),
            Key::Tab => self.on_tab(shift),
            Key::Backspace => self.on_backspace(),
            Key::Delete => self.on_delete(),
            Key::Escape => {
                self.completion.cancel();
                if self.mode.is_snippet() || self.mode.is_column_edit() {
                    self.set_mode(Mode::Normal);
                }
            }
            Key::Char(c) if command => match c.to_ascii_lowercase() {
                'c' => {
                    self.copy();
                }
                'x' => {
                    self.cut();
                }
                'a' => {
                    let len = self.text.len();
                    self.text.set_caret(len, 0);
                }
                'z' => {
                    if shift {
                        self.redo();
                    } else {
                        self.undo();
                    }
                }
                'y' => {
                    self.redo();
                }
                _ => {}
            },
            Key::Char(_) => {}
        }
    }

    fn completion_key_matches(&self, ev: KeyEvent) -> bool {
        self.completion.has_completors() && self.completion.matches_key(ev)
    }

    // ---- text input ------------------------------------------------------

    /// Handle a text-input event: bracket/quote auto-pairing, auto-inserted
    /// counterpart consumption, then plain insertion.
    pub fn on_text_input(&mut self, ev: EditEvent) {
        if self.is_read_only() || ev.text.is_empty() {
            return;
        }

        if self.mode.is_column_edit() {
            let has_cursors = matches!(&self.mode, Mode::ColumnEdit(s) if !s.cursors.is_empty());
            if has_cursors {
                self.on_column_edit_input(ev);
                return;
            }
        }

        let r = ev.text.chars().next().unwrap();
        let (start, end) = ev.range;

        match self.text.brackets.get_counterpart(r) {
            Some((counterpart, true)) => {
                let mut auto_insert = true;
                if counterpart != r {
                    // Brackets only look at the following character.
                    if self.is_near_word_char(start, false) {
                        auto_insert = false;
                    }
                } else if self.is_near_word_char(start, true) || self.is_near_word_char(start, false)
                {
                    // Quote-like pairs suppress on either neighbor.
                    auto_insert = false;
                }

                let mut replaced = ev.text.clone();
                if auto_insert {
                    replaced.push(counterpart);
                }
                self.replace_range(start, end, &replaced);

                if auto_insert {
                    self.text.move_caret(-1, -1);
                    let (caret, _) = self.text.selection();
                    self.auto_insertions.insert(caret, counterpart);
                } else {
                    self.auto_insertions.remove(&start);
                }
            }
            Some((_, false)) => {
                // Closing side: consume a tracked auto-insertion instead of
                // inserting a duplicate.
                let next = self.text.read_rune_at(start);
                if next.is_some() && next == self.auto_insertions.get(&start).copied() {
                    self.text.move_caret(1, 1);
                    self.auto_insertions.remove(&start);
                } else {
                    self.replace_range(start, end, &ev.text);
                }
            }
            None => {
                self.auto_insertions.remove(&start);
                self.replace_range(start, end, &ev.text);
            }
        }

        self.text.scroll_to_caret();
        self.text.move_caret(0, 0);
        self.last_input = Some(ev);

        let ctx = self.completion_context();
        self.completion.on_text(ctx);
    }

    fn is_near_word_char(&self, rune_off: usize, backward: bool) -> bool {
        let pos = if backward {
            match rune_off.checked_sub(1) {
                Some(p) => p,
                None => return false,
            }
        } else {
            rune_off
        };
        self.text
            .read_rune_at(pos)
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
    }

    /// Replace a rune range and place the caret after the inserted text.
    fn replace_range(&mut self, start: usize, end: usize, text: &str) -> usize {
        let (lo, hi) = (start.min(end), start.max(end));
        let inserted = self.text.replace(lo, hi, text);
        self.text.set_caret(lo + inserted, lo + inserted);
        self.decorations.on_edit(lo, hi, inserted);
        if let Mode::Snippet(ctx) = &mut self.mode {
            ctx.on_edit(lo, hi, inserted);
        }
        inserted
    }

    /// Insert text at the selection, replacing it.
    pub fn insert(&mut self, text: &str) -> usize {
        if self.is_read_only() {
            return 0;
        }
        let (start, end) = self.text.selection();
        self.replace_range(start, end, text)
    }

    /// Insert a parsed snippet at the selection and enter snippet mode at
    /// its first tab stop.
    pub fn insert_snippet(&mut self, template: &str) -> Result<usize, EditorError> {
        if self.is_read_only() {
            return Ok(0);
        }
        let parsed = SnippetTemplate::parse(template)?;
        let (start, end) = self.text.selection();
        let lo = start.min(end);
        let inserted = self.replace_range(start, end, &parsed.text);

        let mut ctx = SnippetContext::new(&parsed, lo);
        if let Some((s, e)) = ctx.next_tab_stop() {
            self.text.set_caret(s, e);
        }
        self.set_mode(Mode::Snippet(ctx));
        Ok(inserted)
    }

    // ---- deletion --------------------------------------------------------

    /// Delete the selection, or `graphemes` clusters from the caret when
    /// the selection is empty. Returns the number of runes removed.
    pub fn delete(&mut self, graphemes: isize) -> usize {
        if self.is_read_only() {
            return 0;
        }
        let (start, end) = self.text.selection();
        let (lo, hi) = if start != end {
            (start.min(end), start.max(end))
        } else {
            let target = self.text.move_by_graphemes(start, graphemes);
            (start.min(target), start.max(target))
        };
        if lo == hi {
            return 0;
        }
        self.replace_range(lo, hi, "");
        hi - lo
    }

    /// Delete the selected lines (or the caret's line).
    pub fn delete_line(&mut self) -> usize {
        if self.is_read_only() {
            return 0;
        }
        let (start, end) = self.text.selected_line_range();
        if start == end {
            return 0;
        }
        self.replace_range(start, end, "");
        end - start
    }

    /// Backspace: cancel leading indentation by up to one tab stop, remove a
    /// tracked auto-inserted pair as a whole, otherwise delete one grapheme
    /// cluster (or the selection).
    pub fn on_backspace(&mut self) {
        if self.is_read_only() {
            return;
        }
        let (start, end) = self.text.selection();
        if start == end && start > 0 {
            let prev = self.text.read_rune_at(start - 1);
            if prev == Some(' ') {
                let (line_text, line_start, _) = self.text.selected_line_text();
                let leading: Vec<char> = line_text.chars().take(end - line_start).collect();
                if leading.iter().all(|&c| c == ' ' || c == '\t') {
                    let tab_width = self.text.tab_width();
                    let mut moves = 0usize;
                    for &c in leading.iter().rev() {
                        if c == ' ' && moves < tab_width {
                            moves += 1;
                        } else {
                            break;
                        }
                    }
                    if moves > 0 {
                        self.text.move_caret(0, -(moves as isize));
                    }
                }
            } else if let Some(&inserted) = self.auto_insertions.get(&start) {
                if let Some((counterpart, is_opening)) = self.text.brackets.get_counterpart(inserted)
                {
                    if (!is_opening || inserted == counterpart) && prev == Some(counterpart) {
                        // Select both pair members so the delete below
                        // removes them together.
                        self.text.move_caret(-1, 1);
                    }
                }
                self.auto_insertions.remove(&start);
            }
        }
        self.delete(-1);
    }

    /// Forward delete: one grapheme cluster or the selection.
    pub fn on_delete(&mut self) {
        self.delete(1);
    }

    // ---- line break and tab ----------------------------------------------

    /// Insert a hard break, copying the current line's leading whitespace.
    pub fn on_insert_line_break(&mut self) {
        if self.is_read_only() {
            return;
        }
        self.completion.cancel();
        let (start, end) = self.text.selection();
        let (lo, hi) = (start.min(end), start.max(end));
        let inserted = self.text.indent_on_break();
        self.decorations.on_edit(lo, hi, inserted);
        if let Mode::Snippet(ctx) = &mut self.mode {
            ctx.on_edit(lo, hi, inserted);
        }
        self.text.scroll_to_caret();
        self.text.move_caret(0, 0);
    }

    /// Tab: navigate snippet stops in snippet mode, otherwise indent (or
    /// unindent with `shift`).
    pub fn on_tab(&mut self, shift: bool) {
        if self.is_read_only() {
            return;
        }

        if let Mode::Snippet(ctx) = &mut self.mode {
            let stop = if shift {
                ctx.prev_tab_stop()
            } else {
                ctx.next_tab_stop()
            };
            if let Some((start, end)) = stop {
                self.text.set_caret(start, end);
            }
            return;
        }

        if self.text.indent_lines(shift) > 0 {
            self.text.move_caret(0, 0);
            self.text.scroll_to_caret();
        }
    }

    // ---- clipboard -------------------------------------------------------

    /// Copy the selection, or the caret's line (with a trailing newline)
    /// when the selection is empty. Returns the copied text.
    pub fn copy(&mut self) -> Option<String> {
        let text = if self.text.selection_len() == 0 {
            let (mut line, _, _) = self.text.selected_line_text();
            if !line.is_empty() && !line.ends_with('\n') {
                line.push('\n');
            }
            line
        } else {
            self.text.selected_text()
        };

        if text.is_empty() {
            return None;
        }
        if let Some(clipboard) = self.clipboard.as_mut() {
            clipboard.write("application/text", &text);
        }
        Some(text)
    }

    /// Copy, then delete the selection or the caret's line.
    pub fn cut(&mut self) -> Option<String> {
        let line_op = self.text.selection_len() == 0;
        let text = self.copy()?;
        if !self.is_read_only() {
            if line_op {
                self.delete_line();
            } else {
                self.delete(0);
            }
        }
        Some(text)
    }

    fn on_paste_event(&mut self, content: &str) {
        if self.is_read_only() {
            return;
        }
        let text = match &self.on_paste {
            Some(hook) => hook(content),
            None => content.to_string(),
        };
        if text.is_empty() {
            return;
        }
        self.insert(&text);
        self.text.scroll_to_caret();
        self.text.move_caret(0, 0);
    }

    // ---- undo / redo -----------------------------------------------------

    /// Undo the latest edit group, restoring the captured caret.
    pub fn undo(&mut self) {
        if self.is_read_only() {
            return;
        }
        if let Some(cursors) = self.text.undo() {
            if let Some(last) = cursors.last() {
                self.text.set_caret(last.start, last.end);
            }
            let len = self.text.len();
            self.decorations.clip_to(len);
            self.text.scroll_to_caret();
        }
    }

    /// Redo the latest undone edit group, restoring the captured caret.
    pub fn redo(&mut self) {
        if self.is_read_only() {
            return;
        }
        if let Some(cursors) = self.text.redo() {
            if let Some(last) = cursors.last() {
                self.text.set_caret(last.start, last.end);
            }
            let len = self.text.len();
            self.decorations.clip_to(len);
            self.text.scroll_to_caret();
        }
    }

    // ---- column edit -----------------------------------------------------

    /// Seed column-edit mode with a single cursor at `pos` (viewport
    /// coordinates).
    pub fn start_column_selection(&mut self, pos: Point) {
        debug!("start column selection at {pos:?}");
        self.completion.cancel();

        let scroll = self.text.scroll_off();
        let line_height = self.text.line_height();
        let total = self.text.paragraph_count();

        let doc_y = pos.y + scroll.y;
        let line = ((doc_y / line_height).floor().max(0.0) as usize).min(total.saturating_sub(1));
        let col = self.text.closest_to_xy(pos.x + scroll.x, doc_y).col;

        self.set_mode(Mode::ColumnEdit(ColumnEditState {
            anchor: pos,
            cursors: vec![ColumnCursor {
                line,
                col,
                start_x: pos.x,
                end_x: pos.x,
            }],
        }));
    }

    /// Re-derive the column cursor set from the rectangle between the drag
    /// anchor and `pos`: one cursor per covered line, column resolved at the
    /// rectangle's left edge and clamped into ragged lines.
    pub fn update_column_selection(&mut self, pos: Point) {
        let Mode::ColumnEdit(state) = &self.mode else {
            return;
        };
        if state.cursors.is_empty() {
            return;
        }
        let anchor = state.anchor;

        let min_x = anchor.x.min(pos.x);
        let max_x = anchor.x.max(pos.x);
        let min_y = anchor.y.min(pos.y);
        let max_y = anchor.y.max(pos.y);

        let scroll = self.text.scroll_off();
        let line_height = self.text.line_height();
        let total = self.text.paragraph_count() as isize;

        let start_line = ((min_y + scroll.y) / line_height).floor() as isize;
        let end_line = ((max_y + scroll.y) / line_height).floor() as isize;

        let mut cursors = Vec::new();
        for line in start_line..=end_line {
            if line < 0 || line >= total {
                continue;
            }
            let doc_y = line as f32 * line_height + line_height / 2.0;
            let col = self.text.closest_to_xy(min_x + scroll.x, doc_y).col;
            cursors.push(ColumnCursor {
                line: line as usize,
                col,
                start_x: min_x,
                end_x: max_x,
            });
        }
        debug!("column selection spans {} lines", cursors.len());

        if let Mode::ColumnEdit(state) = &mut self.mode {
            state.anchor = anchor;
            state.cursors = cursors;
        }
    }

    /// Insert `ev.text` at every column cursor, grouped as one undo step;
    /// every cursor advances by the inserted rune count.
    fn on_column_edit_input(&mut self, ev: EditEvent) {
        let text = ev.text.clone();
        let mut cursors = match &mut self.mode {
            Mode::ColumnEdit(state) => std::mem::take(&mut state.cursors),
            _ => return,
        };
        debug!("column input {:?} at {} cursors", text, cursors.len());

        self.buffer.borrow_mut().group_begin();
        for cursor in &mut cursors {
            let off = self.text.convert_pos(cursor.line as isize, cursor.col);
            let inserted = self.text.replace(off, off, &text);
            self.text.set_caret(off + inserted, off + inserted);
            self.decorations.on_edit(off, off, inserted);
            cursor.col += inserted;
        }
        self.buffer.borrow_mut().group_end();

        if let Mode::ColumnEdit(state) = &mut self.mode {
            state.cursors = cursors;
        }
        self.text.scroll_to_caret();
        self.text.move_caret(0, 0);
        self.last_input = Some(ev);
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit(text: &str) -> EditEvent {
        EditEvent::new(0, 0, text)
    }

    #[test]
    fn test_insert_replaces_selection() {
        let mut editor = Editor::with_text("hello world");
        editor.set_caret(0, 5);
        editor.insert("goodbye");
        assert_eq!(editor.text(), "goodbye world");
        assert_eq!(editor.selection(), (7, 7));
    }

    #[test]
    fn test_read_only_blocks_mutation() {
        let mut editor = Editor::with_text("abc");
        editor.set_read_only(true);
        assert_eq!(editor.insert("x"), 0);
        editor.on_backspace();
        assert_eq!(editor.text(), "abc");
        editor.set_read_only(false);
        assert_eq!(editor.insert("x"), 1);
    }

    #[test]
    fn test_process_event_reports_change_and_select() {
        let mut editor = Editor::new();
        let events = editor.process_event(InputEvent::Edit(edit("a")));
        assert!(events.contains(&EditorEvent::Change));
        assert!(events.contains(&EditorEvent::Select));
    }

    #[test]
    fn test_delete_selection_or_grapheme() {
        let mut editor = Editor::with_text("ab");
        editor.set_caret(2, 2);
        assert_eq!(editor.delete(-1), 1);
        assert_eq!(editor.text(), "a");

        let mut editor = Editor::with_text("hello");
        editor.set_caret(1, 4);
        assert_eq!(editor.delete(-1), 3);
        assert_eq!(editor.text(), "ho");
    }

    #[test]
    fn test_undo_restores_caret() {
        let mut editor = Editor::with_text("hello");
        editor.set_caret(2, 2);
        editor.insert("XY");
        assert_eq!(editor.text(), "heXYllo");
        editor.undo();
        assert_eq!(editor.text(), "hello");
        assert_eq!(editor.selection(), (2, 2));
        editor.redo();
        assert_eq!(editor.text(), "heXYllo");
    }

    #[test]
    fn test_copy_empty_selection_copies_line() {
        let mut editor = Editor::with_text("one\ntwo");
        editor.set_caret(5, 5);
        assert_eq!(editor.copy(), Some("two\n".to_string()));
    }

    #[test]
    fn test_cut_line() {
        let mut editor = Editor::with_text("one\ntwo\nthree");
        editor.set_caret(5, 5);
        let cut = editor.cut().unwrap();
        assert_eq!(cut, "two\n");
        assert_eq!(editor.text(), "one\nthree");
    }

    #[test]
    fn test_plugin_command_dispatch() {
        let mut editor = Editor::with_text("x");
        let binding = KeyBinding {
            key: Key::Char('k'),
            modifiers: Modifiers::CTRL,
        };
        editor.register_command("test", binding, |ed, _ev| {
            let len = ed.len();
            ed.set_caret(len, len);
            ed.insert("!");
        });

        editor.process_event(InputEvent::Key(KeyEvent::new(Key::Char('k'), Modifiers::CTRL)));
        assert_eq!(editor.text(), "x!");

        editor.unregister_commands("test");
        editor.process_event(InputEvent::Key(KeyEvent::new(Key::Char('k'), Modifiers::CTRL)));
        assert_eq!(editor.text(), "x!");
    }

    #[test]
    fn test_paste_hook() {
        let mut editor = Editor::new();
        editor.set_paste_hook(|s| s.replace("\r\n", "\n"));
        editor.process_event(InputEvent::Paste("a\r\nb".into()));
        assert_eq!(editor.text(), "a\nb");
    }
}
