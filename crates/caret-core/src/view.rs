//! Interactive view over the shaped document.
//!
//! `TextView` owns the layout, the viewport, and the caret state. It maps
//! high-level motions (lines, pages, words, coordinates) to rune offsets,
//! keeping every resting caret position on a grapheme-cluster boundary, and
//! resolves selection regions for rendering.

use std::cell::RefCell;
use std::rc::Rc;

use crate::brackets::BracketQuotes;
use crate::geom::{Point, Rect, Size};
use crate::layout::{Alignment, CombinedPos, TextLayout, TextParams, WrapPolicy};
use crate::line::{Paragraph, Region};
use crate::shaper::{MonoShaper, Shaper};
use crate::source::PieceTableReader;
use crate::storage::CursorPos;

/// What a caret motion does to the selection anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionAction {
    /// Collapse the selection onto the caret after the motion.
    Clear,
    /// Leave the anchor where it is; the caret extends the selection.
    Extend,
}

#[derive(Debug, Clone, Copy, Default)]
struct CaretState {
    /// Caret position in runes; also the start of the selection.
    start: usize,
    /// Selection anchor. `start == end` means no selection; `start` may be
    /// greater than `end`.
    end: usize,
    /// Sticky horizontal bias carried across vertical motion.
    xoff: f32,
}

/// Shared handle to the document source.
pub type SharedSource = Rc<RefCell<PieceTableReader>>;

/// Viewport, caret, and layout state over a shared document source.
pub struct TextView {
    src: SharedSource,
    shaper: Box<dyn Shaper>,
    params: TextParams,
    layout: TextLayout,
    valid: bool,

    caret: CaretState,
    scroll_off: Point,
    view_size: Size,

    /// Expand tabs to spaces when inserting indentation.
    pub soft_tab: bool,
    /// Bracket and quote pairs used by auto-insertion and matching.
    pub brackets: BracketQuotes,

    pub(crate) word_separators: String,
    pub(crate) word_predicate: Option<Box<dyn Fn(char) -> bool>>,
}

impl TextView {
    /// Create a view over `src` using the reference monospace shaper.
    pub fn new(src: SharedSource) -> Self {
        Self {
            src,
            shaper: Box::new(MonoShaper::new()),
            params: TextParams::default(),
            layout: TextLayout::new(),
            valid: false,
            caret: CaretState::default(),
            scroll_off: Point::default(),
            view_size: Size::new(800.0, 600.0),
            soft_tab: false,
            brackets: BracketQuotes::default(),
            word_separators: String::new(),
            word_predicate: None,
        }
    }

    /// Swap in a host shaper.
    pub fn set_shaper(&mut self, shaper: Box<dyn Shaper>) {
        self.shaper = shaper;
        self.invalidate();
    }

    /// The shared document source.
    pub fn source(&self) -> &SharedSource {
        &self.src
    }

    pub fn params(&self) -> &TextParams {
        &self.params
    }

    /// Mark the layout invalid; it is recomputed lazily on the next query.
    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    fn make_valid(&mut self) {
        if self.valid {
            return;
        }
        let text = self.src.borrow().text();
        self.layout.layout(&text, self.shaper.as_mut(), &self.params);
        self.valid = true;
    }

    fn set_params(&mut self, update: impl FnOnce(&mut TextParams)) {
        let mut next = self.params.clone();
        update(&mut next);
        if next != self.params {
            self.params = next;
            self.invalidate();
        }
    }

    pub fn set_font_size(&mut self, px_per_em: f32) {
        self.set_params(|p| p.px_per_em = px_per_em);
    }

    pub fn set_line_height(&mut self, line_height: f32, scale: f32) {
        self.set_params(|p| {
            p.line_height = line_height;
            p.line_height_scale = scale;
        });
    }

    pub fn set_max_width(&mut self, max_width: f32) {
        self.set_params(|p| p.max_width = max_width);
    }

    pub fn set_min_width(&mut self, min_width: f32) {
        self.set_params(|p| p.min_width = min_width);
    }

    pub fn set_tab_width(&mut self, tab_width: usize) {
        self.set_params(|p| p.tab_width = tab_width.max(1));
    }

    pub fn tab_width(&self) -> usize {
        self.params.tab_width
    }

    pub fn set_wrap_policy(&mut self, wrap: WrapPolicy) {
        self.set_params(|p| p.wrap = wrap);
    }

    pub fn set_alignment(&mut self, alignment: Alignment) {
        self.set_params(|p| p.alignment = alignment);
    }

    /// Set the viewport size in pixels.
    pub fn set_viewport(&mut self, size: Size) {
        if size != self.view_size {
            self.view_size = size;
            self.invalidate();
        }
    }

    pub fn viewport_size(&self) -> Size {
        self.view_size
    }

    /// The viewport rectangle in document coordinates.
    pub fn viewport(&self) -> Rect {
        Rect::from_size(self.view_size).translate(self.scroll_off)
    }

    /// Full dimensions of the shaped document.
    pub fn dimensions(&mut self) -> Size {
        self.make_valid();
        self.layout.size()
    }

    pub fn line_height(&mut self) -> f32 {
        self.make_valid();
        self.layout.line_height()
    }

    /// Number of paragraphs (hard-break-delimited lines).
    pub fn paragraph_count(&mut self) -> usize {
        self.make_valid();
        self.layout.paragraphs().len()
    }

    /// The laid-out paragraphs.
    pub fn paragraphs(&mut self) -> &[Paragraph] {
        self.make_valid();
        self.layout.paragraphs()
    }

    /// Length of the document in runes.
    pub fn len(&self) -> usize {
        self.src.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whole document text.
    pub fn text(&self) -> String {
        self.src.borrow().text()
    }

    /// Byte offset of the rune at `rune_off`, clamped to the document.
    pub fn byte_offset(&mut self, rune_off: usize) -> usize {
        let runes = self.closest_to_rune(rune_off).runes;
        self.src.borrow().rune_offset(runes)
    }

    /// Read the rune at `rune_off`, if any.
    pub fn read_rune_at(&self, rune_off: usize) -> Option<char> {
        self.src.borrow().read_rune_at(rune_off)
    }

    // ---- position queries ------------------------------------------------

    pub fn closest_to_rune(&mut self, rune: usize) -> CombinedPos {
        self.make_valid();
        self.layout.closest_to_rune(rune)
    }

    pub fn closest_to_line_col(&mut self, line: usize, col: usize) -> CombinedPos {
        self.make_valid();
        self.layout.closest_to_line_col(line, col)
    }

    pub fn closest_to_xy(&mut self, x: f32, y: f32) -> CombinedPos {
        self.make_valid();
        self.layout.closest_to_xy(x, y)
    }

    /// Like [`closest_to_xy`](Self::closest_to_xy), but snapped to the
    /// grapheme-cluster boundary whose x position is nearest.
    pub fn closest_to_xy_graphemes(&mut self, x: f32, y: f32) -> CombinedPos {
        let pos = self.closest_to_xy(x, y);
        let first = self.move_by_graphemes(pos.runes, 0);
        let distance = if first > pos.runes { -1 } else { 1 };
        let second = self.move_by_graphemes(first, distance);

        let first_pos = self.closest_to_rune(first);
        let second_pos = self.closest_to_rune(second);
        if (first_pos.x - x).abs() > (second_pos.x - x).abs() {
            second_pos
        } else {
            first_pos
        }
    }

    /// Rune index after moving `graphemes` cluster boundaries from
    /// `start_rune`.
    pub fn move_by_graphemes(&mut self, start_rune: usize, graphemes: isize) -> usize {
        self.make_valid();
        let table = self.layout.graphemes();
        if table.is_empty() {
            return start_rune;
        }
        let idx = table.partition_point(|&g| g < start_rune);
        let idx = (idx as isize + graphemes).clamp(0, table.len() as isize - 1) as usize;
        table[idx]
    }

    fn clamp_caret_to_graphemes(&mut self) {
        self.caret.start = self.move_by_graphemes(self.caret.start, 0);
        self.caret.end = self.move_by_graphemes(self.caret.end, 0);
    }

    // ---- caret and selection ---------------------------------------------

    /// Selection endpoints as `(caret, anchor)`; caret may be after anchor.
    pub fn selection(&self) -> (usize, usize) {
        (self.caret.start, self.caret.end)
    }

    /// Selection length in runes.
    pub fn selection_len(&self) -> usize {
        self.caret.start.abs_diff(self.caret.end)
    }

    /// Move the caret to `start` and the anchor to `end`, snapping both to
    /// grapheme boundaries.
    pub fn set_caret(&mut self, start: usize, end: usize) {
        self.caret.start = self.closest_to_rune(start).runes;
        self.caret.end = self.closest_to_rune(end).runes;
        self.clamp_caret_to_graphemes();
    }

    /// Collapse the selection onto the caret.
    pub fn clear_selection(&mut self) {
        self.caret.end = self.caret.start;
    }

    fn update_selection(&mut self, action: SelectionAction) {
        if action == SelectionAction::Clear {
            self.clear_selection();
        }
    }

    /// Visual line and column of the caret.
    pub fn caret_pos(&mut self) -> (usize, usize) {
        let start = self.caret.start;
        let pos = self.closest_to_rune(start);
        (pos.line, pos.col)
    }

    /// Caret coordinates relative to the viewport.
    pub fn caret_coords(&mut self) -> Point {
        let start = self.caret.start;
        let pos = self.closest_to_rune(start);
        Point::new(pos.x - self.scroll_off.x, pos.y - self.scroll_off.y)
    }

    /// Currently selected text; a short document read yields whatever was
    /// available.
    pub fn selected_text(&mut self) -> String {
        let src = self.src.borrow();
        let start_off = src.rune_offset(self.caret.start.min(self.caret.end));
        let end_off = src.rune_offset(self.caret.start.max(self.caret.end));
        let mut buf = vec![0u8; end_off - start_off];
        let n = src.read_at(&mut buf, start_off);
        buf.truncate(n);
        String::from_utf8(buf).unwrap_or_default()
    }

    // ---- motion ----------------------------------------------------------

    /// Shift both caret ends by the given numbers of grapheme clusters and
    /// reset the sticky horizontal bias.
    pub fn move_caret(&mut self, start_delta: isize, end_delta: isize) {
        self.caret.xoff = 0.0;
        self.caret.start = self.move_by_graphemes(self.caret.start, start_delta);
        self.caret.end = self.move_by_graphemes(self.caret.end, end_delta);
    }

    /// Move the caret vertically by `distance` visual lines, preserving the
    /// horizontal position via the sticky bias.
    pub fn move_lines(&mut self, distance: isize, action: SelectionAction) {
        let start = self.caret.start;
        let caret = self.closest_to_rune(start);
        let x = caret.x + self.caret.xoff;

        self.make_valid();
        let line_count = self.layout.lines().len().max(1);
        let target = (caret.line as isize + distance).clamp(0, line_count as isize - 1) as usize;
        let line_pos = self.closest_to_line_col(target, 0);
        let pos = self.closest_to_xy_graphemes(x, line_pos.y);

        self.caret.start = pos.runes;
        self.caret.xoff = x - pos.x;
        self.update_selection(action);
    }

    /// Move the caret by vertical pages of text.
    pub fn move_pages(&mut self, pages: isize, action: SelectionAction) {
        let start = self.caret.start;
        let caret = self.closest_to_rune(start);
        let x = caret.x + self.caret.xoff;
        let y = caret.y + pages as f32 * self.view_size.height;
        let pos = self.closest_to_xy_graphemes(x, y);

        self.caret.start = pos.runes;
        self.caret.xoff = x - pos.x;
        self.update_selection(action);
    }

    /// Move the caret to the start of the text.
    pub fn move_text_start(&mut self, action: SelectionAction) {
        let end = self.caret.end;
        let caret = self.closest_to_rune(end);
        self.caret.start = 0;
        self.caret.end = caret.runes;
        self.caret.xoff = -caret.x;
        self.update_selection(action);
        self.clamp_caret_to_graphemes();
    }

    /// Move the caret to the end of the text.
    pub fn move_text_end(&mut self, action: SelectionAction) {
        let caret = self.closest_to_rune(usize::MAX);
        self.caret.start = caret.runes;
        self.caret.xoff = self.params.max_width - caret.x;
        self.update_selection(action);
        self.clamp_caret_to_graphemes();
    }

    /// Move the caret to column zero of its visual line.
    pub fn move_line_start(&mut self, action: SelectionAction) {
        let start = self.caret.start;
        let caret = self.closest_to_rune(start);
        let caret = self.closest_to_line_col(caret.line, 0);
        self.caret.start = caret.runes;
        self.caret.xoff = -caret.x;
        self.update_selection(action);
        self.clamp_caret_to_graphemes();
    }

    /// Move the caret past the last column of its visual line.
    pub fn move_line_end(&mut self, action: SelectionAction) {
        let start = self.caret.start;
        let caret = self.closest_to_rune(start);
        let caret = self.closest_to_line_col(caret.line, usize::MAX);
        self.caret.start = caret.runes;
        self.caret.xoff = self.params.max_width - caret.x;
        self.update_selection(action);
        self.clamp_caret_to_graphemes();
    }

    /// Move the caret to the grapheme boundary closest to `point`, given in
    /// viewport coordinates.
    pub fn move_coord(&mut self, point: Point) {
        let x = point.x + self.scroll_off.x;
        let y = point.y + self.scroll_off.y;
        self.caret.start = self.closest_to_xy_graphemes(x, y).runes;
        self.caret.xoff = 0.0;
    }

    // ---- scrolling -------------------------------------------------------

    /// Maximum scroll offsets.
    pub fn scroll_bounds(&mut self) -> Size {
        let dims = self.dimensions();
        Size::new(
            (dims.width - self.view_size.width).max(0.0),
            (dims.height - self.view_size.height).max(0.0),
        )
    }

    pub fn scroll_off(&self) -> Point {
        self.scroll_off
    }

    pub fn scroll_abs(&mut self, x: f32, y: f32) {
        let bounds = self.scroll_bounds();
        self.scroll_off.x = x.clamp(0.0, bounds.width);
        self.scroll_off.y = y.clamp(0.0, bounds.height);
    }

    pub fn scroll_rel(&mut self, dx: f32, dy: f32) {
        let (x, y) = (self.scroll_off.x + dx, self.scroll_off.y + dy);
        self.scroll_abs(x, y);
    }

    /// Scroll the minimal distance so the caret's vertical band is inside
    /// the viewport.
    pub fn scroll_to_caret(&mut self) {
        let start = self.caret.start;
        let caret = self.closest_to_rune(start);
        let min_y = caret.y - caret.ascent;
        let max_y = caret.y + caret.descent;

        let mut dist = 0.0;
        if min_y - self.scroll_off.y < 0.0 {
            dist = min_y - self.scroll_off.y;
        } else if max_y - (self.scroll_off.y + self.view_size.height) > 0.0 {
            dist = max_y - (self.scroll_off.y + self.view_size.height);
        }
        if dist != 0.0 {
            self.scroll_rel(0.0, dist);
        }
    }

    // ---- text mutation ---------------------------------------------------

    /// Replace the whole document. Returns the number of runes inserted.
    pub fn set_text(&mut self, text: &str) -> usize {
        self.src.borrow_mut().set_text(text);
        self.caret = CaretState::default();
        self.invalidate();
        self.len()
    }

    /// Replace the rune range between `start` and `end` (either order) with
    /// `s`, adjusting both caret ends the minimal distance. Returns the
    /// number of runes inserted.
    pub fn replace(&mut self, start: usize, end: usize, s: &str) -> usize {
        let (start, end) = if start > end { (end, start) } else { (start, end) };
        let start = self.closest_to_rune(start).runes;
        let end = self.closest_to_rune(end).runes;
        let inserted = s.chars().count();
        let new_end = start + inserted;

        self.src.borrow_mut().replace(start, end, s);

        let adjust = |pos: usize| {
            if pos > end {
                pos - end + new_end
            } else if pos > new_end {
                new_end
            } else {
                pos
            }
        };
        self.caret.start = adjust(self.caret.start);
        self.caret.end = adjust(self.caret.end);
        self.invalidate();
        inserted
    }

    /// Undo the latest edit group and mark the layout invalid.
    pub fn undo(&mut self) -> Option<Vec<CursorPos>> {
        let cursors = self.src.borrow_mut().undo();
        if cursors.is_some() {
            self.invalidate();
        }
        cursors
    }

    /// Redo the latest undone edit group and mark the layout invalid.
    pub fn redo(&mut self) -> Option<Vec<CursorPos>> {
        let cursors = self.src.borrow_mut().redo();
        if cursors.is_some() {
            self.invalidate();
        }
        cursors
    }

    // ---- regions ---------------------------------------------------------

    /// Rectangles covering the visible glyphs of `[start, end)`.
    pub fn regions(&mut self, start: usize, end: usize) -> Vec<Region> {
        self.make_valid();
        let viewport = self.viewport();
        let mut out = Vec::new();
        let (start, end) = (start.min(end), start.max(end));
        self.layout.locate(viewport, start, end, &mut out);
        out
    }

    /// Hover hit test: resolve `point` (viewport coordinates) to a document
    /// position, or `None` outside the shaped text.
    pub fn query_pos(&mut self, point: Point) -> Option<(usize, usize, usize)> {
        let dims = self.dimensions();
        let x = point.x + self.scroll_off.x;
        let y = point.y + self.scroll_off.y;
        if x < 0.0 || y < 0.0 || y > dims.height {
            return None;
        }
        let pos = self.closest_to_xy_graphemes(x, y);
        Some((pos.line, pos.col, pos.runes))
    }

    // ---- paragraphs ------------------------------------------------------

    /// Find the paragraph containing `rune`, returning its index.
    pub fn find_paragraph(&mut self, rune: usize) -> (usize, Paragraph) {
        self.make_valid();
        let paragraphs = self.layout.paragraphs();
        if paragraphs.is_empty() {
            return (0, Paragraph::default());
        }
        let idx = paragraphs
            .partition_point(|p| p.rune_off + p.runes <= rune)
            .min(paragraphs.len() - 1);
        (idx, paragraphs[idx])
    }

    /// Convert a `(paragraph, column)` position to a rune offset snapped to
    /// a grapheme boundary.
    pub fn convert_pos(&mut self, line: isize, col: usize) -> usize {
        self.make_valid();
        let paragraphs = self.layout.paragraphs();
        if line < 0 || paragraphs.is_empty() {
            return 0;
        }
        let line = line as usize;
        if line >= paragraphs.len() {
            let p = paragraphs[paragraphs.len() - 1];
            return p.rune_off + p.runes;
        }
        let p = paragraphs[line];
        let rune_off = (p.rune_off + col).min(p.rune_off + p.runes);
        self.move_by_graphemes(rune_off, 0)
    }

    /// The paragraphs covered by the selection; with no selection, the
    /// paragraph holding the caret.
    pub fn selected_paragraphs(&mut self) -> Vec<Paragraph> {
        self.make_valid();
        if self.layout.paragraphs().is_empty() {
            return Vec::new();
        }
        let caret_start = self.caret.start.min(self.caret.end);
        let caret_end = self.caret.start.max(self.caret.end);

        let (start_idx, _) = self.find_paragraph(caret_start);
        let (end_idx, _) = self.find_paragraph(caret_end);

        let paragraphs = self.layout.paragraphs();
        let mut out = vec![paragraphs[start_idx]];
        for i in start_idx + 1..=end_idx {
            // Skip the final paragraph when the selection stops exactly at
            // its first rune.
            if i == end_idx && paragraphs[i].rune_off == caret_end {
                break;
            }
            out.push(paragraphs[i]);
        }
        out
    }

    /// Start and end rune offsets of the selected paragraphs.
    pub fn selected_line_range(&mut self) -> (usize, usize) {
        let paragraphs = self.selected_paragraphs();
        match (paragraphs.first(), paragraphs.last()) {
            (Some(first), Some(last)) => (first.rune_off, last.rune_off + last.runes),
            _ => (0, 0),
        }
    }

    /// Text of the selected paragraphs plus their rune range. An empty
    /// selection is treated as a single-line selection.
    pub fn selected_line_text(&mut self) -> (String, usize, usize) {
        let (start, end) = self.selected_line_range();
        let src = self.src.borrow();
        let start_off = src.rune_offset(start);
        let end_off = src.rune_offset(end);
        let mut buf = vec![0u8; end_off - start_off];
        let n = src.read_at(&mut buf, start_off);
        buf.truncate(n);
        (String::from_utf8(buf).unwrap_or_default(), start, end)
    }

    /// Whether the selection covers part of a single paragraph (rather than
    /// whole lines or multiple lines).
    pub fn partial_line_selected(&mut self) -> bool {
        if self.caret.start == self.caret.end {
            return false;
        }
        let paragraphs = self.selected_paragraphs();
        if paragraphs.len() != 1 {
            return false;
        }
        let caret_start = self.caret.start.min(self.caret.end);
        let caret_end = self.caret.start.max(self.caret.end);
        let p = paragraphs[0];

        if p.rune_off != caret_start {
            return true;
        }
        let last_rune = if p.runes > 0 {
            self.read_rune_at(p.rune_off + p.runes - 1)
        } else {
            None
        };
        if last_rune == Some('\n') {
            p.rune_off + p.runes != caret_end + 1
        } else {
            p.rune_off + p.runes != caret_end
        }
    }

    // ---- indentation -----------------------------------------------------

    /// The text used to indent one level.
    pub fn indentation(&self) -> String {
        if self.soft_tab {
            " ".repeat(self.params.tab_width)
        } else {
            "\t".to_string()
        }
    }

    /// Expand `s` when it is a single tab and soft tabs are enabled: the
    /// replacement advances the caret to the next tab stop of the paragraph.
    pub fn expand_tab(&mut self, start: usize, end: usize, s: &str) -> String {
        if !self.soft_tab || s != "\t" {
            return s.to_string();
        }
        let start = start.min(end);
        let (_, p) = self.find_paragraph(start);
        let tab_width = self.params.tab_width.max(1);
        let advance = start.saturating_sub(p.rune_off);
        let next_stop = (advance / tab_width + 1) * tab_width;
        " ".repeat(next_stop - advance)
    }

    /// Indent (or unindent) the selected paragraphs as one undo group.
    /// A single-line selection without `unindent` inserts indentation at the
    /// caret instead. Returns the number of runes added or removed.
    pub fn indent_lines(&mut self, unindent: bool) -> usize {
        let caret_start = self.caret.start.min(self.caret.end);
        let caret_end = self.caret.start.max(self.caret.end);
        let paragraphs = self.selected_paragraphs();

        if !unindent && paragraphs.len() <= 1 {
            let replacement = self.expand_tab(caret_start, caret_end, "\t");
            let inserted = self.replace(caret_start, caret_end, &replacement);
            self.set_caret(caret_start + inserted, caret_start + inserted);
            return inserted;
        }

        let tab_width = self.params.tab_width.max(1);
        let indent = self.indentation();
        let mut changed = 0usize;

        self.src.borrow_mut().group_begin();
        // Process bottom-up so earlier offsets stay valid.
        for p in paragraphs.iter().rev() {
            let line_start = p.rune_off;
            if unindent {
                let mut removed = 0usize;
                match self.read_rune_at(line_start) {
                    Some('\t') => removed = 1,
                    Some(' ') => {
                        while removed < tab_width
                            && self.read_rune_at(line_start + removed) == Some(' ')
                        {
                            removed += 1;
                        }
                    }
                    _ => {}
                }
                if removed > 0 {
                    self.src.borrow_mut().erase(line_start, line_start + removed);
                    self.caret.start = shift_left(self.caret.start, line_start, removed);
                    self.caret.end = shift_left(self.caret.end, line_start, removed);
                    changed += removed;
                }
            } else {
                self.src.borrow_mut().insert(line_start, &indent);
                let added = indent.chars().count();
                if self.caret.start >= line_start {
                    self.caret.start += added;
                }
                if self.caret.end >= line_start {
                    self.caret.end += added;
                }
                changed += added;
            }
        }
        self.src.borrow_mut().group_end();

        if changed > 0 {
            self.invalidate();
            self.clamp_caret_to_graphemes();
        }
        changed
    }

    /// Insert a hard break at the selection, copying the current paragraph's
    /// leading whitespace onto the new line.
    pub fn indent_on_break(&mut self) -> usize {
        let caret_start = self.caret.start.min(self.caret.end);
        let caret_end = self.caret.start.max(self.caret.end);
        let (_, p) = self.find_paragraph(caret_start);

        let mut leading = String::new();
        let mut off = p.rune_off;
        while off < caret_start {
            match self.read_rune_at(off) {
                Some(c @ (' ' | '\t')) => leading.push(c),
                _ => break,
            }
            off += 1;
        }

        let inserted = format!("\n{leading}");
        let count = self.replace(caret_start, caret_end, &inserted);
        self.set_caret(caret_start + count, caret_start + count);
        count
    }

    // ---- bracket matching ------------------------------------------------

    /// Find the innermost matching bracket pair around the caret, returning
    /// their rune offsets.
    pub fn nearest_matching_brackets(&mut self) -> Option<(usize, usize)> {
        let caret = self.caret.start;
        let len = self.len();
        if len == 0 {
            return None;
        }

        // Walk left for the nearest unbalanced opening bracket.
        let mut depth: i32 = 0;
        let mut left = None;
        let mut off = caret;
        while off > 0 {
            off -= 1;
            let c = self.read_rune_at(off)?;
            if self.brackets.is_closing_bracket(c) {
                depth += 1;
            } else if self.brackets.is_opening_bracket(c) {
                if depth == 0 {
                    left = Some((off, c));
                    break;
                }
                depth -= 1;
            }
        }
        let (left_off, open) = left?;
        let close = self.brackets.counterpart(open)?;

        // Walk right for its partner.
        let mut depth = 0i32;
        for off in caret..len {
            let c = self.read_rune_at(off)?;
            if c == open {
                depth += 1;
            } else if c == close {
                if depth == 0 {
                    return Some((left_off, off));
                }
                depth -= 1;
            }
        }
        None
    }
}

fn shift_left(pos: usize, at: usize, removed: usize) -> usize {
    if pos <= at {
        pos
    } else {
        pos.saturating_sub(removed).max(at)
    }
}
