//! Piece-table text storage.
//!
//! The document is the concatenation of *pieces*, each referencing a slice of
//! one of two append-only byte buffers: the original buffer holding the text
//! the table was created with, and the modify buffer holding every insertion
//! made since. Edits never move text; they only re-link pieces. Undo and redo
//! are implemented by saving the replaced span of the piece list as a
//! [`PieceRange`] and splicing it back on demand.

/// Identifies which backing buffer a piece references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    /// The read-only buffer holding the initial document text.
    Original,
    /// The append-only buffer holding inserted text.
    Modify,
}

/// An append-only text buffer with a rune index.
///
/// `rune_starts[i]` is the byte offset of rune `i`, letting piece splits
/// translate rune offsets to byte offsets in O(1).
#[derive(Debug, Default)]
struct TextBuffer {
    bytes: Vec<u8>,
    rune_starts: Vec<usize>,
}

impl TextBuffer {
    fn new() -> Self {
        Self::default()
    }

    /// Append text, returning `(rune_off, byte_off, rune_count)` of the
    /// appended run inside this buffer.
    fn append(&mut self, text: &str) -> (usize, usize, usize) {
        let rune_off = self.rune_starts.len();
        let byte_off = self.bytes.len();
        let mut runes = 0;
        for (i, _) in text.char_indices() {
            self.rune_starts.push(byte_off + i);
            runes += 1;
        }
        self.bytes.extend_from_slice(text.as_bytes());
        (rune_off, byte_off, runes)
    }

    /// Byte offset of the rune at `rune_idx`, clamped to the buffer end.
    fn rune_offset(&self, rune_idx: usize) -> usize {
        if rune_idx >= self.rune_starts.len() {
            self.bytes.len()
        } else {
            self.rune_starts[rune_idx]
        }
    }

    /// Byte length of the run of `rune_len` runes starting at `rune_off`.
    fn bytes_for_range(&self, rune_off: usize, rune_len: usize) -> usize {
        self.rune_offset(rune_off + rune_len) - self.rune_offset(rune_off)
    }

    fn slice(&self, byte_off: usize, byte_len: usize) -> &[u8] {
        &self.bytes[byte_off..byte_off + byte_len]
    }
}

/// A piece references a contiguous run of runes inside one backing buffer.
///
/// Invariants: `byte_len >= rune_len`, pieces never overlap, and the
/// concatenation of all piece text equals the document text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    /// Which backing buffer the piece reads from.
    pub source: BufferKind,
    /// Byte offset inside the backing buffer.
    pub byte_off: usize,
    /// Byte length of the referenced run.
    pub byte_len: usize,
    /// Rune offset inside the backing buffer.
    pub rune_off: usize,
    /// Rune length of the referenced run.
    pub rune_len: usize,
}

/// A caret position captured per edit, returned by undo/redo so callers can
/// restore the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorPos {
    /// Caret rune offset.
    pub start: usize,
    /// Selection-anchor rune offset.
    pub end: usize,
}

/// A captured span of the pre-edit piece list.
///
/// `restore` splices the saved pieces back over the `replaced` pieces that
/// took their place, and returns the inverse range so it can be pushed onto
/// the opposite stack. Sequence counters are captured at capture time.
#[derive(Debug, Clone)]
pub struct PieceRange {
    /// Index in the piece list where the span starts.
    at: usize,
    /// The pieces removed by the edit.
    saved: Vec<Piece>,
    /// How many pieces replaced them.
    replaced: usize,
    /// Document rune length before the edit.
    seq_rune_len: usize,
    /// Document byte length before the edit.
    seq_byte_len: usize,
    /// Rune index at which the edit happened.
    caret: usize,
    /// Undo group this entry belongs to, if any.
    group: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EditAction {
    None,
    Insert,
}

/// Piece-table document buffer with undo/redo.
pub struct PieceTable {
    original: TextBuffer,
    modify: TextBuffer,
    pieces: Vec<Piece>,
    /// Document length in runes.
    seq_rune_len: usize,
    /// Document length in bytes.
    seq_byte_len: usize,

    undo_stack: Vec<PieceRange>,
    redo_stack: Vec<PieceRange>,

    // Insertion-coalescing state. A single-rune insert that lands exactly at
    // the end of the previous insert grows the last inserted piece in place.
    last_action: EditAction,
    last_action_end: usize,
    last_insert_piece: Option<usize>,

    group_depth: u32,
    group_counter: u64,
    current_group: Option<u64>,
}

impl PieceTable {
    /// Create a piece table initialized with `text`.
    pub fn new(text: &str) -> Self {
        let mut table = Self::empty();
        table.init(text);
        table
    }

    /// Create an empty piece table.
    pub fn empty() -> Self {
        Self {
            original: TextBuffer::new(),
            modify: TextBuffer::new(),
            pieces: Vec::new(),
            seq_rune_len: 0,
            seq_byte_len: 0,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            last_action: EditAction::None,
            last_action_end: 0,
            last_insert_piece: None,
            group_depth: 0,
            group_counter: 0,
            current_group: None,
        }
    }

    fn init(&mut self, text: &str) {
        let (rune_off, byte_off, runes) = self.original.append(text);
        if runes == 0 {
            return;
        }
        self.pieces.push(Piece {
            source: BufferKind::Original,
            byte_off,
            byte_len: text.len(),
            rune_off,
            rune_len: runes,
        });
        self.seq_rune_len = runes;
        self.seq_byte_len = text.len();
    }

    /// Replace the whole document, discarding undo history.
    pub fn set_text(&mut self, text: &str) {
        *self = Self::new(text);
    }

    /// Document length in runes.
    pub fn len(&self) -> usize {
        self.seq_rune_len
    }

    /// Whether the document holds no text.
    pub fn is_empty(&self) -> bool {
        self.seq_rune_len == 0
    }

    /// Document length in bytes.
    pub fn byte_len(&self) -> usize {
        self.seq_byte_len
    }

    /// Number of pieces currently linked into the document.
    pub fn piece_count(&self) -> usize {
        self.pieces.len()
    }

    /// Depth of the undo stack, counting grouped edits once.
    pub fn undo_depth(&self) -> usize {
        let mut depth = 0;
        let mut last_group: Option<u64> = None;
        for entry in &self.undo_stack {
            match entry.group {
                Some(g) if last_group == Some(g) => {}
                g => {
                    depth += 1;
                    last_group = g;
                }
            }
        }
        depth
    }

    fn buf(&self, source: BufferKind) -> &TextBuffer {
        match source {
            BufferKind::Original => &self.original,
            BufferKind::Modify => &self.modify,
        }
    }

    fn record_action(&mut self, action: EditAction, rune_index: usize) {
        self.last_action = action;
        self.last_action_end = rune_index;
    }

    fn reset_coalescing(&mut self) {
        self.last_action = EditAction::None;
        self.last_insert_piece = None;
    }

    /// Locate the insert position for `rune_index`.
    ///
    /// Returns `(piece_index, rune_offset_within_piece)` where the offset is
    /// strictly inside the piece; a boundary position is reported as offset 0
    /// of the following index (which may be one past the last piece).
    fn find_insert_pos(&self, rune_index: usize) -> (usize, usize) {
        let mut acc = 0;
        for (idx, piece) in self.pieces.iter().enumerate() {
            let next = acc + piece.rune_len;
            if rune_index < next {
                return (idx, rune_index - acc);
            }
            acc = next;
        }
        (self.pieces.len(), 0)
    }

    /// Insert `text` at `rune_index`. Fails (returning `false`, mutating
    /// nothing) when the index is outside `[0, len]`.
    pub fn insert(&mut self, rune_index: usize, text: &str) -> bool {
        if rune_index > self.seq_rune_len {
            return false;
        }
        if text.is_empty() {
            return true;
        }

        self.redo_stack.clear();

        if self.try_append_to_last_piece(rune_index, text) {
            return true;
        }

        let (idx, in_off) = self.find_insert_pos(rune_index);
        if in_off == 0 {
            self.insert_at_boundary(rune_index, text, idx);
        } else {
            self.insert_in_middle(rune_index, text, idx, in_off);
        }
        true
    }

    /// Coalescing fast path: a single-rune insert directly after the previous
    /// insert grows the last inserted piece without a new undo entry.
    fn try_append_to_last_piece(&mut self, rune_index: usize, text: &str) -> bool {
        if self.last_action != EditAction::Insert
            || rune_index != self.last_action_end
            || self.last_insert_piece.is_none()
            || text.chars().count() > 1
        {
            return false;
        }

        let (_, _, runes) = self.modify.append(text);
        let piece_idx = self.last_insert_piece.unwrap();
        let piece = &mut self.pieces[piece_idx];
        piece.rune_len += runes;
        piece.byte_len += text.len();

        self.seq_rune_len += runes;
        self.seq_byte_len += text.len();
        self.record_action(EditAction::Insert, rune_index + runes);
        true
    }

    fn insert_at_boundary(&mut self, rune_index: usize, text: &str, idx: usize) {
        let (rune_off, byte_off, runes) = self.modify.append(text);
        let new_piece = Piece {
            source: BufferKind::Modify,
            byte_off,
            byte_len: text.len(),
            rune_off,
            rune_len: runes,
        };

        self.undo_stack.push(PieceRange {
            at: idx,
            saved: Vec::new(),
            replaced: 1,
            seq_rune_len: self.seq_rune_len,
            seq_byte_len: self.seq_byte_len,
            caret: rune_index,
            group: self.current_group,
        });

        self.pieces.insert(idx, new_piece);
        self.last_insert_piece = Some(idx);
        self.seq_rune_len += runes;
        self.seq_byte_len += text.len();
        self.record_action(EditAction::Insert, rune_index + runes);
    }

    fn insert_in_middle(&mut self, rune_index: usize, text: &str, idx: usize, in_off: usize) {
        let (rune_off, byte_off, runes) = self.modify.append(text);
        let new_piece = Piece {
            source: BufferKind::Modify,
            byte_off,
            byte_len: text.len(),
            rune_off,
            rune_len: runes,
        };

        let old = self.pieces[idx].clone();
        self.undo_stack.push(PieceRange {
            at: idx,
            saved: vec![old.clone()],
            replaced: 3,
            seq_rune_len: self.seq_rune_len,
            seq_byte_len: self.seq_byte_len,
            caret: rune_index,
            group: self.current_group,
        });

        let buf = self.buf(old.source);
        let left_bytes = buf.bytes_for_range(old.rune_off, in_off);
        let right_byte_off = buf.rune_offset(old.rune_off + in_off);

        let left = Piece {
            source: old.source,
            byte_off: old.byte_off,
            byte_len: left_bytes,
            rune_off: old.rune_off,
            rune_len: in_off,
        };
        let right = Piece {
            source: old.source,
            byte_off: right_byte_off,
            byte_len: old.byte_len - left_bytes,
            rune_off: old.rune_off + in_off,
            rune_len: old.rune_len - in_off,
        };

        self.pieces.splice(idx..=idx, [left, new_piece, right]);
        self.last_insert_piece = Some(idx + 1);
        self.seq_rune_len += runes;
        self.seq_byte_len += text.len();
        self.record_action(EditAction::Insert, rune_index + runes);
    }

    /// Remove the rune range `[start, end)`, capturing the deleted pieces as
    /// one undo entry. Fails when the range is outside the document.
    pub fn erase(&mut self, start: usize, end: usize) -> bool {
        if start > end || end > self.seq_rune_len {
            return false;
        }
        if start == end {
            return true;
        }

        self.redo_stack.clear();
        self.reset_coalescing();

        // Locate the affected piece span.
        let mut acc = 0;
        let mut first = usize::MAX;
        let mut first_off = 0;
        let mut last = 0;
        let mut last_end_off = 0;
        for (idx, piece) in self.pieces.iter().enumerate() {
            let next = acc + piece.rune_len;
            if first == usize::MAX && start < next {
                first = idx;
                first_off = start - acc;
            }
            if end <= next {
                last = idx;
                last_end_off = end - acc;
                break;
            }
            acc = next;
        }

        let saved: Vec<Piece> = self.pieces[first..=last].to_vec();

        let mut replacement: Vec<Piece> = Vec::new();
        if first_off > 0 {
            let head = &saved[0];
            let bytes = self.buf(head.source).bytes_for_range(head.rune_off, first_off);
            replacement.push(Piece {
                source: head.source,
                byte_off: head.byte_off,
                byte_len: bytes,
                rune_off: head.rune_off,
                rune_len: first_off,
            });
        }
        let tail = &saved[saved.len() - 1];
        if last_end_off < tail.rune_len {
            let buf = self.buf(tail.source);
            let skipped = buf.bytes_for_range(tail.rune_off, last_end_off);
            replacement.push(Piece {
                source: tail.source,
                byte_off: tail.byte_off + skipped,
                byte_len: tail.byte_len - skipped,
                rune_off: tail.rune_off + last_end_off,
                rune_len: tail.rune_len - last_end_off,
            });
        }

        let saved_bytes: usize = saved.iter().map(|p| p.byte_len).sum();
        let kept_bytes: usize = replacement.iter().map(|p| p.byte_len).sum();

        self.undo_stack.push(PieceRange {
            at: first,
            saved,
            replaced: replacement.len(),
            seq_rune_len: self.seq_rune_len,
            seq_byte_len: self.seq_byte_len,
            caret: start,
            group: self.current_group,
        });

        self.pieces.splice(first..=last, replacement);
        self.seq_rune_len -= end - start;
        self.seq_byte_len -= saved_bytes - kept_bytes;
        true
    }

    /// Erase `[start, end)` then insert `text` at `start`, grouped as a
    /// single undo step.
    pub fn replace(&mut self, start: usize, end: usize, text: &str) -> bool {
        if start > end || end > self.seq_rune_len {
            return false;
        }
        self.group_begin();
        let mut ok = true;
        if start < end {
            ok &= self.erase(start, end);
        }
        if !text.is_empty() {
            ok &= self.insert(start, text);
        }
        self.group_end();
        ok
    }

    /// Open an undo group. Until the matching [`group_end`](Self::group_end),
    /// every captured edit shares one undo step. Groups nest; only the
    /// outermost pair delimits the step.
    pub fn group_begin(&mut self) {
        if self.group_depth == 0 {
            self.group_counter += 1;
            self.current_group = Some(self.group_counter);
        }
        self.group_depth += 1;
    }

    /// Close the innermost undo group.
    pub fn group_end(&mut self) {
        self.group_depth = self.group_depth.saturating_sub(1);
        if self.group_depth == 0 {
            self.current_group = None;
        }
    }

    /// Splice the saved range back into the list, returning the inverse
    /// range capturing what it replaced.
    fn restore(&mut self, range: PieceRange) -> PieceRange {
        let removed: Vec<Piece> = self
            .pieces
            .splice(range.at..range.at + range.replaced, range.saved.iter().cloned())
            .collect();
        let inverse = PieceRange {
            at: range.at,
            replaced: range.saved.len(),
            saved: removed,
            seq_rune_len: self.seq_rune_len,
            seq_byte_len: self.seq_byte_len,
            caret: range.caret,
            group: range.group,
        };
        self.seq_rune_len = range.seq_rune_len;
        self.seq_byte_len = range.seq_byte_len;
        inverse
    }

    fn undo_redo(&mut self, undo: bool) -> Option<Vec<CursorPos>> {
        let pop = |table: &mut Self| {
            if undo {
                table.undo_stack.pop()
            } else {
                table.redo_stack.pop()
            }
        };
        let peek_group = |table: &Self| {
            let stack = if undo { &table.undo_stack } else { &table.redo_stack };
            stack.last().and_then(|e| e.group)
        };

        let mut entry = pop(self)?;
        let group = entry.group;
        let mut cursors = Vec::new();
        loop {
            let caret = entry.caret;
            let inverse = self.restore(entry);
            cursors.push(CursorPos { start: caret, end: caret });
            if undo {
                self.redo_stack.push(inverse);
            } else {
                self.undo_stack.push(inverse);
            }

            match group {
                Some(g) if peek_group(self) == Some(g) => {
                    entry = pop(self).unwrap();
                }
                _ => break,
            }
        }

        self.reset_coalescing();
        Some(cursors)
    }

    /// Revert the most recent edit (or edit group). Returns the captured
    /// cursor positions, one per restored edit, or `None` when the stack is
    /// empty.
    pub fn undo(&mut self) -> Option<Vec<CursorPos>> {
        self.undo_redo(true)
    }

    /// Re-apply the most recently undone edit (or edit group).
    pub fn redo(&mut self) -> Option<Vec<CursorPos>> {
        self.undo_redo(false)
    }

    /// Whether an undo entry is available.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Whether a redo entry is available.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Materialize the whole document.
    pub fn text(&self) -> String {
        let mut out = String::with_capacity(self.seq_byte_len);
        for piece in &self.pieces {
            let slice = self.buf(piece.source).slice(piece.byte_off, piece.byte_len);
            out.push_str(std::str::from_utf8(slice).unwrap());
        }
        out
    }

    pub(crate) fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub(crate) fn piece_bytes(&self, piece: &Piece) -> &[u8] {
        self.buf(piece.source).slice(piece.byte_off, piece.byte_len)
    }

    /// Byte offset inside the piece's backing buffer for a rune offset
    /// relative to the piece start.
    pub(crate) fn piece_rune_to_byte(&self, piece: &Piece, rune_in_piece: usize) -> usize {
        self.buf(piece.source)
            .bytes_for_range(piece.rune_off, rune_in_piece)
    }
}
