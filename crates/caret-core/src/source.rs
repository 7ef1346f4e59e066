//! Positional read views over the piece sequence.
//!
//! [`PieceTableReader`] wraps a [`PieceTable`] with byte-addressed reads,
//! rune/byte offset translation, and a logical-line cache. Reads past the end
//! of the document are short, never errors: callers receive whatever bytes
//! were available and must tolerate partial buffers.

use crate::storage::{CursorPos, PieceTable};

/// Cached metadata for one logical line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineInfo {
    /// Line length in runes, including the hard break if present.
    pub runes: usize,
    /// Whether the line is terminated by a hard break.
    pub has_break: bool,
}

/// Read view over a [`PieceTable`].
///
/// All mutating document operations of the editing core go through this type
/// so that the change flag and the line cache stay coherent.
pub struct PieceTableReader {
    table: PieceTable,
    lines: Vec<LineInfo>,
    lines_dirty: bool,
    changed: bool,
}

impl PieceTableReader {
    /// Create a reader over an empty document.
    pub fn new() -> Self {
        Self::with_text("")
    }

    /// Create a reader over `text`.
    pub fn with_text(text: &str) -> Self {
        Self {
            table: PieceTable::new(text),
            lines: Vec::new(),
            lines_dirty: true,
            changed: false,
        }
    }

    /// Document length in runes.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether the document holds no text.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Document length in bytes.
    pub fn byte_len(&self) -> usize {
        self.table.byte_len()
    }

    /// Access the underlying piece table.
    pub fn table(&self) -> &PieceTable {
        &self.table
    }

    fn mark_changed(&mut self) {
        self.changed = true;
        self.lines_dirty = true;
    }

    /// Replace the whole document, discarding history.
    pub fn set_text(&mut self, text: &str) {
        self.table.set_text(text);
        self.mark_changed();
    }

    /// Insert `text` at `rune_index`. See [`PieceTable::insert`].
    pub fn insert(&mut self, rune_index: usize, text: &str) -> bool {
        let ok = self.table.insert(rune_index, text);
        if ok && !text.is_empty() {
            self.mark_changed();
        }
        ok
    }

    /// Erase the rune range `[start, end)`. See [`PieceTable::erase`].
    pub fn erase(&mut self, start: usize, end: usize) -> bool {
        let ok = self.table.erase(start, end);
        if ok && start != end {
            self.mark_changed();
        }
        ok
    }

    /// Replace `[start, end)` with `text` as a single undo step.
    pub fn replace(&mut self, start: usize, end: usize, text: &str) -> bool {
        let ok = self.table.replace(start, end, text);
        if ok {
            self.mark_changed();
        }
        ok
    }

    /// Undo the latest edit group, returning per-edit cursor positions.
    pub fn undo(&mut self) -> Option<Vec<CursorPos>> {
        let cursors = self.table.undo();
        if cursors.is_some() {
            self.mark_changed();
        }
        cursors
    }

    /// Redo the latest undone edit group.
    pub fn redo(&mut self) -> Option<Vec<CursorPos>> {
        let cursors = self.table.redo();
        if cursors.is_some() {
            self.mark_changed();
        }
        cursors
    }

    /// Open an undo group on the underlying table.
    pub fn group_begin(&mut self) {
        self.table.group_begin();
    }

    /// Close an undo group on the underlying table.
    pub fn group_end(&mut self) {
        self.table.group_end();
    }

    /// Take the change flag, resetting it. The editor polls this once per
    /// frame to emit change events.
    pub fn take_changed(&mut self) -> bool {
        std::mem::replace(&mut self.changed, false)
    }

    /// Fill `buf` starting at document byte offset `byte_off`, returning the
    /// number of bytes copied. A short count signals end of stream.
    pub fn read_at(&self, buf: &mut [u8], byte_off: usize) -> usize {
        if buf.is_empty() || byte_off >= self.table.byte_len() {
            return 0;
        }

        let mut total = 0;
        let mut bytes = 0usize;
        for piece in self.table.pieces() {
            bytes += piece.byte_len;
            if bytes <= byte_off + total {
                continue;
            }

            let fragment = self.table.piece_bytes(piece);
            let skip = fragment.len() - (bytes - (byte_off + total));
            let fragment = &fragment[skip..];
            let n = fragment.len().min(buf.len() - total);
            buf[total..total + n].copy_from_slice(&fragment[..n]);
            total += n;
            if total >= buf.len() {
                break;
            }
        }
        total
    }

    /// Materialize the whole document as a string.
    pub fn text(&self) -> String {
        self.table.text()
    }

    /// Byte offset of the rune at `rune_off`, clamped to the document size.
    pub fn rune_offset(&self, rune_off: usize) -> usize {
        if self.table.len() == 0 {
            return 0;
        }
        if rune_off >= self.table.len() {
            return self.table.byte_len();
        }

        let mut bytes = 0;
        let mut runes = 0;
        for piece in self.table.pieces() {
            if runes + piece.rune_len > rune_off {
                return bytes + self.table.piece_rune_to_byte(piece, rune_off - runes);
            }
            bytes += piece.byte_len;
            runes += piece.rune_len;
        }
        bytes
    }

    /// Read the rune at rune offset `rune_off`, or `None` past the end.
    pub fn read_rune_at(&self, rune_off: usize) -> Option<char> {
        if rune_off >= self.table.len() {
            return None;
        }
        let byte_off = self.rune_offset(rune_off);
        self.read_rune_at_bytes(byte_off).map(|(c, _)| c)
    }

    /// Read the rune starting at byte offset `byte_off`, returning the rune
    /// and its encoded length.
    pub fn read_rune_at_bytes(&self, byte_off: usize) -> Option<(char, usize)> {
        let mut buf = [0u8; 4];
        let n = self.read_at(&mut buf, byte_off);
        if n == 0 {
            return None;
        }
        let s = match std::str::from_utf8(&buf[..n]) {
            Ok(s) => s,
            // A short read may cut a rune boundary; keep the valid prefix.
            Err(e) if e.valid_up_to() > 0 => std::str::from_utf8(&buf[..e.valid_up_to()]).unwrap(),
            Err(_) => return None,
        };
        s.chars().next().map(|c| (c, c.len_utf8()))
    }

    /// Read the rune ending at byte offset `byte_off`, if any.
    pub fn read_rune_before_bytes(&self, byte_off: usize) -> Option<(char, usize)> {
        let mut buf = [0u8; 4];
        let (start, want) = if byte_off < 4 {
            (0, byte_off)
        } else {
            (byte_off - 4, 4)
        };
        if want == 0 {
            return None;
        }
        let n = self.read_at(&mut buf[..want], start);
        // The window may begin in the middle of a multi-byte rune; skip
        // forward to the first boundary.
        let mut from = 0;
        let s = loop {
            if from >= n {
                return None;
            }
            if let Ok(s) = std::str::from_utf8(&buf[from..n]) {
                break s;
            }
            from += 1;
        };
        s.chars().next_back().map(|c| (c, c.len_utf8()))
    }

    /// Rebuild and return the logical-line cache by scanning all pieces.
    ///
    /// A piece fragment without a terminating break merges into the first
    /// line of the following piece.
    pub fn lines(&mut self) -> &[LineInfo] {
        if self.lines_dirty {
            self.rebuild_lines();
            self.lines_dirty = false;
        }
        &self.lines
    }

    fn rebuild_lines(&mut self) {
        self.lines.clear();
        for piece in self.table.pieces() {
            let text = std::str::from_utf8(self.table.piece_bytes(piece)).unwrap();
            let parsed = parse_lines(text);
            if parsed.is_empty() {
                continue;
            }

            let mut parsed = parsed;
            if let Some(last) = self.lines.last().copied() {
                if !last.has_break {
                    parsed[0].runes += last.runes;
                    self.lines.pop();
                }
            }
            self.lines.extend_from_slice(&parsed);
        }
    }

    /// Number of logical lines.
    pub fn line_count(&mut self) -> usize {
        self.lines().len()
    }

    /// Materialize line `line_no` (hard break included) together with the
    /// rune offset of its first rune. `None` past the last line.
    pub fn read_line(&mut self, line_no: usize) -> Option<(String, usize)> {
        let lines = self.lines();
        if line_no >= lines.len() {
            return None;
        }
        let rune_off: usize = lines[..line_no].iter().map(|l| l.runes).sum();
        let runes = lines[line_no].runes;

        let start = self.rune_offset(rune_off);
        let end = self.rune_offset(rune_off + runes);
        let mut buf = vec![0u8; end - start];
        let n = self.read_at(&mut buf, start);
        buf.truncate(n);
        Some((String::from_utf8(buf).unwrap(), rune_off))
    }
}

impl Default for PieceTableReader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_lines(text: &str) -> Vec<LineInfo> {
    let mut lines = Vec::new();
    let mut runes = 0;
    for c in text.chars() {
        runes += 1;
        if c == '\n' {
            lines.push(LineInfo {
                runes,
                has_break: true,
            });
            runes = 0;
        }
    }
    if runes > 0 {
        lines.push(LineInfo {
            runes,
            has_break: false,
        });
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_at_and_short_read() {
        let r = PieceTableReader::with_text("hello world");
        let mut buf = [0u8; 5];
        assert_eq!(r.read_at(&mut buf, 0), 5);
        assert_eq!(&buf, b"hello");

        assert_eq!(r.read_at(&mut buf, 6), 5);
        assert_eq!(&buf, b"world");

        // Short read at end of stream.
        assert_eq!(r.read_at(&mut buf, 9), 2);
        assert_eq!(&buf[..2], b"ld");

        // Past the end.
        assert_eq!(r.read_at(&mut buf, 11), 0);
    }

    #[test]
    fn test_read_at_across_pieces() {
        let mut r = PieceTableReader::with_text("hello");
        r.insert(5, " world");
        r.insert(0, ">> ");
        assert_eq!(r.text(), ">> hello world");

        let mut buf = [0u8; 14];
        assert_eq!(r.read_at(&mut buf, 0), 14);
        assert_eq!(&buf, b">> hello world");

        let mut buf = [0u8; 7];
        assert_eq!(r.read_at(&mut buf, 2), 7);
        assert_eq!(&buf, b" hello ");
    }

    #[test]
    fn test_rune_offset_round_trip() {
        let mut r = PieceTableReader::with_text("a你b好c");
        r.insert(2, "好x");
        let text = r.text();

        for (rune_idx, (byte_idx, _)) in text.char_indices().enumerate() {
            assert_eq!(r.rune_offset(rune_idx), byte_idx);
        }
        assert_eq!(r.rune_offset(text.chars().count()), text.len());
        assert_eq!(r.rune_offset(usize::MAX), text.len());
    }

    #[test]
    fn test_read_rune_at() {
        let r = PieceTableReader::with_text("a你b");
        assert_eq!(r.read_rune_at(0), Some('a'));
        assert_eq!(r.read_rune_at(1), Some('你'));
        assert_eq!(r.read_rune_at(2), Some('b'));
        assert_eq!(r.read_rune_at(3), None);
    }

    #[test]
    fn test_read_rune_before_bytes() {
        let r = PieceTableReader::with_text("a你b");
        assert_eq!(r.read_rune_before_bytes(1), Some(('a', 1)));
        assert_eq!(r.read_rune_before_bytes(4), Some(('你', 3)));
        assert_eq!(r.read_rune_before_bytes(5), Some(('b', 1)));
        assert_eq!(r.read_rune_before_bytes(0), None);
    }

    #[test]
    fn test_lines_cache() {
        let mut r = PieceTableReader::with_text("ab\ncd\n\nef");
        let lines = r.lines().to_vec();
        assert_eq!(
            lines,
            vec![
                LineInfo { runes: 3, has_break: true },
                LineInfo { runes: 3, has_break: true },
                LineInfo { runes: 1, has_break: true },
                LineInfo { runes: 2, has_break: false },
            ]
        );
    }

    #[test]
    fn test_lines_merge_across_pieces() {
        // "ab" and "cd\n" come from different pieces but form one line.
        let mut r = PieceTableReader::with_text("ab");
        r.insert(2, "cd\nef");
        let lines = r.lines().to_vec();
        assert_eq!(
            lines,
            vec![
                LineInfo { runes: 5, has_break: true },
                LineInfo { runes: 2, has_break: false },
            ]
        );
    }

    #[test]
    fn test_read_line() {
        let mut r = PieceTableReader::with_text("one\ntwo\nthree");
        assert_eq!(r.read_line(0), Some(("one\n".to_string(), 0)));
        assert_eq!(r.read_line(1), Some(("two\n".to_string(), 4)));
        assert_eq!(r.read_line(2), Some(("three".to_string(), 8)));
        assert_eq!(r.read_line(3), None);
    }

    #[test]
    fn test_change_flag() {
        let mut r = PieceTableReader::with_text("x");
        assert!(!r.take_changed());
        r.insert(1, "y");
        assert!(r.take_changed());
        assert!(!r.take_changed());
        r.erase(0, 1);
        assert!(r.take_changed());
    }
}
