//! Word-oriented reading and motion.
//!
//! A word is a maximal run of non-separator runes. The separator set defaults
//! to ASCII punctuation plus Unicode whitespace and can be replaced per view,
//! either as a character set or as a predicate. Languages that do not delimit
//! words with separators (CJK, Thai) are a known limitation of this model.

use crate::view::{SelectionAction, TextView};

/// Separators used when no custom set is configured.
pub const DEFAULT_WORD_SEPARATORS: &str = "`~!@#$%^&*()-=+[{]}\\|;:'\",.<>/?";

impl TextView {
    /// Whether `c` delimits words for word navigation and deletion.
    pub fn is_word_separator(&self, c: char) -> bool {
        if let Some(predicate) = &self.word_predicate {
            return predicate(c);
        }
        let separators = if self.word_separators.is_empty() {
            DEFAULT_WORD_SEPARATORS
        } else {
            &self.word_separators
        };
        separators.contains(c) || c.is_whitespace()
    }

    /// Replace the separator character set.
    pub fn set_word_separators(&mut self, separators: &str) {
        self.word_separators = separators.to_string();
        self.word_predicate = None;
    }

    /// Install a separator predicate, overriding the character set.
    pub fn set_word_predicate(&mut self, predicate: impl Fn(char) -> bool + 'static) {
        self.word_predicate = Some(Box::new(predicate));
    }

    fn caret_at_edge(&self) -> bool {
        let (start, _) = self.selection();
        start == 0 || start == self.len()
    }

    /// The rune the caret would consume moving in `direction`, if any.
    fn rune_toward(&self, direction: isize) -> Option<char> {
        let (start, _) = self.selection();
        let off = if direction < 0 {
            start.checked_sub(1)?
        } else {
            start
        };
        self.read_rune_at(off)
    }

    /// Move the caret by `distance` words: skip separators, then skip the
    /// word itself. The final position lands on a grapheme boundary.
    pub fn move_words(&mut self, distance: isize, action: SelectionAction) {
        let words = distance.unsigned_abs();
        let direction: isize = if distance < 0 { -1 } else { 1 };

        for _ in 0..words {
            while let Some(r) = self.rune_toward(direction) {
                if self.is_word_separator(r) && !self.caret_at_edge() {
                    self.move_caret(direction, 0);
                } else {
                    break;
                }
            }
            self.move_caret(direction, 0);
            while let Some(r) = self.rune_toward(direction) {
                if !self.is_word_separator(r) && !self.caret_at_edge() {
                    self.move_caret(direction, 0);
                } else {
                    break;
                }
            }
        }

        if action == SelectionAction::Clear {
            self.clear_selection();
        }
        self.set_caret_to_grapheme_boundaries();
    }

    fn set_caret_to_grapheme_boundaries(&mut self) {
        let (start, end) = self.selection();
        self.set_caret(start, end);
    }

    fn separator_fn(&self, by_space: bool, c: char) -> bool {
        if by_space {
            c.is_whitespace()
        } else {
            self.is_word_separator(c)
        }
    }

    /// Read runes from `from` in `direction` until a separator (exclusive).
    fn read_by_separator(&self, direction: isize, from: isize, by_space: bool) -> Vec<char> {
        let mut buf = Vec::new();
        let mut off = from;
        loop {
            if off < 0 || off as usize >= self.len() {
                break;
            }
            let Some(r) = self.read_rune_at(off as usize) else {
                break;
            };
            if self.separator_fn(by_space, r) {
                break;
            }
            if direction < 0 {
                buf.insert(0, r);
                off -= 1;
            } else {
                buf.push(r);
                off += 1;
            }
        }
        buf
    }

    /// Read the word around the caret, returning it together with the caret
    /// offset inside the word.
    pub fn read_word(&self, by_space: bool) -> (String, usize) {
        let (start, end) = self.selection();
        let caret = start.max(end);

        let left = self.read_by_separator(-1, caret as isize - 1, by_space);
        let right = self.read_by_separator(1, caret as isize, by_space);
        let offset = left.len();

        let mut word: String = left.into_iter().collect();
        word.extend(right);
        (word, offset)
    }

    /// Start and end rune offsets of the word at `caret`. A caret on a
    /// separator yields an empty range at `caret`.
    pub fn word_boundaries_at(&self, caret: usize, by_space: bool) -> (usize, usize) {
        let left = self.read_by_separator(-1, caret as isize - 1, by_space);
        let right = self.read_by_separator(1, caret as isize, by_space);
        (caret - left.len(), caret + right.len())
    }

    /// Read from the caret in `direction` until `separator` matches.
    pub fn read_until(&self, direction: isize, separator: impl Fn(char) -> bool) -> String {
        let (start, end) = self.selection();
        let caret = start.max(end);
        let mut buf = Vec::new();
        let mut off = if direction <= 0 {
            caret as isize - 1
        } else {
            caret as isize
        };
        loop {
            if off < 0 || off as usize >= self.len() {
                break;
            }
            let Some(r) = self.read_rune_at(off as usize) else {
                break;
            };
            if separator(r) {
                break;
            }
            if direction <= 0 {
                buf.insert(0, r);
                off -= 1;
            } else {
                buf.push(r);
                off += 1;
            }
        }
        buf.into_iter().collect()
    }

    /// All occurrences of the word spanning `[start, end)`, scanning the
    /// document once and matching whole words only.
    pub fn find_all_word_occurrences(
        &mut self,
        start: usize,
        end: usize,
        by_space: bool,
    ) -> Vec<(usize, usize)> {
        if start >= end {
            return Vec::new();
        }
        let chars: Vec<char> = self.text().chars().collect();
        if end > chars.len() {
            return Vec::new();
        }
        let target = chars[start..end].to_vec();

        let mut out = Vec::new();
        let n = chars.len();
        let mut i = 0;
        while i < n {
            while i < n && self.separator_fn(by_space, chars[i]) {
                i += 1;
            }
            if i >= n {
                break;
            }
            let word_start = i;
            while i < n && !self.separator_fn(by_space, chars[i]) {
                i += 1;
            }
            if chars[word_start..i] == target[..] {
                out.push((word_start, i));
            }
        }
        out
    }

    /// All non-overlapping occurrences of the exact rune sequence spanning
    /// `[start, end)`.
    pub fn find_all_text_occurrences(&mut self, start: usize, end: usize) -> Vec<(usize, usize)> {
        if start >= end {
            return Vec::new();
        }
        let chars: Vec<char> = self.text().chars().collect();
        if end > chars.len() {
            return Vec::new();
        }
        let target = chars[start..end].to_vec();
        let len = target.len();

        let mut out = Vec::new();
        let mut i = 0;
        while i + len <= chars.len() {
            if chars[i..i + len] == target[..] {
                out.push((i, i + len));
                i += len;
            } else {
                i += 1;
            }
        }
        out
    }
}
