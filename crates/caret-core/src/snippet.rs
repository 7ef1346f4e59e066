//! Snippet templates and tab-stop navigation.
//!
//! Templates follow the LSP snippet syntax subset the editor needs: `$n`
//! marks an empty tab stop, `${n:placeholder}` a stop pre-filled with
//! placeholder text, and `$0` the final caret position. `\$` escapes a
//! literal dollar sign.

use crate::error::EditorError;

/// One tab stop, with rune offsets relative to the expanded snippet text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabStop {
    /// Stop index from the template; `0` is the final stop.
    pub index: usize,
    pub start: usize,
    pub end: usize,
}

/// A parsed snippet: the literal text to insert plus its tab stops in
/// navigation order (ascending index, `0` last).
#[derive(Debug, Clone, PartialEq)]
pub struct SnippetTemplate {
    pub text: String,
    pub stops: Vec<TabStop>,
}

impl SnippetTemplate {
    /// Parse `template`, accumulating the literal text and stop offsets.
    pub fn parse(template: &str) -> Result<Self, EditorError> {
        let mut text = String::new();
        let mut stops: Vec<TabStop> = Vec::new();
        let mut runes = 0usize;

        let mut chars = template.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    let escaped = chars
                        .next()
                        .ok_or_else(|| EditorError::SnippetParse("dangling escape".into()))?;
                    text.push(escaped);
                    runes += 1;
                }
                '$' => match chars.peek() {
                    Some(d) if d.is_ascii_digit() => {
                        let index = read_number(&mut chars);
                        stops.push(TabStop {
                            index,
                            start: runes,
                            end: runes,
                        });
                    }
                    Some('{') => {
                        chars.next();
                        let index = read_number(&mut chars);
                        let start = runes;
                        match chars.next() {
                            Some(':') => {
                                let mut closed = false;
                                for p in chars.by_ref() {
                                    if p == '}' {
                                        closed = true;
                                        break;
                                    }
                                    text.push(p);
                                    runes += 1;
                                }
                                if !closed {
                                    return Err(EditorError::SnippetParse(
                                        "unterminated placeholder".into(),
                                    ));
                                }
                            }
                            Some('}') => {}
                            _ => {
                                return Err(EditorError::SnippetParse(
                                    "malformed tab stop".into(),
                                ));
                            }
                        }
                        stops.push(TabStop {
                            index,
                            start,
                            end: runes,
                        });
                    }
                    _ => {
                        text.push('$');
                        runes += 1;
                    }
                },
                _ => {
                    text.push(c);
                    runes += 1;
                }
            }
        }

        // Navigation order: 1, 2, ... then 0.
        stops.sort_by_key(|s| if s.index == 0 { usize::MAX } else { s.index });
        Ok(Self { text, stops })
    }
}

fn read_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> usize {
    let mut n = 0usize;
    while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
        n = n * 10 + d as usize;
        chars.next();
    }
    n
}

/// Live snippet state: absolute tab-stop ranges inside the document and the
/// current navigation position.
#[derive(Debug, Clone, PartialEq)]
pub struct SnippetContext {
    stops: Vec<TabStop>,
    current: Option<usize>,
}

impl SnippetContext {
    /// Build a context for a template inserted at rune offset `base`.
    pub fn new(template: &SnippetTemplate, base: usize) -> Self {
        let stops = template
            .stops
            .iter()
            .map(|s| TabStop {
                index: s.index,
                start: s.start + base,
                end: s.end + base,
            })
            .collect();
        Self {
            stops,
            current: None,
        }
    }

    pub fn stops(&self) -> &[TabStop] {
        &self.stops
    }

    /// Advance to the next tab stop, returning its range.
    pub fn next_tab_stop(&mut self) -> Option<(usize, usize)> {
        let next = match self.current {
            None => 0,
            Some(i) => (i + 1).min(self.stops.len().saturating_sub(1)),
        };
        self.current = Some(next);
        self.stops.get(next).map(|s| (s.start, s.end))
    }

    /// Step back to the previous tab stop, returning its range.
    pub fn prev_tab_stop(&mut self) -> Option<(usize, usize)> {
        let prev = match self.current {
            None | Some(0) => 0,
            Some(i) => i - 1,
        };
        self.current = Some(prev);
        self.stops.get(prev).map(|s| (s.start, s.end))
    }

    /// Whether the current stop is the last one.
    pub fn at_last_stop(&self) -> bool {
        match self.current {
            Some(i) => i + 1 >= self.stops.len(),
            None => self.stops.is_empty(),
        }
    }

    /// Track an edit replacing `[start, end)` with `new_len` runes: stops
    /// after the edit shift, a stop containing it grows or shrinks.
    pub fn on_edit(&mut self, start: usize, end: usize, new_len: usize) {
        let old_len = end - start;
        for stop in &mut self.stops {
            if start >= stop.start && start <= stop.end {
                // Edit begins inside (or at the edge of) the stop.
                stop.end = stop.end + new_len - old_len.min(stop.end - start);
            } else if stop.start >= end {
                stop.start = stop.start + new_len - old_len;
                stop.end = stop.end + new_len - old_len;
            }
        }
    }
}
