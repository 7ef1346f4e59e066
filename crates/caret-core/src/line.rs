//! Visual lines and paragraphs produced by the layout engine.

use crate::geom::{Point, Rect};
use crate::shaper::{Glyph, GlyphFlags};

/// A visual line: one wrapped segment of a paragraph with a single baseline.
///
/// Glyphs are stored in logical order; after [`recompute`](Line::recompute)
/// their `x` fields encode the visual order, with right-to-left runs laid out
/// from their right edge.
#[derive(Debug, Clone, Default)]
pub struct Line {
    /// Left edge of the line's glyphs.
    pub x_off: f32,
    /// Baseline y position in document space.
    pub y_off: f32,
    /// Sum of glyph advances.
    pub width: f32,
    pub ascent: f32,
    pub descent: f32,
    pub glyphs: Vec<Glyph>,
    /// Number of runes represented by this line.
    pub runes: usize,
    /// Rune offset of the first rune of the line in the document.
    pub rune_off: usize,
}

impl Line {
    /// Append a glyph, accumulating line metrics.
    pub fn append(&mut self, glyph: Glyph) {
        self.width += glyph.advance;
        // Glyph ascent and descent are uniform within a shaping run, so the
        // line simply adopts them.
        self.ascent = glyph.ascent;
        self.descent = glyph.descent;
        self.runes += glyph.runes;
        self.glyphs.push(glyph);
    }

    /// Assign X positions by partitioning glyphs into maximal direction runs
    /// in logical order: each run occupies the next `run_width` of the line,
    /// left-to-right runs fill it ascending, right-to-left runs descending
    /// from the run's right edge. Marks the final glyph with `LINE_BREAK` and
    /// records the line's document rune offset.
    pub fn recompute(&mut self, align_off: f32, rune_off: usize) {
        self.rune_off = rune_off;
        self.x_off = align_off;
        if self.glyphs.is_empty() {
            return;
        }

        let mut x_off = 0.0f32;
        let mut run_start = 0usize;

        for i in 0..=self.glyphs.len() {
            let end_of_run = if i == self.glyphs.len() {
                true
            } else {
                let current = self.glyphs[i].flags & GlyphFlags::TOWARD_ORIGIN;
                let start = self.glyphs[run_start].flags & GlyphFlags::TOWARD_ORIGIN;
                current != start
            };
            if !end_of_run {
                continue;
            }

            let run_width: f32 = self.glyphs[run_start..i].iter().map(|g| g.advance).sum();
            let is_rtl = self.glyphs[run_start]
                .flags
                .contains(GlyphFlags::TOWARD_ORIGIN);

            if is_rtl {
                // The run occupies [x_off, x_off + run_width); walk the
                // cursor down from the right edge.
                let mut cursor = align_off + x_off + run_width;
                for glyph in &mut self.glyphs[run_start..i] {
                    cursor -= glyph.advance;
                    glyph.x = cursor;
                }
            } else {
                let mut cursor = align_off + x_off;
                for glyph in &mut self.glyphs[run_start..i] {
                    glyph.x = cursor;
                    cursor += glyph.advance;
                }
            }

            x_off += run_width;
            run_start = i;
        }

        if let Some(last) = self.glyphs.last_mut() {
            last.flags |= GlyphFlags::LINE_BREAK;
        }
    }

    /// Move the line (and its glyphs) to baseline `y_off`.
    pub fn adjust_y(&mut self, y_off: f32) {
        self.y_off = y_off;
        for glyph in &mut self.glyphs {
            glyph.y = y_off;
        }
    }

    /// Bounding box of the line's glyph band.
    pub fn bounds(&self) -> Rect {
        Rect::new(
            Point::new(self.x_off, self.y_off - self.ascent),
            Point::new(self.x_off + self.width, self.y_off + self.descent),
        )
    }
}

/// One hard-break-delimited unit of the document.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Paragraph {
    pub start_x: f32,
    pub start_y: f32,
    pub end_x: f32,
    pub end_y: f32,
    pub ascent: f32,
    pub descent: f32,
    /// Number of runes represented by this paragraph.
    pub runes: usize,
    /// Rune offset of the first rune of the paragraph in the document.
    pub rune_off: usize,
}

impl Paragraph {
    /// Fold a visual line into the paragraph. Returns `true` when the line
    /// ends the paragraph (its last glyph carries a paragraph break).
    pub fn add(&mut self, line: &Line) -> bool {
        let Some(last) = line.glyphs.last() else {
            // An empty trailing line closes the paragraph it constitutes.
            if self.runes == 0 {
                self.start_x = line.x_off;
                self.start_y = line.y_off;
                self.end_x = line.x_off;
                self.end_y = line.y_off;
                self.ascent = line.ascent;
                self.descent = line.descent;
                self.rune_off = line.rune_off;
            }
            return true;
        };

        if self.runes == 0 {
            let first = &line.glyphs[0];
            self.start_x = first.x;
            self.start_y = first.y;
            self.rune_off = line.rune_off;
        }
        self.end_x = last.x + last.advance;
        self.end_y = last.y;
        self.ascent = line.ascent;
        self.descent = line.descent;
        self.runes += line.runes;
        last.flags.contains(GlyphFlags::PARAGRAPH_BREAK)
    }
}

/// A rectangle covering part of a visual line, produced by the selection
/// locator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub bounds: Rect,
}
