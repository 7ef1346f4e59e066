//! Paragraph-oriented line layout.
//!
//! The engine consumes an immutable snapshot of the document text, shapes it
//! paragraph by paragraph, wraps the glyph stream into visual [`Line`]s at
//! `max_width`, reorders Bidi runs per line, and records rune offsets so the
//! view layer can run position queries against stable, indexable lines.

use unicode_segmentation::UnicodeSegmentation;

use crate::geom::{Point, Rect, Size};
use crate::line::{Line, Paragraph, Region};
use crate::shaper::{Glyph, GlyphFlags, Shaper};

/// Horizontal alignment of each visual line inside `max_width`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Start,
    Middle,
    End,
}

/// How displayed text is broken into lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapPolicy {
    /// No soft wrapping; paragraphs become single visual lines.
    None,
    /// Wrap at the first glyph that no longer fits.
    #[default]
    Char,
    /// Prefer breaking after whitespace, falling back to glyph wrap.
    Word,
}

/// Layout parameter set. Any change invalidates the shaped text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextParams {
    /// Font size in pixels per em.
    pub px_per_em: f32,
    /// Baseline distance; `0` derives it from the font size.
    pub line_height: f32,
    /// Scale applied to the line height; `0` selects the default `1.2`.
    pub line_height_scale: f32,
    /// Wrap width in pixels; `f32::INFINITY` disables width limits.
    pub max_width: f32,
    /// Minimum reported layout width.
    pub min_width: f32,
    /// Tab width measured in space advances.
    pub tab_width: usize,
    pub wrap: WrapPolicy,
    pub alignment: Alignment,
}

impl Default for TextParams {
    fn default() -> Self {
        Self {
            px_per_em: 14.0,
            line_height: 0.0,
            line_height_scale: 0.0,
            max_width: f32::INFINITY,
            min_width: 0.0,
            tab_width: 4,
            wrap: WrapPolicy::default(),
            alignment: Alignment::default(),
        }
    }
}

impl TextParams {
    /// The baseline distance used by the layout, applying defaults the same
    /// way a shaper would.
    pub fn effective_line_height(&self) -> f32 {
        let base = if self.line_height > 0.0 {
            self.line_height
        } else {
            self.px_per_em
        };
        let scale = if self.line_height_scale > 0.0 {
            self.line_height_scale
        } else {
            1.2
        };
        base * scale
    }
}

/// A resolved caret position: document rune offset, visual line/column, and
/// pixel coordinates (baseline `y`).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CombinedPos {
    pub runes: usize,
    pub line: usize,
    pub col: usize,
    pub x: f32,
    pub y: f32,
    pub ascent: f32,
    pub descent: f32,
}

/// The shaped and wrapped form of the whole document.
#[derive(Default)]
pub struct TextLayout {
    lines: Vec<Line>,
    paragraphs: Vec<Paragraph>,
    /// Ascending rune offsets of grapheme-cluster boundaries, `0..=len`.
    graphemes: Vec<usize>,
    size: Size,
    line_height: f32,
    total_runes: usize,
}

impl TextLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    pub fn graphemes(&self) -> &[usize] {
        &self.graphemes
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn line_height(&self) -> f32 {
        self.line_height
    }

    pub fn total_runes(&self) -> usize {
        self.total_runes
    }

    /// Re-lay the document. `text` is an immutable snapshot; the engine holds
    /// no reference to it once the call returns.
    pub fn layout(&mut self, text: &str, shaper: &mut dyn Shaper, params: &TextParams) -> Size {
        self.lines.clear();
        self.paragraphs.clear();

        self.line_height = params.effective_line_height();
        let space = shaper
            .shape(params, " ")
            .first()
            .map(|g| g.advance)
            .unwrap_or(params.px_per_em / 2.0);
        let tab_px = space * params.tab_width.max(1) as f32;

        let mut rune_off = 0usize;
        let mut para = Paragraph::default();

        for para_text in split_paragraphs(text) {
            let glyphs = shaper.shape(params, para_text);
            let runes: Vec<char> = para_text.chars().collect();

            for mut line in wrap_paragraph(glyphs, &runes, params, tab_px) {
                let align = align_offset(params, line.width);
                line.recompute(align, rune_off);
                let baseline = self.lines.len() as f32 * self.line_height + line.ascent;
                line.adjust_y(baseline);
                rune_off += line.runes;

                if para.add(&line) {
                    self.paragraphs.push(std::mem::take(&mut para));
                }
                self.lines.push(line);
            }
        }

        if text.is_empty() || text.ends_with('\n') {
            // The caret can rest on the line after the final hard break.
            let mut line = Line::default();
            let (ascent, descent) = self
                .lines
                .last()
                .map(|l| (l.ascent, l.descent))
                .unwrap_or((params.px_per_em * 0.8, params.px_per_em * 0.2));
            line.ascent = ascent;
            line.descent = descent;
            line.recompute(align_offset(params, 0.0), rune_off);
            line.adjust_y(self.lines.len() as f32 * self.line_height + ascent);

            let mut trailing = Paragraph::default();
            trailing.add(&line);
            self.paragraphs.push(trailing);
            self.lines.push(line);
        } else if para.runes > 0 {
            self.paragraphs.push(para);
        }

        self.total_runes = rune_off;
        self.rebuild_graphemes(text);

        let max_line_width = self
            .lines
            .iter()
            .map(|l| l.x_off + l.width)
            .fold(0.0f32, f32::max);
        let width = if params.max_width.is_finite() {
            params.max_width.max(params.min_width)
        } else {
            max_line_width.max(params.min_width)
        };
        self.size = Size::new(width, self.lines.len() as f32 * self.line_height);
        self.size
    }

    fn rebuild_graphemes(&mut self, text: &str) {
        self.graphemes.clear();
        let mut off = 0usize;
        for cluster in text.graphemes(true) {
            self.graphemes.push(off);
            off += cluster.chars().count();
        }
        self.graphemes.push(off);
    }

    /// Maximum caret column on `line`: the position just before a hard break,
    /// or the line end for soft-wrapped lines.
    fn max_caret_col(line: &Line) -> usize {
        let breaks = line
            .glyphs
            .last()
            .map(|g| {
                if g.flags.contains(GlyphFlags::PARAGRAPH_BREAK) {
                    g.runes
                } else {
                    0
                }
            })
            .unwrap_or(0);
        line.runes - breaks
    }

    /// Pixel x of the caret boundary at `rune` within `line`.
    fn x_in_line(line: &Line, rune: usize) -> f32 {
        let mut off = line.rune_off;
        for glyph in &line.glyphs {
            if off >= rune {
                return glyph.x;
            }
            off += glyph.runes;
        }
        match line.glyphs.last() {
            Some(last) => last.x + last.advance,
            None => line.x_off,
        }
    }

    fn pos_at(&self, line_idx: usize, rune: usize) -> CombinedPos {
        let line = &self.lines[line_idx];
        CombinedPos {
            runes: rune,
            line: line_idx,
            col: rune - line.rune_off,
            x: Self::x_in_line(line, rune),
            y: line.y_off,
            ascent: line.ascent,
            descent: line.descent,
        }
    }

    /// Resolve the position of the caret boundary at rune offset `rune`,
    /// clamped to `[0, len]`.
    pub fn closest_to_rune(&self, rune: usize) -> CombinedPos {
        if self.lines.is_empty() {
            return CombinedPos::default();
        }
        let rune = rune.min(self.total_runes);
        let idx = self
            .lines
            .partition_point(|l| l.rune_off <= rune)
            .saturating_sub(1);
        self.pos_at(idx, rune)
    }

    /// Resolve a visual `(line, col)` position; both clamp into range, and
    /// the column stops before a hard break.
    pub fn closest_to_line_col(&self, line: usize, col: usize) -> CombinedPos {
        if self.lines.is_empty() {
            return CombinedPos::default();
        }
        let line_idx = line.min(self.lines.len() - 1);
        let l = &self.lines[line_idx];
        let col = col.min(Self::max_caret_col(l));
        self.pos_at(line_idx, l.rune_off + col)
    }

    /// Resolve the caret boundary closest to pixel coordinates `(x, y)`: the
    /// line whose vertical band contains `y` (or the nearest line), then the
    /// glyph whose horizontal center is nearest `x`, biased by glyph
    /// direction.
    pub fn closest_to_xy(&self, x: f32, y: f32) -> CombinedPos {
        if self.lines.is_empty() {
            return CombinedPos::default();
        }
        let idx = self
            .lines
            .partition_point(|l| l.y_off + l.descent <= y)
            .min(self.lines.len() - 1);
        let line = &self.lines[idx];
        let max_col = Self::max_caret_col(line);

        let mut best_col = 0usize;
        let mut best_dist = f32::INFINITY;
        let mut col = 0usize;
        for glyph in &line.glyphs {
            let center = glyph.x + glyph.advance / 2.0;
            let dist = (center - x).abs();
            if dist < best_dist {
                best_dist = dist;
                let rtl = glyph.flags.contains(GlyphFlags::TOWARD_ORIGIN);
                let before_center = x < center;
                best_col = if before_center != rtl {
                    col
                } else {
                    (col + glyph.runes).min(max_col)
                };
            }
            col += glyph.runes;
        }
        self.pos_at(idx, line.rune_off + best_col.min(max_col))
    }

    /// Collect one rectangle per visual line covering the glyphs of
    /// `[start, end)` that intersect `viewport`.
    pub fn locate(&self, viewport: Rect, start: usize, end: usize, regions: &mut Vec<Region>) {
        regions.clear();
        if start >= end {
            return;
        }

        for line in &self.lines {
            if line.y_off - line.ascent >= viewport.max.y {
                break;
            }
            if line.y_off + line.descent <= viewport.min.y {
                continue;
            }
            if start >= line.rune_off + line.runes.max(1) || end <= line.rune_off {
                continue;
            }

            let mut min_x = f32::INFINITY;
            let mut max_x = f32::NEG_INFINITY;
            let mut off = line.rune_off;
            for glyph in &line.glyphs {
                let glyph_end = off + glyph.runes;
                if off < end && glyph_end > start {
                    min_x = min_x.min(glyph.x);
                    max_x = max_x.max(glyph.x + glyph.advance);
                }
                off = glyph_end;
            }
            if min_x > max_x {
                // An empty line inside the range still marks its left edge.
                min_x = line.x_off;
                max_x = line.x_off;
            }

            let min_x = min_x.max(viewport.min.x);
            let max_x = max_x.min(viewport.max.x);
            if max_x < min_x {
                continue;
            }
            regions.push(Region {
                bounds: Rect::new(
                    Point::new(min_x, line.y_off - line.ascent),
                    Point::new(max_x, line.y_off + line.descent),
                ),
            });
        }
    }
}

fn align_offset(params: &TextParams, line_width: f32) -> f32 {
    if !params.max_width.is_finite() {
        return 0.0;
    }
    match params.alignment {
        Alignment::Start => 0.0,
        Alignment::Middle => ((params.max_width - line_width) / 2.0).max(0.0),
        Alignment::End => (params.max_width - line_width).max(0.0),
    }
}

/// Split text into hard-break-delimited paragraphs, breaks included.
fn split_paragraphs(text: &str) -> impl Iterator<Item = &str> {
    text.split_inclusive('\n')
}

fn tab_advance(x: f32, tab_px: f32) -> f32 {
    let stop = ((x / tab_px).floor() + 1.0) * tab_px;
    stop - x
}

/// Wrap one paragraph's glyph stream into visual lines.
fn wrap_paragraph(
    glyphs: Vec<Glyph>,
    runes: &[char],
    params: &TextParams,
    tab_px: f32,
) -> Vec<Line> {
    let max_w = match params.wrap {
        WrapPolicy::None => f32::INFINITY,
        _ => params.max_width,
    };

    let mut lines = Vec::new();
    let mut line = Line::default();
    let mut x = 0.0f32;

    // Word policy buffers the in-flight word so the whole word can move to
    // the next line when it overflows.
    let mut word: Vec<Glyph> = Vec::new();
    let mut word_width = 0.0f32;

    let mut rune_cursor = 0usize;
    for mut glyph in glyphs {
        let first_rune = runes.get(rune_cursor).copied().unwrap_or(' ');
        rune_cursor += glyph.runes.max(1);

        let is_tab = first_rune == '\t';
        let is_para_break = glyph.flags.contains(GlyphFlags::PARAGRAPH_BREAK);
        let is_space = first_rune.is_whitespace();

        let buffer_word = params.wrap == WrapPolicy::Word && !is_space && !is_para_break;
        if buffer_word {
            if x + word_width + glyph.advance > max_w {
                if !line.glyphs.is_empty() {
                    // Break before the word.
                    lines.push(std::mem::take(&mut line));
                    x = 0.0;
                } else if !word.is_empty() {
                    // The word alone exceeds the width; split it.
                    for g in word.drain(..) {
                        line.append(g);
                    }
                    x += word_width;
                    word_width = 0.0;
                    lines.push(std::mem::take(&mut line));
                    x = 0.0;
                }
            }
            word.push(glyph);
            word_width += glyph.advance;
            continue;
        }

        // Whitespace and breaks flush the pending word onto the line first.
        for g in word.drain(..) {
            line.append(g);
        }
        x += word_width;
        word_width = 0.0;

        if is_tab {
            glyph.advance = tab_advance(x, tab_px);
        }
        if !is_para_break && !line.glyphs.is_empty() && x + glyph.advance > max_w {
            lines.push(std::mem::take(&mut line));
            x = 0.0;
            if is_tab {
                // A tab carried to a fresh line expands from column zero.
                glyph.advance = tab_advance(0.0, tab_px);
            }
        }
        x += glyph.advance;
        line.append(glyph);
    }

    for g in word.drain(..) {
        line.append(g);
    }
    if !line.glyphs.is_empty() {
        lines.push(line);
    }
    lines
}
