//! Gutter provider interface.
//!
//! Gutter columns (line numbers, diff markers, breakpoints) are supplied by
//! the host as [`GutterProvider`]s. The manager orders providers by priority
//! (higher priority renders farther from the text), aggregates widths, and
//! performs line hit-testing over the paragraph bands of the current layout.
//! Rendering itself stays with the host: providers return abstract cells.

use crate::decorations::Color;
use crate::geom::Rect;

/// Per-paragraph layout info handed to providers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GutterParagraph {
    /// Paragraph index (logical line number, zero-based).
    pub index: usize,
    /// Baseline of the paragraph's first visual line.
    pub start_y: f32,
    /// Baseline of the paragraph's last visual line.
    pub end_y: f32,
    pub ascent: f32,
    pub descent: f32,
    pub rune_off: usize,
    pub runes: usize,
}

/// Context for one gutter layout pass.
#[derive(Debug, Clone, PartialEq)]
pub struct GutterContext {
    /// Viewport in document coordinates.
    pub viewport: Rect,
    /// Paragraphs intersecting the viewport.
    pub paragraphs: Vec<GutterParagraph>,
    /// The caret's logical line, when the selection is empty.
    pub current_line: Option<usize>,
    pub line_height: f32,
    /// Total logical line count of the document.
    pub total_lines: usize,
}

/// One renderable cell of a gutter column.
#[derive(Debug, Clone, PartialEq)]
pub struct GutterCell {
    /// Logical line the cell belongs to.
    pub line: usize,
    /// Text content (e.g. the line number).
    pub text: String,
    /// Whether the cell marks the current line.
    pub highlight: bool,
}

/// A full-width line highlight requested by a provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineHighlight {
    pub line: usize,
    pub color: Color,
}

/// A gutter column supplied by the host or a plugin.
pub trait GutterProvider {
    /// Stable identifier; re-registering the same id replaces the provider.
    fn id(&self) -> &str;

    /// Priority orders columns from the text outward.
    fn priority(&self) -> i32;

    /// Column width in pixels for a document of `line_count` lines.
    fn width(&self, line_count: usize) -> f32;

    /// Produce the visible cells for this pass.
    fn layout(&mut self, ctx: &GutterContext) -> Vec<GutterCell>;

    /// Optional click handling; return `true` when the click was consumed.
    fn handle_click(&mut self, line: usize, num_clicks: u8) -> bool {
        let _ = (line, num_clicks);
        false
    }

    /// Optional full-width line highlights.
    fn line_highlights(&self, ctx: &GutterContext) -> Vec<LineHighlight> {
        let _ = ctx;
        Vec::new()
    }
}

/// A click resolved to a provider and logical line.
#[derive(Debug, Clone, PartialEq)]
pub struct GutterClick {
    pub provider_id: String,
    pub line: usize,
    pub num_clicks: u8,
}

/// Coordinates the registered gutter providers.
#[derive(Default)]
pub struct GutterManager {
    providers: Vec<Box<dyn GutterProvider>>,
    /// Spacing between columns in pixels.
    gap: f32,
    /// Cached from the last layout pass, for hit testing.
    paragraphs: Vec<GutterParagraph>,
    line_height: f32,
    viewport: Rect,
}

impl GutterManager {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            gap: 2.0,
            paragraphs: Vec::new(),
            line_height: 0.0,
            viewport: Rect::default(),
        }
    }

    /// Register a provider, replacing any provider with the same id.
    pub fn register(&mut self, provider: Box<dyn GutterProvider>) {
        if let Some(existing) = self
            .providers
            .iter_mut()
            .find(|p| p.id() == provider.id())
        {
            *existing = provider;
        } else {
            self.providers.push(provider);
        }
        // Higher priority first: rendered left-to-right, farther from text.
        self.providers.sort_by_key(|p| std::cmp::Reverse(p.priority()));
    }

    /// Remove a provider by id.
    pub fn unregister(&mut self, id: &str) {
        self.providers.retain(|p| p.id() != id);
    }

    pub fn has_providers(&self) -> bool {
        !self.providers.is_empty()
    }

    pub fn set_gap(&mut self, gap: f32) {
        self.gap = gap;
    }

    /// Total width of all columns including gaps.
    pub fn total_width(&self, line_count: usize) -> f32 {
        if self.providers.is_empty() {
            return 0.0;
        }
        let widths: f32 = self.providers.iter().map(|p| p.width(line_count)).sum();
        widths + self.gap * (self.providers.len() - 1) as f32
    }

    /// Run a layout pass, caching the context for hit tests. Returns each
    /// provider's cells in render order.
    pub fn layout(&mut self, ctx: &GutterContext) -> Vec<(String, Vec<GutterCell>)> {
        self.paragraphs = ctx.paragraphs.clone();
        self.line_height = ctx.line_height;
        self.viewport = ctx.viewport;

        self.providers
            .iter_mut()
            .map(|p| (p.id().to_string(), p.layout(ctx)))
            .collect()
    }

    /// Line highlights from all providers.
    pub fn line_highlights(&self, ctx: &GutterContext) -> Vec<LineHighlight> {
        let mut out: Vec<LineHighlight> = self
            .providers
            .iter()
            .flat_map(|p| p.line_highlights(ctx))
            .collect();
        out.sort_by_key(|h| h.line);
        out
    }

    /// Dispatch a click at local gutter coordinates, returning the consumed
    /// event if a provider handled it.
    pub fn handle_click(&mut self, y: f32, num_clicks: u8) -> Option<GutterClick> {
        let line = self.hit_test_line(y)?;
        for provider in &mut self.providers {
            if provider.handle_click(line, num_clicks) {
                return Some(GutterClick {
                    provider_id: provider.id().to_string(),
                    line,
                    num_clicks,
                });
            }
        }
        None
    }

    /// Resolve a local y coordinate to the logical line whose expanded band
    /// contains it. Bands grow by the leading (line height minus glyph
    /// height) so the gaps between lines stay clickable.
    pub fn hit_test_line(&self, y: f32) -> Option<usize> {
        if self.paragraphs.is_empty() {
            return None;
        }
        let doc_y = y + self.viewport.min.y;
        for para in &self.paragraphs {
            let (top, bottom) = self.expand_bounds(para);
            if doc_y >= top && doc_y <= bottom {
                return Some(para.index);
            }
        }
        None
    }

    fn expand_bounds(&self, para: &GutterParagraph) -> (f32, f32) {
        let glyph_height = para.ascent + para.descent;
        let leading = (self.line_height - glyph_height).max(0.0);
        let top_leading = leading / 2.0;
        (
            para.start_y - para.ascent - top_leading,
            para.end_y + para.descent + (leading - top_leading),
        )
    }
}

/// Built-in line-number column.
pub struct LineNumbers {
    digit_width: f32,
    padding: f32,
}

impl LineNumbers {
    pub fn new(digit_width: f32) -> Self {
        Self {
            digit_width,
            padding: 4.0,
        }
    }
}

impl GutterProvider for LineNumbers {
    fn id(&self) -> &str {
        "line_numbers"
    }

    fn priority(&self) -> i32 {
        0
    }

    fn width(&self, line_count: usize) -> f32 {
        let digits = line_count.max(1).ilog10() as usize + 1;
        digits as f32 * self.digit_width + self.padding * 2.0
    }

    fn layout(&mut self, ctx: &GutterContext) -> Vec<GutterCell> {
        ctx.paragraphs
            .iter()
            .map(|p| GutterCell {
                line: p.index,
                text: (p.index + 1).to_string(),
                highlight: ctx.current_line == Some(p.index),
            })
            .collect()
    }
}
