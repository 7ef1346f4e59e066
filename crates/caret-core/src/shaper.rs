//! The shaping interface between the host and the layout engine.
//!
//! The host supplies a [`Shaper`] that turns paragraph text into a stream of
//! positioned glyphs. The layout engine wraps the stream into visual lines and
//! reorders Bidi runs; the shaper only has to report advances, vertical
//! metrics, cluster sizes, and direction.
//!
//! [`MonoShaper`] is a reference implementation with fixed-advance metrics,
//! used by the test suite and suitable for headless hosts.

use bitflags::bitflags;
use unicode_width::UnicodeWidthChar;

use crate::layout::TextParams;

bitflags! {
    /// Per-glyph flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct GlyphFlags: u8 {
        /// The glyph is the final glyph of a visual line.
        const LINE_BREAK = 1 << 0;
        /// The glyph represents a hard paragraph break.
        const PARAGRAPH_BREAK = 1 << 1;
        /// The glyph advances toward the origin (right-to-left).
        const TOWARD_ORIGIN = 1 << 2;
    }
}

/// One shaped glyph.
///
/// `x`/`y` are assigned by the layout engine; shapers may leave them zero.
/// `y` is the baseline. `runes` is the number of runes in the glyph's
/// cluster.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Glyph {
    pub x: f32,
    pub y: f32,
    pub advance: f32,
    pub ascent: f32,
    pub descent: f32,
    pub runes: usize,
    pub flags: GlyphFlags,
}

/// Produces glyphs for a run of text under a parameter set.
///
/// Implementations must return glyphs in logical order, one entry per
/// cluster, covering every rune of `text` exactly once (hard breaks
/// included, flagged with [`GlyphFlags::PARAGRAPH_BREAK`]).
pub trait Shaper {
    fn shape(&mut self, params: &TextParams, text: &str) -> Vec<Glyph>;
}

/// Fixed-advance reference shaper.
///
/// Narrow runes take half an em, wide runes a full em (per UAX #11),
/// zero-width runes nothing. Runes in right-to-left scripts are flagged
/// `TOWARD_ORIGIN`. Clusters are single runes; grapheme grouping is left to
/// the layout's grapheme table.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonoShaper;

impl MonoShaper {
    pub fn new() -> Self {
        Self
    }

    fn is_rtl(c: char) -> bool {
        matches!(c,
            '\u{0590}'..='\u{05FF}'        // Hebrew
            | '\u{0600}'..='\u{06FF}'      // Arabic
            | '\u{0700}'..='\u{074F}'      // Syriac
            | '\u{0750}'..='\u{077F}'      // Arabic Supplement
            | '\u{08A0}'..='\u{08FF}'      // Arabic Extended-A
            | '\u{FB1D}'..='\u{FB4F}'      // Hebrew presentation forms
            | '\u{FB50}'..='\u{FDFF}'      // Arabic presentation forms A
            | '\u{FE70}'..='\u{FEFF}')     // Arabic presentation forms B
    }
}

impl Shaper for MonoShaper {
    fn shape(&mut self, params: &TextParams, text: &str) -> Vec<Glyph> {
        let half_em = params.px_per_em / 2.0;
        let ascent = params.px_per_em * 0.8;
        let descent = params.px_per_em * 0.2;

        let mut glyphs = Vec::with_capacity(text.chars().count());
        for c in text.chars() {
            let mut flags = GlyphFlags::empty();
            let advance = if c == '\n' {
                flags |= GlyphFlags::PARAGRAPH_BREAK;
                0.0
            } else if c == '\t' {
                // Expanded to the next tab stop by the layout engine.
                half_em
            } else {
                half_em * UnicodeWidthChar::width(c).unwrap_or(1) as f32
            };
            if Self::is_rtl(c) {
                flags |= GlyphFlags::TOWARD_ORIGIN;
            }
            glyphs.push(Glyph {
                x: 0.0,
                y: 0.0,
                advance,
                ascent,
                descent,
                runes: 1,
                flags,
            });
        }
        glyphs
    }
}
