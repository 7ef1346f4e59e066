use caret_core::{
    Color, Decoration, Editor, MonoShaper, Point, Rect, Size, TextLayout, TextParams, WrapPolicy,
};

fn layout_of(text: &str, params: &TextParams) -> TextLayout {
    let mut layout = TextLayout::new();
    layout.layout(text, &mut MonoShaper::new(), params);
    layout
}

fn params(max_width: f32) -> TextParams {
    TextParams {
        px_per_em: 10.0,
        max_width,
        ..TextParams::default()
    }
}

/// The concatenation of all lines' rune counts reproduces the document rune
/// sequence, for every wrap policy and width.
#[test]
fn test_wrapped_lines_cover_document() {
    let text = "The quick brown fox\njumps over\t the lazy dog\n\nmixed 你好 width and שלום rtl";
    for policy in [WrapPolicy::None, WrapPolicy::Char, WrapPolicy::Word] {
        for width in [25.0, 40.0, 80.0, f32::INFINITY] {
            let mut p = params(width);
            p.wrap = policy;
            let layout = layout_of(text, &p);

            let total: usize = layout.lines().iter().map(|l| l.runes).sum();
            assert_eq!(total, text.chars().count(), "policy {policy:?} width {width}");

            let mut expected_off = 0;
            for line in layout.lines() {
                assert_eq!(line.rune_off, expected_off);
                expected_off += line.runes;
            }
        }
    }
}

/// Paragraph boundaries sit exactly at hard breaks, and all visual lines of
/// paragraph i precede those of paragraph i+1.
#[test]
fn test_paragraph_ordering_invariant() {
    let text = "alpha beta gamma\ndelta\n\nepsilon zeta eta theta";
    let layout = layout_of(text, &params(30.0));

    let mut expected_off = 0;
    for p in layout.paragraphs() {
        assert_eq!(p.rune_off, expected_off);
        expected_off += p.runes;
    }
    assert_eq!(expected_off, text.chars().count());
}

/// Mixed-direction lines keep the total glyph span equal to the advance sum
/// and never produce negative positions.
#[test]
fn test_bidi_mixed_line() {
    let layout = layout_of("AB שלום CD", &params(f32::INFINITY));
    assert_eq!(layout.lines().len(), 1);
    let line = &layout.lines()[0];

    let sum: f32 = line.glyphs.iter().map(|g| g.advance).sum();
    let min = line.glyphs.iter().map(|g| g.x).fold(f32::INFINITY, f32::min);
    let max = line
        .glyphs
        .iter()
        .map(|g| g.x + g.advance)
        .fold(f32::NEG_INFINITY, f32::max);

    assert!((max - min - sum).abs() < 1e-3);
    assert!(line.glyphs.iter().all(|g| g.x >= 0.0));
}

/// Located rectangles cover exactly the selected glyphs inside the viewport:
/// one rectangle per visual line, horizontal extent matching the glyphs in
/// range.
#[test]
fn test_selection_regions_cover_range() {
    let mut editor = Editor::with_text("abcd\nefgh\nijkl");
    editor.view_mut().set_font_size(10.0);
    editor.view_mut().set_viewport(Size::new(200.0, 100.0));

    let regions = editor.view_mut().regions(1, 11);
    assert_eq!(regions.len(), 3);

    // Line 0: glyphs 1..4 plus the hard break at x 20.
    assert_eq!(regions[0].bounds.min.x, 5.0);
    assert_eq!(regions[0].bounds.max.x, 20.0);
    // Line 1 fully covered.
    assert_eq!(regions[1].bounds.min.x, 0.0);
    assert_eq!(regions[1].bounds.max.x, 20.0);
    // Line 2: glyph "i" only.
    assert_eq!(regions[2].bounds.min.x, 0.0);
    assert_eq!(regions[2].bounds.max.x, 5.0);
}

#[test]
fn test_regions_clip_to_viewport() {
    let mut editor = Editor::with_text("aa\nbb\ncc\ndd\nee\nff");
    editor.view_mut().set_font_size(10.0);
    editor.view_mut().set_viewport(Size::new(200.0, 24.0));
    editor.view_mut().scroll_abs(0.0, 24.0);

    // Select everything; only the lines inside the scrolled viewport get
    // rectangles.
    let len = editor.len();
    let regions = editor.view_mut().regions(0, len);
    assert_eq!(regions.len(), 2);
    assert!(regions
        .iter()
        .all(|r| r.bounds.min.y >= 24.0 && r.bounds.max.y <= 48.0));
}

#[test]
fn test_empty_selection_has_no_regions() {
    let mut editor = Editor::with_text("abc");
    let regions = editor.view_mut().regions(2, 2);
    assert!(regions.is_empty());
}

#[test]
fn test_selected_lines_inside_wrapped_paragraph() {
    // One long paragraph wrapped at 20px (4 glyphs per line): selecting
    // a mid-section produces one region per visual line.
    let mut editor = Editor::with_text("abcdefghijkl");
    editor.view_mut().set_font_size(10.0);
    editor.view_mut().set_max_width(20.0);
    editor.view_mut().set_viewport(Size::new(200.0, 100.0));

    let regions = editor.view_mut().regions(2, 10);
    assert_eq!(regions.len(), 3);
}

#[test]
fn test_decoration_regions_follow_edits() {
    let mut editor = Editor::with_text("hello world");
    editor.add_decorations(vec![Decoration::background(
        "test",
        6,
        11,
        Color::rgba(1, 2, 3, 255),
    )]);

    // Insert before the decorated range; the decoration shifts right.
    editor.set_caret(0, 0);
    editor.insert(">> ");
    let decos = editor.decorations().all();
    assert_eq!((decos[0].start, decos[0].end), (9, 14));

    let regions = editor.decoration_regions("test");
    assert_eq!(regions.len(), 1);
    let (_, rects) = &regions[0];
    assert_eq!(rects.len(), 1);

    // Replacing the decorated text drops the decoration.
    editor.set_caret(9, 14);
    editor.insert("there");
    assert!(editor.decorations().all().is_empty());
}

#[test]
fn test_decorations_clipped_at_add_time() {
    let mut editor = Editor::with_text("short");
    let kept = editor.add_decorations(vec![
        Decoration::background("t", 0, 100, Color::rgba(0, 0, 0, 255)),
        Decoration::background("t", 50, 60, Color::rgba(0, 0, 0, 255)),
    ]);
    assert_eq!(kept, 1);
    assert_eq!(editor.decorations().all()[0].end, 5);
}

#[test]
fn test_wrap_width_change_invalidates_layout() {
    let mut editor = Editor::with_text("abcdefghij");
    editor.view_mut().set_font_size(10.0);
    editor.view_mut().set_viewport(Size::new(200.0, 100.0));

    let tall = editor.view_mut().dimensions();
    editor.view_mut().set_max_width(20.0);
    let wrapped = editor.view_mut().dimensions();
    assert!(wrapped.height > tall.height);

    editor.view_mut().set_max_width(f32::INFINITY);
    let restored = editor.view_mut().dimensions();
    assert_eq!(restored.height, tall.height);
}

#[test]
fn test_locate_viewport_rect_directly() {
    let layout = layout_of("abcd\nefgh\nijkl", &params(f32::INFINITY));
    let mut regions = Vec::new();
    // Second line band only.
    let viewport = Rect::new(Point::new(0.0, 12.0), Point::new(100.0, 24.0));
    layout.locate(viewport, 0, 14, &mut regions);
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].bounds.min.y, 12.0);
}
