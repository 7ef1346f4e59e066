use caret_core::{
    Editor, EditorEvent, InputEvent, Key, KeyEvent, Modifiers, Point, PointerEvent, Size,
};

fn editor(text: &str) -> Editor {
    let mut editor = Editor::with_text(text);
    // Fixed metrics: glyph advance 5px, line height 12px.
    editor.view_mut().set_font_size(10.0);
    editor.view_mut().set_viewport(Size::new(200.0, 48.0));
    editor
}

fn press(editor: &mut Editor, key: Key, modifiers: Modifiers) {
    editor.process_event(InputEvent::Key(KeyEvent::new(key, modifiers)));
}

/// Every caret motion must land on a grapheme-cluster boundary.
#[test]
fn test_motions_stay_on_grapheme_boundaries() {
    // Mixed content: combining accent, CJK, emoji, line breaks.
    let mut e = editor("ae\u{0301}b 你好\n🦀 rust\nend");

    let keys = [
        Key::Right,
        Key::Right,
        Key::Down,
        Key::End,
        Key::Left,
        Key::Down,
        Key::Home,
        Key::Up,
        Key::Right,
    ];
    for key in keys {
        press(&mut e, key, Modifiers::empty());
        let (start, end) = e.selection();
        assert_eq!(e.view_mut().move_by_graphemes(start, 0), start);
        assert_eq!(e.view_mut().move_by_graphemes(end, 0), end);
    }
}

#[test]
fn test_vertical_motion_keeps_sticky_column() {
    let mut e = editor("abcdef\nxy\nlmnopq");
    e.set_caret(4, 4);

    press(&mut e, Key::Down, Modifiers::empty());
    // Clamped to the short line's end.
    assert_eq!(e.selection().0, 9);

    press(&mut e, Key::Down, Modifiers::empty());
    // Back out to the remembered column.
    let (line, col) = e.view_mut().caret_pos();
    assert_eq!((line, col), (2, 4));
}

#[test]
fn test_shift_arrow_extends_selection() {
    let mut e = editor("hello");
    press(&mut e, Key::Right, Modifiers::SHIFT);
    press(&mut e, Key::Right, Modifiers::SHIFT);
    assert_eq!(e.selection(), (2, 0));
    assert_eq!(e.selected_text(), "he");

    // A plain arrow collapses the selection.
    press(&mut e, Key::Right, Modifiers::empty());
    let (start, end) = e.selection();
    assert_eq!(start, end);
}

#[test]
fn test_word_motion_keys() {
    let mut e = editor("foo bar baz");
    press(&mut e, Key::Right, Modifiers::CTRL);
    assert_eq!(e.selection().0, 3);
    press(&mut e, Key::Right, Modifiers::CTRL);
    assert_eq!(e.selection().0, 7);
    press(&mut e, Key::Left, Modifiers::CTRL);
    assert_eq!(e.selection().0, 4);
}

#[test]
fn test_home_end_and_document_bounds() {
    let mut e = editor("first\nsecond");
    e.set_caret(8, 8);

    press(&mut e, Key::Home, Modifiers::empty());
    assert_eq!(e.selection().0, 6);
    press(&mut e, Key::End, Modifiers::empty());
    assert_eq!(e.selection().0, 12);

    press(&mut e, Key::Home, Modifiers::CTRL);
    assert_eq!(e.selection().0, 0);
    press(&mut e, Key::End, Modifiers::CTRL);
    assert_eq!(e.selection().0, 12);
}

#[test]
fn test_page_motion_uses_viewport_height() {
    // 8 lines of 12px; viewport is 48px = 4 lines.
    let mut e = editor("a\nb\nc\nd\ne\nf\ng\nh");
    press(&mut e, Key::PageDown, Modifiers::empty());
    let (line, _) = e.view_mut().caret_pos();
    assert_eq!(line, 4);

    press(&mut e, Key::PageUp, Modifiers::empty());
    let (line, _) = e.view_mut().caret_pos();
    assert_eq!(line, 0);
}

#[test]
fn test_single_click_places_caret() {
    let mut e = editor("abcd\nefgh");
    let events = e.process_event(InputEvent::Pointer(PointerEvent::press(
        Point::new(11.0, 14.0),
        Modifiers::empty(),
        1,
    )));
    let (line, col) = e.view_mut().caret_pos();
    assert_eq!((line, col), (1, 2));
    assert!(events.contains(&EditorEvent::Select) || e.selection().0 == 7);
}

#[test]
fn test_double_click_selects_word() {
    let mut e = editor("hello world");
    e.process_event(InputEvent::Pointer(PointerEvent::press(
        Point::new(36.0, 5.0),
        Modifiers::empty(),
        2,
    )));
    let (start, end) = e.selection();
    assert_eq!((start.min(end), start.max(end)), (6, 11));
}

#[test]
fn test_triple_click_selects_line() {
    let mut e = editor("one two\nthree");
    e.process_event(InputEvent::Pointer(PointerEvent::press(
        Point::new(10.0, 5.0),
        Modifiers::empty(),
        3,
    )));
    let (start, end) = e.selection();
    assert_eq!((start.min(end), start.max(end)), (0, 7));
}

#[test]
fn test_shift_click_extends() {
    let mut e = editor("abcdefgh");
    e.set_caret(0, 0);
    e.process_event(InputEvent::Pointer(PointerEvent::press(
        Point::new(30.0, 5.0),
        Modifiers::SHIFT,
        1,
    )));
    let (start, end) = e.selection();
    assert_eq!((start.min(end), start.max(end)), (0, 6));
}

#[test]
fn test_drag_extends_selection() {
    let mut e = editor("abcdefgh");
    e.process_event(InputEvent::Pointer(PointerEvent::press(
        Point::new(0.0, 5.0),
        Modifiers::empty(),
        1,
    )));
    e.process_event(InputEvent::Pointer(PointerEvent::drag(Point::new(20.0, 5.0))));
    e.process_event(InputEvent::Pointer(PointerEvent::release(Point::new(20.0, 5.0))));

    let (start, end) = e.selection();
    assert_eq!((start.min(end), start.max(end)), (0, 4));
}

#[test]
fn test_scroll_event_moves_viewport() {
    let mut e = editor("a\nb\nc\nd\ne\nf\ng\nh\ni\nj");
    e.process_event(InputEvent::Pointer(PointerEvent::scroll(Point::new(0.0, 24.0))));
    assert_eq!(e.view().scroll_off().y, 24.0);

    e.process_event(InputEvent::Pointer(PointerEvent::scroll(Point::new(0.0, 1e6))));
    let bounds = e.view_mut().scroll_bounds();
    assert_eq!(e.view().scroll_off().y, bounds.height);
}

#[test]
fn test_hover_reports_position() {
    let mut e = editor("abcd");
    let events = e.process_event(InputEvent::Pointer(PointerEvent::hover(Point::new(7.0, 5.0))));
    assert_eq!(events.len(), 1);
    match &events[0] {
        EditorEvent::Hover { line, col, runes, .. } => {
            assert_eq!((*line, *col), (0, 1));
            assert_eq!(*runes, 1);
        }
        other => panic!("expected hover event, got {other:?}"),
    }
}

#[test]
fn test_typing_scrolls_caret_into_view() {
    let mut e = editor("a\nb\nc\nd\ne\nf\ng\nh");
    e.set_caret(e.len(), e.len());
    e.process_event(InputEvent::Edit(caret_core::EditEvent::new(
        e.len(),
        e.len(),
        "x",
    )));

    let sel_start = e.selection().0;
    let caret = e.view_mut().closest_to_rune(sel_start);
    let viewport = e.view().viewport();
    assert!(caret.y - caret.ascent >= viewport.min.y);
    assert!(caret.y + caret.descent <= viewport.max.y);
}
