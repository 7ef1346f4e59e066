use caret_core::{
    Candidate, CompletionContext, Completor, DocPosition, EditEvent, EditRange, Editor,
    InputEvent, Key, KeyBinding, KeyEvent, Mode, Modifiers, TextEdit, TextFormat, Trigger,
};

/// A synchronous completor over a fixed word list, filtering by prefix.
struct WordCompletor {
    words: Vec<&'static str>,
    trigger: Trigger,
    format: TextFormat,
}

impl WordCompletor {
    fn new(words: Vec<&'static str>) -> Self {
        Self {
            words,
            trigger: Trigger::default(),
            format: TextFormat::PlainText,
        }
    }

    fn with_chars(mut self, chars: &[&str]) -> Self {
        self.trigger.characters = chars.iter().map(|s| s.to_string()).collect();
        self
    }

    fn with_key(mut self, key: Key, modifiers: Modifiers) -> Self {
        self.trigger.key_binding = Some(KeyBinding { key, modifiers });
        self
    }

    fn snippets(mut self) -> Self {
        self.format = TextFormat::Snippet;
        self
    }
}

impl Completor for WordCompletor {
    fn trigger(&self) -> Trigger {
        self.trigger.clone()
    }

    fn suggest(&mut self, _ctx: &CompletionContext) -> Vec<Candidate> {
        self.words
            .iter()
            .map(|w| Candidate {
                label: w.to_string(),
                text_edit: TextEdit {
                    range: EditRange::default(),
                    new_text: w.to_string(),
                    format: self.format,
                },
                ..Candidate::default()
            })
            .collect()
    }

    fn filter_and_rank(&mut self, prefix: &str, candidates: &[Candidate]) -> Vec<Candidate> {
        candidates
            .iter()
            .filter(|c| c.label.starts_with(prefix))
            .cloned()
            .collect()
    }
}

fn type_text(editor: &mut Editor, text: &str) {
    for c in text.chars() {
        let (caret, _) = editor.selection();
        editor.process_event(InputEvent::Edit(EditEvent::new(caret, caret, c.to_string())));
    }
}

#[test]
fn test_typing_opens_session_and_narrows() {
    let mut editor = Editor::new();
    editor
        .add_completor(Box::new(WordCompletor::new(vec!["foo", "fob", "bar"])))
        .unwrap();

    type_text(&mut editor, "f");
    assert!(editor.completion().is_active());
    assert_eq!(editor.completion().candidates().len(), 2);

    type_text(&mut editor, "o");
    let labels: Vec<&str> = editor
        .completion()
        .candidates()
        .iter()
        .map(|c| c.label.as_str())
        .collect();
    assert_eq!(labels, vec!["foo", "fob"]);

    type_text(&mut editor, "o");
    assert_eq!(editor.completion().candidates().len(), 1);
}

#[test]
fn test_terminator_closes_then_trigger_reopens() {
    let mut editor = Editor::new();
    editor
        .add_completor(Box::new(
            WordCompletor::new(vec!["len", "map"]).with_chars(&["."]),
        ))
        .unwrap();

    type_text(&mut editor, "foo");
    assert!(editor.completion().is_active());

    // "." terminates the running session; as a trigger character it then
    // opens a fresh one with unfiltered candidates.
    type_text(&mut editor, ".");
    assert!(editor.completion().is_active());
    assert_eq!(editor.completion().candidates().len(), 2);
    assert_eq!(editor.text(), "foo.");
}

#[test]
fn test_space_closes_session() {
    let mut editor = Editor::new();
    editor
        .add_completor(Box::new(WordCompletor::new(vec!["foo"])))
        .unwrap();

    type_text(&mut editor, "fo");
    assert!(editor.completion().is_active());
    type_text(&mut editor, " ");
    assert!(!editor.completion().is_active());
}

#[test]
fn test_confirm_replaces_typed_prefix() {
    let mut editor = Editor::new();
    editor
        .add_completor(Box::new(WordCompletor::new(vec!["foobar"])))
        .unwrap();

    type_text(&mut editor, "fo");
    assert!(editor.completion().is_active());

    assert!(editor.confirm_completion(0));
    assert_eq!(editor.text(), "foobar");
    assert_eq!(editor.selection(), (6, 6));
    assert!(!editor.completion().is_active());
}

#[test]
fn test_confirm_merges_candidate_range_with_prefix() {
    // The candidate supplies its own range covering "pre" before the typed
    // prefix; the merge takes the earlier start and later end on the line.
    struct RangedCompletor;
    impl Completor for RangedCompletor {
        fn trigger(&self) -> Trigger {
            Trigger::default()
        }
        fn suggest(&mut self, _ctx: &CompletionContext) -> Vec<Candidate> {
            vec![Candidate {
                label: "prefix".into(),
                text_edit: TextEdit {
                    range: EditRange {
                        start: DocPosition { line: 0, column: 0, runes: 0 },
                        end: DocPosition { line: 0, column: 3, runes: 0 },
                    },
                    new_text: "prefix".into(),
                    format: TextFormat::PlainText,
                },
                ..Candidate::default()
            }]
        }
        fn filter_and_rank(&mut self, _prefix: &str, candidates: &[Candidate]) -> Vec<Candidate> {
            candidates.to_vec()
        }
    }

    let mut editor = Editor::with_text("pre");
    editor.set_caret(3, 3);
    editor.add_completor(Box::new(RangedCompletor)).unwrap();

    type_text(&mut editor, "f");
    assert!(editor.completion().is_active());
    assert!(editor.confirm_completion(0));
    // Candidate range [0,3) merged with prefix range [3,4) -> [0,4).
    assert_eq!(editor.text(), "prefix");
}

#[test]
fn test_snippet_candidate_enters_snippet_mode() {
    let mut editor = Editor::new();
    editor
        .add_completor(Box::new(
            WordCompletor::new(vec!["fn ${1:name}() {$0}"]).snippets(),
        ))
        .unwrap();

    type_text(&mut editor, "f");
    assert!(editor.completion().is_active());
    assert!(editor.confirm_completion(0));

    assert_eq!(editor.text(), "fn name() {}");
    assert!(matches!(editor.mode(), Mode::Snippet(_)));
    // Caret selects the first placeholder.
    assert_eq!(editor.selection(), (3, 7));
}

#[test]
fn test_key_triggered_session() {
    let mut editor = Editor::with_text("abc ");
    editor.set_caret(4, 4);
    editor
        .add_completor(Box::new(
            WordCompletor::new(vec!["alpha", "beta"]).with_key(Key::Char(' '), Modifiers::CTRL),
        ))
        .unwrap();

    editor.process_event(InputEvent::Key(KeyEvent::new(
        Key::Char(' '),
        Modifiers::CTRL,
    )));
    assert!(editor.completion().is_active());
    assert_eq!(editor.completion().candidates().len(), 2);
}

#[test]
fn test_click_cancels_session_with_linger_frame() {
    let mut editor = Editor::new();
    editor
        .add_completor(Box::new(WordCompletor::new(vec!["foo"])))
        .unwrap();

    type_text(&mut editor, "f");
    assert!(editor.completion().is_active());

    editor.process_event(InputEvent::Pointer(caret_core::PointerEvent::press(
        caret_core::Point::new(0.0, 0.0),
        Modifiers::empty(),
        1,
    )));
    assert!(!editor.completion().is_active());
    // The popup stays mounted for exactly one frame to detach handlers.
    assert!(editor.completion_mut().take_linger());
    assert!(!editor.completion_mut().take_linger());
}

#[test]
fn test_focus_loss_cancels_session() {
    let mut editor = Editor::new();
    editor
        .add_completor(Box::new(WordCompletor::new(vec!["foo"])))
        .unwrap();

    type_text(&mut editor, "f");
    assert!(editor.completion().is_active());
    editor.process_event(InputEvent::FocusLost);
    assert!(!editor.completion().is_active());
}

#[test]
fn test_escape_cancels_session() {
    let mut editor = Editor::new();
    editor
        .add_completor(Box::new(WordCompletor::new(vec!["foo"])))
        .unwrap();

    type_text(&mut editor, "f");
    editor.process_event(InputEvent::Key(KeyEvent::plain(Key::Escape)));
    assert!(!editor.completion().is_active());
}

#[test]
fn test_duplicate_key_binding_rejected() {
    let mut editor = Editor::new();
    editor
        .add_completor(Box::new(
            WordCompletor::new(vec!["a"]).with_key(Key::Char('p'), Modifiers::CTRL),
        ))
        .unwrap();
    assert!(editor
        .add_completor(Box::new(
            WordCompletor::new(vec!["b"]).with_key(Key::Char('p'), Modifiers::CTRL),
        ))
        .is_err());
}
