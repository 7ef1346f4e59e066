//! Auto-completion sessions.
//!
//! A completor registers a [`Trigger`]: a set of trigger characters and an
//! optional key binding. A session starts when a trigger fires, accumulates
//! the typed prefix, re-ranks candidates on every input, and ends on
//! confirmation, cancellation, or a terminating character. Completors must
//! return synchronously; asynchronous producers keep a local cache and
//! return what they have.

use crate::error::EditorError;
use crate::events::{Key, KeyEvent, Modifiers};
use crate::geom::Point;

/// A document position carried through the completion API. `line` counts
/// paragraphs, `column` runes within the paragraph; `runes` is the absolute
/// rune offset when known (zero when only line/column are set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DocPosition {
    pub line: usize,
    pub column: usize,
    pub runes: usize,
}

/// A rune range expressed as document positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EditRange {
    pub start: DocPosition,
    pub end: DocPosition,
}

impl EditRange {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Context captured at the caret when a completion event fires.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompletionContext {
    /// The text of the input event that produced this context.
    pub input: String,
    pub position: DocPosition,
    /// Caret coordinates in document space, for popup placement.
    pub coords: Point,
}

/// How a candidate's text is to be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextFormat {
    #[default]
    PlainText,
    Snippet,
}

/// The edit a candidate applies on confirmation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextEdit {
    pub range: EditRange,
    pub new_text: String,
    pub format: TextFormat,
}

/// One completion candidate.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Candidate {
    pub label: String,
    pub description: String,
    /// Coarse kind tag ("function", "variable", ...), host-defined.
    pub kind: String,
    pub text_edit: TextEdit,
}

/// A key combination that activates a completor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBinding {
    pub key: Key,
    pub modifiers: Modifiers,
}

/// Trigger description of a completor.
#[derive(Debug, Clone, Default)]
pub struct Trigger {
    /// Inputs that start a session when typed (e.g. `"."`).
    pub characters: Vec<String>,
    pub key_binding: Option<KeyBinding>,
}

impl Trigger {
    fn activates_on_key(&self, event: KeyEvent) -> bool {
        self.key_binding
            .is_some_and(|b| b.key == event.key && b.modifiers == event.modifiers)
    }
}

/// A source of completion candidates. All methods must return synchronously.
pub trait Completor {
    fn trigger(&self) -> Trigger;
    fn suggest(&mut self, ctx: &CompletionContext) -> Vec<Candidate>;
    fn filter_and_rank(&mut self, prefix: &str, candidates: &[Candidate]) -> Vec<Candidate>;
}

/// The edit to apply after a candidate is confirmed.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmAction {
    pub range: EditRange,
    pub new_text: String,
    pub format: TextFormat,
}

const TERMINATING_CHARS: [char; 10] = ['{', '}', '(', ')', ',', ';', ' ', '\n', '\t', '.'];

fn has_terminating_char(input: &str) -> bool {
    input
        .chars()
        .next()
        .is_some_and(|c| TERMINATING_CHARS.contains(&c))
}

pub(crate) fn is_symbol_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn can_trigger(trigger: &Trigger, input: &str) -> bool {
    if trigger.characters.iter().any(|c| c == input) {
        return true;
    }
    input.chars().next().is_some_and(is_symbol_char)
}

/// Per-session state: prefix typed since activation and the range it covers.
struct Session {
    completor: usize,
    triggered: bool,
    trigger_chars: String,
    canceled: bool,
    prefix: Vec<char>,
    prefix_range: EditRange,
    candidates: Vec<Candidate>,
    ctx: CompletionContext,
}

impl Session {
    fn new(completor: usize) -> Self {
        Self {
            completor,
            triggered: true,
            trigger_chars: String::new(),
            canceled: false,
            prefix: Vec::new(),
            prefix_range: EditRange::default(),
            candidates: Vec::new(),
            ctx: CompletionContext::default(),
        }
    }

    fn is_valid(&self) -> bool {
        !self.canceled
    }

    fn invalidate(&mut self) {
        self.canceled = true;
        self.prefix.clear();
        self.prefix_range = EditRange::default();
        self.candidates.clear();
    }

    fn update(&mut self, ctx: CompletionContext, completor: &mut dyn Completor) -> Vec<Candidate> {
        if self.canceled {
            return Vec::new();
        }

        if self.triggered {
            self.candidates = completor.suggest(&ctx);
            self.trigger_chars = ctx.input.clone();
            self.triggered = false;
            self.prefix.clear();
            self.prefix_range = EditRange::default();
        }

        // A terminating character always ends the session, including trigger
        // characters typed mid-session (method chaining).
        if has_terminating_char(&ctx.input) && ctx.input != self.trigger_chars {
            self.invalidate();
            return Vec::new();
        }

        self.ctx = ctx;

        let input = self.ctx.input.clone();
        if input.chars().next().is_some_and(is_symbol_char) {
            self.prefix.extend(input.chars());
            if self.prefix_range.is_empty() {
                let mut start = self.ctx.position;
                start.column = start.column.saturating_sub(input.chars().count());
                start.runes = 0;
                self.prefix_range.start = start;
            }
            self.prefix_range.end = self.ctx.position;
            self.prefix_range.end.runes = 0;
        }

        let prefix: String = self.prefix.iter().collect();
        completor.filter_and_rank(&prefix, &self.candidates)
    }

    fn prefix_range(&self) -> EditRange {
        self.prefix_range
    }
}

/// Session manager owned by the editor.
#[derive(Default)]
pub struct Completion {
    completors: Vec<Box<dyn Completor>>,
    session: Option<Session>,
    candidates: Vec<Candidate>,
    /// Keeps the popup mounted for one frame after cancellation so the host
    /// widget can detach its event handlers.
    linger: bool,
}

impl Completion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a completor. Fails when its key binding is already taken by
    /// another registered completor.
    pub fn add_completor(&mut self, completor: Box<dyn Completor>) -> Result<(), EditorError> {
        let binding = completor.trigger().key_binding;
        if let Some(binding) = binding {
            let duplicated = self
                .completors
                .iter()
                .any(|c| c.trigger().key_binding == Some(binding));
            if duplicated {
                return Err(EditorError::DuplicateKeyBinding);
            }
        }
        self.completors.push(completor);
        Ok(())
    }

    pub fn has_completors(&self) -> bool {
        !self.completors.is_empty()
    }

    /// Whether a session is live.
    pub fn is_active(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_valid())
    }

    /// Current candidate list for the popup.
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Popup placement coordinates of the active session.
    pub fn offset(&self) -> Point {
        self.session.as_ref().map(|s| s.ctx.coords).unwrap_or_default()
    }

    /// Take the one-frame linger flag set by cancellation.
    pub fn take_linger(&mut self) -> bool {
        std::mem::replace(&mut self.linger, false)
    }

    /// Whether any registered completor's key binding matches `event`.
    pub fn matches_key(&self, event: KeyEvent) -> bool {
        self.completors
            .iter()
            .any(|c| c.trigger().activates_on_key(event))
    }

    /// Activate a key-triggered completor. Returns `true` when a session
    /// started.
    pub fn on_key(&mut self, event: KeyEvent, ctx: CompletionContext) -> bool {
        self.cancel();

        let Some(idx) = self
            .completors
            .iter()
            .position(|c| c.trigger().activates_on_key(event))
        else {
            return false;
        };

        let mut session = Session::new(idx);
        let candidates = session.update(ctx, self.completors[idx].as_mut());
        self.session = Some(session);
        self.set_candidates(candidates);
        true
    }

    /// Feed a text input to the active session, or try to open one.
    pub fn on_text(&mut self, ctx: CompletionContext) {
        if ctx.input.is_empty() {
            self.cancel();
            return;
        }

        if let Some(session) = self.session.as_mut() {
            if session.is_valid() {
                let completor = self.completors[session.completor].as_mut();
                let candidates = session.update(ctx.clone(), completor);
                if session.is_valid() {
                    self.set_candidates(candidates);
                    return;
                }
                // The session was just terminated (e.g. by a trigger char
                // like "."); fall through and see if the same input starts a
                // new one.
                self.linger = true;
                self.candidates.clear();
            }
        }

        let Some(idx) = self
            .completors
            .iter()
            .position(|c| can_trigger(&c.trigger(), &ctx.input))
        else {
            return;
        };

        let mut session = Session::new(idx);
        let candidates = session.update(ctx, self.completors[idx].as_mut());
        self.session = Some(session);
        self.set_candidates(candidates);
    }

    fn set_candidates(&mut self, candidates: Vec<Candidate>) {
        self.candidates = candidates;
    }

    /// Invalidate the session. The popup stays for one more frame.
    pub fn cancel(&mut self) {
        if let Some(session) = self.session.as_mut() {
            if session.is_valid() {
                session.invalidate();
                self.linger = true;
            }
        }
        self.candidates.clear();
    }

    /// Resolve candidate `idx` into the edit to apply: the candidate's range
    /// merged with the session's tracked prefix range.
    pub fn confirm(&mut self, idx: usize) -> Option<ConfirmAction> {
        let candidate = self.candidates.get(idx)?;
        let prefix_range = self
            .session
            .as_ref()
            .map(|s| s.prefix_range())
            .unwrap_or_default();
        let range = merge_range(candidate.text_edit.range, prefix_range);
        Some(ConfirmAction {
            range,
            new_text: candidate.text_edit.new_text.clone(),
            format: candidate.text_edit.format,
        })
    }
}

/// Merge two edit ranges on the same line: earlier start, later end. An
/// empty range yields the other; ranges on different lines keep the first.
fn merge_range(r1: EditRange, r2: EditRange) -> EditRange {
    if r1.is_empty() {
        return r2;
    }
    if r2.is_empty() {
        return r1;
    }
    if r1.start.line != r2.start.line || r1.end.line != r2.end.line {
        return r1;
    }

    let mut out = r1;
    if r2.start.column < out.start.column {
        out.start = r2.start;
    }
    if r2.end.column > out.end.column {
        out.end = r2.end;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    struct WordCompletor {
        words: Vec<&'static str>,
        trigger: Trigger,
    }

    impl WordCompletor {
        fn new(words: Vec<&'static str>) -> Self {
            Self {
                words,
                trigger: Trigger::default(),
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
                        new_text: w.to_string(),
                        ..TextEdit::default()
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

    fn ctx(input: &str, column: usize) -> CompletionContext {
        CompletionContext {
            input: input.to_string(),
            position: DocPosition {
                line: 0,
                column,
                runes: 0,
            },
            coords: Point::default(),
        }
    }

    #[test]
    fn test_symbol_chars() {
        assert!(is_symbol_char('a'));
        assert!(is_symbol_char('Z'));
        assert!(is_symbol_char('0'));
        assert!(is_symbol_char('_'));
        assert!(!is_symbol_char('.'));
        assert!(!is_symbol_char(' '));
    }

    #[test]
    fn test_char_trigger_opens_session_and_filters() {
        let mut completion = Completion::new();
        completion
            .add_completor(Box::new(WordCompletor::new(vec!["foo", "fob", "bar"])))
            .unwrap();

        completion.on_text(ctx("f", 1));
        assert!(completion.is_active());
        assert_eq!(completion.candidates().len(), 2);

        completion.on_text(ctx("o", 2));
        assert_eq!(completion.candidates().len(), 1);
        assert_eq!(completion.candidates()[0].label, "foo");
    }

    #[test]
    fn test_terminator_cancels_then_retrigger() {
        let mut completion = Completion::new();
        completion
            .add_completor(Box::new(
                WordCompletor::new(vec!["map", "len"]).with_chars(&["."]),
            ))
            .unwrap();

        completion.on_text(ctx("f", 1));
        assert!(completion.is_active());

        // "." terminates the running session and immediately starts a new
        // one because it is a trigger character.
        completion.on_text(ctx(".", 2));
        assert!(completion.is_active());
        assert_eq!(completion.candidates().len(), 2);
    }

    #[test]
    fn test_terminator_without_trigger_closes() {
        let mut completion = Completion::new();
        completion
            .add_completor(Box::new(WordCompletor::new(vec!["foo"])))
            .unwrap();

        completion.on_text(ctx("f", 1));
        assert!(completion.is_active());

        completion.on_text(ctx(" ", 2));
        assert!(!completion.is_active());
        assert!(completion.candidates().is_empty());
    }

    #[test]
    fn test_key_trigger() {
        let mut completion = Completion::new();
        completion
            .add_completor(Box::new(
                WordCompletor::new(vec!["foo"]).with_key(Key::Char(' '), Modifiers::CTRL),
            ))
            .unwrap();

        let started = completion.on_key(
            KeyEvent::new(Key::Char(' '), Modifiers::CTRL),
            ctx("", 0),
        );
        assert!(started);
        assert!(completion.is_active());
        assert_eq!(completion.candidates().len(), 1);

        let started = completion.on_key(KeyEvent::plain(Key::Tab), ctx("", 0));
        assert!(!started);
    }

    #[test]
    fn test_duplicate_key_binding_rejected() {
        let mut completion = Completion::new();
        completion
            .add_completor(Box::new(
                WordCompletor::new(vec!["a"]).with_key(Key::Char('p'), Modifiers::CTRL),
            ))
            .unwrap();
        let err = completion.add_completor(Box::new(
            WordCompletor::new(vec!["b"]).with_key(Key::Char('p'), Modifiers::CTRL),
        ));
        assert!(err.is_err());
    }

    #[test]
    fn test_cancel_sets_linger_one_frame() {
        let mut completion = Completion::new();
        completion
            .add_completor(Box::new(WordCompletor::new(vec!["foo"])))
            .unwrap();
        completion.on_text(ctx("f", 1));

        completion.cancel();
        assert!(!completion.is_active());
        assert!(completion.take_linger());
        assert!(!completion.take_linger());
    }

    #[test]
    fn test_prefix_range_tracking() {
        let mut completion = Completion::new();
        completion
            .add_completor(Box::new(WordCompletor::new(vec!["foobar"])))
            .unwrap();

        completion.on_text(ctx("f", 1));
        completion.on_text(ctx("o", 2));
        completion.on_text(ctx("o", 3));

        let action = completion.confirm(0).unwrap();
        assert_eq!(action.range.start.column, 0);
        assert_eq!(action.range.end.column, 3);
        assert_eq!(action.new_text, "foobar");
    }

    #[test]
    fn test_merge_range() {
        let mk = |sc, ec| EditRange {
            start: DocPosition { line: 0, column: sc, runes: 0 },
            end: DocPosition { line: 0, column: ec, runes: 0 },
        };
        assert_eq!(merge_range(mk(2, 4), mk(0, 3)), mk(0, 4));
        assert_eq!(merge_range(EditRange::default(), mk(1, 2)), mk(1, 2));
        assert_eq!(merge_range(mk(1, 2), EditRange::default()), mk(1, 2));

        let other_line = EditRange {
            start: DocPosition { line: 1, column: 0, runes: 0 },
            end: DocPosition { line: 1, column: 2, runes: 0 },
        };
        assert_eq!(merge_range(mk(1, 2), other_line), mk(1, 2));
    }
}
