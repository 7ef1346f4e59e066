//! caret-core — Headless Text Editing Kernel
//!
//! # Overview
//!
//! `caret-core` is the editing core of an interactive source-code editor:
//! it holds an editable document, shapes it into visual lines, maintains
//! caret and selection state across edits, and coordinates auto-completion
//! sessions. It draws nothing and owns no event loop; the host supplies a
//! shaper and delivers input events, and receives lines, regions, and
//! decorations to paint.
//!
//! # Core Features
//!
//! - **Piece-table storage**: append-only buffers, coalescing single-rune
//!   inserts, undo/redo via saved piece-range swaps
//! - **Paragraph layout**: soft wrapping, pixel tab stops, Bidi visual
//!   reordering, grapheme-aligned caret queries
//! - **View engine**: viewport/scrolling, sticky-column vertical motion,
//!   word navigation, selection region location
//! - **Editor dispatch**: pointer/key/IME/paste events, bracket/quote
//!   auto-pairing, indent rules, column-edit cursors
//! - **Completion sessions**: char/key triggers, prefix tracking,
//!   terminator handling, confirm-range merging
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Editor (events, modes, completion)         │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  TextView (viewport, caret, selection)      │  ← Caret Engine
//! ├─────────────────────────────────────────────┤
//! │  TextLayout (wrap, Bidi, queries)           │  ← Text Layout
//! ├─────────────────────────────────────────────┤
//! │  PieceTableReader (positional reads)        │  ← Document Source
//! ├─────────────────────────────────────────────┤
//! │  PieceTable (pieces, undo/redo)             │  ← Text Storage
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use caret_core::editor::Editor;
//! use caret_core::events::{EditEvent, InputEvent};
//!
//! let mut editor = Editor::with_text("hello\n");
//! editor.set_caret(5, 5);
//! editor.process_event(InputEvent::Edit(EditEvent::new(5, 5, ", world")));
//! assert_eq!(editor.text(), "hello, world\n");
//! ```
//!
//! # Concurrency
//!
//! The core is single-threaded and cooperative. All mutation happens on the
//! event-processing thread; no operation suspends, and event handlers must
//! return before the next event is delivered. The document source is shared
//! between the editor and the view through `Rc<RefCell<_>>`, which enforces
//! the no-edits-during-layout contract at runtime.

pub mod brackets;
pub mod completion;
pub mod decorations;
pub mod editor;
pub mod error;
pub mod events;
pub mod geom;
pub mod gutter;
pub mod layout;
pub mod line;
pub mod mode;
pub mod shaper;
pub mod snippet;
pub mod source;
pub mod storage;
pub mod view;
pub mod word;

pub use brackets::BracketQuotes;
pub use completion::{
    Candidate, Completion, CompletionContext, Completor, ConfirmAction, DocPosition, EditRange,
    KeyBinding, TextEdit, TextFormat, Trigger,
};
pub use decorations::{Color, Decoration, DecorationStore};
pub use editor::{Clipboard, Editor, EditorOptions};
pub use error::EditorError;
pub use events::{
    EditEvent, EditorEvent, InputEvent, Key, KeyEvent, Modifiers, PointerEvent, PointerKind,
};
pub use geom::{Point, Rect, Size};
pub use gutter::{
    GutterCell, GutterContext, GutterManager, GutterParagraph, GutterProvider, LineHighlight,
    LineNumbers,
};
pub use layout::{Alignment, CombinedPos, TextLayout, TextParams, WrapPolicy};
pub use line::{Line, Paragraph, Region};
pub use mode::{ColumnCursor, ColumnEditState, Mode};
pub use shaper::{Glyph, GlyphFlags, MonoShaper, Shaper};
pub use snippet::{SnippetContext, SnippetTemplate, TabStop};
pub use source::{LineInfo, PieceTableReader};
pub use storage::{CursorPos, Piece, PieceTable};
pub use view::{SelectionAction, SharedSource, TextView};
pub use word::DEFAULT_WORD_SEPARATORS;
