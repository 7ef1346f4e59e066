//! Public error type.

use thiserror::Error;

/// Errors surfaced by the fallible parts of the editing core. Precondition
/// failures (out-of-range indices and the like) are reported as `bool` or
/// `Option` returns instead and never reach this type.
#[derive(Debug, Error)]
pub enum EditorError {
    /// Two registered completors share the same key binding.
    #[error("duplicated completion key binding")]
    DuplicateKeyBinding,

    /// A snippet template could not be parsed.
    #[error("invalid snippet template: {0}")]
    SnippetParse(String),
}
