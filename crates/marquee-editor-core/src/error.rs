use marquee_common::ApiError;
use miette::Diagnostic;
use smol_str::SmolStr;
use thiserror::Error;

use crate::registry::FieldKind;

/// Errors raised by editor state operations.
#[derive(Debug, Error, Diagnostic)]
pub enum EditorError {
    #[error("failed to save page {page}")]
    #[diagnostic(
        code(editor::save),
        help("Your edits are still in the draft; try saving again")
    )]
    Save {
        page: SmolStr,
        #[source]
        source: ApiError,
    },

    #[error("a save for page {page} is already in flight")]
    #[diagnostic(code(editor::save_in_flight))]
    SaveInFlight { page: SmolStr },

    #[error("upload into {key} failed")]
    #[diagnostic(code(editor::upload))]
    Upload {
        key: SmolStr,
        #[source]
        source: ApiError,
    },

    #[error("page {page} has no section {section}")]
    #[diagnostic(code(editor::unknown_section))]
    UnknownSection { page: SmolStr, section: SmolStr },

    #[error("page {page} has no field {key}")]
    #[diagnostic(code(editor::unknown_field))]
    UnknownField { page: SmolStr, key: SmolStr },

    #[error("{op} does not apply to {key} ({kind:?} field)")]
    #[diagnostic(code(editor::field_kind))]
    FieldKind {
        key: SmolStr,
        kind: FieldKind,
        op: &'static str,
    },

    #[error("index {index} out of range for {key} (length {len})")]
    #[diagnostic(code(editor::index))]
    IndexOutOfRange {
        key: SmolStr,
        index: usize,
        len: usize,
    },

    #[error("{key} already holds the maximum of {max} items")]
    #[diagnostic(code(editor::array_full))]
    ArrayFull { key: SmolStr, max: usize },

    #[error("invalid origin {origin:?}: {message}")]
    #[diagnostic(code(editor::origin))]
    InvalidOrigin { origin: String, message: String },
}

pub type Result<T> = std::result::Result<T, EditorError>;
