//! Error types for Tally core.

use thiserror::Error;

use tally_engine::engine::KeyError;

/// Errors that can occur in the Tally spreadsheet model.
///
/// Formula mistakes are not errors at this level; they show up as markers in
/// the affected cell's display.
#[derive(Error, Debug)]
pub enum TallyError {
    #[error(transparent)]
    Key(#[from] KeyError),

    #[error("Index {index} out of range (valid: 0..={max})")]
    IndexOutOfRange { index: usize, max: usize },

    #[error("Cell {key} lies outside the {rows}x{cols} grid")]
    KeyOutOfRange { key: String, rows: usize, cols: usize },

    #[error("Observer is not registered on this cell")]
    ObserverNotFound,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, TallyError>;
