//! Error types for the engine.
//!
//! Two families live here:
//! - [`KeyError`] is a caller-contract failure from key addressing. It is
//!   returned as a hard `Err` and never shows up in a cell.
//! - [`FormulaError`] is an authoring mistake inside a formula. It never
//!   escapes the evaluator; its `Display` text is the marker shown in the
//!   offending cell.

use thiserror::Error;

/// Errors raised by key parsing and key arithmetic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("Invalid cell key: {0}")]
    InvalidKey(String),

    #[error("Cannot step {0} past the first row or column")]
    IndexOutOfRange(String),
}

/// User-data errors produced while tokenizing, parsing or evaluating a formula.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormulaError {
    #[error("#QUOTE!")]
    UnterminatedQuote,

    #[error("#PAREN!")]
    UnmatchedParenthesis,

    #[error("#TOKEN!")]
    UnrecognizedInput,

    #[error("#CALL!")]
    MissingParentheses,

    #[error("#ARGS!")]
    MissingArguments,

    #[error("#KEY!")]
    InvalidKey,

    #[error("#OPERAND!")]
    MissingOperand,

    #[error("#SYNTAX!")]
    TrailingInput,

    #[error("#VALUE!")]
    NotNumeric,

    #[error("#SELF!")]
    SelfReference,

    #[error("#REF!")]
    OutOfBounds,

    #[error("#RANGE!")]
    RangeTooLarge,
}

impl FormulaError {
    /// The marker string displayed in a cell that failed with this error.
    pub fn marker(self) -> String {
        self.to_string()
    }
}
