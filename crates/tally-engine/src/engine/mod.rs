//! Spreadsheet engine API.
//!
//! This module provides the pure computation side of the spreadsheet:
//!
//! - [`CellRef`] and the key helpers - Key addressing (A1 notation ↔ column/row indices)
//! - [`tokenize`] / [`parse_tokens`] - Formula text to token buffer to expression tree
//! - [`evaluate`] / [`evaluate_cell`] - Formula evaluation against a [`CellLookup`]
//! - [`shift_formula_references`] - Rewrite keys when rows/columns move
//! - [`format_number`] - Format numbers for display

mod cell_ref;
mod error;
mod eval;
mod format;
mod parse;
mod shift;
mod token;
mod value;

pub use cell_ref::{
    CellRef, col_of, decrement_col, decrement_row, increment_col, increment_row, index_of_col,
    index_of_row, is_valid_key, key_from_indices, row_of,
};
pub use error::{FormulaError, KeyError};
pub use eval::{CellLookup, EvalOptions, Evaluation, evaluate, evaluate_cell};
pub use format::format_number;
pub use parse::{Expr, parse_tokens};
pub use shift::{ShiftOperation, shift_formula_references};
pub use token::{DEAD_REF, Operator, Token, tokenize};
pub use value::Value;
