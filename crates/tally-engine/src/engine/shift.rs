//! Reference rewriting for structural edits.
//!
//! When a row or column is inserted or deleted, keys inside formula text can
//! be moved along with the cells they point at. Quoted text is left alone.

use regex::{Captures, Regex};
use std::sync::OnceLock;

use super::cell_ref::CellRef;
use super::token::DEAD_REF;

/// Operation for shifting cell references in formulas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShiftOperation {
    InsertRow(usize),
    DeleteRow(usize),
    InsertColumn(usize),
    DeleteColumn(usize),
}

fn key_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b[A-Z]+[0-9]+\b").expect("key token regex must compile")
    })
}

/// Shift cell references in a formula when rows/cols are inserted/deleted.
/// Returns the updated formula string.
///
/// Rules:
/// - Insert row at R: refs to row >= R become row + 1
/// - Delete row at R: refs to row > R become row - 1; row == R becomes `#REF!`
/// - Same logic for columns
pub fn shift_formula_references(formula: &str, op: ShiftOperation) -> String {
    let mut out = String::with_capacity(formula.len());
    let mut rest = formula;

    // Alternate between unquoted and quoted segments.
    while let Some(open) = rest.find('"') {
        out.push_str(&shift_segment(&rest[..open], op));
        let quoted = &rest[open..];
        match quoted[1..].find('"') {
            Some(close) => {
                out.push_str(&quoted[..close + 2]);
                rest = &quoted[close + 2..];
            }
            None => {
                // Unterminated quote: keep the remainder verbatim.
                out.push_str(quoted);
                return out;
            }
        }
    }
    out.push_str(&shift_segment(rest, op));
    out
}

fn shift_segment(segment: &str, op: ShiftOperation) -> String {
    key_token_re()
        .replace_all(segment, |caps: &Captures| shift_single_ref(&caps[0], op))
        .into_owned()
}

fn shift_single_ref(key: &str, op: ShiftOperation) -> String {
    let Ok(cr) = CellRef::parse(key) else {
        return key.to_string();
    };

    match op {
        ShiftOperation::InsertRow(at) if cr.row >= at => cr.next_row().to_string(),
        ShiftOperation::InsertColumn(at) if cr.col >= at => cr.next_col().to_string(),
        ShiftOperation::DeleteRow(at) if cr.row == at => DEAD_REF.to_string(),
        ShiftOperation::DeleteColumn(at) if cr.col == at => DEAD_REF.to_string(),
        ShiftOperation::DeleteRow(at) if cr.row > at => {
            CellRef::new(cr.col, cr.row - 1).to_string()
        }
        ShiftOperation::DeleteColumn(at) if cr.col > at => {
            CellRef::new(cr.col - 1, cr.row).to_string()
        }
        _ => key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_row_shifts_refs_at_or_below() {
        assert_eq!(
            shift_formula_references("SUM(A1..A3) + B2", ShiftOperation::InsertRow(1)),
            "SUM(A1..A4) + B3"
        );
    }

    #[test]
    fn test_insert_column_shifts_refs_at_or_right() {
        assert_eq!(
            shift_formula_references("REF(A1) + Z2", ShiftOperation::InsertColumn(0)),
            "REF(B1) + AA2"
        );
    }

    #[test]
    fn test_delete_row_marks_dead_refs() {
        assert_eq!(
            shift_formula_references("REF(A2) + A3 + A1", ShiftOperation::DeleteRow(1)),
            "REF(#REF!) + A2 + A1"
        );
    }

    #[test]
    fn test_delete_column_marks_dead_refs() {
        assert_eq!(
            shift_formula_references("B1..C1", ShiftOperation::DeleteColumn(1)),
            "#REF!..B1"
        );
    }

    #[test]
    fn test_quoted_text_is_untouched() {
        assert_eq!(
            shift_formula_references(r#""A1" + A1"#, ShiftOperation::InsertRow(0)),
            r#""A1" + A2"#
        );
        assert_eq!(
            shift_formula_references(r#"A1 + "B2"#, ShiftOperation::InsertRow(0)),
            r#"A2 + "B2"#
        );
    }

    #[test]
    fn test_function_names_are_not_keys() {
        assert_eq!(
            shift_formula_references("SUM(1, 2)", ShiftOperation::InsertRow(0)),
            "SUM(1, 2)"
        );
    }
}
