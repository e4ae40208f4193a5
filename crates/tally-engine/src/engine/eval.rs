//! Formula evaluation.
//!
//! [`evaluate`] turns a raw input string into a display string plus the set
//! of keys it read ("observees"). It never fails: every user-data problem is
//! reported as an error marker in the display, alongside whatever observees
//! were discovered before the failure. Cell values come from a
//! [`CellLookup`], so the evaluator itself holds no state.

use std::collections::BTreeSet;

use crate::builtins::{Builtin, apply_aggregate};

use super::cell_ref::CellRef;
use super::error::FormulaError;
use super::parse::{Expr, parse_tokens};
use super::token::{Operator, tokenize};
use super::value::Value;

/// Read access to the current display value of other cells.
pub trait CellLookup {
    /// Display value of `key`, or `None` when the key lies outside the grid.
    fn display(&self, key: &CellRef) -> Option<String>;
}

/// Knobs that shape evaluation and formatting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EvalOptions {
    /// Ranges covering more cells than this evaluate to `#RANGE!`.
    pub max_range_cells: usize,
    /// Cap on fractional digits shown for non-integral numbers. `None` keeps
    /// full precision so dependent formulas read the exact value.
    pub decimal_places: Option<usize>,
}

impl Default for EvalOptions {
    fn default() -> Self {
        EvalOptions {
            max_range_cells: 1_000_000,
            decimal_places: None,
        }
    }
}

/// Outcome of evaluating one input string.
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    pub display: String,
    pub observees: BTreeSet<CellRef>,
    pub error: Option<FormulaError>,
}

impl Evaluation {
    fn empty() -> Self {
        Evaluation {
            display: String::new(),
            observees: BTreeSet::new(),
            error: None,
        }
    }

    pub fn is_self_reference(&self) -> bool {
        self.error == Some(FormulaError::SelfReference)
    }
}

/// Evaluate `input` against `lookup`.
pub fn evaluate(input: &str, lookup: &dyn CellLookup, options: &EvalOptions) -> Evaluation {
    let body = formula_body(input);
    if body.is_empty() {
        return Evaluation::empty();
    }

    let mut evaluator = Evaluator {
        lookup,
        options,
        observees: BTreeSet::new(),
    };
    let result = tokenize(body)
        .and_then(|tokens| parse_tokens(&tokens))
        .and_then(|expr| evaluator.eval(&expr));

    let observees = evaluator.observees;
    let evaluation = match result {
        Ok(value) => Evaluation {
            display: value.display(options.decimal_places),
            observees,
            error: None,
        },
        Err(err) => Evaluation {
            display: err.marker(),
            observees,
            error: Some(err),
        },
    };
    tracing::trace!(input, display = %evaluation.display, "evaluated formula");
    evaluation
}

/// Evaluate the input of the cell at `owner`. If the formula read the owner
/// itself, the result is forced to the self-reference marker.
pub fn evaluate_cell(
    owner: CellRef,
    input: &str,
    lookup: &dyn CellLookup,
    options: &EvalOptions,
) -> Evaluation {
    let mut evaluation = evaluate(input, lookup, options);
    if evaluation.observees.contains(&owner) {
        evaluation.display = FormulaError::SelfReference.marker();
        evaluation.error = Some(FormulaError::SelfReference);
    }
    evaluation
}

/// Strip surrounding whitespace and an optional leading `=`.
fn formula_body(input: &str) -> &str {
    let trimmed = input.trim();
    trimmed.strip_prefix('=').map_or(trimmed, str::trim)
}

struct Evaluator<'a> {
    lookup: &'a dyn CellLookup,
    options: &'a EvalOptions,
    observees: BTreeSet<CellRef>,
}

impl Evaluator<'_> {
    fn eval(&mut self, expr: &Expr) -> Result<Value, FormulaError> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Text(s) => Ok(Value::Text(s.clone())),
            Expr::Ref(key) => self.read(*key),
            Expr::DeadRef => Err(FormulaError::OutOfBounds),
            Expr::Range(start, end) => self.range(*start, *end),
            Expr::Call { builtin, args } => {
                let values = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                match builtin {
                    Builtin::Ref => Err(FormulaError::InvalidKey),
                    _ => apply_aggregate(*builtin, values),
                }
            }
            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                apply_operator(*op, lhs, rhs)
            }
            Expr::Negate(inner) => {
                let value = self.eval(inner)?;
                Ok(Value::Number(-value.as_number()?))
            }
            Expr::List(items) => {
                let mut flat = Vec::with_capacity(items.len());
                for item in items {
                    self.eval(item)?.flatten_into(&mut flat);
                }
                Ok(Value::List(flat))
            }
        }
    }

    fn read(&mut self, key: CellRef) -> Result<Value, FormulaError> {
        let display = self.lookup.display(&key).ok_or(FormulaError::OutOfBounds)?;
        self.observees.insert(key);
        Ok(Value::from_display(&display))
    }

    /// Every cell in the rectangle spanned by `start` and `end`, row-major.
    fn range(&mut self, start: CellRef, end: CellRef) -> Result<Value, FormulaError> {
        let (min_row, max_row) = (start.row.min(end.row), start.row.max(end.row));
        let (min_col, max_col) = (start.col.min(end.col), start.col.max(end.col));

        let cell_count = (max_row - min_row + 1)
            .checked_mul(max_col - min_col + 1)
            .ok_or(FormulaError::RangeTooLarge)?;
        if cell_count > self.options.max_range_cells {
            return Err(FormulaError::RangeTooLarge);
        }

        let mut members = Vec::with_capacity(cell_count);
        for row in min_row..=max_row {
            for col in min_col..=max_col {
                self.read(CellRef::new(col, row))?
                    .flatten_into(&mut members);
            }
        }
        Ok(Value::List(members))
    }
}

fn apply_operator(op: Operator, lhs: Value, rhs: Value) -> Result<Value, FormulaError> {
    if let (Operator::Add, Value::Text(a), Value::Text(b)) = (op, &lhs, &rhs) {
        return Ok(Value::Text(format!("{a}{b}")));
    }
    let a = lhs.as_number()?;
    let b = rhs.as_number()?;
    let n = match op {
        Operator::Add => a + b,
        Operator::Sub => a - b,
        Operator::Mul => a * b,
        Operator::Div => a / b,
        Operator::Rem => a % b,
        Operator::Pow => a.powf(b),
        Operator::Range => return Err(FormulaError::InvalidKey),
    };
    Ok(Value::Number(n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// A fixed 10x10 grid backed by a map of displays.
    struct MapLookup(HashMap<CellRef, String>);

    impl MapLookup {
        fn new(cells: &[(&str, &str)]) -> Self {
            MapLookup(
                cells
                    .iter()
                    .map(|(k, v)| (CellRef::parse(k).unwrap(), v.to_string()))
                    .collect(),
            )
        }
    }

    impl CellLookup for MapLookup {
        fn display(&self, key: &CellRef) -> Option<String> {
            if key.row >= 10 || key.col >= 10 {
                return None;
            }
            Some(self.0.get(key).cloned().unwrap_or_default())
        }
    }

    fn display(input: &str) -> String {
        evaluate(input, &MapLookup::new(&[]), &EvalOptions::default()).display
    }

    fn keys(list: &[&str]) -> BTreeSet<CellRef> {
        list.iter().map(|k| CellRef::parse(k).unwrap()).collect()
    }

    #[test]
    fn test_empty_input() {
        let result = evaluate("   ", &MapLookup::new(&[]), &EvalOptions::default());
        assert_eq!(result.display, "");
        assert!(result.observees.is_empty());
        assert_eq!(result.error, None);
    }

    #[test]
    fn test_arithmetic_precedence() {
        assert_eq!(display("1 + 2 * 2"), "5");
        assert_eq!(display("1 * (2 + 2)"), "4");
        assert_eq!(display("3 ^ 3"), "27");
        assert_eq!(display("10 % 4"), "2");
        assert_eq!(display("7 / 2"), "3.5");
        assert_eq!(display("2 ^ 3 ^ 2"), "64");
    }

    #[test]
    fn test_unary_minus() {
        assert_eq!(display("-5"), "-5");
        assert_eq!(display("-2 ^ 2"), "-4");
        assert_eq!(display("2 * -3"), "-6");
        assert_eq!(display("-(1 + 2)"), "-3");
    }

    #[test]
    fn test_leading_equals_is_optional() {
        assert_eq!(display("= 1 + 1"), "2");
    }

    #[test]
    fn test_strings() {
        assert_eq!(display(r#""hello""#), "hello");
        assert_eq!(display(r#""foo" + "bar""#), "foobar");
        assert_eq!(display(r#""foo" + 1"#), "#VALUE!");
    }

    #[test]
    fn test_aggregate_functions() {
        assert_eq!(display("SUM(1,2,3)"), "6");
        assert_eq!(display("TOTAL(1, 2) * 2"), "6");
        assert_eq!(display("AVERAGE(10,20,30)"), "20");
        assert_eq!(display("MEAN(1, 2)"), "1.5");
        assert_eq!(display("MIN(1,2,3)"), "1");
        assert_eq!(display("MAXIMUM(1,(2+5),3)"), "7");
        assert_eq!(display("RANGE(4, 9, 1)"), "8");
        assert_eq!(display(r#"SUM(1, "x")"#), "#VALUE!");
    }

    #[test]
    fn test_ref_records_observee() {
        let lookup = MapLookup::new(&[("A1", "10"), ("B2", "hi")]);
        let result = evaluate("REF(A1) + 5", &lookup, &EvalOptions::default());
        assert_eq!(result.display, "15");
        assert_eq!(result.observees, keys(&["A1"]));

        let result = evaluate("REF(B2)", &lookup, &EvalOptions::default());
        assert_eq!(result.display, "hi");
    }

    #[test]
    fn test_bare_key_is_a_reference() {
        let lookup = MapLookup::new(&[("A1", "4")]);
        let result = evaluate("A1 * A2", &lookup, &EvalOptions::default());
        assert_eq!(result.display, "0");
        assert_eq!(result.observees, keys(&["A1", "A2"]));
    }

    #[test]
    fn test_range_operator() {
        let lookup = MapLookup::new(&[("A1", "10"), ("A2", "20"), ("A3", "30"), ("B1", "1")]);
        let options = EvalOptions::default();

        let result = evaluate("SUM(A1..A3)", &lookup, &options);
        assert_eq!(result.display, "60");
        assert_eq!(result.observees, keys(&["A1", "A2", "A3"]));

        // Row-major order, reversed corners normalised.
        let result = evaluate("B2..A1", &lookup, &options);
        assert_eq!(result.display, "10,1,20,");
        assert_eq!(result.observees, keys(&["A1", "B1", "A2", "B2"]));
    }

    #[test]
    fn test_range_with_error_member_is_not_numeric() {
        let lookup = MapLookup::new(&[("A1", "1"), ("A2", "#PAREN!")]);
        let result = evaluate("SUM(A1..A2)", &lookup, &EvalOptions::default());
        assert_eq!(result.display, "#VALUE!");
        assert_eq!(result.observees, keys(&["A1", "A2"]));
    }

    #[test]
    fn test_list_display_of_referenced_range_cell() {
        let lookup = MapLookup::new(&[("C1", "1,2,3")]);
        assert_eq!(
            evaluate("SUM(C1)", &lookup, &EvalOptions::default()).display,
            "6"
        );
    }

    #[test]
    fn test_range_limit() {
        let options = EvalOptions {
            max_range_cells: 4,
            ..EvalOptions::default()
        };
        let result = evaluate("SUM(A1..C3)", &MapLookup::new(&[]), &options);
        assert_eq!(result.display, "#RANGE!");
        assert!(result.observees.is_empty());
    }

    #[test]
    fn test_out_of_bounds_reference() {
        let result = evaluate("REF(Z99)", &MapLookup::new(&[]), &EvalOptions::default());
        assert_eq!(result.error, Some(FormulaError::OutOfBounds));
        assert!(result.observees.is_empty());
    }

    #[test]
    fn test_error_keeps_observees_found_so_far() {
        let lookup = MapLookup::new(&[("A1", "1"), ("A2", "oops")]);
        let result = evaluate("A1 + A2", &lookup, &EvalOptions::default());
        assert_eq!(result.display, "#VALUE!");
        assert_eq!(result.observees, keys(&["A1", "A2"]));
    }

    #[test]
    fn test_distinct_error_markers() {
        assert_eq!(display("\"abc"), "#QUOTE!");
        assert_eq!(display("(1 + 2"), "#PAREN!");
        assert_eq!(display("1 + 2)"), "#PAREN!");
        assert_eq!(display("hello"), "#TOKEN!");
        assert_eq!(display("SUM 1"), "#CALL!");
        assert_eq!(display("SUM (1)"), "#CALL!");
        assert_eq!(display("SUM()"), "#ARGS!");
        assert_eq!(display("REF(12)"), "#KEY!");
        assert_eq!(display("1 +"), "#OPERAND!");
        assert_eq!(display("#REF! + 1"), "#REF!");
    }

    #[test]
    fn test_self_reference() {
        let owner = CellRef::parse("A1").unwrap();
        let result = evaluate_cell(owner, "REF(A1)", &MapLookup::new(&[]), &EvalOptions::default());
        assert_eq!(result.display, "#SELF!");
        assert!(result.is_self_reference());

        let result = evaluate_cell(owner, "SUM(A1..A3)", &MapLookup::new(&[]), &EvalOptions::default());
        assert!(result.is_self_reference());
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(display("1 / 0"), "#INF!");
        assert_eq!(display("0 / 0"), "#NAN!");
    }
}
