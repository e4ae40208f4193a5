//! Runtime values produced while evaluating a formula.

use super::error::FormulaError;
use super::format::format_number;

/// The result of evaluating an expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Empty,
    Number(f64),
    Text(String),
    /// Comma-separated values, e.g. the members of a range.
    List(Vec<Value>),
}

impl Value {
    /// Type a cell's display string for use inside another formula.
    ///
    /// `""` reads as empty, numeric text as a number, comma-joined text as a
    /// list; anything else (including error markers) stays text.
    pub fn from_display(display: &str) -> Value {
        if display.is_empty() {
            return Value::Empty;
        }
        if display.contains(',') {
            return Value::List(display.split(',').map(Value::from_scalar).collect());
        }
        Value::from_scalar(display)
    }

    fn from_scalar(s: &str) -> Value {
        if s.is_empty() {
            Value::Empty
        } else if let Some(n) = parse_number(s) {
            Value::Number(n)
        } else {
            Value::Text(s.to_string())
        }
    }

    /// Numeric view used by arithmetic operators. Empty counts as zero.
    pub fn as_number(&self) -> Result<f64, FormulaError> {
        match self {
            Value::Empty => Ok(0.0),
            Value::Number(n) => Ok(*n),
            Value::Text(_) | Value::List(_) => Err(FormulaError::NotNumeric),
        }
    }

    /// Push this value onto `out`, expanding nested lists in place.
    pub fn flatten_into(self, out: &mut Vec<Value>) {
        match self {
            Value::List(items) => {
                for item in items {
                    item.flatten_into(out);
                }
            }
            other => out.push(other),
        }
    }

    /// Display text. `decimal_places` caps fractional digits when set.
    pub fn display(&self, decimal_places: Option<usize>) -> String {
        match self {
            Value::Empty => String::new(),
            Value::Number(n) => format_number(*n, decimal_places),
            Value::Text(s) => s.clone(),
            Value::List(items) => items
                .iter()
                .map(|v| v.display(decimal_places))
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

/// Parse plain decimal notation only. Rust's `f64` parser also accepts
/// "inf", "NaN" and exponents, none of which a display string should turn into.
fn parse_number(s: &str) -> Option<f64> {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty()
        || !digits.bytes().all(|b| b.is_ascii_digit() || b == b'.')
        || !digits.bytes().any(|b| b.is_ascii_digit())
    {
        return None;
    }
    s.parse::<f64>().ok()
}
