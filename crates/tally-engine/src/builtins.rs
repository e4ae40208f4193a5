//! Built-in spreadsheet functions and their metadata.
//!
//! Conventions:
//! - Spreadsheet-facing built-in names are ALL CAPS (e.g. `SUM`, `AVG`).
//! - Several names may map to the same [`Builtin`] (aliases).
//! - If you add a new built-in, add its row to `BUILTINS` and its arm to
//!   [`apply_aggregate`] (or to the evaluator for reference-style builtins).

use crate::engine::{FormulaError, Value};

/// The functions the formula language knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Builtin {
    /// `REF(key)`: the display value of another cell.
    Ref,
    /// `RANGE(args...)`: max minus min.
    Range,
    Sum,
    Average,
    Max,
    Min,
}

pub struct BuiltinSpec {
    pub name: &'static str,
    pub builtin: Builtin,
    /// One-line summary shown in the command-line help.
    pub description: &'static str,
}

pub const BUILTINS: &[BuiltinSpec] = &[
    BuiltinSpec {
        name: "REF",
        builtin: Builtin::Ref,
        description: "Display value of the referenced cell",
    },
    BuiltinSpec {
        name: "RANGE",
        builtin: Builtin::Range,
        description: "Difference between the largest and smallest argument",
    },
    BuiltinSpec {
        name: "SUM",
        builtin: Builtin::Sum,
        description: "Sum of numeric arguments",
    },
    BuiltinSpec {
        name: "TOTAL",
        builtin: Builtin::Sum,
        description: "Alias of SUM",
    },
    BuiltinSpec {
        name: "AVERAGE",
        builtin: Builtin::Average,
        description: "Mean of numeric arguments",
    },
    BuiltinSpec {
        name: "AVG",
        builtin: Builtin::Average,
        description: "Alias of AVERAGE",
    },
    BuiltinSpec {
        name: "MEAN",
        builtin: Builtin::Average,
        description: "Alias of AVERAGE",
    },
    BuiltinSpec {
        name: "MAX",
        builtin: Builtin::Max,
        description: "Largest numeric argument",
    },
    BuiltinSpec {
        name: "MAXIMUM",
        builtin: Builtin::Max,
        description: "Alias of MAX",
    },
    BuiltinSpec {
        name: "MIN",
        builtin: Builtin::Min,
        description: "Smallest numeric argument",
    },
    BuiltinSpec {
        name: "MINIMUM",
        builtin: Builtin::Min,
        description: "Alias of MIN",
    },
];

/// Resolve an upper-case function name (or alias).
pub fn lookup_builtin(name: &str) -> Option<Builtin> {
    BUILTINS.iter().find(|b| b.name == name).map(|b| b.builtin)
}

/// Flatten arguments into numbers. Empty members are skipped; any other
/// non-numeric member fails the whole call.
fn numeric_args(args: Vec<Value>) -> Result<Vec<f64>, FormulaError> {
    let mut flat = Vec::with_capacity(args.len());
    for arg in args {
        arg.flatten_into(&mut flat);
    }
    let mut numbers = Vec::with_capacity(flat.len());
    for value in flat {
        match value {
            Value::Empty => {}
            Value::Number(n) => numbers.push(n),
            Value::Text(_) | Value::List(_) => return Err(FormulaError::NotNumeric),
        }
    }
    Ok(numbers)
}

/// Apply an aggregate builtin to already-evaluated arguments.
///
/// `REF` is resolved by the evaluator, never here.
pub fn apply_aggregate(builtin: Builtin, args: Vec<Value>) -> Result<Value, FormulaError> {
    if args.is_empty() {
        return Err(FormulaError::MissingArguments);
    }
    let numbers = numeric_args(args)?;

    let result = match builtin {
        Builtin::Sum => numbers.iter().sum::<f64>(),
        Builtin::Average => {
            if numbers.is_empty() {
                return Err(FormulaError::NotNumeric);
            }
            numbers.iter().sum::<f64>() / numbers.len() as f64
        }
        Builtin::Max => extreme(&numbers, f64::max)?,
        Builtin::Min => extreme(&numbers, f64::min)?,
        Builtin::Range => extreme(&numbers, f64::max)? - extreme(&numbers, f64::min)?,
        Builtin::Ref => return Err(FormulaError::InvalidKey),
    };
    Ok(Value::Number(result))
}

fn extreme(numbers: &[f64], pick: fn(f64, f64) -> f64) -> Result<f64, FormulaError> {
    numbers
        .iter()
        .copied()
        .reduce(pick)
        .ok_or(FormulaError::NotNumeric)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nums(values: &[f64]) -> Vec<Value> {
        values.iter().map(|n| Value::Number(*n)).collect()
    }

    #[test]
    fn test_lookup_aliases() {
        assert_eq!(lookup_builtin("SUM"), Some(Builtin::Sum));
        assert_eq!(lookup_builtin("TOTAL"), Some(Builtin::Sum));
        assert_eq!(lookup_builtin("MEAN"), Some(Builtin::Average));
        assert_eq!(lookup_builtin("MINIMUM"), Some(Builtin::Min));
        assert_eq!(lookup_builtin("sum"), None);
        assert_eq!(lookup_builtin("COUNT"), None);
    }

    #[test]
    fn test_aggregates() {
        assert_eq!(
            apply_aggregate(Builtin::Sum, nums(&[1.0, 2.0, 3.0])),
            Ok(Value::Number(6.0))
        );
        assert_eq!(
            apply_aggregate(Builtin::Average, nums(&[10.0, 20.0, 30.0])),
            Ok(Value::Number(20.0))
        );
        assert_eq!(
            apply_aggregate(Builtin::Max, nums(&[4.0, 9.0, 1.0])),
            Ok(Value::Number(9.0))
        );
        assert_eq!(
            apply_aggregate(Builtin::Range, nums(&[4.0, 9.0, 1.0])),
            Ok(Value::Number(8.0))
        );
    }

    #[test]
    fn test_lists_are_flattened_and_empties_skipped() {
        let args = vec![
            Value::List(vec![Value::Number(10.0), Value::Empty, Value::Number(30.0)]),
            Value::Number(2.0),
        ];
        assert_eq!(
            apply_aggregate(Builtin::Average, args),
            Ok(Value::Number(14.0))
        );
    }

    #[test]
    fn test_text_member_fails_whole_call() {
        let args = vec![Value::Number(1.0), Value::Text("#VALUE!".into())];
        assert_eq!(
            apply_aggregate(Builtin::Sum, args),
            Err(FormulaError::NotNumeric)
        );
    }

    #[test]
    fn test_no_numeric_members() {
        assert_eq!(
            apply_aggregate(Builtin::Sum, vec![Value::Empty]),
            Ok(Value::Number(0.0))
        );
        assert_eq!(
            apply_aggregate(Builtin::Min, vec![Value::Empty]),
            Err(FormulaError::NotNumeric)
        );
        assert_eq!(
            apply_aggregate(Builtin::Sum, vec![]),
            Err(FormulaError::MissingArguments)
        );
    }
}
