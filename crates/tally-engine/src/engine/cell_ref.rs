//! Cell key parsing, formatting and arithmetic.
//!
//! Provides bidirectional conversion between spreadsheet keys (e.g. "A1",
//! "B2", "AA100") and zero-indexed column/row coordinates. Keys are strict:
//! one or more uppercase letters followed by one or more digits, nothing else.
//!
//! # Examples
//!
//! ```
//! use tally_engine::engine::CellRef;
//!
//! let cell: CellRef = "B3".parse().unwrap();
//! assert_eq!(cell.col, 1); // 0-indexed
//! assert_eq!(cell.row, 2);
//! assert_eq!(cell.to_string(), "B3");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use super::error::KeyError;

/// A reference to a cell by column and row indices (0-indexed).
///
/// Ordering is row-major: all of row 0 sorts before row 1.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

fn key_re() -> &'static Regex {
    static KEY_RE: OnceLock<Regex> = OnceLock::new();
    KEY_RE.get_or_init(|| {
        Regex::new(r"^(?<letters>[A-Z]+)(?<digits>[0-9]+)$").expect("cell key regex must compile")
    })
}

/// Returns true if `key` is a well-formed cell key that maps to a real cell.
pub fn is_valid_key(key: &str) -> bool {
    CellRef::parse(key).is_ok()
}

/// The letter (column) part of a key, e.g. "AB" for "AB12".
pub fn col_of(key: &str) -> Result<&str, KeyError> {
    let caps = key_re()
        .captures(key)
        .ok_or_else(|| KeyError::InvalidKey(key.to_string()))?;
    Ok(caps.name("letters").map_or("", |m| m.as_str()))
}

/// The digit (row) part of a key, e.g. "12" for "AB12".
pub fn row_of(key: &str) -> Result<&str, KeyError> {
    let caps = key_re()
        .captures(key)
        .ok_or_else(|| KeyError::InvalidKey(key.to_string()))?;
    Ok(caps.name("digits").map_or("", |m| m.as_str()))
}

/// Zero-based row index of a 1-based row number string ("1" -> 0).
pub fn index_of_row(digits: &str) -> Result<usize, KeyError> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(KeyError::InvalidKey(digits.to_string()));
    }
    digits
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .ok_or_else(|| KeyError::InvalidKey(digits.to_string()))
}

/// Zero-based column index of a base-26 letter string ("A" -> 0, "AA" -> 26).
pub fn index_of_col(letters: &str) -> Result<usize, KeyError> {
    if letters.is_empty() {
        return Err(KeyError::InvalidKey(letters.to_string()));
    }
    let mut acc = 0usize;
    for b in letters.bytes() {
        if !b.is_ascii_uppercase() {
            return Err(KeyError::InvalidKey(letters.to_string()));
        }
        let digit = (b - b'A') as usize + 1;
        acc = acc
            .checked_mul(26)
            .and_then(|n| n.checked_add(digit))
            .ok_or_else(|| KeyError::InvalidKey(letters.to_string()))?;
    }
    Ok(acc - 1)
}

/// Key string for a zero-based (column, row) pair.
pub fn key_from_indices(col: usize, row: usize) -> String {
    CellRef::new(col, row).to_string()
}

/// Key one row further down, e.g. "B3" -> "B4".
pub fn increment_row(key: &str) -> Result<String, KeyError> {
    Ok(CellRef::parse(key)?.next_row().to_string())
}

/// Key one row further up, e.g. "B3" -> "B2". Fails on row 1.
pub fn decrement_row(key: &str) -> Result<String, KeyError> {
    Ok(CellRef::parse(key)?.prev_row()?.to_string())
}

/// Key one column to the right, e.g. "Z1" -> "AA1".
pub fn increment_col(key: &str) -> Result<String, KeyError> {
    Ok(CellRef::parse(key)?.next_col().to_string())
}

/// Key one column to the left, e.g. "AA1" -> "Z1". Fails on column A.
pub fn decrement_col(key: &str) -> Result<String, KeyError> {
    Ok(CellRef::parse(key)?.prev_col()?.to_string())
}

impl CellRef {
    pub fn new(col: usize, row: usize) -> CellRef {
        CellRef { row, col }
    }

    /// Parse a strict uppercase key such as "A1" or "AB12".
    pub fn parse(key: &str) -> Result<CellRef, KeyError> {
        let col = index_of_col(col_of(key)?)?;
        let row = index_of_row(row_of(key)?)?;
        Ok(CellRef::new(col, row))
    }

    pub fn next_row(self) -> CellRef {
        CellRef::new(self.col, self.row + 1)
    }

    pub fn prev_row(self) -> Result<CellRef, KeyError> {
        let row = self
            .row
            .checked_sub(1)
            .ok_or_else(|| KeyError::IndexOutOfRange(self.to_string()))?;
        Ok(CellRef::new(self.col, row))
    }

    pub fn next_col(self) -> CellRef {
        CellRef::new(self.col + 1, self.row)
    }

    pub fn prev_col(self) -> Result<CellRef, KeyError> {
        let col = self
            .col
            .checked_sub(1)
            .ok_or_else(|| KeyError::IndexOutOfRange(self.to_string()))?;
        Ok(CellRef::new(col, self.row))
    }

    /// Convert column index to spreadsheet-style letters (0 -> A, 25 -> Z, 26 -> AA).
    pub fn col_to_letters(col: usize) -> String {
        let mut result = String::new();
        let mut n = col as u128 + 1;
        while n > 0 {
            n -= 1;
            result.insert(0, (b'A' + (n % 26) as u8) as char);
            n /= 26;
        }
        result
    }
}

impl std::str::FromStr for CellRef {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CellRef::parse(s)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", CellRef::col_to_letters(self.col), self.row + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_letter_columns() {
        assert_eq!(CellRef::parse("A1").unwrap(), CellRef::new(0, 0));
        assert_eq!(CellRef::parse("B1").unwrap(), CellRef::new(1, 0));
        assert_eq!(CellRef::parse("Z10").unwrap(), CellRef::new(25, 9));
    }

    #[test]
    fn test_parse_multi_letter_columns() {
        assert_eq!(CellRef::parse("AA1").unwrap().col, 26);
        assert_eq!(CellRef::parse("AZ1").unwrap().col, 51);
        assert_eq!(CellRef::parse("BA1").unwrap().col, 52);
    }

    #[test]
    fn test_parse_rejects_malformed_keys() {
        for bad in ["", "123", "ABC", "A0", "1A", "A 1", "a1", "A1B", "A-1"] {
            assert!(
                matches!(CellRef::parse(bad), Err(KeyError::InvalidKey(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_overflow_is_invalid() {
        let huge = format!("{}1", "Z".repeat(40));
        assert!(CellRef::parse(&huge).is_err());
    }

    #[test]
    fn test_row_and_col_parts() {
        assert_eq!(col_of("AB12").unwrap(), "AB");
        assert_eq!(row_of("AB12").unwrap(), "12");
        assert!(row_of("12AB").is_err());
    }

    #[test]
    fn test_index_conversions() {
        assert_eq!(index_of_row("1").unwrap(), 0);
        assert_eq!(index_of_row("42").unwrap(), 41);
        assert_eq!(index_of_col("A").unwrap(), 0);
        assert_eq!(index_of_col("Z").unwrap(), 25);
        assert_eq!(index_of_col("AA").unwrap(), 26);
        assert!(index_of_row("0").is_err());
    }

    #[test]
    fn test_key_from_indices_is_inverse() {
        for (col, row) in [(0, 0), (25, 3), (26, 0), (701, 9), (702, 99)] {
            let key = key_from_indices(col, row);
            assert_eq!(CellRef::parse(&key).unwrap(), CellRef::new(col, row));
        }
        assert_eq!(key_from_indices(702, 0), "AAA1");
    }

    #[test]
    fn test_key_arithmetic() {
        assert_eq!(increment_row("B3").unwrap(), "B4");
        assert_eq!(decrement_row("B3").unwrap(), "B2");
        assert_eq!(increment_col("Z1").unwrap(), "AA1");
        assert_eq!(decrement_col("AA1").unwrap(), "Z1");
    }

    #[test]
    fn test_decrement_below_zero_fails() {
        assert!(matches!(
            decrement_row("C1"),
            Err(KeyError::IndexOutOfRange(_))
        ));
        assert!(matches!(
            decrement_col("A7"),
            Err(KeyError::IndexOutOfRange(_))
        ));
    }

    #[test]
    fn test_ordering_is_row_major() {
        let mut keys = vec![CellRef::new(1, 0), CellRef::new(0, 1), CellRef::new(0, 0)];
        keys.sort();
        assert_eq!(keys, vec![CellRef::new(0, 0), CellRef::new(1, 0), CellRef::new(0, 1)]);
    }
}
