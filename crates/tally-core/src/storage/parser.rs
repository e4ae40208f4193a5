//! Parser for .grd file format

use crate::error::{Result, TallyError};
use crate::storage::SheetRecord;
use std::fs;
use std::path::Path;
use tally_engine::engine::CellRef;

/// Parse a .grd file
pub fn parse_grd(path: &Path) -> Result<SheetRecord> {
    let content = fs::read_to_string(path)?;
    parse_grd_content(&content)
}

/// Parse .grd content from a string.
///
/// Missing `@rows`/`@cols` headers default to the smallest extent holding
/// every listed cell.
pub fn parse_grd_content(content: &str) -> Result<SheetRecord> {
    let mut record = SheetRecord::default();
    let mut rows = None;
    let mut cols = None;
    let (mut min_rows, mut min_cols) = (0, 0);

    for (line_num, line) in content.lines().enumerate() {
        let line_num = line_num + 1;
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((name, value)) = line.split_once(':') else {
            return Err(parse_error(line_num, "Expected 'KEY: VALUE' format"));
        };
        let (name, value) = (name.trim(), value.trim());

        if let Some(header) = name.strip_prefix('@') {
            let n = value
                .parse::<usize>()
                .map_err(|_| parse_error(line_num, &format!("Invalid count: {}", value)))?;
            match header {
                "rows" => rows = Some(n),
                "cols" => cols = Some(n),
                _ => return Err(parse_error(line_num, &format!("Unknown header: @{}", header))),
            }
            continue;
        }

        let cell_ref = CellRef::parse(name)
            .map_err(|_| parse_error(line_num, &format!("Invalid cell reference: {}", name)))?;
        min_rows = min_rows.max(cell_ref.row + 1);
        min_cols = min_cols.max(cell_ref.col + 1);
        record
            .cells
            .insert(cell_ref.to_string(), parse_cell_value(value, line_num)?);
    }

    record.rows = rows.unwrap_or(min_rows);
    record.cols = cols.unwrap_or(min_cols);
    Ok(record)
}

fn parse_error(line: usize, message: &str) -> TallyError {
    TallyError::Parse {
        line,
        message: message.to_string(),
    }
}

/// Quoted values are unescaped; anything else is taken verbatim.
fn parse_cell_value(value: &str, line_num: usize) -> Result<String> {
    match value.strip_prefix('"') {
        Some(rest) => match rest.strip_suffix('"') {
            // An odd run of trailing backslashes escapes the closing quote.
            Some(text) if trailing_backslashes(text) % 2 == 0 => Ok(unescape_grd_text(text)),
            _ => Err(parse_error(line_num, "Unterminated quoted value")),
        },
        None => Ok(value.to_string()),
    }
}

fn trailing_backslashes(text: &str) -> usize {
    text.bytes().rev().take_while(|&b| b == b'\\').count()
}

fn unescape_grd_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('n') => out.push('\n'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
