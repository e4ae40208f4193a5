//! Writer for .grd file format

use crate::error::Result;
use crate::storage::SheetRecord;
use std::fs;
use std::path::Path;
use tally_engine::engine::CellRef;

/// Write a record to a .grd file
pub fn write_grd(path: &Path, record: &SheetRecord) -> Result<()> {
    fs::write(path, write_grd_content(record))?;
    Ok(())
}

/// Write a record to a .grd format string, cells in row-major order.
pub fn write_grd_content(record: &SheetRecord) -> String {
    let mut lines = vec![
        "# Tally Spreadsheet".to_string(),
        format!("@rows: {}", record.rows),
        format!("@cols: {}", record.cols),
    ];

    let mut cells: Vec<(CellRef, &String)> = record
        .cells
        .iter()
        .filter(|(_, raw)| !raw.is_empty())
        .filter_map(|(key, raw)| CellRef::parse(key).ok().map(|k| (k, raw)))
        .collect();
    cells.sort_by_key(|(key, _)| *key);

    for (key, raw) in cells {
        lines.push(format!("{}: \"{}\"", key, escape_grd_text(raw)));
    }

    lines.join("\n") + "\n"
}

fn escape_grd_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
    }
    out
}
