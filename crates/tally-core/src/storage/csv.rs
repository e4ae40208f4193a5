//! CSV export of evaluated displays.

use crate::error::Result;
use crate::sheet::Spreadsheet;
use std::path::Path;
use tally_engine::engine::CellRef;

/// Export the populated bounding box of `sheet` to a CSV file.
pub fn write_csv(path: &Path, sheet: &Spreadsheet) -> Result<()> {
    std::fs::write(path, csv_content(sheet))?;
    Ok(())
}

/// CSV text for the populated bounding box, one line per row. An empty
/// sheet produces an empty string.
pub fn csv_content(sheet: &Spreadsheet) -> String {
    let cells = sheet.cells();
    let Some(min_row) = cells.iter().map(|(k, _, _)| k.row).min() else {
        return String::new();
    };
    let min_col = cells.iter().map(|(k, _, _)| k.col).min().unwrap_or(0);
    let max_row = cells.iter().map(|(k, _, _)| k.row).max().unwrap_or(min_row);
    let max_col = cells.iter().map(|(k, _, _)| k.col).max().unwrap_or(min_col);

    let mut out = String::new();
    for row in min_row..=max_row {
        let fields: Vec<String> = (min_col..=max_col)
            .map(|col| escape_csv_field(&sheet.display(&CellRef::new(col, row))))
            .collect();
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

/// Escape a field for CSV output
fn escape_csv_field(field: &str) -> String {
    // Guard against CSV formula injection in spreadsheet apps.
    let first_non_space = field.trim_start_matches([' ', '\t']).chars().next();
    let safe_field = if matches!(first_non_space, Some('=' | '+' | '-' | '@')) {
        format!("'{}", field)
    } else {
        field.to_string()
    };

    if safe_field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", safe_field.replace('"', "\"\""))
    } else {
        safe_field
    }
}
