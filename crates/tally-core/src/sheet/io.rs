use std::path::Path;

use tally_engine::engine::CellRef;

use super::state::Spreadsheet;
use crate::config::Config;
use crate::error::{Result, TallyError};
use crate::storage::{SheetRecord, parse_grd, write_grd};

impl Spreadsheet {
    /// Persisted form: extents plus the raw input of every populated cell.
    pub fn to_record(&self) -> SheetRecord {
        SheetRecord {
            rows: self.rows,
            cols: self.cols,
            cells: self
                .cells()
                .into_iter()
                .map(|(key, input, _)| (key.to_string(), input))
                .collect(),
        }
    }

    /// Rebuild a sheet by replaying every entry of `record` through
    /// [`Spreadsheet::set_cell_input`], so the observer graph is derived from
    /// scratch. All keys are validated before anything is built.
    pub fn from_record(record: &SheetRecord, config: &Config) -> Result<Spreadsheet> {
        let mut entries = Vec::with_capacity(record.cells.len());
        for (key, raw) in &record.cells {
            let cell_ref = CellRef::parse(key)?;
            if cell_ref.row >= record.rows || cell_ref.col >= record.cols {
                return Err(TallyError::KeyOutOfRange {
                    key: key.clone(),
                    rows: record.rows,
                    cols: record.cols,
                });
            }
            entries.push((cell_ref, raw.as_str()));
        }

        let mut sheet = Spreadsheet::with_config(&Config {
            rows: record.rows,
            cols: record.cols,
            ..config.clone()
        });
        for (key, raw) in entries {
            sheet.apply_input(key, raw);
        }
        tracing::debug!(
            rows = sheet.rows,
            cols = sheet.cols,
            cells = sheet.cells.len(),
            "rebuilt sheet from record"
        );
        Ok(sheet)
    }

    /// Load a `.json` record or a `.grd` file (any other extension).
    pub fn load_file(path: &Path, config: &Config) -> Result<Spreadsheet> {
        let record = if is_json(path) {
            SheetRecord::from_json(&std::fs::read_to_string(path)?)?
        } else {
            parse_grd(path)?
        };
        tracing::debug!(path = %path.display(), entries = record.cells.len(), "loaded file");
        Spreadsheet::from_record(&record, config)
    }

    /// Save as a `.json` record or a `.grd` file (any other extension).
    pub fn save_file(&self, path: &Path) -> Result<()> {
        let record = self.to_record();
        if is_json(path) {
            std::fs::write(path, record.to_json()?)?;
        } else {
            write_grd(path, &record)?;
        }
        tracing::debug!(path = %path.display(), entries = record.cells.len(), "saved file");
        Ok(())
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}
