//! Persistence formats: the flat JSON record, `.grd` text, and CSV export.

pub mod csv;
pub mod parser;
pub mod record;
pub mod writer;

pub use csv::{csv_content, write_csv};
pub use parser::{parse_grd, parse_grd_content};
pub use record::SheetRecord;
pub use writer::{write_grd, write_grd_content};
