//! tally-core - spreadsheet model, observer graph, configuration and storage.

pub mod config;
pub mod error;
pub mod sheet;
pub mod storage;

pub use config::Config;
pub use error::{Result, TallyError};
pub use sheet::{Spreadsheet, SubscriptionId};
pub use storage::SheetRecord;

pub use tally_engine::engine::{CellRef, KeyError};
