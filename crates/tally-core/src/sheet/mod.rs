//! Spreadsheet state and logic.

mod cell;
mod events;
mod graph;
mod io;
mod ops;
mod state;

pub use events::SubscriptionId;
pub use state::Spreadsheet;
