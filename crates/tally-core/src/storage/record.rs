//! Flat persisted form of a sheet.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Result;

/// Row and column counts plus the raw input of every populated cell, keyed
/// by cell key. Displays are never stored.
///
/// As JSON this is one flat object: `{"rows":3,"cols":2,"A1":"1","B2":"A1*2"}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetRecord {
    pub rows: usize,
    pub cols: usize,
    #[serde(flatten)]
    pub cells: BTreeMap<String, String>,
}

impl SheetRecord {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(content: &str) -> Result<SheetRecord> {
        Ok(serde_json::from_str(content)?)
    }
}
