//! Cell storage.
//!
//! Cells live in an arena and are addressed by a stable [`CellId`]. A cell's
//! key can change when rows or columns shift; its id never does, so the
//! observer graph is keyed by id and survives re-keying untouched.

use tally_engine::engine::CellRef;

/// Stable identity of a cell for as long as it exists.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct CellId(usize);

/// A populated cell.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    /// Current position. Updated when rows/columns are inserted or deleted.
    pub key: CellRef,
    /// Exact string last supplied by the user (the formula-bar value).
    pub input: String,
    /// Cached result of evaluating `input`.
    pub display: String,
}

impl Cell {
    pub fn new(key: CellRef) -> Cell {
        Cell {
            key,
            input: String::new(),
            display: String::new(),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct CellArena {
    slots: Vec<Option<Cell>>,
    free: Vec<CellId>,
}

impl CellArena {
    pub(crate) fn insert(&mut self, cell: Cell) -> CellId {
        if let Some(id) = self.free.pop() {
            self.slots[id.0] = Some(cell);
            return id;
        }
        self.slots.push(Some(cell));
        CellId(self.slots.len() - 1)
    }

    pub(crate) fn get(&self, id: CellId) -> Option<&Cell> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, id: CellId) -> Option<&mut Cell> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    pub(crate) fn remove(&mut self, id: CellId) -> Option<Cell> {
        let cell = self.slots.get_mut(id.0)?.take()?;
        self.free.push(id);
        Some(cell)
    }

    pub(crate) fn contains(&self, id: CellId) -> bool {
        self.get(id).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }
}
