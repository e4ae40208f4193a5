use dashmap::DashMap;
use std::collections::HashSet;

use tally_engine::engine::{CellLookup, CellRef, EvalOptions};

use super::cell::{Cell, CellArena, CellId};
use super::events::{SubscriptionId, Subscribers};
use super::graph::ObserverGraph;
use crate::config::Config;
use crate::error::{Result, TallyError};

/// An in-memory spreadsheet: cells keyed by position, the observer graph
/// between them, the grid extents, and change subscribers.
///
/// Only populated cells are stored. Reading an unpopulated key yields the
/// empty display without allocating a cell.
#[derive(Debug)]
pub struct Spreadsheet {
    pub(crate) cells: CellArena,
    /// Current key of every stored cell.
    pub(crate) index: DashMap<CellRef, CellId>,
    pub(crate) graph: ObserverGraph,
    pub(crate) rows: usize,
    pub(crate) cols: usize,
    pub(crate) options: EvalOptions,
    pub(crate) shift_references: bool,
    pub(crate) subscribers: Subscribers,
    /// Cells on the current recompute stack.
    pub(crate) in_flight: HashSet<CellId>,
}

impl Default for Spreadsheet {
    fn default() -> Self {
        Spreadsheet::with_config(&Config::default())
    }
}

impl Spreadsheet {
    /// Create an empty sheet of `rows` x `cols` with default evaluation options.
    pub fn new(rows: usize, cols: usize) -> Self {
        Spreadsheet::with_config(&Config {
            rows,
            cols,
            ..Config::default()
        })
    }

    pub fn with_config(config: &Config) -> Self {
        Spreadsheet {
            cells: CellArena::default(),
            index: DashMap::new(),
            graph: ObserverGraph::default(),
            rows: config.rows,
            cols: config.cols,
            options: config.eval_options(),
            shift_references: config.shift_references,
            subscribers: Subscribers::default(),
            in_flight: HashSet::new(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn col_count(&self) -> usize {
        self.cols
    }

    pub fn contains_key(&self, key: &CellRef) -> bool {
        key.row < self.rows && key.col < self.cols
    }

    /// Evaluated display of `key`, or "" if nothing is stored there.
    pub fn display(&self, key: &CellRef) -> String {
        self.cell(key).map(|c| c.display.clone()).unwrap_or_default()
    }

    /// Raw input last supplied for `key`, or "".
    pub fn formula_bar_value(&self, key: &CellRef) -> String {
        self.cell(key).map(|c| c.input.clone()).unwrap_or_default()
    }

    pub fn display_str(&self, key: &str) -> Result<String> {
        Ok(self.display(&CellRef::parse(key)?))
    }

    pub fn formula_bar_str(&self, key: &str) -> Result<String> {
        Ok(self.formula_bar_value(&CellRef::parse(key)?))
    }

    /// True if a non-empty input is stored at `key`.
    pub fn is_populated(&self, key: &CellRef) -> bool {
        self.cell(key).is_some_and(|c| !c.input.is_empty())
    }

    /// Populated cells as `(key, input, display)`, in row-major order.
    pub fn cells(&self) -> Vec<(CellRef, String, String)> {
        let mut out: Vec<(CellRef, String, String)> = self
            .index
            .iter()
            .filter_map(|entry| self.cells.get(*entry.value()))
            .filter(|cell| !cell.input.is_empty())
            .map(|cell| (cell.key, cell.input.clone(), cell.display.clone()))
            .collect();
        out.sort_by_key(|(key, _, _)| *key);
        out
    }

    /// Keys of the cells whose last evaluation read `key`.
    pub fn observers_of(&self, key: &CellRef) -> Vec<CellRef> {
        self.keys_of(self.id_of(key).map(|id| self.graph.observers_of(id)))
    }

    /// Keys `key`'s last evaluation read.
    pub fn observees_of(&self, key: &CellRef) -> Vec<CellRef> {
        self.keys_of(self.id_of(key).map(|id| self.graph.observees_of(id)))
    }

    /// Drop the edge "`observer` observes `observee`". Fails with
    /// [`TallyError::ObserverNotFound`] if no such edge exists. The next
    /// recompute of `observer` derives its edges afresh.
    pub fn remove_observer(&mut self, observee: &CellRef, observer: &CellRef) -> Result<()> {
        let (Some(observee), Some(observer)) = (self.id_of(observee), self.id_of(observer)) else {
            return Err(TallyError::ObserverNotFound);
        };
        self.graph.remove_observer(observee, observer)?;
        self.prune_if_vacant(observee);
        self.prune_if_vacant(observer);
        Ok(())
    }

    /// Register a callback invoked once after every successful mutation.
    pub fn subscribe(&mut self, listener: impl FnMut() + 'static) -> SubscriptionId {
        let id = self.subscribers.subscribe(Box::new(listener));
        tracing::debug!(?id, total = self.subscribers.len(), "subscribed");
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let removed = self.subscribers.unsubscribe(id);
        tracing::debug!(?id, removed, "unsubscribed");
        removed
    }

    pub(crate) fn id_of(&self, key: &CellRef) -> Option<CellId> {
        self.index.get(key).map(|entry| *entry.value())
    }

    pub(crate) fn cell(&self, key: &CellRef) -> Option<&Cell> {
        self.id_of(key).and_then(|id| self.cells.get(id))
    }

    /// Id of the cell at `key`, creating an empty one if absent.
    pub(crate) fn ensure_cell(&mut self, key: CellRef) -> CellId {
        if let Some(id) = self.id_of(&key) {
            return id;
        }
        let id = self.cells.insert(Cell::new(key));
        self.index.insert(key, id);
        id
    }

    /// Drop `id` if it holds no input and takes part in no edges.
    pub(crate) fn prune_if_vacant(&mut self, id: CellId) {
        if self.in_flight.contains(&id)
            || !self.graph.observers_of(id).is_empty()
            || !self.graph.observees_of(id).is_empty()
        {
            return;
        }
        let vacant = self.cells.get(id).is_some_and(|c| c.input.is_empty());
        if vacant && let Some(cell) = self.cells.remove(id) {
            self.index.remove(&cell.key);
        }
    }

    fn keys_of(&self, ids: Option<Vec<CellId>>) -> Vec<CellRef> {
        let mut keys: Vec<CellRef> = ids
            .unwrap_or_default()
            .into_iter()
            .filter_map(|id| self.cells.get(id).map(|c| c.key))
            .collect();
        keys.sort();
        keys
    }
}

impl CellLookup for Spreadsheet {
    fn display(&self, key: &CellRef) -> Option<String> {
        self.contains_key(key).then(|| Spreadsheet::display(self, key))
    }
}
