use std::collections::HashSet;

use tally_engine::engine::{CellRef, ShiftOperation, evaluate_cell, shift_formula_references};

use super::cell::CellId;
use super::state::Spreadsheet;
use crate::error::{Result, TallyError};

/// Dimension for row/column operations
#[derive(Clone, Copy, Debug)]
enum Dimension {
    Row,
    Column,
}

impl Dimension {
    /// Get the coordinate value from a CellRef for this dimension
    fn get_coord(self, cell_ref: &CellRef) -> usize {
        match self {
            Dimension::Row => cell_ref.row,
            Dimension::Column => cell_ref.col,
        }
    }

    /// Create a new CellRef with modified coordinate in this dimension
    fn new_cell_ref(self, cell_ref: &CellRef, new_coord: usize) -> CellRef {
        match self {
            Dimension::Row => CellRef::new(cell_ref.col, new_coord),
            Dimension::Column => CellRef::new(new_coord, cell_ref.row),
        }
    }

    fn count(self, sheet: &Spreadsheet) -> usize {
        match self {
            Dimension::Row => sheet.rows,
            Dimension::Column => sheet.cols,
        }
    }

    fn set_count(self, sheet: &mut Spreadsheet, count: usize) {
        match self {
            Dimension::Row => sheet.rows = count,
            Dimension::Column => sheet.cols = count,
        }
    }

    fn insert_op(self, at: usize) -> ShiftOperation {
        match self {
            Dimension::Row => ShiftOperation::InsertRow(at),
            Dimension::Column => ShiftOperation::InsertColumn(at),
        }
    }

    fn delete_op(self, at: usize) -> ShiftOperation {
        match self {
            Dimension::Row => ShiftOperation::DeleteRow(at),
            Dimension::Column => ShiftOperation::DeleteColumn(at),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Dimension::Row => "row",
            Dimension::Column => "column",
        }
    }
}

impl Spreadsheet {
    /// Store `raw` at `key` and recompute everything that depends on it.
    ///
    /// Formula mistakes never fail here; they show up as a marker in the
    /// cell's display. Only a key outside the grid is an error.
    pub fn set_cell_input(&mut self, key: CellRef, raw: &str) -> Result<()> {
        self.check_key(&key)?;
        self.apply_input(key, raw);
        self.notify();
        Ok(())
    }

    pub fn set_cell_input_str(&mut self, key: &str, raw: &str) -> Result<()> {
        self.set_cell_input(CellRef::parse(key)?, raw)
    }

    /// Reset the cell at `key` to empty input.
    pub fn clear_cell(&mut self, key: CellRef) -> Result<()> {
        self.set_cell_input(key, "")
    }

    /// Insert an empty row above `at`. Valid for `0..=row_count()`.
    pub fn insert_row(&mut self, at: usize) -> Result<()> {
        self.insert_dimension(Dimension::Row, at)
    }

    /// Insert an empty column left of `at`. Valid for `0..=col_count()`.
    pub fn insert_column(&mut self, at: usize) -> Result<()> {
        self.insert_dimension(Dimension::Column, at)
    }

    /// Delete row `at`, shifting later rows up.
    pub fn delete_row(&mut self, at: usize) -> Result<()> {
        self.delete_dimension(Dimension::Row, at)
    }

    /// Delete column `at`, shifting later columns left.
    pub fn delete_column(&mut self, at: usize) -> Result<()> {
        self.delete_dimension(Dimension::Column, at)
    }

    /// Empty every populated cell in row `at`.
    pub fn clear_row(&mut self, at: usize) -> Result<()> {
        self.clear_dimension(Dimension::Row, at)
    }

    /// Empty every populated cell in column `at`.
    pub fn clear_column(&mut self, at: usize) -> Result<()> {
        self.clear_dimension(Dimension::Column, at)
    }

    pub(crate) fn check_key(&self, key: &CellRef) -> Result<()> {
        if self.contains_key(key) {
            return Ok(());
        }
        Err(TallyError::KeyOutOfRange {
            key: key.to_string(),
            rows: self.rows,
            cols: self.cols,
        })
    }

    /// Store `raw` and run the recompute cascade, without notifying subscribers.
    pub(crate) fn apply_input(&mut self, key: CellRef, raw: &str) {
        let id = self.ensure_cell(key);
        if let Some(cell) = self.cells.get_mut(id) {
            cell.input = raw.to_string();
        }
        self.recompute(id);
        self.prune_if_vacant(id);
    }

    /// Re-evaluate `id`, replace its observee edges, then recompute its
    /// observers depth-first. A cell already on the stack is not re-entered.
    pub(crate) fn recompute(&mut self, id: CellId) {
        let Some(cell) = self.cells.get(id) else {
            return;
        };
        let (key, input) = (cell.key, cell.input.clone());
        if !self.in_flight.insert(id) {
            tracing::warn!(cell = %key, "dependency cycle: skipping re-entrant recompute");
            return;
        }

        let options = self.options;
        let evaluation = evaluate_cell(key, &input, &*self, &options);
        let observees: HashSet<CellId> = if evaluation.is_self_reference() {
            HashSet::new()
        } else {
            evaluation
                .observees
                .iter()
                .map(|observee| self.ensure_cell(*observee))
                .collect()
        };

        let stale = self.graph.observees_of(id);
        self.graph.replace_observees(id, observees);
        for old in stale {
            self.prune_if_vacant(old);
        }

        if let Some(cell) = self.cells.get_mut(id) {
            cell.display = evaluation.display;
        }

        for observer in self.graph.observers_of(id) {
            self.recompute(observer);
        }
        self.in_flight.remove(&id);
    }

    fn recompute_each(&mut self, ids: Vec<CellId>) {
        let mut seen = HashSet::new();
        for id in ids {
            if seen.insert(id) && self.cells.contains(id) {
                self.recompute(id);
            }
        }
    }

    pub(crate) fn notify(&mut self) {
        self.subscribers.fire();
    }

    /// Stored cells whose coordinate in `dim` satisfies `pred`, row-major.
    fn collect_cells(&self, dim: Dimension, pred: impl Fn(usize) -> bool) -> Vec<(CellId, CellRef)> {
        let mut found: Vec<(CellId, CellRef)> = self
            .index
            .iter()
            .filter(|entry| pred(dim.get_coord(entry.key())))
            .map(|entry| (*entry.value(), *entry.key()))
            .collect();
        found.sort_by_key(|(_, key)| *key);
        found
    }

    /// Move every `(id, old, new)` in one batch: all old keys leave the index
    /// before any new key is inserted, so shifted runs never collide.
    fn rekey(&mut self, moves: &[(CellId, CellRef, CellRef)]) {
        for (_, old, _) in moves {
            self.index.remove(old);
        }
        for (id, _, new) in moves {
            if let Some(cell) = self.cells.get_mut(*id) {
                cell.key = *new;
            }
            self.index.insert(*new, *id);
        }
    }

    /// Rewrite keys inside every stored input. Returns the cells whose input changed.
    fn shift_inputs(&mut self, op: ShiftOperation) -> Vec<CellId> {
        let mut ids: Vec<(CellRef, CellId)> = self
            .index
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect();
        ids.sort();

        let mut changed = Vec::new();
        for (_, id) in ids {
            let Some(cell) = self.cells.get_mut(id) else {
                continue;
            };
            if cell.input.is_empty() {
                continue;
            }
            let shifted = shift_formula_references(&cell.input, op);
            if shifted != cell.input {
                cell.input = shifted;
                changed.push(id);
            }
        }
        changed
    }

    fn observers_of_all(&self, ids: impl IntoIterator<Item = CellId>) -> Vec<CellId> {
        ids.into_iter()
            .flat_map(|id| self.graph.observers_of(id))
            .collect()
    }

    /// Generic insert operation for row or column
    fn insert_dimension(&mut self, dim: Dimension, at: usize) -> Result<()> {
        let count = dim.count(self);
        if at > count {
            return Err(TallyError::IndexOutOfRange {
                index: at,
                max: count,
            });
        }
        dim.set_count(self, count + 1);

        let moves: Vec<(CellId, CellRef, CellRef)> = self
            .collect_cells(dim, |coord| coord >= at)
            .into_iter()
            .map(|(id, key)| (id, key, dim.new_cell_ref(&key, dim.get_coord(&key) + 1)))
            .collect();
        self.rekey(&moves);

        let mut dirty = Vec::new();
        if self.shift_references {
            dirty.extend(self.shift_inputs(dim.insert_op(at)));
        }
        dirty.extend(self.observers_of_all(moves.iter().map(|(id, _, _)| *id)));
        self.recompute_each(dirty);

        tracing::debug!(
            dimension = dim.name(),
            at,
            moved = moves.len(),
            rows = self.rows,
            cols = self.cols,
            "inserted"
        );
        self.notify();
        Ok(())
    }

    /// Generic delete operation for row or column
    fn delete_dimension(&mut self, dim: Dimension, at: usize) -> Result<()> {
        let count = dim.count(self);
        if at >= count {
            return Err(TallyError::IndexOutOfRange {
                index: at,
                max: count.saturating_sub(1),
            });
        }

        // Remove cells at the deleted coordinate, remembering who watched them.
        let doomed = self.collect_cells(dim, |coord| coord == at);
        let mut former_observers = Vec::new();
        let mut orphaned = Vec::new();
        for (id, key) in &doomed {
            orphaned.extend(self.graph.observees_of(*id));
            former_observers.extend(self.graph.detach(*id));
            self.cells.remove(*id);
            self.index.remove(key);
        }

        let moves: Vec<(CellId, CellRef, CellRef)> = self
            .collect_cells(dim, |coord| coord > at)
            .into_iter()
            .map(|(id, key)| (id, key, dim.new_cell_ref(&key, dim.get_coord(&key) - 1)))
            .collect();
        self.rekey(&moves);
        dim.set_count(self, count - 1);

        for id in orphaned {
            self.prune_if_vacant(id);
        }

        let mut dirty = former_observers;
        if self.shift_references {
            dirty.extend(self.shift_inputs(dim.delete_op(at)));
        }
        dirty.extend(self.observers_of_all(moves.iter().map(|(id, _, _)| *id)));
        self.recompute_each(dirty);

        tracing::debug!(
            dimension = dim.name(),
            at,
            deleted = doomed.len(),
            moved = moves.len(),
            rows = self.rows,
            cols = self.cols,
            "deleted"
        );
        self.notify();
        Ok(())
    }

    fn clear_dimension(&mut self, dim: Dimension, at: usize) -> Result<()> {
        let count = dim.count(self);
        if at >= count {
            return Err(TallyError::IndexOutOfRange {
                index: at,
                max: count.saturating_sub(1),
            });
        }

        let populated: Vec<CellRef> = self
            .collect_cells(dim, |coord| coord == at)
            .into_iter()
            .filter(|(_, key)| self.is_populated(key))
            .map(|(_, key)| key)
            .collect();
        for key in &populated {
            self.apply_input(*key, "");
        }

        tracing::debug!(dimension = dim.name(), at, cleared = populated.len(), "cleared");
        self.notify();
        Ok(())
    }
}
