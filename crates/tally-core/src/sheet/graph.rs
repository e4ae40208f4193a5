//! Observer graph between cells.
//!
//! # Edge Direction
//!
//! ```text
//! A → B  means  "B observes A"  (B's last evaluation read A)
//! ```
//!
//! When A's display changes, everything reachable along outgoing edges must
//! recompute.
//!
//! # Invariants
//!
//! 1. **Bidirectional consistency:** B ∈ observers[A] iff A ∈ observees[B].
//! 2. **No dangling entries:** empty sets are removed, not stored.
//! 3. **No self edges:** a cell never observes itself.

use std::collections::{BTreeSet, HashMap, HashSet};

use super::cell::CellId;
use crate::error::{Result, TallyError};

#[derive(Debug, Default)]
pub(crate) struct ObserverGraph {
    /// observee -> cells observing it
    observers: HashMap<CellId, HashSet<CellId>>,
    /// observer -> cells it observes
    observees: HashMap<CellId, HashSet<CellId>>,
}

impl ObserverGraph {
    /// Record that `observer` reads `observee`. Adding an existing edge is a
    /// no-op; returns whether the edge is new.
    pub(crate) fn add_observer(&mut self, observee: CellId, observer: CellId) -> bool {
        if observee == observer {
            return false;
        }
        self.observees.entry(observer).or_default().insert(observee);
        self.observers.entry(observee).or_default().insert(observer)
    }

    /// Drop the edge `observee → observer`. Removing an edge that was never
    /// added is a caller bug.
    pub(crate) fn remove_observer(&mut self, observee: CellId, observer: CellId) -> Result<()> {
        let removed = self
            .observers
            .get_mut(&observee)
            .is_some_and(|set| set.remove(&observer));
        if !removed {
            return Err(TallyError::ObserverNotFound);
        }
        prune(&mut self.observers, observee);
        if let Some(set) = self.observees.get_mut(&observer) {
            set.remove(&observee);
        }
        prune(&mut self.observees, observer);
        Ok(())
    }

    /// Replace everything `observer` reads with `new_observees`.
    pub(crate) fn replace_observees(&mut self, observer: CellId, new_observees: HashSet<CellId>) {
        if let Some(old) = self.observees.remove(&observer) {
            for observee in old {
                if let Some(set) = self.observers.get_mut(&observee) {
                    set.remove(&observer);
                }
                prune(&mut self.observers, observee);
            }
        }
        for observee in new_observees {
            self.add_observer(observee, observer);
        }
    }

    /// Cells observing `id`, in a stable order.
    pub(crate) fn observers_of(&self, id: CellId) -> Vec<CellId> {
        sorted(self.observers.get(&id))
    }

    /// Cells `id` observes, in a stable order.
    pub(crate) fn observees_of(&self, id: CellId) -> Vec<CellId> {
        sorted(self.observees.get(&id))
    }

    /// Remove every edge touching `id`. Returns the cells that were observing it.
    pub(crate) fn detach(&mut self, id: CellId) -> Vec<CellId> {
        self.replace_observees(id, HashSet::new());
        let former = self.observers.remove(&id).unwrap_or_default();
        for observer in &former {
            if let Some(set) = self.observees.get_mut(observer) {
                set.remove(&id);
            }
            prune(&mut self.observees, *observer);
        }
        let former: BTreeSet<CellId> = former.into_iter().collect();
        former.into_iter().collect()
    }
}

fn prune(map: &mut HashMap<CellId, HashSet<CellId>>, id: CellId) {
    if map.get(&id).is_some_and(HashSet::is_empty) {
        map.remove(&id);
    }
}

fn sorted(set: Option<&HashSet<CellId>>) -> Vec<CellId> {
    let mut ids: Vec<CellId> = set.into_iter().flatten().copied().collect();
    ids.sort();
    ids
}
