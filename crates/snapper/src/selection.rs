//! Object selection with an active object.
//!
//! The active object is the target of "snap to active" and the dragged
//! object of an interactive session; the rest of the selection follows it.

use crate::scene::ObjectId;

/// Selected objects in selection order, plus the active object
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionManager {
    selected: Vec<ObjectId>,
    active: Option<ObjectId>,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<ObjectId> {
        self.active
    }

    pub fn selected(&self) -> &[ObjectId] {
        &self.selected
    }

    pub fn count(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn is_selected(&self, id: ObjectId) -> bool {
        self.selected.contains(&id)
    }

    /// Selected objects other than the active one, in selection order
    pub fn others(&self) -> impl Iterator<Item = ObjectId> + '_ {
        let active = self.active;
        self.selected.iter().copied().filter(move |&id| Some(id) != active)
    }

    /// Add to the selection without changing the active object
    pub fn add_quiet(&mut self, id: ObjectId) {
        if !self.is_selected(id) {
            self.selected.push(id);
        }
    }

    /// Replace the selection; the last object becomes active
    pub fn select_multiple(&mut self, ids: impl IntoIterator<Item = ObjectId>) {
        self.selected.clear();
        for id in ids {
            self.add_quiet(id);
        }
        self.active = self.selected.last().copied();
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.active = None;
    }

    /// Forget a removed object. If it was active, the last remaining
    /// selected object takes over.
    pub fn remove_object(&mut self, id: ObjectId) {
        self.selected.retain(|&e| e != id);
        if self.active == Some(id) {
            self.active = self.selected.last().copied();
        }
    }
}
