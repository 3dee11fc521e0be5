//! Undo/redo history.
//!
//! Edits made between [`UndoHistory::begin_transaction`] and
//! [`UndoHistory::commit_transaction`] undo as one step.

use std::collections::VecDeque;

use super::Command;
use crate::error::Result;
use crate::scene::Scene;

/// Commands grouped under one name; undoes in reverse order
pub struct Transaction {
    name: String,
    commands: Vec<Box<dyn Command>>,
}

impl Transaction {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commands: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Command for Transaction {
    fn description(&self) -> &str {
        &self.name
    }

    fn execute(&mut self, scene: &mut Scene) -> Result<()> {
        self.commands.iter_mut().try_for_each(|cmd| cmd.execute(scene))
    }

    fn undo(&mut self, scene: &mut Scene) -> Result<()> {
        self.commands.iter_mut().rev().try_for_each(|cmd| cmd.undo(scene))
    }
}

/// Bounded undo/redo stacks. The oldest entry is dropped once `limit` is
/// exceeded.
pub struct UndoHistory {
    done: VecDeque<Box<dyn Command>>,
    undone: Vec<Box<dyn Command>>,
    limit: usize,
    open: Option<Transaction>,
}

impl Default for UndoHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoHistory {
    pub const DEFAULT_MAX_SIZE: usize = 100;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_MAX_SIZE)
    }

    pub fn with_capacity(limit: usize) -> Self {
        Self {
            done: VecDeque::new(),
            undone: Vec::new(),
            limit,
            open: None,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.done.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.done.back().map(|c| c.description())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.undone.last().map(|c| c.description())
    }

    /// Group everything pushed from now on under `name`. An already open
    /// transaction is committed first.
    pub fn begin_transaction(&mut self, name: impl Into<String>) {
        if self.open.is_some() {
            log::warn!("Transaction already open, committing it first");
            self.commit_transaction();
        }
        self.open = Some(Transaction::new(name));
    }

    pub fn commit_transaction(&mut self) {
        match self.open.take() {
            Some(t) if !t.is_empty() => self.record(Box::new(t)),
            _ => {}
        }
    }

    /// Close the open transaction, undoing what it already did
    pub fn rollback_transaction(&mut self, scene: &mut Scene) -> Result<()> {
        match self.open.take() {
            Some(mut t) => t.undo(scene),
            None => Ok(()),
        }
    }

    pub fn in_transaction(&self) -> bool {
        self.open.is_some()
    }

    /// Add a command that has already been executed
    pub fn push(&mut self, cmd: Box<dyn Command>) {
        match &mut self.open {
            Some(t) => t.commands.push(cmd),
            None => self.record(cmd),
        }
    }

    fn record(&mut self, cmd: Box<dyn Command>) {
        self.done.push_back(cmd);
        self.undone.clear();
        while self.done.len() > self.limit {
            self.done.pop_front();
        }
    }

    /// Undo the newest command. `Ok(false)` when there is nothing to undo;
    /// a command that fails to undo stays where it was.
    pub fn undo(&mut self, scene: &mut Scene) -> Result<bool> {
        let Some(mut cmd) = self.done.pop_back() else {
            return Ok(false);
        };
        if let Err(e) = cmd.undo(scene) {
            self.done.push_back(cmd);
            return Err(e);
        }
        log::debug!("Undid '{}'", cmd.description());
        self.undone.push(cmd);
        Ok(true)
    }

    /// Redo the newest undone command. `Ok(false)` when there is nothing to
    /// redo.
    pub fn redo(&mut self, scene: &mut Scene) -> Result<bool> {
        let Some(mut cmd) = self.undone.pop() else {
            return Ok(false);
        };
        if let Err(e) = cmd.execute(scene) {
            self.undone.push(cmd);
            return Err(e);
        }
        log::debug!("Redid '{}'", cmd.description());
        self.done.push_back(cmd);
        Ok(true)
    }

    pub fn clear(&mut self) {
        self.done.clear();
        self.undone.clear();
        self.open = None;
    }

    pub fn undo_count(&self) -> usize {
        self.done.len()
    }

    pub fn redo_count(&self) -> usize {
        self.undone.len()
    }
}
