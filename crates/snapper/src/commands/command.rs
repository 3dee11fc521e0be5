//! Command trait.

use crate::error::Result;
use crate::scene::Scene;

/// A scene edit that can be executed, undone, and redone.
///
/// `execute` is called once to perform the edit and again for every
/// redo; `undo` is only called after a successful `execute`.
pub trait Command: Send + Sync {
    /// Human-readable description for the undo/redo menu.
    fn description(&self) -> &str;

    /// Perform (or redo) the edit.
    fn execute(&mut self, scene: &mut Scene) -> Result<()>;

    /// Revert the edit.
    fn undo(&mut self, scene: &mut Scene) -> Result<()>;
}
