//! Command pattern implementation for undo/redo support.
//!
//! Every operator has a command that records the objects it touches
//! before running, so undo and redo restore exact snapshots.

mod change;
mod command;
mod frame_commands;
mod history;
mod snap_commands;

pub use change::SceneChange;
pub use command::Command;
pub use frame_commands::{
    AddExtraFrameCommand,
    CopyFramesCommand,
    CursorToFrameCommand,
    EditFrameCommand,
    FrameEdit,
    RemoveExtraFrameCommand,
    ToggleSnappingCommand,
};
pub use history::{Transaction, UndoHistory};
pub use snap_commands::{
    FlipCommand,
    RotateCommand,
    SelectNeighborsCommand,
    SessionCommand,
    SnapToActiveCommand,
};

use crate::error::Result;
use crate::scene::{ObjectId, Scene};

/// Execute a command and add it to history.
pub fn execute(scene: &mut Scene, history: &mut UndoHistory, mut cmd: Box<dyn Command>) -> Result<()> {
    cmd.execute(scene)?;
    history.push(cmd);
    Ok(())
}

/// First run: capture `objects`, run the edit, capture again. Later runs
/// (redo) replay the captured result.
fn record(
    change: &mut Option<SceneChange>,
    scene: &mut Scene,
    objects: &[ObjectId],
    run: impl FnOnce(&mut Scene) -> Result<()>,
) -> Result<()> {
    if let Some(change) = change {
        change.reapply(scene);
        return Ok(());
    }
    let mut recorded = SceneChange::capture(scene, objects)?;
    run(scene)?;
    if let Err(e) = recorded.finish(scene, &[]) {
        // an edit that cannot be recorded cannot be undone either
        recorded.revert(scene)?;
        return Err(e);
    }
    *change = Some(recorded);
    Ok(())
}

fn revert(change: &Option<SceneChange>, scene: &mut Scene) -> Result<()> {
    match change {
        Some(change) => change.revert(scene),
        None => Ok(()),
    }
}
