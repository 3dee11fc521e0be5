//! Commands that edit frames, the snapping flag, or the 3D cursor.

use super::{record, revert, Command, SceneChange};
use crate::config::SnapperConfig;
use crate::error::Result;
use crate::frame::FrameRef;
use crate::operators;
use crate::scene::{ObjectId, Scene};

/// Turn snapping on or off for an object.
pub struct ToggleSnappingCommand {
    pub object: ObjectId,
    change: Option<SceneChange>,
}

impl ToggleSnappingCommand {
    pub fn new(object: ObjectId) -> Self {
        Self { object, change: None }
    }
}

impl Command for ToggleSnappingCommand {
    fn description(&self) -> &str {
        "Enable/Disable Snapping"
    }

    fn execute(&mut self, scene: &mut Scene) -> Result<()> {
        let object = self.object;
        record(&mut self.change, scene, &[object], |scene| {
            operators::toggle_snapping(scene, object).map(|_| ())
        })
    }

    fn undo(&mut self, scene: &mut Scene) -> Result<()> {
        revert(&self.change, scene)
    }
}

pub struct AddExtraFrameCommand {
    pub object: ObjectId,
    index: Option<usize>,
    change: Option<SceneChange>,
}

impl AddExtraFrameCommand {
    pub fn new(object: ObjectId) -> Self {
        Self {
            object,
            index: None,
            change: None,
        }
    }

    /// Index of the added frame, once executed
    pub fn index(&self) -> Option<usize> {
        self.index
    }
}

impl Command for AddExtraFrameCommand {
    fn description(&self) -> &str {
        "Add Frame"
    }

    fn execute(&mut self, scene: &mut Scene) -> Result<()> {
        let object = self.object;
        let mut index = self.index;
        record(&mut self.change, scene, &[object], |scene| {
            index = Some(operators::add_extra_frame(scene, object)?);
            Ok(())
        })?;
        self.index = index;
        Ok(())
    }

    fn undo(&mut self, scene: &mut Scene) -> Result<()> {
        revert(&self.change, scene)
    }
}

pub struct RemoveExtraFrameCommand {
    pub object: ObjectId,
    pub index: usize,
    change: Option<SceneChange>,
}

impl RemoveExtraFrameCommand {
    pub fn new(object: ObjectId, index: usize) -> Self {
        Self {
            object,
            index,
            change: None,
        }
    }
}

impl Command for RemoveExtraFrameCommand {
    fn description(&self) -> &str {
        "Remove Frame"
    }

    fn execute(&mut self, scene: &mut Scene) -> Result<()> {
        let (object, index) = (self.object, self.index);
        record(&mut self.change, scene, &[object], |scene| {
            operators::remove_extra_frame(scene, object, index).map(|_| ())
        })
    }

    fn undo(&mut self, scene: &mut Scene) -> Result<()> {
        revert(&self.change, scene)
    }
}

/// Copy the active object's frames to the rest of the selection.
#[derive(Default)]
pub struct CopyFramesCommand {
    change: Option<SceneChange>,
}

impl CopyFramesCommand {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Command for CopyFramesCommand {
    fn description(&self) -> &str {
        "Copy Frames"
    }

    fn execute(&mut self, scene: &mut Scene) -> Result<()> {
        let touched: Vec<ObjectId> = scene.selection().others().collect();
        record(&mut self.change, scene, &touched, |scene| {
            operators::copy_frames_to_selected(scene).map(|_| ())
        })
    }

    fn undo(&mut self, scene: &mut Scene) -> Result<()> {
        revert(&self.change, scene)
    }
}

pub struct CursorToFrameCommand {
    pub object: ObjectId,
    pub frame: FrameRef,
    change: Option<SceneChange>,
}

impl CursorToFrameCommand {
    pub fn new(object: ObjectId, frame: FrameRef) -> Self {
        Self {
            object,
            frame,
            change: None,
        }
    }
}

impl Command for CursorToFrameCommand {
    fn description(&self) -> &str {
        "Cursor to Frame"
    }

    fn execute(&mut self, scene: &mut Scene) -> Result<()> {
        let (object, frame) = (self.object, self.frame);
        record(&mut self.change, scene, &[], |scene| {
            operators::cursor_to_frame(scene, object, frame).map(|_| ())
        })
    }

    fn undo(&mut self, scene: &mut Scene) -> Result<()> {
        revert(&self.change, scene)
    }
}

/// Edits of a single frame's vectors
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameEdit {
    Reset,
    CycleAxes,
    LocationFromSelection,
    DirectionFromSelection,
    UpFromSelection,
    DirectionToNormal,
}

impl FrameEdit {
    pub fn description(self) -> &'static str {
        match self {
            FrameEdit::Reset => "Reset Frame",
            FrameEdit::CycleAxes => "Cycle Axes",
            FrameEdit::LocationFromSelection => "Set Location",
            FrameEdit::DirectionFromSelection => "Set Direction",
            FrameEdit::UpFromSelection => "Set Up",
            FrameEdit::DirectionToNormal => "Set Direction to Normal",
        }
    }

    fn apply(self, scene: &mut Scene, object: ObjectId, frame: FrameRef, config: &SnapperConfig) -> Result<()> {
        match self {
            FrameEdit::Reset => operators::reset_frame(scene, object, frame),
            FrameEdit::CycleAxes => operators::cycle_axes(scene, object, frame),
            FrameEdit::LocationFromSelection => {
                operators::set_location_from_selection(scene, object, frame).map(|_| ())
            }
            FrameEdit::DirectionFromSelection => {
                operators::set_direction_from_selection(scene, object, frame).map(|_| ())
            }
            FrameEdit::UpFromSelection => {
                operators::set_up_from_selection(scene, object, frame).map(|_| ())
            }
            FrameEdit::DirectionToNormal => {
                operators::set_direction_to_normal(scene, object, frame, config).map(|_| ())
            }
        }
    }
}

pub struct EditFrameCommand {
    pub object: ObjectId,
    pub frame: FrameRef,
    pub edit: FrameEdit,
    config: SnapperConfig,
    change: Option<SceneChange>,
}

impl EditFrameCommand {
    pub fn new(object: ObjectId, frame: FrameRef, edit: FrameEdit, config: &SnapperConfig) -> Self {
        Self {
            object,
            frame,
            edit,
            config: config.clone(),
            change: None,
        }
    }
}

impl Command for EditFrameCommand {
    fn description(&self) -> &str {
        self.edit.description()
    }

    fn execute(&mut self, scene: &mut Scene) -> Result<()> {
        let (object, frame, edit) = (self.object, self.frame, self.edit);
        let config = &self.config;
        record(&mut self.change, scene, &[object], |scene| {
            edit.apply(scene, object, frame, config)
        })
    }

    fn undo(&mut self, scene: &mut Scene) -> Result<()> {
        revert(&self.change, scene)
    }
}
