//! Commands that move objects: snapping, rotating, flipping, and the
//! record of an interactive session.

use super::{record, revert, Command, SceneChange};
use crate::config::SnapperConfig;
use crate::error::Result;
use crate::frame::FrameRef;
use crate::matcher::select_neighbors;
use crate::operators;
use crate::scene::{ObjectId, Scene};

/// Snap the first selected non-active object to the active object.
pub struct SnapToActiveCommand {
    pub to: FrameRef,
    pub from: FrameRef,
    pub steps: i32,
    config: SnapperConfig,
    change: Option<SceneChange>,
}

impl SnapToActiveCommand {
    pub fn new(to: FrameRef, from: FrameRef, steps: i32, config: &SnapperConfig) -> Self {
        Self {
            to,
            from,
            steps,
            config: config.clone(),
            change: None,
        }
    }
}

impl Command for SnapToActiveCommand {
    fn description(&self) -> &str {
        "Snap"
    }

    fn execute(&mut self, scene: &mut Scene) -> Result<()> {
        let touched: Vec<ObjectId> = scene.selection().others().take(1).collect();
        let (to, from, steps) = (self.to, self.from, self.steps);
        let config = &self.config;
        record(&mut self.change, scene, &touched, |scene| {
            operators::snap_selected_to_active(scene, to, from, steps, config).map(|_| ())
        })
    }

    fn undo(&mut self, scene: &mut Scene) -> Result<()> {
        revert(&self.change, scene)
    }
}

/// Rotate an object by one snap angle about one of its frames.
pub struct RotateCommand {
    pub object: ObjectId,
    pub frame: FrameRef,
    change: Option<SceneChange>,
}

impl RotateCommand {
    pub fn new(object: ObjectId, frame: FrameRef) -> Self {
        Self {
            object,
            frame,
            change: None,
        }
    }
}

impl Command for RotateCommand {
    fn description(&self) -> &str {
        "Rotate"
    }

    fn execute(&mut self, scene: &mut Scene) -> Result<()> {
        let (object, frame) = (self.object, self.frame);
        record(&mut self.change, scene, &[object], |scene| {
            operators::rotate_object(scene, object, frame)
        })
    }

    fn undo(&mut self, scene: &mut Scene) -> Result<()> {
        revert(&self.change, scene)
    }
}

/// Re-mate an object against its closest neighbouring frame.
pub struct FlipCommand {
    pub object: ObjectId,
    pub frame: FrameRef,
    config: SnapperConfig,
    change: Option<SceneChange>,
}

impl FlipCommand {
    pub fn new(object: ObjectId, frame: FrameRef, config: &SnapperConfig) -> Self {
        Self {
            object,
            frame,
            config: config.clone(),
            change: None,
        }
    }
}

impl Command for FlipCommand {
    fn description(&self) -> &str {
        "Flip"
    }

    fn execute(&mut self, scene: &mut Scene) -> Result<()> {
        let (object, frame) = (self.object, self.frame);
        let config = &self.config;
        record(&mut self.change, scene, &[object], |scene| {
            operators::flip_object(scene, object, frame, config).map(|_| ())
        })
    }

    fn undo(&mut self, scene: &mut Scene) -> Result<()> {
        revert(&self.change, scene)
    }
}

/// Grow the selection by the objects whose frames touch it.
pub struct SelectNeighborsCommand {
    pub recursive: bool,
    pub radius: f32,
    change: Option<SceneChange>,
}

impl SelectNeighborsCommand {
    pub fn new(recursive: bool, config: &SnapperConfig) -> Self {
        Self {
            recursive,
            radius: config.overlap_radius,
            change: None,
        }
    }
}

impl Command for SelectNeighborsCommand {
    fn description(&self) -> &str {
        "Select Neighbors"
    }

    fn execute(&mut self, scene: &mut Scene) -> Result<()> {
        let (recursive, radius) = (self.recursive, self.radius);
        record(&mut self.change, scene, &[], |scene| {
            select_neighbors(scene, recursive, radius).map(|_| ())
        })
    }

    fn undo(&mut self, scene: &mut Scene) -> Result<()> {
        revert(&self.change, scene)
    }
}

/// Record of a committed interactive session.
///
/// The session has already changed the scene when this is created;
/// `execute` only replays it on redo.
#[derive(Debug)]
pub struct SessionCommand {
    change: SceneChange,
}

impl SessionCommand {
    pub fn new(change: SceneChange) -> Self {
        Self { change }
    }

    pub fn change(&self) -> &SceneChange {
        &self.change
    }
}

impl Command for SessionCommand {
    fn description(&self) -> &str {
        "Snap Interactively"
    }

    fn execute(&mut self, scene: &mut Scene) -> Result<()> {
        self.change.reapply(scene);
        Ok(())
    }

    fn undo(&mut self, scene: &mut Scene) -> Result<()> {
        self.change.revert(scene)
    }
}
