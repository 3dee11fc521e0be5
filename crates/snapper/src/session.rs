//! Interactive snapping session.
//!
//! The active object follows the pointer in screen space. After every
//! move the closest pair of frames is looked up, and a click aligns the
//! pair. The session runs through
//!
//! ```text
//! Idle -> Armed -> Probing* -> Committed | Cancelled
//! ```
//!
//! and ignores everything once it reaches a terminal state. A session
//! instance can be started again afterwards.

use snapper_math::{Mat4, Vec2, Vec3};

use crate::align::align;
use crate::commands::{SceneChange, SessionCommand};
use crate::config::SnapperConfig;
use crate::error::{Result, SnapError};
use crate::input::{InputEvent, Key, MouseButton, ViewProjection};
use crate::matcher::{CandidateFilter, CandidateSet, Match, MatchOptions, Probe};
use crate::scene::{ObjectId, ObjectState, Scene};
use crate::selection::SelectionManager;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Idle,
    Armed,
    Probing,
    Committed,
    Cancelled,
}

impl SessionState {
    /// Armed or probing
    pub fn is_running(self) -> bool {
        matches!(self, SessionState::Armed | SessionState::Probing)
    }
}

/// The pair of frame locations a renderer should connect
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Highlight {
    /// Frame of the dragged object, world space
    pub from: Vec3,
    /// Target frame, world space
    pub to: Vec3,
}

/// Result of feeding one event to a session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    /// The session is not running, the event was not used
    Ignored,
    Running,
    Committed,
    Cancelled,
}

/// Options fixed when a session starts
#[derive(Clone, Copy, Debug)]
struct Behaviour {
    matching: MatchOptions,
    flip: bool,
    auto_parent: bool,
    angle_epsilon: f32,
}

/// Drag-and-snap controller for the active object.
#[derive(Debug, Default)]
pub struct SnapSession {
    state: SessionState,
    subject: Option<ObjectId>,
    /// Subject and temporarily parented objects as they were at start
    saved: Vec<ObjectState>,
    selection_before: SelectionManager,
    cursor_before: Vec3,
    /// Duplicates made by a duplicate-first start
    created: Vec<ObjectId>,
    /// Co-selected objects parented to the subject for the drag
    temp_parented: Vec<ObjectId>,
    candidates: CandidateSet,
    probes: Vec<Probe>,
    behaviour: Option<Behaviour>,
    anchor: Vec2,
    first_pointer: Vec2,
    best: Option<Match>,
    highlight: Option<Highlight>,
    record: Option<SessionCommand>,
}

impl SnapSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// The dragged object
    pub fn subject(&self) -> Option<ObjectId> {
        self.subject
    }

    /// Objects parented to the subject for the duration of the drag
    pub fn temp_parented(&self) -> &[ObjectId] {
        &self.temp_parented
    }

    pub fn candidates(&self) -> &CandidateSet {
        &self.candidates
    }

    /// Current best match, if any
    pub fn best_match(&self) -> Option<&Match> {
        self.best.as_ref()
    }

    /// Snapshot for an external renderer
    pub fn highlight(&self) -> Option<Highlight> {
        self.highlight
    }

    /// Undo record of the last committed session
    pub fn take_record(&mut self) -> Option<SessionCommand> {
        self.record.take()
    }

    /// Start dragging the active object from `pointer`.
    ///
    /// With `duplicate` the selection is duplicated first and the copy of
    /// the active object is dragged instead. Fails without touching the
    /// scene if the object cannot be dragged.
    pub fn start(
        &mut self,
        scene: &mut Scene,
        view: &dyn ViewProjection,
        pointer: Vec2,
        config: &SnapperConfig,
        duplicate: bool,
    ) -> Result<()> {
        if self.is_running() {
            return Err(SnapError::SessionActive);
        }
        let active = scene.require_active()?;
        if !scene.object(active)?.frames.enabled {
            log::warn!("Cannot drag {}: snapping is disabled", active);
            return Err(SnapError::SnappingDisabled(active));
        }
        let anchor = view
            .world_to_screen(scene.world_translation(active)?)
            .ok_or(SnapError::OffScreen(active))?;

        self.reset();
        self.selection_before = scene.selection().clone();
        self.cursor_before = scene.cursor;

        let subject = if duplicate {
            match self.duplicate_selection(scene, active) {
                Ok(copy) => copy,
                Err(e) => {
                    self.rollback(scene);
                    return Err(e);
                }
            }
        } else {
            active
        };
        self.subject = Some(subject);

        if let Err(e) = self.arm(scene, subject, config) {
            self.rollback(scene);
            return Err(e);
        }

        self.behaviour = Some(Behaviour {
            matching: MatchOptions::from(config),
            flip: config.flip,
            auto_parent: config.auto_parent,
            angle_epsilon: config.angle_epsilon,
        });
        self.anchor = anchor;
        self.first_pointer = pointer;
        self.state = SessionState::Armed;

        log::debug!(
            "Snap session started on {} with {} candidates, {} probes, {} followers",
            subject,
            self.candidates.len(),
            self.probes.len(),
            self.temp_parented.len()
        );
        Ok(())
    }

    /// Duplicate every selected object; the copies become the selection
    fn duplicate_selection(&mut self, scene: &mut Scene, active: ObjectId) -> Result<ObjectId> {
        let originals: Vec<ObjectId> = scene.selection().selected().to_vec();
        let mut active_copy = None;
        let mut copies = Vec::with_capacity(originals.len());
        for id in originals {
            let copy = scene.duplicate(id)?;
            self.created.push(copy);
            if id == active {
                active_copy = Some(copy);
            } else {
                copies.push(copy);
            }
        }
        // the active object may not be part of the selection
        let active_copy = match active_copy {
            Some(copy) => copy,
            None => {
                let copy = scene.duplicate(active)?;
                self.created.push(copy);
                copy
            }
        };
        copies.push(active_copy);
        scene.selection_mut().select_multiple(copies);
        Ok(active_copy)
    }

    /// Snapshot, collect candidates and probes, parent the followers
    fn arm(&mut self, scene: &mut Scene, subject: ObjectId, config: &SnapperConfig) -> Result<()> {
        let followers: Vec<ObjectId> = if config.move_selected {
            scene
                .selection()
                .others()
                .filter(|&id| {
                    let unparented = scene.get(id).map_or(false, |o| o.parent().is_none());
                    // an ancestor cannot follow its own descendant
                    id != subject && unparented && !scene.is_ancestor(subject, id)
                })
                .collect()
        } else {
            Vec::new()
        };

        self.saved.push(scene.snapshot(subject)?);
        for &id in &followers {
            self.saved.push(scene.snapshot(id)?);
        }

        self.candidates = CandidateSet::build(
            scene,
            CandidateFilter::excluding(subject).with_selected_excluded(true),
        )?;
        self.probes = Probe::collect(&scene.object(subject)?.frames);

        for id in followers {
            scene.set_parent_keep_transform(id, Some(subject))?;
            self.temp_parented.push(id);
        }
        Ok(())
    }

    /// Move the subject to follow the pointer and look for the best match
    pub fn on_move(
        &mut self,
        scene: &mut Scene,
        view: &dyn ViewProjection,
        pointer: Vec2,
    ) -> Result<Option<&Match>> {
        let (Some(subject), Some(behaviour)) = (self.subject, self.behaviour) else {
            return Ok(None);
        };
        if !self.is_running() {
            return Ok(None);
        }

        let screen = self.anchor + (pointer - self.first_pointer);
        let current = scene.world_translation(subject)?;
        let position = view.screen_to_world(screen, current);
        scene.set_world_translation(subject, position)?;

        let world = scene.world_matrix(subject)?;
        self.best = self.candidates.query(&self.probes, &world, &behaviour.matching);
        self.highlight = self.best.as_ref().map(|m| Highlight {
            from: m.source_location,
            to: m.target_location,
        });
        self.state = SessionState::Probing;
        Ok(self.best.as_ref())
    }

    /// Finish the drag.
    ///
    /// With a match and `shift` released the matched frames are aligned.
    /// With a match and auto-parenting on, the subject is parented to the
    /// target. Followers are always released. Returns the applied match.
    pub fn on_confirm(&mut self, scene: &mut Scene, shift: bool) -> Result<Option<Match>> {
        let (Some(subject), Some(behaviour)) = (self.subject, self.behaviour) else {
            return Ok(None);
        };
        if !self.is_running() {
            return Ok(None);
        }

        let best = self.best.take();
        if let Some(m) = &best {
            if !shift {
                if let Err(e) = self.align_to(scene, subject, m, &behaviour) {
                    log::warn!("Snap failed ({}), restoring the dragged object", e);
                    self.on_cancel(scene);
                    return Err(e);
                }
            }
            if behaviour.auto_parent {
                if let Err(e) = scene.set_parent_keep_transform(subject, Some(m.target_object)) {
                    log::warn!("Could not parent {} to {}: {}", subject, m.target_object, e);
                }
            }
        }
        self.release_followers(scene);

        let mut change = SceneChange::from_states(
            std::mem::take(&mut self.saved),
            std::mem::take(&mut self.selection_before),
            self.cursor_before,
        );
        let created = std::mem::take(&mut self.created);
        match change.finish(scene, &created) {
            Ok(()) => self.record = Some(SessionCommand::new(change)),
            Err(e) => log::warn!("Snap session could not be recorded: {}", e),
        }

        self.highlight = None;
        self.state = SessionState::Committed;
        match &best {
            Some(m) => log::info!(
                "Snapped {}:{} to {}:{}",
                subject,
                m.source_frame,
                m.target_object,
                m.target_frame
            ),
            None => log::info!("Placed {} without snapping", subject),
        }
        Ok(best)
    }

    fn align_to(
        &self,
        scene: &mut Scene,
        subject: ObjectId,
        m: &Match,
        behaviour: &Behaviour,
    ) -> Result<()> {
        let target = scene.object(m.target_object)?.frame(m.target_frame)?.clone();
        let source = scene.object(subject)?.frame(m.source_frame)?.clone();
        let target_world = scene.world_matrix(m.target_object)?;
        let mut world: Mat4 = scene.world_matrix(subject)?;
        align(
            &target,
            &target_world,
            &source,
            &mut world,
            0,
            behaviour.flip,
            behaviour.angle_epsilon,
        )?;
        scene.set_world_matrix(subject, world)
    }

    fn release_followers(&mut self, scene: &mut Scene) {
        for id in std::mem::take(&mut self.temp_parented) {
            if let Err(e) = scene.set_parent_keep_transform(id, None) {
                log::warn!("Could not release {}: {}", id, e);
            }
        }
    }

    /// Abort the drag and put every touched object back exactly as it was
    pub fn on_cancel(&mut self, scene: &mut Scene) -> bool {
        if !self.is_running() {
            return false;
        }
        self.rollback(scene);
        self.state = SessionState::Cancelled;
        log::debug!("Snap session cancelled");
        true
    }

    fn rollback(&mut self, scene: &mut Scene) {
        self.temp_parented.clear();
        for &id in self.created.iter().rev() {
            if scene.get(id).is_some() {
                if let Err(e) = scene.remove(id) {
                    log::warn!("Could not remove duplicate {}: {}", id, e);
                }
            }
        }
        for state in self.saved.iter().filter(|s| !self.created.contains(&s.id())) {
            scene.restore(state);
        }
        *scene.selection_mut() = self.selection_before.clone();
        scene.cursor = self.cursor_before;
        self.created.clear();
        self.saved.clear();
        self.best = None;
        self.highlight = None;
    }

    fn reset(&mut self) {
        let record = self.record.take();
        *self = Self::default();
        self.record = record;
    }

    /// Route an input event: pointer motion probes, a left click confirms,
    /// a right click or Escape cancels.
    pub fn handle_event(
        &mut self,
        scene: &mut Scene,
        view: &dyn ViewProjection,
        event: &InputEvent,
    ) -> Result<SessionStatus> {
        if !self.is_running() {
            return Ok(SessionStatus::Ignored);
        }
        match event {
            InputEvent::MouseMove(e) => {
                self.on_move(scene, view, e.position)?;
            }
            InputEvent::MouseButton(e) if e.pressed => match e.button {
                Some(MouseButton::Left) => {
                    self.on_confirm(scene, e.modifiers.shift)?;
                    return Ok(SessionStatus::Committed);
                }
                Some(MouseButton::Right) => {
                    self.on_cancel(scene);
                    return Ok(SessionStatus::Cancelled);
                }
                _ => {}
            },
            InputEvent::Key {
                key: Key::Escape,
                pressed: true,
                ..
            } => {
                self.on_cancel(scene);
                return Ok(SessionStatus::Cancelled);
            }
            _ => {}
        }
        Ok(SessionStatus::Running)
    }
}
