//! In-process object model the snapping operations run against.
//!
//! Objects carry a local matrix and an optional parent; world matrices are
//! always derived (`parent_world · local`). Writes to a world matrix are
//! converted back into the local matrix so the requested world result
//! holds exactly as far as float arithmetic allows.

use std::fmt;

use serde::{Deserialize, Serialize};
use snapper_math::{Mat4, Vec3};

use crate::error::{Result, SnapError};
use crate::frame::{Frame, FrameRef, FrameSet};
use crate::geometry::EditGeometry;
use crate::selection::SelectionManager;

/// Stable object handle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object({})", self.0)
    }
}

/// Parent chains deeper than this are treated as broken
const MAX_DEPTH: usize = 1000;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    id: ObjectId,
    pub name: String,
    local: Mat4,
    parent: Option<ObjectId>,
    pub visible: bool,
    /// Bounding box size in world units
    pub dimensions: Vec3,
    pub frames: FrameSet,
    /// Present while the object is in edit mode
    pub geometry: Option<EditGeometry>,
}

impl SceneObject {
    #[inline]
    pub fn id(&self) -> ObjectId {
        self.id
    }

    #[inline]
    pub fn local_matrix(&self) -> Mat4 {
        self.local
    }

    #[inline]
    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    /// Snapping enabled and visible
    pub fn is_snap_target(&self) -> bool {
        self.frames.enabled && self.visible
    }

    pub fn frame(&self, frame: FrameRef) -> Result<&Frame> {
        self.frames.get(frame).ok_or(SnapError::FrameNotFound {
            object: self.id,
            frame,
        })
    }

    pub fn frame_mut(&mut self, frame: FrameRef) -> Result<&mut Frame> {
        let object = self.id;
        self.frames
            .get_mut(frame)
            .ok_or(SnapError::FrameNotFound { object, frame })
    }
}

/// Saved copy of one object, used to roll back or replay edits
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectState {
    object: SceneObject,
    index: usize,
}

impl ObjectState {
    pub fn id(&self) -> ObjectId {
        self.object.id
    }

    pub fn object(&self) -> &SceneObject {
        &self.object
    }
}

/// Ordered collection of objects plus selection and the 3D cursor
#[derive(Clone, Debug, Default)]
pub struct Scene {
    objects: Vec<SceneObject>,
    next_id: u64,
    selection: SelectionManager,
    /// 3D cursor location
    pub cursor: Vec3,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an unparented, visible object with the given world matrix
    pub fn spawn(&mut self, name: impl Into<String>, world: impl Into<Mat4>) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        self.objects.push(SceneObject {
            id,
            name: name.into(),
            local: world.into(),
            parent: None,
            visible: true,
            dimensions: Vec3::ONE,
            frames: FrameSet::new(),
            geometry: None,
        });
        log::trace!("Spawned {}", id);
        id
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Objects in scene order
    pub fn objects(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter()
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn object(&self, id: ObjectId) -> Result<&SceneObject> {
        self.get(id).ok_or(SnapError::ObjectNotFound(id))
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Result<&mut SceneObject> {
        self.objects
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(SnapError::ObjectNotFound(id))
    }

    fn index_of(&self, id: ObjectId) -> Result<usize> {
        self.objects
            .iter()
            .position(|o| o.id == id)
            .ok_or(SnapError::ObjectNotFound(id))
    }

    pub fn selection(&self) -> &SelectionManager {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionManager {
        &mut self.selection
    }

    pub fn active(&self) -> Option<ObjectId> {
        self.selection.active()
    }

    /// Active object or [`SnapError::NoActiveSubject`]
    pub fn require_active(&self) -> Result<ObjectId> {
        let id = self.selection.active().ok_or(SnapError::NoActiveSubject)?;
        self.object(id)?;
        Ok(id)
    }

    pub fn parent(&self, id: ObjectId) -> Result<Option<ObjectId>> {
        Ok(self.object(id)?.parent)
    }

    pub fn children(&self, id: ObjectId) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects
            .iter()
            .filter(move |o| o.parent == Some(id))
            .map(|o| o.id)
    }

    /// True if `ancestor` appears anywhere in `id`'s parent chain
    pub fn is_ancestor(&self, id: ObjectId, ancestor: ObjectId) -> bool {
        let mut current = id;
        let mut visited = 0;
        while visited < MAX_DEPTH {
            match self.get(current).and_then(|o| o.parent) {
                Some(parent) if parent == ancestor => return true,
                Some(parent) => {
                    current = parent;
                    visited += 1;
                }
                None => break,
            }
        }
        false
    }

    pub fn local_matrix(&self, id: ObjectId) -> Result<Mat4> {
        Ok(self.object(id)?.local)
    }

    pub fn set_local_matrix(&mut self, id: ObjectId, local: Mat4) -> Result<()> {
        if !local.is_finite() {
            return Err(SnapError::InvalidTransform);
        }
        self.object_mut(id)?.local = local;
        Ok(())
    }

    /// `parent_world · local`, walking the whole parent chain
    pub fn world_matrix(&self, id: ObjectId) -> Result<Mat4> {
        let object = self.object(id)?;
        let mut world = object.local;
        let mut parent = object.parent;
        let mut depth = 0;
        while let Some(pid) = parent {
            if depth >= MAX_DEPTH {
                return Err(SnapError::HierarchyCycle { child: id, parent: pid });
            }
            let p = self.object(pid)?;
            world = p.local * world;
            parent = p.parent;
            depth += 1;
        }
        Ok(world)
    }

    /// Rewrite the local matrix so that the object's world matrix becomes
    /// `world`. Fails without change if the parent's world matrix is
    /// singular or `world` is not finite.
    pub fn set_world_matrix(&mut self, id: ObjectId, world: Mat4) -> Result<()> {
        let local = self.local_for_world(id, world)?;
        self.object_mut(id)?.local = local;
        Ok(())
    }

    fn local_for_world(&self, id: ObjectId, world: Mat4) -> Result<Mat4> {
        if !world.is_finite() {
            return Err(SnapError::InvalidTransform);
        }
        match self.object(id)?.parent {
            None => Ok(world),
            Some(pid) => {
                let parent_inv = self
                    .world_matrix(pid)?
                    .inverse()
                    .ok_or(SnapError::InvalidTransform)?;
                let local = parent_inv * world;
                if local.is_finite() {
                    Ok(local)
                } else {
                    Err(SnapError::InvalidTransform)
                }
            }
        }
    }

    pub fn world_translation(&self, id: ObjectId) -> Result<Vec3> {
        Ok(self.world_matrix(id)?.translation())
    }

    /// Move the object so its world origin lands on `position`, keeping
    /// world rotation and scale
    pub fn set_world_translation(&mut self, id: ObjectId, position: Vec3) -> Result<()> {
        let world = self.world_matrix(id)?.with_translation(position);
        self.set_world_matrix(id, world)
    }

    /// Reparent `child` (or clear its parent with `None`) while keeping its
    /// world matrix.
    pub fn set_parent_keep_transform(
        &mut self,
        child: ObjectId,
        parent: Option<ObjectId>,
    ) -> Result<()> {
        let world = self.world_matrix(child)?;
        let local = match parent {
            None => world,
            Some(pid) => {
                self.object(pid)?;
                if pid == child || self.is_ancestor(pid, child) {
                    return Err(SnapError::HierarchyCycle { child, parent: pid });
                }
                let parent_inv = self
                    .world_matrix(pid)?
                    .inverse()
                    .ok_or(SnapError::InvalidTransform)?;
                parent_inv * world
            }
        };
        if !local.is_finite() {
            return Err(SnapError::InvalidTransform);
        }
        let object = self.object_mut(child)?;
        object.parent = parent;
        object.local = local;
        log::debug!("Parent of {} set to {:?}", child, parent);
        Ok(())
    }

    /// Copy an object (frames and geometry included) under the same
    /// parent. The copy is appended to the scene order.
    pub fn duplicate(&mut self, id: ObjectId) -> Result<ObjectId> {
        let mut copy = self.object(id)?.clone();
        let new_id = ObjectId(self.next_id);
        self.next_id += 1;
        copy.id = new_id;
        copy.name = format!("{}.{:03}", copy.name, new_id.0);
        self.objects.push(copy);
        log::debug!("Duplicated {} as {}", id, new_id);
        Ok(new_id)
    }

    /// Remove an object. Its children are re-parented to its parent with
    /// their world matrices kept.
    pub fn remove(&mut self, id: ObjectId) -> Result<ObjectState> {
        let index = self.index_of(id)?;
        let grandparent = self.objects[index].parent;
        let children: Vec<ObjectId> = self.children(id).collect();
        for child in children {
            self.set_parent_keep_transform(child, grandparent)?;
        }
        let object = self.objects.remove(index);
        self.selection.remove_object(id);
        Ok(ObjectState { object, index })
    }

    pub fn snapshot(&self, id: ObjectId) -> Result<ObjectState> {
        let index = self.index_of(id)?;
        Ok(ObjectState {
            object: self.objects[index].clone(),
            index,
        })
    }

    /// Put a snapshot back. A removed object is re-inserted at its old
    /// position in the scene order.
    pub fn restore(&mut self, state: &ObjectState) {
        match self.objects.iter_mut().find(|o| o.id == state.object.id) {
            Some(object) => *object = state.object.clone(),
            None => {
                let index = state.index.min(self.objects.len());
                self.objects.insert(index, state.object.clone());
                self.next_id = self.next_id.max(state.object.id.0 + 1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapper_math::{Quat, Transform};

    fn at(x: f32, y: f32, z: f32) -> Mat4 {
        Mat4::from_translation(Vec3::new(x, y, z))
    }

    #[test]
    fn test_world_matrix_follows_parent() {
        let mut scene = Scene::new();
        let parent = scene.spawn("parent", at(1.0, 0.0, 0.0));
        let child = scene.spawn("child", at(0.0, 2.0, 0.0));
        scene.set_parent_keep_transform(child, Some(parent)).unwrap();

        // world transform kept
        let world = scene.world_matrix(child).unwrap();
        assert!((world.translation() - Vec3::new(0.0, 2.0, 0.0)).length() < 1e-6);
        assert!((scene.local_matrix(child).unwrap().translation() - Vec3::new(-1.0, 2.0, 0.0)).length() < 1e-6);

        scene.set_world_translation(parent, Vec3::new(5.0, 0.0, 0.0)).unwrap();
        let world = scene.world_matrix(child).unwrap();
        assert!((world.translation() - Vec3::new(4.0, 2.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_set_world_matrix_under_rotated_parent() {
        let mut scene = Scene::new();
        let parent = scene.spawn(
            "parent",
            Transform::from_position(Vec3::new(1.0, 2.0, 3.0))
                .with_rotation(Quat::from_axis_angle(Vec3::Z, 0.8))
                .with_scale(Vec3::new(2.0, 1.0, 0.5)),
        );
        let child = scene.spawn("child", Mat4::IDENTITY);
        scene.set_parent_keep_transform(child, Some(parent)).unwrap();

        let target = at(-3.0, 0.5, 7.0);
        scene.set_world_matrix(child, target).unwrap();
        assert!(scene.world_matrix(child).unwrap().abs_diff_eq(&target, 1e-5));
    }

    #[test]
    fn test_parent_cycle_rejected() {
        let mut scene = Scene::new();
        let a = scene.spawn("a", Mat4::IDENTITY);
        let b = scene.spawn("b", Mat4::IDENTITY);
        scene.set_parent_keep_transform(b, Some(a)).unwrap();
        assert!(matches!(
            scene.set_parent_keep_transform(a, Some(b)),
            Err(SnapError::HierarchyCycle { .. })
        ));
        assert!(matches!(
            scene.set_parent_keep_transform(a, Some(a)),
            Err(SnapError::HierarchyCycle { .. })
        ));
        assert_eq!(scene.parent(a).unwrap(), None);
    }

    #[test]
    fn test_singular_parent_rejected() {
        let mut scene = Scene::new();
        let flat = scene.spawn("flat", Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0)));
        let child = scene.spawn("child", at(1.0, 1.0, 1.0));
        assert!(matches!(
            scene.set_parent_keep_transform(child, Some(flat)),
            Err(SnapError::InvalidTransform)
        ));
        assert_eq!(scene.parent(child).unwrap(), None);
    }

    #[test]
    fn test_snapshot_restore_and_remove() {
        let mut scene = Scene::new();
        let a = scene.spawn("a", at(1.0, 0.0, 0.0));
        let b = scene.spawn("b", at(2.0, 0.0, 0.0));
        let before = scene.snapshot(a).unwrap();
        scene.set_world_translation(a, Vec3::new(9.0, 9.0, 9.0)).unwrap();
        scene.restore(&before);
        assert_eq!(scene.local_matrix(a).unwrap(), at(1.0, 0.0, 0.0));

        let removed = scene.remove(a).unwrap();
        assert!(scene.get(a).is_none());
        scene.restore(&removed);
        let order: Vec<_> = scene.objects().map(|o| o.id()).collect();
        assert_eq!(order, vec![a, b]);
    }

    #[test]
    fn test_duplicate_gets_fresh_id() {
        let mut scene = Scene::new();
        let a = scene.spawn("bolt", at(1.0, 0.0, 0.0));
        let b = scene.duplicate(a).unwrap();
        assert_ne!(a, b);
        assert_eq!(scene.local_matrix(b).unwrap(), scene.local_matrix(a).unwrap());
        assert!(scene.object(b).unwrap().name.starts_with("bolt."));
    }
}
