//! Before/after snapshots of the part of a scene an edit touched.

use snapper_math::Vec3;

use crate::error::Result;
use crate::scene::{ObjectId, ObjectState, Scene};
use crate::selection::SelectionManager;

/// Recorded effect of one edit.
///
/// Captured around the edit: [`SceneChange::capture`] before it runs,
/// [`SceneChange::finish`] after. Undo and redo then replay snapshots
/// instead of running the edit again, so they land on exactly the same
/// matrices.
#[derive(Clone, Debug)]
pub struct SceneChange {
    before: Vec<ObjectState>,
    after: Vec<ObjectState>,
    /// Objects that did not exist before the edit
    created: Vec<ObjectId>,
    selection_before: SelectionManager,
    selection_after: SelectionManager,
    cursor_before: Vec3,
    cursor_after: Vec3,
}

impl SceneChange {
    /// Snapshot `objects`, the selection and the cursor
    pub fn capture(scene: &Scene, objects: &[ObjectId]) -> Result<Self> {
        let before = objects
            .iter()
            .map(|&id| scene.snapshot(id))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            before,
            after: Vec::new(),
            created: Vec::new(),
            selection_before: scene.selection().clone(),
            selection_after: scene.selection().clone(),
            cursor_before: scene.cursor,
            cursor_after: scene.cursor,
        })
    }

    /// Build a change from snapshots taken earlier by the caller
    pub fn from_states(
        before: Vec<ObjectState>,
        selection_before: SelectionManager,
        cursor_before: Vec3,
    ) -> Self {
        Self {
            before,
            after: Vec::new(),
            created: Vec::new(),
            selection_before: selection_before.clone(),
            selection_after: selection_before,
            cursor_before,
            cursor_after: cursor_before,
        }
    }

    /// Snapshot the touched objects again, plus any `created` ones
    pub fn finish(&mut self, scene: &Scene, created: &[ObjectId]) -> Result<()> {
        let mut after = Vec::with_capacity(self.before.len() + created.len());
        for state in &self.before {
            after.push(scene.snapshot(state.id())?);
        }
        for &id in created {
            if !self.before.iter().any(|s| s.id() == id) {
                after.push(scene.snapshot(id)?);
            }
        }
        self.after = after;
        self.created = created.to_vec();
        self.selection_after = scene.selection().clone();
        self.cursor_after = scene.cursor;
        Ok(())
    }

    pub fn created(&self) -> &[ObjectId] {
        &self.created
    }

    /// Objects whose state was recorded before the edit
    pub fn touched(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.before.iter().map(|s| s.id())
    }

    /// Put the scene back the way it was before the edit
    pub fn revert(&self, scene: &mut Scene) -> Result<()> {
        for &id in self.created.iter().rev() {
            if scene.get(id).is_some() {
                scene.remove(id)?;
            }
        }
        for state in self.before.iter().filter(|s| !self.created.contains(&s.id())) {
            scene.restore(state);
        }
        *scene.selection_mut() = self.selection_before.clone();
        scene.cursor = self.cursor_before;
        Ok(())
    }

    /// Put the scene into its post-edit state again
    pub fn reapply(&self, scene: &mut Scene) {
        for state in &self.after {
            scene.restore(state);
        }
        *scene.selection_mut() = self.selection_after.clone();
        scene.cursor = self.cursor_after;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapper_math::Mat4;

    #[test]
    fn test_revert_and_reapply() {
        let mut scene = Scene::new();
        let a = scene.spawn("a", Mat4::IDENTITY);
        scene.selection_mut().select_multiple([a]);

        let mut change = SceneChange::capture(&scene, &[a]).unwrap();
        scene.set_world_translation(a, Vec3::new(1.0, 2.0, 3.0)).unwrap();
        let b = scene.duplicate(a).unwrap();
        scene.selection_mut().select_multiple([b]);
        scene.cursor = Vec3::X;
        change.finish(&scene, &[b]).unwrap();
        let moved = scene.local_matrix(a).unwrap();

        change.revert(&mut scene).unwrap();
        assert_eq!(scene.local_matrix(a).unwrap(), Mat4::IDENTITY);
        assert!(scene.get(b).is_none());
        assert_eq!(scene.active(), Some(a));
        assert_eq!(scene.cursor, Vec3::ZERO);

        change.reapply(&mut scene);
        assert_eq!(scene.local_matrix(a).unwrap(), moved);
        assert!(scene.get(b).is_some());
        assert_eq!(scene.active(), Some(b));
        assert_eq!(scene.cursor, Vec3::X);
    }
}
