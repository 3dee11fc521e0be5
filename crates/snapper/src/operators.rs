//! Single-shot snapping operators.
//!
//! Each operator checks everything it needs before touching the scene, so
//! an `Err` always means nothing changed.

use snapper_math::Vec3;

use crate::align::{align, directions_aligned, rotate_in_place, Alignment};
use crate::config::SnapperConfig;
use crate::error::{Result, SnapError};
use crate::frame::{gizmo_scale_for, Frame, FrameRef};
use crate::geometry::EditGeometry;
use crate::matcher::{CandidateFilter, CandidateSet};
use crate::scene::{ObjectId, Scene, SceneObject};

/// The object, provided it takes part in snapping
fn snap_object(scene: &Scene, id: ObjectId) -> Result<&SceneObject> {
    let object = scene.object(id)?;
    if !object.frames.enabled {
        log::warn!("{} does not have snapping enabled", id);
        return Err(SnapError::SnappingDisabled(id));
    }
    Ok(object)
}

/// Align frame `from` of the first selected non-active object to frame
/// `to` of the active object, then turn it `steps` snap angles about the
/// target direction.
pub fn snap_selected_to_active(
    scene: &mut Scene,
    to: FrameRef,
    from: FrameRef,
    steps: i32,
    config: &SnapperConfig,
) -> Result<(ObjectId, Alignment)> {
    let target_id = scene.require_active()?;
    let target = snap_object(scene, target_id)?.frame(to)?.clone();
    let source_id = scene
        .selection()
        .others()
        .next()
        .ok_or(SnapError::EmptySelection("snap to active"))?;
    let source = scene.object(source_id)?.frame(from)?.clone();

    let target_world = scene.world_matrix(target_id)?;
    let mut world = scene.world_matrix(source_id)?;
    let alignment = align(
        &target,
        &target_world,
        &source,
        &mut world,
        steps,
        false,
        config.angle_epsilon,
    )?;
    scene.set_world_matrix(source_id, world)?;

    log::info!("Snapped {}:{} to {}:{}", source_id, from, target_id, to);
    Ok((source_id, alignment))
}

/// Turn an object by its frame's snap angle about the frame direction
pub fn rotate_object(scene: &mut Scene, object: ObjectId, frame: FrameRef) -> Result<()> {
    let f = snap_object(scene, object)?.frame(frame)?.clone();
    let mut world = scene.world_matrix(object)?;
    rotate_in_place(&mut world, &f, f.snap_angle())?;
    scene.set_world_matrix(object, world)?;
    log::info!("Rotated {} about {}", object, frame);
    Ok(())
}

/// Re-mate an object against the closest frame of any other snap target.
///
/// If the two principal directions currently point the same way the
/// object is aligned face to face, otherwise back to back, so repeated
/// calls toggle between the two.
///
/// Only enabled frames count as targets. A disabled fixed slot is skipped
/// even when it is the closest frame.
pub fn flip_object(
    scene: &mut Scene,
    object: ObjectId,
    frame: FrameRef,
    config: &SnapperConfig,
) -> Result<Alignment> {
    let source = snap_object(scene, object)?.frame(frame)?.clone();
    let mut world = scene.world_matrix(object)?;

    let candidates = CandidateSet::build(scene, CandidateFilter::excluding(object))?;
    let (candidate, _) = candidates
        .nearest(source.world_location(&world))
        .ok_or(SnapError::NoEligibleCandidates)?;
    let target_id = candidate.object;
    let target_frame = candidate.frame;
    let target = scene.object(target_id)?.frame(target_frame)?.clone();
    let target_world = scene.world_matrix(target_id)?;

    let flip = directions_aligned(&target_world, &target, &world, &source);
    let alignment = align(
        &target,
        &target_world,
        &source,
        &mut world,
        0,
        flip,
        config.angle_epsilon,
    )?;
    scene.set_world_matrix(object, world)?;

    log::info!(
        "Flipped {}:{} against {}:{} (flip {})",
        object,
        frame,
        target_id,
        target_frame,
        flip
    );
    Ok(alignment)
}

/// Switch snapping on or off for an object and size its fixed-slot gizmos
/// to the object. Returns the new state.
pub fn toggle_snapping(scene: &mut Scene, object: ObjectId) -> Result<bool> {
    let object_ref = scene.object_mut(object)?;
    let scale = gizmo_scale_for(object_ref.dimensions);
    object_ref.frames.enabled = !object_ref.frames.enabled;
    object_ref.frames.set_fixed_gizmo_scale(scale);
    let enabled = object_ref.frames.enabled;
    log::info!("Snapping {} on {}", if enabled { "enabled" } else { "disabled" }, object);
    Ok(enabled)
}

/// Append an extra frame sized to the object; returns its index
pub fn add_extra_frame(scene: &mut Scene, object: ObjectId) -> Result<usize> {
    let object_ref = scene.object_mut(object)?;
    let scale = gizmo_scale_for(object_ref.dimensions);
    let index = object_ref.frames.add_extra(scale);
    log::debug!("Added extra frame #{} to {}", index, object);
    Ok(index)
}

pub fn remove_extra_frame(scene: &mut Scene, object: ObjectId, index: usize) -> Result<Frame> {
    scene
        .object_mut(object)?
        .frames
        .remove_extra(index)
        .ok_or(SnapError::FrameNotFound {
            object,
            frame: FrameRef::Extra(index),
        })
}

/// Copy the active object's snapping flag and fixed slots to every other
/// selected object, and append its extras to theirs.
pub fn copy_frames_to_selected(scene: &mut Scene) -> Result<Vec<ObjectId>> {
    let source_id = scene.require_active()?;
    let source = snap_object(scene, source_id)?.frames.clone();
    let targets: Vec<ObjectId> = scene.selection().others().collect();
    if targets.is_empty() {
        log::warn!("Copy frames needs at least one other selected object");
        return Err(SnapError::EmptySelection("copy frames"));
    }
    for &id in &targets {
        scene.object(id)?;
    }
    for &id in &targets {
        scene.object_mut(id)?.frames.copy_from(&source);
    }
    log::info!("Copied frames of {} to {} objects", source_id, targets.len());
    Ok(targets)
}

/// Move the 3D cursor onto a frame's world location
pub fn cursor_to_frame(scene: &mut Scene, object: ObjectId, frame: FrameRef) -> Result<Vec3> {
    let location = snap_object(scene, object)?
        .frame(frame)?
        .world_location(&scene.world_matrix(object)?);
    scene.cursor = location;
    Ok(location)
}

pub fn reset_frame(scene: &mut Scene, object: ObjectId, frame: FrameRef) -> Result<()> {
    scene.object_mut(object)?.frame_mut(frame)?.reset();
    Ok(())
}

pub fn cycle_axes(scene: &mut Scene, object: ObjectId, frame: FrameRef) -> Result<()> {
    scene.object_mut(object)?.frame_mut(frame)?.cycle_axes();
    Ok(())
}

fn geometry(scene: &Scene, object: ObjectId) -> Result<&EditGeometry> {
    scene
        .object(object)?
        .geometry
        .as_ref()
        .ok_or(SnapError::NoGeometry(object))
}

/// Frame location to the average of the selected elements
pub fn set_location_from_selection(
    scene: &mut Scene,
    object: ObjectId,
    frame: FrameRef,
) -> Result<Vec3> {
    scene.object(object)?.frame(frame)?;
    let location = geometry(scene, object)?
        .selection_average()
        .ok_or(SnapError::EmptySelection("frame location"))?;
    scene.object_mut(object)?.frame_mut(frame)?.location = location;
    Ok(location)
}

/// Unit vector from the frame location towards the selection average
fn toward_selection(
    scene: &Scene,
    object: ObjectId,
    frame: FrameRef,
    what: &'static str,
) -> Result<Vec3> {
    let origin = scene.object(object)?.frame(frame)?.location;
    let average = geometry(scene, object)?
        .selection_average()
        .ok_or(SnapError::EmptySelection(what))?;
    let v = (average - origin).normalize_or_zero();
    if v == Vec3::ZERO || !v.is_finite() {
        log::warn!("Selection coincides with the frame location of {}", object);
        return Err(SnapError::InvalidTransform);
    }
    Ok(v)
}

/// Point the frame direction from its location to the selection
pub fn set_direction_from_selection(
    scene: &mut Scene,
    object: ObjectId,
    frame: FrameRef,
) -> Result<Vec3> {
    let direction = toward_selection(scene, object, frame, "frame direction")?;
    scene.object_mut(object)?.frame_mut(frame)?.direction = direction;
    Ok(direction)
}

/// Point the frame up vector from its location to the selection
pub fn set_up_from_selection(
    scene: &mut Scene,
    object: ObjectId,
    frame: FrameRef,
) -> Result<Vec3> {
    let up = toward_selection(scene, object, frame, "frame up vector")?;
    scene.object_mut(object)?.frame_mut(frame)?.up = up;
    Ok(up)
}

/// Point the frame direction along the selection normal. Applying it to a
/// frame that already points that way turns it around.
pub fn set_direction_to_normal(
    scene: &mut Scene,
    object: ObjectId,
    frame: FrameRef,
    config: &SnapperConfig,
) -> Result<Vec3> {
    let old = scene.object(object)?.frame(frame)?.direction;
    let mut direction = geometry(scene, object)?
        .selection_normal()
        .ok_or(SnapError::EmptySelection("frame normal"))?;
    if (direction - old).length() < config.angle_epsilon {
        direction = -direction;
    }
    scene.object_mut(object)?.frame_mut(frame)?.direction = direction;
    Ok(direction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FixedSlot;
    use crate::geometry::{Mesh, MeshFace, MeshVertex};
    use snapper_math::Mat4;

    const A: FrameRef = FrameRef::Fixed(FixedSlot::A);
    const B: FrameRef = FrameRef::Fixed(FixedSlot::B);

    fn snap_object_at(scene: &mut Scene, name: &str, at: Vec3) -> ObjectId {
        let id = scene.spawn(name, Mat4::from_translation(at));
        scene.object_mut(id).unwrap().frames.enabled = true;
        id
    }

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn test_snap_selected_to_active() {
        let mut scene = Scene::new();
        let moving = snap_object_at(&mut scene, "moving", Vec3::new(5.0, 5.0, 0.0));
        let base = snap_object_at(&mut scene, "base", Vec3::ZERO);
        {
            let frames = &mut scene.object_mut(base).unwrap().frames;
            let b = frames.fixed_mut(FixedSlot::B);
            b.disabled = false;
            b.location = Vec3::new(0.0, 0.0, 1.0);
            b.direction = Vec3::Z;
            b.up = Vec3::X;
        }
        scene.selection_mut().select_multiple([moving, base]);

        let config = SnapperConfig::default();
        let (snapped, _) = snap_selected_to_active(&mut scene, B, A, 0, &config).unwrap();
        assert_eq!(snapped, moving);

        let world = scene.world_matrix(moving).unwrap();
        let frame = scene.object(moving).unwrap().frames.fixed(FixedSlot::A).clone();
        assert!(close(frame.world_location(&world), Vec3::new(0.0, 0.0, 1.0)));
        assert!(close(frame.world_direction(&world), Vec3::Z));
        assert!(close(frame.world_up(&world), Vec3::X));
    }

    #[test]
    fn test_snap_needs_second_object() {
        let mut scene = Scene::new();
        let base = snap_object_at(&mut scene, "base", Vec3::ZERO);
        scene.selection_mut().select_multiple([base]);
        let result = snap_selected_to_active(&mut scene, A, A, 0, &SnapperConfig::default());
        assert!(matches!(result, Err(SnapError::EmptySelection(_))));

        scene.selection_mut().clear();
        let result = snap_selected_to_active(&mut scene, A, A, 0, &SnapperConfig::default());
        assert!(matches!(result, Err(SnapError::NoActiveSubject)));
    }

    #[test]
    fn test_rotate_object_keeps_frame_location() {
        let mut scene = Scene::new();
        let id = snap_object_at(&mut scene, "bolt", Vec3::new(1.0, 2.0, 3.0));
        scene.object_mut(id).unwrap().frames.fixed_mut(FixedSlot::A).location = Vec3::Y;
        let frame = scene.object(id).unwrap().frames.fixed(FixedSlot::A).clone();
        let before = frame.world_location(&scene.world_matrix(id).unwrap());

        rotate_object(&mut scene, id, A).unwrap();
        let world = scene.world_matrix(id).unwrap();
        assert!(close(frame.world_location(&world), before));
        assert!(!world.abs_diff_eq(&Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)), 1e-4));
    }

    #[test]
    fn test_rotate_requires_snapping() {
        let mut scene = Scene::new();
        let id = scene.spawn("plain", Mat4::IDENTITY);
        assert!(matches!(
            rotate_object(&mut scene, id, A),
            Err(SnapError::SnappingDisabled(_))
        ));
    }

    #[test]
    fn test_flip_toggles_mating() {
        let mut scene = Scene::new();
        let base = snap_object_at(&mut scene, "base", Vec3::ZERO);
        let part = snap_object_at(&mut scene, "part", Vec3::new(0.5, 0.0, 0.0));
        let config = SnapperConfig::default();

        let direction = |scene: &Scene, id| {
            let f = scene.object(id).unwrap().frames.fixed(FixedSlot::A).clone();
            f.world_direction(&scene.world_matrix(id).unwrap())
        };

        // both start pointing +X
        flip_object(&mut scene, part, A, &config).unwrap();
        assert!(direction(&scene, part).dot(direction(&scene, base)) < -0.999);
        assert!(close(scene.world_translation(part).unwrap(), Vec3::ZERO));

        flip_object(&mut scene, part, A, &config).unwrap();
        assert!(direction(&scene, part).dot(direction(&scene, base)) > 0.999);
    }

    #[test]
    fn test_flip_without_targets() {
        let mut scene = Scene::new();
        let part = snap_object_at(&mut scene, "part", Vec3::ZERO);
        scene.spawn("plain", Mat4::IDENTITY);
        let before = scene.local_matrix(part).unwrap();
        assert!(matches!(
            flip_object(&mut scene, part, A, &SnapperConfig::default()),
            Err(SnapError::NoEligibleCandidates)
        ));
        assert_eq!(scene.local_matrix(part).unwrap(), before);
    }

    #[test]
    fn test_flip_skips_disabled_slots() {
        let mut scene = Scene::new();
        let base = snap_object_at(&mut scene, "base", Vec3::new(5.0, 0.0, 0.0));
        let part = snap_object_at(&mut scene, "part", Vec3::ZERO);
        // closest frame to the part, but disabled
        scene.object_mut(base).unwrap().frames.fixed_mut(FixedSlot::B).location =
            Vec3::new(-4.9, 0.0, 0.0);

        flip_object(&mut scene, part, A, &SnapperConfig::default()).unwrap();
        assert!(close(scene.world_translation(part).unwrap(), Vec3::new(5.0, 0.0, 0.0)));
    }

    #[test]
    fn test_toggle_snapping_sets_gizmo_scale() {
        let mut scene = Scene::new();
        let id = scene.spawn("beam", Mat4::IDENTITY);
        scene.object_mut(id).unwrap().dimensions = Vec3::new(4.0, 0.5, 2.0);
        assert!(toggle_snapping(&mut scene, id).unwrap());
        let frames = &scene.object(id).unwrap().frames;
        assert_eq!(frames.fixed(FixedSlot::C).gizmo_scale(), 0.5);

        scene.object_mut(id).unwrap().dimensions = Vec3::new(0.01, 1.0, 1.0);
        assert!(!toggle_snapping(&mut scene, id).unwrap());
        assert_eq!(scene.object(id).unwrap().frames.fixed(FixedSlot::A).gizmo_scale(), 0.2);
    }

    #[test]
    fn test_add_and_remove_extra_frames() {
        let mut scene = Scene::new();
        let id = scene.spawn("plate", Mat4::IDENTITY);
        assert_eq!(add_extra_frame(&mut scene, id).unwrap(), 0);
        assert_eq!(add_extra_frame(&mut scene, id).unwrap(), 1);
        assert_eq!(add_extra_frame(&mut scene, id).unwrap(), 2);

        let removed = remove_extra_frame(&mut scene, id, 1).unwrap();
        assert_eq!(removed.label, "2");
        let frames = &scene.object(id).unwrap().frames;
        let labels: Vec<_> = frames.extras().iter().map(|f| f.label.as_str()).collect();
        assert_eq!(labels, vec!["1", "3"]);
        assert_eq!(frames.active_extra(), 0);

        assert!(matches!(
            remove_extra_frame(&mut scene, id, 5),
            Err(SnapError::FrameNotFound { .. })
        ));
    }

    #[test]
    fn test_copy_frames_to_selected() {
        let mut scene = Scene::new();
        let dst = scene.spawn("dst", Mat4::IDENTITY);
        scene.object_mut(dst).unwrap().frames.add_extra(1.0);
        let src = snap_object_at(&mut scene, "src", Vec3::ZERO);
        {
            let frames = &mut scene.object_mut(src).unwrap().frames;
            frames.fixed_mut(FixedSlot::A).location = Vec3::new(1.0, 2.0, 3.0);
            frames.add_extra(1.0);
        }
        scene.selection_mut().select_multiple([dst, src]);

        assert_eq!(copy_frames_to_selected(&mut scene).unwrap(), vec![dst]);
        let frames = &scene.object(dst).unwrap().frames;
        assert!(frames.enabled);
        assert_eq!(frames.fixed(FixedSlot::A).location, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(frames.extras().len(), 2);
    }

    #[test]
    fn test_cursor_to_frame() {
        let mut scene = Scene::new();
        let id = snap_object_at(&mut scene, "a", Vec3::new(1.0, 0.0, 0.0));
        scene.object_mut(id).unwrap().frames.fixed_mut(FixedSlot::A).location = Vec3::Z;
        assert_eq!(cursor_to_frame(&mut scene, id, A).unwrap(), Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(scene.cursor, Vec3::new(1.0, 0.0, 1.0));
    }

    fn mesh_object(scene: &mut Scene) -> ObjectId {
        let id = scene.spawn("mesh", Mat4::IDENTITY);
        let vertex = |co: Vec3, selected| MeshVertex {
            co,
            normal: Vec3::Z,
            selected,
        };
        scene.object_mut(id).unwrap().geometry = Some(EditGeometry::Mesh(Mesh {
            vertices: vec![
                vertex(Vec3::new(2.0, 0.0, 0.0), true),
                vertex(Vec3::new(4.0, 0.0, 0.0), true),
                vertex(Vec3::new(9.0, 9.0, 9.0), false),
            ],
            faces: vec![MeshFace {
                normal: Vec3::Y,
                selected: false,
            }],
        }));
        id
    }

    #[test]
    fn test_selection_setters() {
        let mut scene = Scene::new();
        let id = mesh_object(&mut scene);

        let location = set_location_from_selection(&mut scene, id, A).unwrap();
        assert_eq!(location, Vec3::new(3.0, 0.0, 0.0));

        scene.object_mut(id).unwrap().frame_mut(A).unwrap().location = Vec3::ZERO;
        assert!(close(set_direction_from_selection(&mut scene, id, A).unwrap(), Vec3::X));
        scene.object_mut(id).unwrap().frame_mut(A).unwrap().location = Vec3::new(3.0, -2.0, 0.0);
        assert!(close(set_up_from_selection(&mut scene, id, A).unwrap(), Vec3::Y));
    }

    #[test]
    fn test_direction_to_normal_turns_around() {
        let mut scene = Scene::new();
        let id = mesh_object(&mut scene);
        let config = SnapperConfig::default();

        // no faces selected: vertex normals
        assert!(close(set_direction_to_normal(&mut scene, id, A, &config).unwrap(), Vec3::Z));
        assert!(close(set_direction_to_normal(&mut scene, id, A, &config).unwrap(), Vec3::NEG_Z));
    }

    #[test]
    fn test_setters_leave_frame_alone_on_error() {
        let mut scene = Scene::new();
        let id = mesh_object(&mut scene);
        if let Some(EditGeometry::Mesh(mesh)) = &mut scene.object_mut(id).unwrap().geometry {
            mesh.vertices.iter_mut().for_each(|v| v.selected = false);
        }
        let before = scene.object(id).unwrap().frames.clone();
        let config = SnapperConfig::default();
        assert!(matches!(
            set_location_from_selection(&mut scene, id, A),
            Err(SnapError::EmptySelection(_))
        ));
        assert!(set_direction_to_normal(&mut scene, id, A, &config).is_err());
        assert_eq!(scene.object(id).unwrap().frames, before);

        let plain = scene.spawn("plain", Mat4::IDENTITY);
        assert!(matches!(
            set_up_from_selection(&mut scene, plain, A),
            Err(SnapError::NoGeometry(_))
        ));
    }

    #[test]
    fn test_reset_and_cycle() {
        let mut scene = Scene::new();
        let id = scene.spawn("a", Mat4::IDENTITY);
        cycle_axes(&mut scene, id, A).unwrap();
        assert_eq!(scene.object(id).unwrap().frame(A).unwrap().direction, Vec3::NEG_X);
        reset_frame(&mut scene, id, A).unwrap();
        assert_eq!(scene.object(id).unwrap().frame(A).unwrap().direction, Vec3::X);
        assert!(cycle_axes(&mut scene, id, FrameRef::Extra(0)).is_err());
    }
}
