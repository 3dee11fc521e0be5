//! Frame-to-frame alignment.
//!
//! [`align`] moves a source object so that one of its frames coincides
//! with a target frame: same world location, parallel (or, with `flip`,
//! antiparallel) principal directions and matching up vectors. The work is
//! done on a staged copy of the source matrix; the caller's matrix is only
//! written once the whole result is known to be finite.

use snapper_math::consts::PI;
use snapper_math::{compose_pivot_rotation, rotation_aligning, Mat4, Quat, Vec3};

use crate::error::{Result, SnapError};
use crate::frame::Frame;

/// Angles measured before the rotation steps were applied
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Alignment {
    /// Angle between the principal directions, radians in `[0, PI]`
    pub principal_angle: f32,
    /// Angle between the up vectors after the principal rotation
    pub up_angle: f32,
}

/// Align `source` (a frame of the object whose world matrix is
/// `source_world`) to `target` (a frame of the object at `target_world`).
///
/// 1. translate the source so both world locations coincide
/// 2. rotate about the target location to make the principal directions
///    parallel, or antiparallel when `flip` is set
/// 3. rotate the up vectors into line, plus `steps` increments of the
///    target's snap angle about the target's principal direction
///
/// On error `source_world` is left untouched.
pub fn align(
    target: &Frame,
    target_world: &Mat4,
    source: &Frame,
    source_world: &mut Mat4,
    steps: i32,
    flip: bool,
    epsilon: f32,
) -> Result<Alignment> {
    let mut staged = *source_world;

    // translation
    let to_location = target.world_location(target_world);
    let from_location = source.world_location(&staged);
    staged = Mat4::from_translation(to_location - from_location) * staged;

    // principal direction
    let to_direction = target.world_direction(target_world);
    let mut from_direction = source.world_direction(&staged);
    if flip {
        from_direction = -from_direction;
    }
    let principal_angle = from_direction.angle_between(to_direction);
    let rot = rotation_aligning(from_direction, to_direction, epsilon);
    staged = compose_pivot_rotation(to_location, rot) * staged;

    // up vector and rotation steps
    let to_up = target.world_up(target_world);
    let from_up = source.world_up(&staged);
    let up_angle = from_up.angle_between(to_up);
    let rot_up = up_rotation(from_up, to_up, to_direction, epsilon);
    let rot_steps = if steps != 0 {
        Quat::from_axis_angle(to_direction, steps as f32 * target.snap_angle())
    } else {
        Quat::IDENTITY
    };
    staged = compose_pivot_rotation(to_location, rot_steps * rot_up) * staged;

    if !staged.is_finite() {
        log::warn!("Alignment produced a non-finite transform, nothing applied");
        return Err(SnapError::InvalidTransform);
    }
    *source_world = staged;

    log::debug!(
        "Aligned '{}' to '{}': principal {:.4} rad, up {:.4} rad, {} steps, flip {}",
        source.label,
        target.label,
        principal_angle,
        up_angle,
        steps,
        flip
    );
    Ok(Alignment {
        principal_angle,
        up_angle,
    })
}

/// Shortest arc between the up vectors. Antiparallel ups turn half way
/// round the principal axis so the direction alignment survives.
fn up_rotation(from_up: Vec3, to_up: Vec3, axis: Vec3, epsilon: f32) -> Quat {
    let angle = from_up.angle_between(to_up);
    if (PI - angle) < epsilon && axis.length_squared() > 0.0 {
        return Quat::from_axis_angle(axis, PI);
    }
    rotation_aligning(from_up, to_up, epsilon)
}

/// Rotate an object by `angle` about `frame`'s world direction, pivoting on
/// the frame's world location.
pub fn rotate_in_place(object_world: &mut Mat4, frame: &Frame, angle: f32) -> Result<()> {
    let pivot = frame.world_location(object_world);
    let axis = frame.world_direction(object_world);
    let staged = compose_pivot_rotation(pivot, Quat::from_axis_angle(axis, angle)) * *object_world;
    if !staged.is_finite() {
        return Err(SnapError::InvalidTransform);
    }
    *object_world = staged;
    log::debug!("Rotated about '{}' by {:.4} rad", frame.label, angle);
    Ok(())
}

/// Whether the two frames' world principal directions point the same way
pub fn directions_aligned(a_world: &Mat4, a: &Frame, b_world: &Mat4, b: &Frame) -> bool {
    a.world_direction(a_world).dot(b.world_direction(b_world)) > 0.0
}
