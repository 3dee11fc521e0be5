//! Geometry kernel for frame alignment.
//!
//! Pure functions over directions and matrices. None of them fail: the
//! degenerate cases (parallel and antiparallel inputs) resolve to an
//! identity or a half turn instead of producing a NaN axis.

use crate::matrix::Mat4;
use crate::quaternion::Quat;
use crate::vector::Vec3;
use crate::consts::PI;

/// Angles closer than this to 0 or PI are treated as degenerate
pub const ANGLE_EPSILON: f32 = 1e-4;

/// Shortest-arc rotation taking the direction `from` onto `to`.
///
/// - angle below `epsilon` gives [`Quat::IDENTITY`]
/// - angle within `epsilon` of PI gives a half turn about
///   `from.any_orthogonal()`
/// - zero-length input gives identity
pub fn rotation_aligning(from: Vec3, to: Vec3, epsilon: f32) -> Quat {
    let angle = from.angle_between(to);
    if angle < epsilon {
        return Quat::IDENTITY;
    }
    if (PI - angle) < epsilon {
        return Quat::from_axis_angle(from.any_orthogonal(), PI);
    }
    let axis = from.cross(to).normalize_or_zero();
    if axis == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    Quat::from_axis_angle(axis, angle)
}

/// Raw shortest arc from `from` to `to` and its unsigned angle.
///
/// Unlike [`rotation_aligning`] no threshold is applied, so near-parallel
/// inputs still report their tiny angle.
pub fn rotation_difference(from: Vec3, to: Vec3) -> (Quat, f32) {
    let angle = from.angle_between(to);
    let axis = from.cross(to).normalize_or_zero();
    let q = if axis == Vec3::ZERO {
        if angle > PI * 0.5 {
            Quat::from_axis_angle(from.any_orthogonal(), PI)
        } else {
            Quat::IDENTITY
        }
    } else {
        Quat::from_axis_angle(axis, angle)
    };
    (q, angle)
}

/// `T(pivot) · R(rot) · T(-pivot)`: rotate about an arbitrary point
pub fn compose_pivot_rotation(pivot: Vec3, rot: Quat) -> Mat4 {
    Mat4::from_translation(pivot) * Mat4::from_quat(rot) * Mat4::from_translation(-pivot)
}

/// Newell's method polygon normal for an ordered point loop.
///
/// Returns the unnormalized normal; the caller decides how to treat a
/// zero result (fewer than three points, or collinear points).
pub fn newell_normal(points: &[Vec3]) -> Vec3 {
    if points.len() < 3 {
        return Vec3::ZERO;
    }
    let mut n = Vec3::ZERO;
    for (i, cur) in points.iter().enumerate() {
        let next = points[(i + 1) % points.len()];
        n.x += (cur.y - next.y) * (cur.z + next.z);
        n.y += (cur.z - next.z) * (cur.x + next.x);
        n.z += (cur.x - next.x) * (cur.y + next.y);
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn parallel(a: Vec3, b: Vec3) -> bool {
        a.normalize().dot(b.normalize()) > 1.0 - 1e-5
    }

    #[test]
    fn test_aligning_maps_from_onto_to() {
        let pairs = [
            (Vec3::X, Vec3::Y),
            (Vec3::new(1.0, 2.0, 3.0), Vec3::new(-3.0, 0.5, 1.0)),
            (Vec3::Z, Vec3::new(0.0, 0.1, -1.0)),
            (Vec3::new(0.2, -0.7, 0.1), Vec3::new(5.0, 5.0, 5.0)),
        ];
        for (a, b) in pairs {
            let q = rotation_aligning(a, b, ANGLE_EPSILON);
            assert!(parallel(q * a, b), "{:?} -> {:?}", a, b);
        }
    }

    #[test]
    fn test_aligning_same_direction_is_identity() {
        let a = Vec3::new(0.3, -4.0, 2.0);
        assert_eq!(rotation_aligning(a, a, ANGLE_EPSILON), Quat::IDENTITY);
        assert_eq!(rotation_aligning(a, a * 7.0, ANGLE_EPSILON), Quat::IDENTITY);
    }

    #[test]
    fn test_aligning_opposite_is_half_turn_about_perpendicular() {
        for a in [Vec3::X, Vec3::NEG_Y, Vec3::new(1.0, 1.0, 0.0), Vec3::new(0.0, 0.0, 3.0)] {
            let q = rotation_aligning(a, -a, ANGLE_EPSILON);
            let (axis, angle) = q.to_axis_angle();
            assert_relative_eq!(angle, PI, epsilon = 1e-4);
            assert!(axis.dot(a.normalize()).abs() < 1e-5);
            assert!(parallel(q * a, -a));
        }
    }

    #[test]
    fn test_rotation_difference_reports_raw_angle() {
        let (_, angle) = rotation_difference(Vec3::X, Vec3::new(1.0, 1e-6, 0.0));
        assert!(angle < ANGLE_EPSILON);
        let (q, angle) = rotation_difference(Vec3::X, Vec3::Z);
        assert_relative_eq!(angle, PI / 2.0, epsilon = 1e-6);
        assert!(parallel(q * Vec3::X, Vec3::Z));
    }

    #[test]
    fn test_pivot_rotation_fixes_pivot() {
        let pivot = Vec3::new(3.0, -1.0, 2.0);
        let m = compose_pivot_rotation(pivot, Quat::from_axis_angle(Vec3::new(1.0, 1.0, 1.0), 1.1));
        assert!((m.transform_point(pivot) - pivot).length() < 1e-5);
    }

    #[test]
    fn test_newell_normal_of_square() {
        let square = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let n = newell_normal(&square).normalize();
        assert!((n - Vec3::Z).length() < 1e-6);
        assert_eq!(newell_normal(&square[..2]), Vec3::ZERO);
    }
}
