//! Unit quaternions for frame rotations

use crate::vector::Vec3;
use core::ops::Mul;

/// Rotation as `(x, y, z)` vector part and `w` scalar part
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(C, align(16))]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quat {
    pub const IDENTITY: Self = Self::from_parts(Vec3::ZERO, 1.0);

    #[inline]
    const fn from_parts(v: Vec3, w: f32) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
            w,
        }
    }

    #[inline]
    fn vector(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Rotation of `angle` radians about `axis`. The axis is normalized
    /// here; a zero axis gives the identity.
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let (sin, cos) = (angle * 0.5).sin_cos();
        Self::from_parts(axis.normalize() * sin, cos)
    }

    /// Inverse rotation, assuming unit length
    #[inline]
    pub fn conjugate(self) -> Self {
        Self::from_parts(-self.vector(), self.w)
    }

    /// Axis and angle in `[0, PI]`. The axis is `Z` for a near-identity
    /// rotation.
    pub fn to_axis_angle(self) -> (Vec3, f32) {
        let q = if self.w < 0.0 {
            Self::from_parts(-self.vector(), -self.w)
        } else {
            self
        };
        let sin = q.vector().length();
        let angle = 2.0 * sin.atan2(q.w);
        if sin < 1e-6 {
            (Vec3::Z, angle)
        } else {
            (q.vector() / sin, angle)
        }
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Hamilton product: `a * b` applies `b` first
impl Mul for Quat {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let (a, b) = (self.vector(), rhs.vector());
        Self::from_parts(
            b * self.w + a * rhs.w + a.cross(b),
            self.w * rhs.w - a.dot(b),
        )
    }
}

impl Mul<Vec3> for Quat {
    type Output = Vec3;

    fn mul(self, v: Vec3) -> Vec3 {
        let u = self.vector();
        let t = u.cross(v) * 2.0;
        v + t * self.w + u.cross(t)
    }
}
