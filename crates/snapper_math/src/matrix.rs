//! 4x4 affine matrices for object-to-world transforms

use crate::quaternion::Quat;
use crate::vector::{Vec3, Vec4};
use core::ops::Mul;

/// Column-major 4x4 matrix.
///
/// Object transforms are always affine (bottom row `0 0 0 1`), so
/// rotation, translation and non-uniform scale compose exactly the way the
/// host scene composes them.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(C, align(16))]
pub struct Mat4 {
    pub cols: [Vec4; 4],
}

impl Mat4 {
    pub const IDENTITY: Self = Self {
        cols: [Vec4::X, Vec4::Y, Vec4::Z, Vec4::W],
    };

    /// Affine matrix from three basis columns and a translation
    #[inline]
    pub fn from_basis(x: Vec3, y: Vec3, z: Vec3, translation: Vec3) -> Self {
        Self {
            cols: [x.extend(0.0), y.extend(0.0), z.extend(0.0), translation.extend(1.0)],
        }
    }

    #[inline]
    pub fn from_translation(translation: Vec3) -> Self {
        Self::from_basis(Vec3::X, Vec3::Y, Vec3::Z, translation)
    }

    #[inline]
    pub fn from_scale(scale: Vec3) -> Self {
        Self::from_basis(Vec3::X * scale.x, Vec3::Y * scale.y, Vec3::Z * scale.z, Vec3::ZERO)
    }

    /// Rotation matrix of a unit quaternion
    pub fn from_quat(q: Quat) -> Self {
        Self::from_basis(q * Vec3::X, q * Vec3::Y, q * Vec3::Z, Vec3::ZERO)
    }

    /// `T · R · S`
    pub fn from_scale_rotation_translation(scale: Vec3, rotation: Quat, translation: Vec3) -> Self {
        Self::from_basis(
            rotation * Vec3::X * scale.x,
            rotation * Vec3::Y * scale.y,
            rotation * Vec3::Z * scale.z,
            translation,
        )
    }

    /// Column `i` without its `w` component
    #[inline]
    pub fn axis(&self, i: usize) -> Vec3 {
        self.cols[i].truncate()
    }

    #[inline]
    pub fn translation(&self) -> Vec3 {
        self.axis(3)
    }

    /// Replace the translation, keeping rotation and scale
    #[inline]
    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.cols[3] = translation.extend(1.0);
        self
    }

    /// Map a point (`w = 1`)
    #[inline]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        (*self * point.extend(1.0)).truncate()
    }

    /// Map a direction (`w = 0`); translation does not apply
    #[inline]
    pub fn transform_vector(&self, vector: Vec3) -> Vec3 {
        (*self * vector.extend(0.0)).truncate()
    }

    /// Determinant of the upper 3x3 block
    #[inline]
    pub fn determinant(&self) -> f32 {
        self.axis(0).dot(self.axis(1).cross(self.axis(2)))
    }

    /// Inverse of an affine matrix.
    ///
    /// `None` when the basis is singular (zero scale on some axis) or not
    /// finite.
    pub fn inverse(&self) -> Option<Self> {
        let (x, y, z) = (self.axis(0), self.axis(1), self.axis(2));
        let det = self.determinant();
        if det.abs() < f32::EPSILON * f32::EPSILON || !det.is_finite() {
            return None;
        }
        // rows of the inverse basis
        let r0 = y.cross(z) / det;
        let r1 = z.cross(x) / det;
        let r2 = x.cross(y) / det;
        let t = self.translation();
        Some(Self::from_basis(
            Vec3::new(r0.x, r1.x, r2.x),
            Vec3::new(r0.y, r1.y, r2.y),
            Vec3::new(r0.z, r1.z, r2.z),
            -Vec3::new(r0.dot(t), r1.dot(t), r2.dot(t)),
        ))
    }

    pub fn is_finite(&self) -> bool {
        self.cols.iter().all(|c| c.is_finite())
    }

    /// Flat column-major copy
    pub fn to_cols_array(&self) -> [f32; 16] {
        let mut out = [0.0; 16];
        for (i, c) in self.cols.iter().enumerate() {
            out[i * 4..i * 4 + 4].copy_from_slice(&[c.x, c.y, c.z, c.w]);
        }
        out
    }

    /// Element-wise comparison within `epsilon`
    pub fn abs_diff_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.to_cols_array()
            .iter()
            .zip(other.to_cols_array().iter())
            .all(|(a, b)| (a - b).abs() <= epsilon)
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Mat4 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self {
            cols: rhs.cols.map(|c| self * c),
        }
    }
}

impl Mul<Vec4> for Mat4 {
    type Output = Vec4;

    #[inline]
    fn mul(self, rhs: Vec4) -> Vec4 {
        self.cols[0] * rhs.x + self.cols[1] * rhs.y + self.cols[2] * rhs.z + self.cols[3] * rhs.w
    }
}
