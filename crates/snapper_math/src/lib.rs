//! # snapper_math - math primitives for snap-point alignment
//!
//! Small `f32` vector, quaternion and column-major matrix types, plus the
//! geometry kernel the alignment engine is built on.

pub mod vector;
pub mod matrix;
pub mod quaternion;
pub mod transform;
pub mod kernel;

pub use vector::*;
pub use matrix::*;
pub use quaternion::*;
pub use transform::*;
pub use kernel::*;

pub mod consts {
    pub const PI: f32 = core::f32::consts::PI;
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Degrees to radians; snap angles are configured in degrees
#[inline]
pub fn radians(degrees: f32) -> f32 {
    degrees * consts::DEG_TO_RAD
}

pub mod prelude {
    pub use crate::vector::{Vec2, Vec3, Vec4};
    pub use crate::matrix::Mat4;
    pub use crate::quaternion::Quat;
    pub use crate::transform::Transform;
    pub use crate::kernel::{
        compose_pivot_rotation, newell_normal, rotation_aligning, rotation_difference,
        ANGLE_EPSILON,
    };
    pub use crate::radians;
}
