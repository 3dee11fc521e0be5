//! Edit-mode geometry queries used to seed frame vectors.
//!
//! Only two questions are asked of geometry: the average of the selected
//! elements, and the normal of the selection.

use serde::{Deserialize, Serialize};
use snapper_math::{newell_normal, Vec3};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshVertex {
    pub co: Vec3,
    pub normal: Vec3,
    pub selected: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshFace {
    pub normal: Vec3,
    pub selected: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<MeshVertex>,
    pub faces: Vec<MeshFace>,
}

/// Bezier control point with its two handles, each separately selectable
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BezierPoint {
    pub co: Vec3,
    pub handle_left: Vec3,
    pub handle_right: Vec3,
    pub select_control_point: bool,
    pub select_left_handle: bool,
    pub select_right_handle: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    /// Bezier splines; each is an ordered list of points
    pub splines: Vec<Vec<BezierPoint>>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LatticePoint {
    pub co: Vec3,
    pub selected: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Lattice {
    pub points: Vec<LatticePoint>,
}

/// Object-local geometry of an object in edit mode
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EditGeometry {
    Mesh(Mesh),
    Curve(Curve),
    Lattice(Lattice),
}

impl EditGeometry {
    /// Selected positions in storage order. For curves this is left
    /// handle, right handle, control point for each bezier point.
    pub fn selected_points(&self) -> Vec<Vec3> {
        match self {
            EditGeometry::Mesh(mesh) => mesh
                .vertices
                .iter()
                .filter(|v| v.selected)
                .map(|v| v.co)
                .collect(),
            EditGeometry::Curve(curve) => {
                let mut points = Vec::new();
                for point in curve.splines.iter().flatten() {
                    if point.select_left_handle {
                        points.push(point.handle_left);
                    }
                    if point.select_right_handle {
                        points.push(point.handle_right);
                    }
                    if point.select_control_point {
                        points.push(point.co);
                    }
                }
                points
            }
            EditGeometry::Lattice(lattice) => lattice
                .points
                .iter()
                .filter(|p| p.selected)
                .map(|p| p.co)
                .collect(),
        }
    }

    /// Average of the selected positions, `None` if nothing is selected
    pub fn selection_average(&self) -> Option<Vec3> {
        average(&self.selected_points())
    }

    /// Unit normal of the selection, `None` when it cannot be derived.
    ///
    /// Meshes average the selected face normals, falling back to the
    /// selected vertex normals. Curves and lattices use the Newell normal
    /// of at least three selected points.
    pub fn selection_normal(&self) -> Option<Vec3> {
        let normal = match self {
            EditGeometry::Mesh(mesh) => {
                let faces: Vec<Vec3> = mesh
                    .faces
                    .iter()
                    .filter(|f| f.selected)
                    .map(|f| f.normal)
                    .collect();
                if faces.is_empty() {
                    let vertices: Vec<Vec3> = mesh
                        .vertices
                        .iter()
                        .filter(|v| v.selected)
                        .map(|v| v.normal)
                        .collect();
                    average(&vertices)?
                } else {
                    average(&faces)?
                }
            }
            EditGeometry::Curve(_) | EditGeometry::Lattice(_) => {
                let points = self.selected_points();
                if points.len() < 3 {
                    return None;
                }
                newell_normal(&points)
            }
        };
        let normal = normal.normalize_or_zero();
        (normal != Vec3::ZERO && normal.is_finite()).then_some(normal)
    }
}

fn average(points: &[Vec3]) -> Option<Vec3> {
    if points.is_empty() {
        return None;
    }
    let sum = points.iter().fold(Vec3::ZERO, |acc, &p| acc + p);
    Some(sum / points.len() as f32)
}
