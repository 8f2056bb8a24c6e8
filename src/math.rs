use crate::types::{Position, Rotation};
use cgmath::{Deg, InnerSpace, Matrix, Matrix3, SquareMatrix};

const ROTATION_TOLERANCE: f64 = 1e-6;

/// Coordinate plane a single-axis rotation happens in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plane {
    XY,
    XZ,
    YZ,
}

impl Plane {
    /// Rotation matrix turning vectors by `degrees` inside this plane.
    /// Positive angles are counter-clockwise when looking down the remaining axis:
    /// XY turns about Z, XZ about Y, YZ about X.
    pub fn rotation(self, degrees: f64) -> Rotation {
        match self {
            Plane::XY => Matrix3::from_angle_z(Deg(degrees)),
            Plane::XZ => Matrix3::from_angle_y(Deg(degrees)),
            Plane::YZ => Matrix3::from_angle_x(Deg(degrees)),
        }
    }
}

/// Rotate a single vector about the origin.
pub fn rotate(vector: Position, plane: Plane, degrees: f64) -> Position {
    plane.rotation(degrees) * vector
}

/// Orthogonal with determinant +1 (within a small tolerance).
pub fn is_proper_rotation(matrix: &Rotation) -> bool {
    let product = *matrix * matrix.transpose();
    let identity: Rotation = Matrix3::identity();
    let orthogonal = [
        (product.x, identity.x),
        (product.y, identity.y),
        (product.z, identity.z),
    ]
    .into_iter()
    .all(|(column, expected)| (column - expected).magnitude() < ROTATION_TOLERANCE);

    orthogonal && (matrix.determinant() - 1.0).abs() < ROTATION_TOLERANCE
}
