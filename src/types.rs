use cgmath::{Matrix3, Vector3};

/////////////////////////////////////////////////////////////////////////////////////////////////

/// Slot of a node in [`crate::skeleton::Skeleton`]'s arena, or of a channel in its bindings.
pub type Index = usize;
pub type Position = Vector3<f64>;
/// 3x3 matrix applied to offsets. Expected to be a proper rotation, but nothing enforces it.
pub type Rotation = Matrix3<f64>;
pub type Depth = usize;
