//! Fallback pose estimation from a reference pose and a static offset.

use crate::core::{Pose, Vector3};

/// Pose of an object rigidly attached to `reference` at `offset`.
///
/// The offset is expressed in the reference's local frame: it is rotated by
/// the reference orientation, then translated by the reference position. The
/// result takes the reference orientation and carries no velocity.
///
/// The reference rotation is normalized first, so a host reporting a scaled
/// quaternion still yields a rigid offset.
pub fn estimate(reference: &Pose, offset: Vector3) -> Pose {
    let rotation = reference.rotation.normalized();
    Pose::new(reference.position + rotation.rotate_vector(offset), rotation)
}
