//! 3D vector and quaternion primitives.
//!
//! Coordinate frame follows the host runtime: right-handed, +Y up, -Z forward,
//! meters. Quaternions use the Hamilton convention and are stored `[w, x, y, z]`.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

/// A 3D vector in meters (or m/s, rad/s depending on context).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    /// Zero vector.
    pub const ZERO: Vector3 = Vector3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Create a new vector.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Build from an `[x, y, z]` array.
    #[inline]
    pub const fn from_array(v: [f32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }

    #[inline]
    pub fn dot(&self, other: &Vector3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[inline]
    pub fn cross(&self, other: &Vector3) -> Vector3 {
        Vector3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Euclidean length.
    #[inline]
    pub fn length(&self) -> f32 {
        self.dot(self).sqrt()
    }

    /// True if every component is exactly zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vector3 {
    type Output = Vector3;

    #[inline]
    fn add(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vector3 {
    type Output = Vector3;

    #[inline]
    fn sub(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vector3 {
    type Output = Vector3;

    #[inline]
    fn mul(self, s: f32) -> Vector3 {
        Vector3::new(self.x * s, self.y * s, self.z * s)
    }
}

impl Neg for Vector3 {
    type Output = Vector3;

    #[inline]
    fn neg(self) -> Vector3 {
        Vector3::new(-self.x, -self.y, -self.z)
    }
}

/// Quaternion representation [w, x, y, z].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

impl Quaternion {
    /// Create a quaternion from its components (scalar first).
    #[inline]
    pub const fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self { w, x, y, z }
    }

    /// Create identity quaternion (no rotation).
    #[inline]
    pub const fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    /// Rotation of `angle` radians about `axis`.
    ///
    /// The axis does not need to be normalized. A zero axis yields identity.
    pub fn from_axis_angle(axis: Vector3, angle: f32) -> Self {
        let len = axis.length();
        if len < 1e-10 {
            return Self::identity();
        }
        let (s, c) = (angle * 0.5).sin_cos();
        let k = s / len;
        Self::new(c, axis.x * k, axis.y * k, axis.z * k)
    }

    /// Rotation about the vertical (+Y) axis.
    #[inline]
    pub fn from_yaw(yaw: f32) -> Self {
        Self::from_axis_angle(Vector3::new(0.0, 1.0, 0.0), yaw)
    }

    #[inline]
    pub fn norm(&self) -> f32 {
        (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.w.is_finite() && self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Unit-length copy of this quaternion.
    ///
    /// Degenerate input (near-zero norm or non-finite components) maps to
    /// identity rather than propagating NaN into published poses.
    pub fn normalized(&self) -> Self {
        if !self.is_finite() {
            return Self::identity();
        }
        let norm = self.norm();
        if norm < 1e-10 {
            return Self::identity();
        }
        Self::new(self.w / norm, self.x / norm, self.y / norm, self.z / norm)
    }

    /// Conjugate (inverse rotation for unit quaternions).
    #[inline]
    pub fn conjugate(&self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    /// Rotate a vector by this quaternion (q · v · q*).
    ///
    /// Uses the expanded form `v + 2w(u × v) + 2u × (u × v)` with `u` the
    /// vector part; assumes a unit quaternion.
    pub fn rotate_vector(&self, v: Vector3) -> Vector3 {
        let u = Vector3::new(self.x, self.y, self.z);
        let uv = u.cross(&v);
        let uuv = u.cross(&uv);
        v + uv * (2.0 * self.w) + uuv * 2.0
    }
}

impl Mul for Quaternion {
    type Output = Quaternion;

    /// Hamilton product: `self * rhs` applies `rhs` first, then `self`.
    fn mul(self, rhs: Quaternion) -> Quaternion {
        Quaternion::new(
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn assert_vec_eq(a: Vector3, b: Vector3) {
        assert_relative_eq!(a.x, b.x, epsilon = 1e-6);
        assert_relative_eq!(a.y, b.y, epsilon = 1e-6);
        assert_relative_eq!(a.z, b.z, epsilon = 1e-6);
    }

    #[test]
    fn test_identity_rotation_is_noop() {
        let v = Vector3::new(0.3, -1.2, 0.7);
        assert_vec_eq(Quaternion::identity().rotate_vector(v), v);
    }

    #[test]
    fn test_yaw_quarter_turn() {
        // +90° about +Y maps +X onto -Z
        let q = Quaternion::from_yaw(FRAC_PI_2);
        let r = q.rotate_vector(Vector3::new(1.0, 0.0, 0.0));
        assert_vec_eq(r, Vector3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_rotation_about_x() {
        let q = Quaternion::from_axis_angle(Vector3::new(1.0, 0.0, 0.0), FRAC_PI_2);
        let r = q.rotate_vector(Vector3::new(0.0, 1.0, 0.0));
        assert_vec_eq(r, Vector3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_rotation_preserves_length() {
        let q = Quaternion::from_axis_angle(Vector3::new(1.0, 2.0, -0.5), 1.1);
        let v = Vector3::new(0.4, -0.6, 0.15);
        assert_relative_eq!(q.rotate_vector(v).length(), v.length(), epsilon = 1e-6);
    }

    #[test]
    fn test_product_composes_rotations() {
        let a = Quaternion::from_yaw(FRAC_PI_2);
        let b = Quaternion::from_yaw(FRAC_PI_2);
        let half_turn = a * b;
        let r = half_turn.rotate_vector(Vector3::new(1.0, 0.0, 0.0));
        assert_vec_eq(r, Vector3::new(-1.0, 0.0, 0.0));

        let expected = Quaternion::from_yaw(PI);
        assert_relative_eq!(half_turn.w, expected.w, epsilon = 1e-6);
        assert_relative_eq!(half_turn.y, expected.y, epsilon = 1e-6);
    }

    #[test]
    fn test_conjugate_undoes_rotation() {
        let q = Quaternion::from_axis_angle(Vector3::new(0.2, 1.0, 0.3), 0.8);
        let v = Vector3::new(1.0, 0.5, -2.0);
        assert_vec_eq(q.conjugate().rotate_vector(q.rotate_vector(v)), v);
    }

    #[test]
    fn test_normalized() {
        let q = Quaternion::new(2.0, 0.0, 0.0, 0.0).normalized();
        assert_relative_eq!(q.norm(), 1.0, epsilon = 1e-6);
        assert_eq!(q, Quaternion::identity());

        assert_eq!(
            Quaternion::new(0.0, 0.0, 0.0, 0.0).normalized(),
            Quaternion::identity()
        );
        assert_eq!(
            Quaternion::new(f32::NAN, 0.0, 1.0, 0.0).normalized(),
            Quaternion::identity()
        );
    }

    #[test]
    fn test_zero_axis_is_identity() {
        assert_eq!(
            Quaternion::from_axis_angle(Vector3::ZERO, 1.0),
            Quaternion::identity()
        );
    }

    #[test]
    fn test_vector_ops() {
        let a = Vector3::new(1.0, 2.0, 3.0);
        let b = Vector3::new(0.5, -1.0, 2.0);
        assert_eq!(a + b, Vector3::new(1.5, 1.0, 5.0));
        assert_eq!(a - b, Vector3::new(0.5, 3.0, 1.0));
        assert_eq!(-a, Vector3::new(-1.0, -2.0, -3.0));
        assert_relative_eq!(a.dot(&b), 4.5);
        assert!(Vector3::ZERO.is_zero());
        assert!(!a.is_zero());
    }
}
