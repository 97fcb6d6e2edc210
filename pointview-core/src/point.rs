//! Point types and related functionality

use nalgebra::{Point3, Vector3};

/// A 3D point with double precision coordinates
pub type Point3d = Point3<f64>;

/// A 3D vector with double precision components
pub type Vector3d = Vector3<f64>;

/// Returns true when all three coordinates are finite (no NaN or infinity)
#[inline]
pub fn is_finite_triple(x: f64, y: f64, z: f64) -> bool {
    x.is_finite() && y.is_finite() && z.is_finite()
}

/// Extension methods for points coming out of the sanitizer
pub trait FinitePoint {
    /// Whether every coordinate is finite
    fn is_finite(&self) -> bool;
}

impl FinitePoint for Point3d {
    fn is_finite(&self) -> bool {
        is_finite_triple(self.x, self.y, self.z)
    }
}
