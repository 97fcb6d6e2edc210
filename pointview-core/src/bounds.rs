//! Axis-aligned bounding boxes

use crate::{point::*, point_cloud::*};
use serde::{Deserialize, Serialize};

/// Minimal axis-aligned box containing a set of points
///
/// The canonical empty box has `min == max == origin`, so every size is
/// exactly zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point3d,
    pub max: Point3d,
}

impl BoundingBox {
    /// The zero box reported for an empty buffer
    pub fn zero() -> Self {
        Self {
            min: Point3d::origin(),
            max: Point3d::origin(),
        }
    }

    /// A box enclosing exactly one point
    pub fn from_point(point: &Point3d) -> Self {
        Self {
            min: *point,
            max: *point,
        }
    }

    /// Grow the box to include `point`
    pub fn expand(&mut self, point: &Point3d) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.min.z = self.min.z.min(point.z);

        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
        self.max.z = self.max.z.max(point.z);
    }

    /// Per-axis extent `max - min`
    ///
    /// An extent that overflows `f64` is reported as zero.
    pub fn size(&self) -> Vector3d {
        let extent = |min: f64, max: f64| {
            let size = max - min;
            if size.is_finite() { size } else { 0.0 }
        };
        Vector3d::new(
            extent(self.min.x, self.max.x),
            extent(self.min.y, self.max.y),
            extent(self.min.z, self.max.z),
        )
    }

    /// Midpoint of the box
    pub fn center(&self) -> Point3d {
        // Halve before adding so boxes near f64::MAX do not overflow.
        Point3d::new(
            self.min.x * 0.5 + self.max.x * 0.5,
            self.min.y * 0.5 + self.max.y * 0.5,
            self.min.z * 0.5 + self.max.z * 0.5,
        )
    }

    /// Length of the box diagonal
    ///
    /// Always finite: the norm is taken on the size scaled by its largest
    /// component, and saturates at `f64::MAX`.
    pub fn diagonal(&self) -> f64 {
        let size = self.size();
        let largest = size.amax();
        if largest == 0.0 {
            return 0.0;
        }
        (largest * (size / largest).norm()).min(f64::MAX)
    }

    /// Vertical extent as `(min_z, max_z)`
    pub fn z_range(&self) -> (f64, f64) {
        (self.min.z, self.max.z)
    }

    /// Dimensions formatted as `W×H×D` with two decimals, in X, Y, Z order
    pub fn label(&self) -> String {
        let size = self.size();
        format!("{:.2}×{:.2}×{:.2}", size.x, size.y, size.z)
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::zero()
    }
}

/// Trait for point sets that can report their extent
pub trait Bounded {
    /// Get the bounding box of the object
    fn bounding_box(&self) -> BoundingBox;

    /// Get the center point of the object
    fn center(&self) -> Point3d {
        self.bounding_box().center()
    }
}

impl Bounded for PointCloud<Point3d> {
    fn bounding_box(&self) -> BoundingBox {
        let mut points = self.points.iter();
        let Some(first) = points.next() else {
            return BoundingBox::zero();
        };

        let mut bbox = BoundingBox::from_point(first);
        for point in points {
            bbox.expand(point);
        }
        bbox
    }
}
