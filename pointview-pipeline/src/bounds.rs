//! Bounding-box computation over sanitized points

use pointview_core::{Bounded, BoundingBox, PointBuffer};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Extent and size of a point buffer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub bounding_box: BoundingBox,
    pub point_count: usize,
}

impl Bounds {
    pub fn is_empty(&self) -> bool {
        self.point_count == 0
    }
}

/// Single pass over `points` producing the bounding box and point count
///
/// An empty buffer yields the canonical zero box.
pub fn compute_bounds(points: &PointBuffer) -> Bounds {
    let bounds = Bounds {
        bounding_box: points.bounding_box(),
        point_count: points.len(),
    };
    debug!(
        points = bounds.point_count,
        dimensions = %bounds.bounding_box.label(),
        "computed bounds"
    );
    bounds
}
