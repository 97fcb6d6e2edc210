//! Camera framing for loaded point clouds

use nalgebra::{Matrix4, Perspective3};
use pointview_core::{BoundingBox, Point3d, Vector3d};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Direction (relative to the box center) the framed camera is placed along,
/// scaled by the framing distance
pub const VIEW_OFFSET: [f64; 3] = [0.5, 0.5, 1.0];

/// Where the camera sits and what it looks at
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraPose {
    pub position: Point3d,
    pub look_at: Point3d,
}

impl Default for CameraPose {
    /// Pose used when there is nothing to frame
    fn default() -> Self {
        Self {
            position: Point3d::new(0.0, 0.0, 5.0),
            look_at: Point3d::origin(),
        }
    }
}

/// Lens and framing parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub up: Vector3d,
    pub fov_degrees: f64,
    pub near: f64,
    pub far: f64,
    /// Lower bound on the framing distance, so a single point or a tiny
    /// cloud does not put the camera on top of its target
    pub min_distance: f64,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            up: Vector3d::new(0.0, 0.0, 1.0),
            fov_degrees: 60.0,
            near: 0.1,
            far: 1000.0,
            min_distance: 0.1,
        }
    }
}

/// Compute a pose that keeps the whole of `bbox` in view
///
/// The target is the box center. The camera is pushed out along
/// [`VIEW_OFFSET`] by the length of the box diagonal. Only call this for a
/// non-empty buffer; an empty load keeps [`CameraPose::default`].
pub fn frame_bounds(bbox: &BoundingBox, settings: &CameraSettings) -> CameraPose {
    let center = bbox.center();
    let distance = bbox.diagonal().max(settings.min_distance);
    let offset = Vector3d::from(VIEW_OFFSET) * distance;

    // Saturate instead of overflowing to infinity for boxes near f64::MAX
    let position = (center + offset).map(|v| v.clamp(-f64::MAX, f64::MAX));

    let pose = CameraPose {
        position,
        look_at: center,
    };
    debug!(distance, center = ?center, "framed camera");
    pose
}

/// A camera ready to hand to a render surface
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub pose: CameraPose,
    pub settings: CameraSettings,
    pub aspect_ratio: f64,
}

impl Camera {
    pub fn new(pose: CameraPose, settings: CameraSettings, aspect_ratio: f64) -> Self {
        Self {
            pose,
            settings,
            aspect_ratio,
        }
    }

    /// Get the view matrix
    ///
    /// Falls back to +Y as the up vector when the configured up is parallel
    /// to the viewing direction (e.g. the default pose looking straight down
    /// a Z-up scene).
    pub fn view_matrix(&self) -> Matrix4<f64> {
        let direction = self.pose.look_at - self.pose.position;
        let up = if direction.cross(&self.settings.up).norm_squared() <= f64::EPSILON {
            Vector3d::y()
        } else {
            self.settings.up
        };
        Matrix4::look_at_rh(&self.pose.position, &self.pose.look_at, &up)
    }

    /// Get the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f64> {
        let perspective = Perspective3::new(
            self.aspect_ratio,
            self.settings.fov_degrees.to_radians(),
            self.settings.near,
            self.settings.far,
        );
        perspective.into_inner()
    }
}
