//! Caller-facing viewer configuration

use crate::camera::CameraSettings;
use crate::color::ColorMode;
use pointview_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Smallest point size the point-size slider offers
pub const MIN_POINT_SIZE: f32 = 0.00001;
/// Largest point size the point-size slider offers
pub const MAX_POINT_SIZE: f32 = 0.02;

/// Options for a load or re-render
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub color_mode: ColorMode,
    /// Passed through to the render surface untouched
    pub point_size: f32,
    pub camera: CameraSettings,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            color_mode: ColorMode::Altitude,
            point_size: 0.001,
            camera: CameraSettings::default(),
        }
    }
}

impl ViewerConfig {
    pub fn with_color_mode(mut self, color_mode: ColorMode) -> Self {
        self.color_mode = color_mode;
        self
    }

    pub fn with_point_size(mut self, point_size: f32) -> Self {
        self.point_size = point_size;
        self
    }

    pub fn with_camera(mut self, camera: CameraSettings) -> Self {
        self.camera = camera;
        self
    }

    /// Check values that would produce a broken render
    pub fn validate(&self) -> Result<()> {
        if !self.point_size.is_finite() || self.point_size <= 0.0 {
            return Err(Error::InvalidData(format!(
                "point_size must be a positive number, got {}",
                self.point_size
            )));
        }
        let camera = &self.camera;
        if !(camera.fov_degrees > 0.0 && camera.fov_degrees < 180.0) {
            return Err(Error::InvalidData(format!(
                "camera fov must be between 0 and 180 degrees, got {}",
                camera.fov_degrees
            )));
        }
        if !(camera.near > 0.0 && camera.far > camera.near) {
            return Err(Error::InvalidData(format!(
                "camera clip planes must satisfy 0 < near < far, got near={} far={}",
                camera.near, camera.far
            )));
        }
        if !(camera.min_distance > 0.0 && camera.min_distance.is_finite()) {
            return Err(Error::InvalidData(format!(
                "camera min_distance must be a positive number, got {}",
                camera.min_distance
            )));
        }
        Ok(())
    }
}
