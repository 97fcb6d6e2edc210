//! The sanitize → bounds → {colour, camera, metadata} pipeline

use crate::bounds::compute_bounds;
use crate::camera::{frame_bounds, CameraPose};
use crate::color::{ColorMapper, ColorMode};
use crate::config::ViewerConfig;
use crate::metadata::{report_metadata, EmptyPointSet, Metadata};
use crate::sanitize::{sanitize, SanitizedPoints};
use pointview_core::{BoundingBox, ColorBuffer, Error, ErrorKind, PointBuffer, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Everything a render surface and the UI need for one completed load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderBundle {
    pub positions: PointBuffer,
    /// Aligned one-to-one with `positions`
    pub colors: ColorBuffer,
    pub bounding_box: BoundingBox,
    pub camera: CameraPose,
    pub metadata: Metadata,
    pub color_mode: ColorMode,
    pub point_size: f32,
    /// Set when the load produced zero points; the camera is then the
    /// default pose and the scene should show a placeholder
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty: Option<EmptyPointSet>,
}

impl RenderBundle {
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// The non-fatal condition attached to this bundle, if any
    pub fn condition(&self) -> Option<ErrorKind> {
        self.empty.map(|e| e.kind())
    }

    /// Recompute the colour buffer for a different mode, keeping positions,
    /// bounds and camera
    pub fn recolor(&mut self, mode: ColorMode) -> Result<()> {
        let colors = ColorMapper::new(mode).map_checked(
            &self.positions,
            self.metadata.point_count,
            &self.bounding_box,
        )?;
        self.colors = colors;
        self.color_mode = mode;
        self.check_alignment()
    }

    /// Verify the colour buffer lines up with the point buffer
    pub fn check_alignment(&self) -> Result<()> {
        if self.colors.len() != self.positions.len() {
            return Err(Error::ContractViolation(format!(
                "{} colors for {} points",
                self.colors.len(),
                self.positions.len()
            )));
        }
        Ok(())
    }
}

/// Runs the ingestion pipeline with a fixed configuration
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: ViewerConfig,
}

impl Pipeline {
    /// Create a pipeline, rejecting an invalid configuration
    pub fn new(config: ViewerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Turn raw `[x0, y0, z0, x1, ...]` coordinates into a render bundle
    ///
    /// Stages run in dependency order: sanitize, then bounds, then colour
    /// mapping and camera framing side by side, then metadata. Metadata is
    /// assembled last, once, so no partial state is ever reported.
    ///
    /// Zero usable points is not an error: the bundle carries a zero box, the
    /// default camera pose and an [`EmptyPointSet`] marker.
    ///
    /// # Example
    /// ```rust
    /// use pointview_pipeline::{Pipeline, ViewerConfig};
    ///
    /// fn main() -> pointview_core::Result<()> {
    ///     let pipeline = Pipeline::new(ViewerConfig::default())?;
    ///     let bundle = pipeline.run(&[0.0, 0.0, 0.0, 1.0, 1.0, 2.0, f64::NAN, 0.0, 0.0])?;
    ///     assert_eq!(bundle.metadata.point_count, 2);
    ///     assert_eq!(bundle.metadata.bounding_box_label, "1.00×1.00×2.00");
    ///     Ok(())
    /// }
    /// ```
    #[instrument(skip_all, fields(raw_values = raw.len(), mode = %self.config.color_mode))]
    pub fn run(&self, raw: &[f64]) -> Result<RenderBundle> {
        let SanitizedPoints {
            points,
            source_rows,
        } = sanitize(raw)?;
        let bounds = compute_bounds(&points);

        if bounds.is_empty() {
            debug!(source_rows, "no valid points, skipping camera framing");
            return Ok(RenderBundle {
                positions: points,
                colors: ColorBuffer::new(),
                bounding_box: bounds.bounding_box,
                camera: CameraPose::default(),
                metadata: report_metadata(&bounds),
                color_mode: self.config.color_mode,
                point_size: self.config.point_size,
                empty: Some(EmptyPointSet { source_rows }),
            });
        }

        let mapper = ColorMapper::new(self.config.color_mode);
        let (colors, camera) = rayon::join(
            || mapper.map_checked(&points, bounds.point_count, &bounds.bounding_box),
            || frame_bounds(&bounds.bounding_box, &self.config.camera),
        );

        let bundle = RenderBundle {
            positions: points,
            colors: colors?,
            bounding_box: bounds.bounding_box,
            camera,
            metadata: report_metadata(&bounds),
            color_mode: self.config.color_mode,
            point_size: self.config.point_size,
            empty: None,
        };
        bundle.check_alignment()?;
        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::turbo;
    use pointview_core::Point3d;

    #[test]
    fn test_rejects_invalid_config() {
        assert!(Pipeline::new(ViewerConfig::default().with_point_size(-1.0)).is_err());
    }

    #[test]
    fn test_point_size_passes_through() {
        let pipeline = Pipeline::new(ViewerConfig::default().with_point_size(0.015)).unwrap();
        let bundle = pipeline.run(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(bundle.point_size, 0.015);
    }

    #[test]
    fn test_recolor_keeps_geometry() {
        let pipeline = Pipeline::new(ViewerConfig::default()).unwrap();
        let mut bundle = pipeline.run(&[0.0, 0.0, 0.0, 1.0, 1.0, 2.0]).unwrap();
        let camera = bundle.camera;
        assert_eq!(bundle.colors[0], turbo(0.0));

        bundle.recolor(ColorMode::Uniform).unwrap();
        assert_eq!(bundle.color_mode, ColorMode::Uniform);
        assert!(bundle.colors.iter().all(|c| *c == pointview_core::Rgb::WHITE));
        assert_eq!(bundle.camera, camera);
        assert_eq!(bundle.positions[1], Point3d::new(1.0, 1.0, 2.0));
    }

    #[test]
    fn test_misaligned_bundle_is_contract_violation() {
        let pipeline = Pipeline::new(ViewerConfig::default()).unwrap();
        let mut bundle = pipeline.run(&[0.0, 0.0, 0.0, 1.0, 1.0, 2.0]).unwrap();
        bundle.colors.pop();
        assert!(bundle.check_alignment().unwrap_err().is_contract_violation());

        // A stale count no longer matches the buffer
        bundle.metadata.point_count = 5;
        assert!(bundle.recolor(ColorMode::Altitude).unwrap_err().is_contract_violation());
    }

    #[test]
    fn test_empty_bundle_condition() {
        let pipeline = Pipeline::new(ViewerConfig::default()).unwrap();
        let bundle = pipeline.run(&[]).unwrap();
        assert!(bundle.is_empty());
        assert_eq!(bundle.condition(), Some(ErrorKind::EmptyPointSet));
        assert_eq!(bundle.camera, CameraPose::default());
    }
}
