//! Per-point colouring

use pointview_core::{BoundingBox, ColorBuffer, Error, PointBuffer, Result, Rgb};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, error};

/// How points are coloured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Colour by height through the turbo ramp
    #[default]
    Altitude,
    /// Every point is white
    #[serde(alias = "white")]
    Uniform,
}

impl FromStr for ColorMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "altitude" => Ok(ColorMode::Altitude),
            "uniform" | "white" => Ok(ColorMode::Uniform),
            other => Err(Error::InvalidData(format!(
                "unknown color mode '{other}', expected 'altitude' or 'uniform'"
            ))),
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ColorMode::Altitude => "altitude",
            ColorMode::Uniform => "uniform",
        })
    }
}

/// Normalized height used when every point shares the same z
pub const FLAT_ALTITUDE: f64 = 0.5;

/// Map `z` into `[0, 1]` relative to `[min_z, max_z]`
///
/// A degenerate range (`max_z == min_z`) maps everything to
/// [`FLAT_ALTITUDE`] instead of dividing by zero.
pub fn normalize_altitude(z: f64, min_z: f64, max_z: f64) -> f64 {
    if max_z == min_z {
        return FLAT_ALTITUDE;
    }
    let range = max_z - min_z;
    let t = if range.is_finite() {
        (z - min_z) / range
    } else {
        // Range overflows f64; halving every term keeps the ratio exact.
        (z * 0.5 - min_z * 0.5) / (max_z * 0.5 - min_z * 0.5)
    };
    t.clamp(0.0, 1.0)
}

/// The turbo colour ramp, `[0, 1] -> RGB`
///
/// Polynomial approximation of Google's Turbo map (the form used by d3's
/// `interpolateTurbo`), evaluated without 8-bit quantization so it stays
/// continuous. Inputs outside `[0, 1]` are clamped.
pub fn turbo(t: f64) -> Rgb {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let r = 34.61 + t * (1172.33 - t * (10793.56 - t * (33300.12 - t * (38394.49 - t * 14825.05))));
    let g = 23.31 + t * (557.33 + t * (1225.33 - t * (3574.96 - t * (1073.77 + t * 707.56))));
    let b = 27.2 + t * (3211.1 - t * (15327.97 - t * (27814.0 - t * (22569.18 - t * 6838.66))));
    let channel = |v: f64| (v.clamp(0.0, 255.0) / 255.0) as f32;
    Rgb::new(channel(r), channel(g), channel(b))
}

/// Produces one colour per point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColorMapper {
    pub mode: ColorMode,
}

impl ColorMapper {
    pub fn new(mode: ColorMode) -> Self {
        Self { mode }
    }

    /// Colour every point of `points`, using `bbox` for the vertical range
    ///
    /// The output always has `points.len()` entries in the same order.
    pub fn map(&self, points: &PointBuffer, bbox: &BoundingBox) -> ColorBuffer {
        let colors: ColorBuffer = match self.mode {
            ColorMode::Uniform => vec![Rgb::WHITE; points.len()],
            ColorMode::Altitude => {
                let (min_z, max_z) = bbox.z_range();
                points
                    .points
                    .par_iter()
                    .map(|p| turbo(normalize_altitude(p.z, min_z, max_z)))
                    .collect()
            }
        };
        debug!(mode = %self.mode, colors = colors.len(), "mapped colors");
        colors
    }

    /// Like [`ColorMapper::map`], but first checks that `points` has the
    /// length the caller expects
    ///
    /// A mismatch means the caller paired buffers from different loads; it is
    /// reported as [`Error::ContractViolation`] rather than truncated.
    pub fn map_checked(
        &self,
        points: &PointBuffer,
        expected_len: usize,
        bbox: &BoundingBox,
    ) -> Result<ColorBuffer> {
        if points.len() != expected_len {
            error!(
                points = points.len(),
                expected_len, "color mapping requested for a buffer of the wrong length"
            );
            return Err(Error::ContractViolation(format!(
                "point buffer has {} points but {} colors were requested",
                points.len(),
                expected_len
            )));
        }
        Ok(self.map(points, bbox))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pointview_core::{Bounded, Point3d};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn cloud(points: &[(f64, f64, f64)]) -> PointBuffer {
        points.iter().map(|&(x, y, z)| Point3d::new(x, y, z)).collect()
    }

    #[test]
    fn test_color_mode_parsing() {
        assert_eq!("altitude".parse::<ColorMode>().unwrap(), ColorMode::Altitude);
        assert_eq!("Uniform".parse::<ColorMode>().unwrap(), ColorMode::Uniform);
        assert_eq!("white".parse::<ColorMode>().unwrap(), ColorMode::Uniform);
        assert!("rainbow".parse::<ColorMode>().is_err());
        assert_eq!(ColorMode::Uniform.to_string(), "uniform");
    }

    #[test]
    fn test_color_mode_serde_alias() {
        let mode: ColorMode = serde_json::from_str("\"white\"").unwrap();
        assert_eq!(mode, ColorMode::Uniform);
        assert_eq!(serde_json::to_string(&ColorMode::Altitude).unwrap(), "\"altitude\"");
    }

    #[test]
    fn test_normalize_altitude() {
        assert_eq!(normalize_altitude(0.0, 0.0, 2.0), 0.0);
        assert_eq!(normalize_altitude(1.0, 0.0, 2.0), 0.5);
        assert_eq!(normalize_altitude(2.0, 0.0, 2.0), 1.0);
        assert_eq!(normalize_altitude(5.0, 5.0, 5.0), FLAT_ALTITUDE);
        assert_eq!(normalize_altitude(f64::MAX, -f64::MAX, f64::MAX), 1.0);
        assert_eq!(normalize_altitude(-f64::MAX, -f64::MAX, f64::MAX), 0.0);
    }

    #[test]
    fn test_turbo_is_deterministic_and_normalized() {
        for i in 0..=100 {
            let t = i as f64 / 100.0;
            let c = turbo(t);
            assert_eq!(c, turbo(t));
            assert!(c.is_normalized());
        }
    }

    #[test]
    fn test_turbo_endpoints() {
        let low = turbo(0.0);
        assert!((low.r - 34.61 / 255.0).abs() < 1e-6);
        let high = turbo(1.0);
        // Dark red end of the ramp
        assert!(high.r > high.g && high.g > high.b);
        assert_eq!(turbo(-1.0), low);
        assert_eq!(turbo(2.0), high);
    }

    #[test]
    fn test_turbo_is_continuous() {
        let steps = 10_000;
        for i in 0..steps {
            let a = turbo(i as f64 / steps as f64);
            let b = turbo((i + 1) as f64 / steps as f64);
            assert!((a.r - b.r).abs() < 0.01);
            assert!((a.g - b.g).abs() < 0.01);
            assert!((a.b - b.b).abs() < 0.01);
        }
    }

    #[test]
    fn test_uniform_is_white() {
        let mut rng = StdRng::seed_from_u64(3);
        let points: PointBuffer = (0..100)
            .map(|_| Point3d::new(rng.gen(), rng.gen(), rng.gen_range(-1e6..1e6)))
            .collect();
        let colors = ColorMapper::new(ColorMode::Uniform).map(&points, &points.bounding_box());
        assert_eq!(colors.len(), points.len());
        assert!(colors.iter().all(|c| *c == Rgb::WHITE));
    }

    #[test]
    fn test_altitude_endpoints() {
        let points = cloud(&[(0.0, 0.0, 1.0), (1.0, 0.0, -3.0), (2.0, 0.0, 4.0), (3.0, 0.0, 4.0)]);
        let colors = ColorMapper::new(ColorMode::Altitude).map(&points, &points.bounding_box());
        assert_eq!(colors.len(), 4);
        assert_eq!(colors[1], turbo(0.0));
        assert_eq!(colors[2], turbo(1.0));
        assert_eq!(colors[3], turbo(1.0));
        assert_eq!(colors[0], turbo(4.0 / 7.0));
    }

    #[test]
    fn test_flat_altitude_uses_midpoint() {
        let points = cloud(&[(0.0, 0.0, 5.0), (2.0, 3.0, 5.0)]);
        let colors = ColorMapper::new(ColorMode::Altitude).map(&points, &points.bounding_box());
        assert!(colors.iter().all(|c| *c == turbo(0.5)));
        assert!(colors.iter().all(Rgb::is_normalized));
    }

    #[test]
    fn test_empty_buffer() {
        let points = PointBuffer::new();
        for mode in [ColorMode::Altitude, ColorMode::Uniform] {
            assert!(ColorMapper::new(mode).map(&points, &BoundingBox::zero()).is_empty());
        }
    }

    #[test]
    fn test_map_checked_rejects_length_mismatch() {
        let points = cloud(&[(0.0, 0.0, 0.0), (1.0, 1.0, 1.0)]);
        let mapper = ColorMapper::new(ColorMode::Altitude);
        let err = mapper.map_checked(&points, 3, &points.bounding_box()).unwrap_err();
        assert!(err.is_contract_violation());
        assert_eq!(mapper.map_checked(&points, 2, &points.bounding_box()).unwrap().len(), 2);
    }
}
