//! Filtering of raw coordinate arrays down to finite points

use pointview_core::{is_finite_triple, Error, Point3d, PointBuffer, Result};
use tracing::debug;

/// Output of [`sanitize`]
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizedPoints {
    /// Finite points in source order
    pub points: PointBuffer,
    /// Number of triples in the raw input, valid or not
    pub source_rows: usize,
}

impl SanitizedPoints {
    /// Number of triples that were dropped for having a non-finite component
    pub fn dropped(&self) -> usize {
        self.source_rows - self.points.len()
    }
}

/// Keep only the triples whose three components are finite
///
/// Order is preserved and invalid triples are dropped, never replaced. An
/// empty result is not an error; callers read it from the point count.
///
/// The input must be a flat `[x0, y0, z0, x1, ...]` array. A length that is
/// not a multiple of three means the loader handed over a mis-shaped buffer
/// and is reported as [`Error::ContractViolation`].
///
/// # Example
/// ```rust
/// use pointview_pipeline::sanitize;
///
/// fn main() -> pointview_core::Result<()> {
///     let raw = [0.0, 0.0, 0.0, 1.0, 1.0, 2.0, f64::NAN, 0.0, 0.0];
///     let sanitized = sanitize(&raw)?;
///     assert_eq!(sanitized.points.len(), 2);
///     assert_eq!(sanitized.dropped(), 1);
///     Ok(())
/// }
/// ```
pub fn sanitize(raw: &[f64]) -> Result<SanitizedPoints> {
    if raw.len() % 3 != 0 {
        return Err(Error::ContractViolation(format!(
            "raw coordinate array has {} values, not a multiple of 3",
            raw.len()
        )));
    }

    let source_rows = raw.len() / 3;
    let mut points = PointBuffer::with_capacity(source_rows);
    for triple in raw.chunks_exact(3) {
        let (x, y, z) = (triple[0], triple[1], triple[2]);
        if is_finite_triple(x, y, z) {
            points.push(Point3d::new(x, y, z));
        }
    }
    points.shrink_to_fit();

    let sanitized = SanitizedPoints {
        points,
        source_rows,
    };
    debug!(
        source_rows,
        kept = sanitized.points.len(),
        dropped = sanitized.dropped(),
        "sanitized raw coordinates"
    );
    Ok(sanitized)
}
