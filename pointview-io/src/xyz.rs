//! XYZ point cloud decoding
//!
//! Plain text, one point per row, coordinates separated by whitespace.
//! Blank lines and `#` comments are skipped; columns after the third (for
//! example per-point colours) are ignored.

use crate::error::DecodeError;
use crate::{PointCloudFormat, PointDecoder, RawCoordinates};
use tracing::debug;

/// Decoder for `.xyz` files
pub struct XyzDecoder;

impl XyzDecoder {
    /// Decode XYZ text into flat `x, y, z` coordinates
    pub fn decode_text(text: &str) -> RawCoordinates {
        let mut coords = Vec::new();
        let mut skipped = 0usize;

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut tokens = line.split_whitespace();
            match (tokens.next(), tokens.next(), tokens.next()) {
                (Some(x), Some(y), Some(z)) => {
                    // Unparseable values become NaN and are dropped by the sanitizer
                    coords.push(parse_lenient(x));
                    coords.push(parse_lenient(y));
                    coords.push(parse_lenient(z));
                }
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            debug!(skipped, "ignored XYZ rows with fewer than three columns");
        }
        coords
    }
}

fn parse_lenient(token: &str) -> f64 {
    token.parse::<f64>().unwrap_or(f64::NAN)
}

impl PointDecoder for XyzDecoder {
    fn format(&self) -> PointCloudFormat {
        PointCloudFormat::Xyz
    }

    fn decode(&self, bytes: &[u8]) -> pointview_core::Result<RawCoordinates> {
        let text = std::str::from_utf8(bytes).map_err(|e| DecodeError::InvalidUtf8 {
            line: bytes[..e.valid_up_to()].iter().filter(|&&b| b == b'\n').count() + 1,
        })?;
        Ok(Self::decode_text(text))
    }
}
