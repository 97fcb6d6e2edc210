//! Decoding of point-cloud files into raw coordinate arrays
//!
//! This crate is the loader that sits in front of the ingestion pipeline. It
//! turns the bytes of a `.pcd` or `.xyz` file into a flat, ordered
//! `[x0, y0, z0, x1, ...]` array. Values are passed through untouched:
//! non-finite coordinates are left for the sanitizer to drop.

pub mod error;
pub mod lzf;
pub mod pcd;
pub mod xyz;

pub use error::*;
pub use pcd::{PcdDataFormat, PcdDecoder, PcdField, PcdFieldType, PcdHeader};
pub use xyz::XyzDecoder;

use pointview_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Flat coordinate triples as produced by a decoder
pub type RawCoordinates = Vec<f64>;

/// Point-cloud formats the loader understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointCloudFormat {
    /// Structured header plus ASCII, binary or compressed records
    Pcd,
    /// Whitespace separated `x y z` rows
    Xyz,
}

impl PointCloudFormat {
    /// Look up a format by file extension (case-insensitive, no leading dot)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pcd" => Some(PointCloudFormat::Pcd),
            "xyz" => Some(PointCloudFormat::Xyz),
            _ => None,
        }
    }

    /// Pick the format for a file from its name, sniffing the content only
    /// when the name carries no extension at all
    pub fn detect(name: &str, bytes: &[u8]) -> Result<Self> {
        match Path::new(name).extension().and_then(|s| s.to_str()) {
            Some(ext) => Self::from_extension(ext).ok_or_else(|| {
                Error::UnsupportedFormat(format!(
                    "{name}: only .pcd and .xyz point clouds are supported"
                ))
            }),
            None if looks_like_pcd(bytes) => Ok(PointCloudFormat::Pcd),
            None => Err(Error::UnsupportedFormat(format!(
                "{name}: could not detect file extension"
            ))),
        }
    }

    /// Canonical lowercase extension
    pub fn extension(&self) -> &'static str {
        match self {
            PointCloudFormat::Pcd => "pcd",
            PointCloudFormat::Xyz => "xyz",
        }
    }

    /// The decoder for this format
    pub fn decoder(&self) -> &'static dyn PointDecoder {
        match self {
            PointCloudFormat::Pcd => &PcdDecoder,
            PointCloudFormat::Xyz => &XyzDecoder,
        }
    }
}

impl fmt::Display for PointCloudFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PointCloudFormat::Pcd => "PCD",
            PointCloudFormat::Xyz => "XYZ",
        })
    }
}

fn looks_like_pcd(bytes: &[u8]) -> bool {
    bytes.starts_with(b"# .PCD") || bytes.starts_with(b"VERSION")
}

/// Trait for turning file bytes into raw coordinates
pub trait PointDecoder: Send + Sync {
    /// Get the format this decoder handles
    fn format(&self) -> PointCloudFormat;

    /// Decode the file contents
    fn decode(&self, bytes: &[u8]) -> Result<RawCoordinates>;
}

/// Decode `bytes` as the given format
pub fn decode(format: PointCloudFormat, bytes: &[u8]) -> Result<RawCoordinates> {
    format.decoder().decode(bytes)
}

/// Display information about an uploaded file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    pub name: String,
    pub format: PointCloudFormat,
    pub byte_len: usize,
}

impl FileSummary {
    /// File size in kibibytes with two decimals, e.g. `"1.50 KB"`
    pub fn size_label(&self) -> String {
        format!("{:.2} KB", self.byte_len as f64 / 1024.0)
    }
}

/// The bytes of one point-cloud file, tagged with its detected format
///
/// This is the per-load resource a viewer session holds while a decode is
/// pending; dropping it releases the file contents.
#[derive(Debug, Clone)]
pub struct SourceFile {
    summary: FileSummary,
    bytes: Vec<u8>,
}

impl SourceFile {
    /// Wrap in-memory file contents, rejecting unsupported formats up front
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let name = name.into();
        let format = PointCloudFormat::detect(&name, &bytes)?;
        Ok(Self {
            summary: FileSummary {
                name,
                format,
                byte_len: bytes.len(),
            },
            bytes,
        })
    }

    /// Read a file from disk
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        // Check the extension before touching the disk
        if let Some(ext) = path.extension().and_then(|s| s.to_str()) {
            if PointCloudFormat::from_extension(ext).is_none() {
                return Err(Error::UnsupportedFormat(format!(
                    "{name}: only .pcd and .xyz point clouds are supported"
                )));
            }
        }
        let bytes = std::fs::read(path)?;
        Self::from_bytes(name, bytes)
    }

    pub fn summary(&self) -> &FileSummary {
        &self.summary
    }

    pub fn format(&self) -> PointCloudFormat {
        self.summary.format
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Decode the file into raw coordinates
    pub fn decode(&self) -> Result<RawCoordinates> {
        decode(self.summary.format, &self.bytes)
    }
}
