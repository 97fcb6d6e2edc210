//! Core data structures for pointview
//!
//! This crate provides the types shared by the loader and the ingestion
//! pipeline: points, point buffers, colour buffers, bounding boxes and the
//! error model.

pub mod point;
pub mod point_cloud;
pub mod color;
pub mod bounds;
pub mod error;

pub use point::*;
pub use point_cloud::*;
pub use color::*;
pub use bounds::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3, Matrix4};

/// Common result type for pointview operations
pub type Result<T> = std::result::Result<T, Error>;
