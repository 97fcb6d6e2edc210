//! Point-cloud ingestion and analysis
//!
//! This crate turns the raw coordinate array produced by a loader into a
//! render-ready bundle:
//! - Sanitizing (dropping non-finite triples)
//! - Bounding-box computation
//! - Altitude or uniform colouring
//! - Camera framing
//! - Metadata reporting
//!
//! [`ViewerSession`] wraps the pipeline with load generations so a stale
//! decode can never install its buffers over a newer load.

pub mod sanitize;
pub mod bounds;
pub mod color;
pub mod camera;
pub mod metadata;
pub mod config;
pub mod pipeline;
pub mod session;

pub use sanitize::*;
pub use bounds::*;
pub use color::*;
pub use camera::*;
pub use metadata::*;
pub use config::*;
pub use pipeline::*;
pub use session::*;
