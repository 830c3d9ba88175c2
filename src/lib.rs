//! Exporter for chunked GameCube model containers.
//!
//! Takes a normalized scene document (triangulated meshes, materials, texture
//! names, bone weights) plus a rig blob, converts every mesh's triangles into
//! triangle strips, quantizes vertex attributes into the console's fixed-point
//! formats, and assembles the chunked container file with its relocation
//! table.

pub mod config;
pub mod container;
pub mod error;
pub mod ingestion;
pub mod pipeline;
pub mod strip;
pub mod types;

pub use config::{CliArgs, ExportConfig, RigFormat};
pub use error::{GnoError, Result};
pub use pipeline::{ExportSummary, Exporter};
