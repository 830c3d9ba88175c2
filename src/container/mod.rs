//! Chunked model container: writer primitives, attribute encoders, and the
//! whole-file builder.

pub mod builder;
pub mod encode;
pub mod model;
pub mod writer;

pub use builder::{BuildOptions, BuiltContainer, ContainerLayout, build};
pub use model::{PreparedMesh, PreparedModel, VertexSet, VertexSetKind, WeightRow};
pub use writer::ChunkWriter;
