//! Triangle stripification.

pub mod graph;
pub mod strippifier;

pub use graph::MeshGraph;
pub use strippifier::{Strip, strippify};
