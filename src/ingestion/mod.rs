//! Input loading: the normalized scene document and the rig bone blob.

pub mod rig;
pub mod scene;

pub use rig::{extract_bone_blob, load_rig};
pub use scene::load_scene;
