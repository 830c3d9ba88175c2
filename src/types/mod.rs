pub mod material;
pub mod mesh;
pub mod scene;

pub use material::{Material, TextureKind, TextureSlot};
pub use mesh::{BoneInfluence, Bounds, MeshData};
pub use scene::{Scene, SceneStats};
