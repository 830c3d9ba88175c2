use serde::{Deserialize, Serialize};

/// Extra texture behavior, selecting the slot flag word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextureKind {
    #[default]
    Diffuse,
    Reflective,
    Emissive,
}

impl TextureKind {
    /// Flag word written into the 20-byte texture slot descriptor.
    pub fn flags(&self) -> u32 {
        match self {
            TextureKind::Diffuse => 0x400C_0101,
            TextureKind::Reflective => 0x400C_2004,
            TextureKind::Emissive => 0x400C_0104,
        }
    }
}

/// One texture slot of a material, referencing `Scene::texture_names`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureSlot {
    pub texture: usize,
    #[serde(default)]
    pub kind: TextureKind,
}

/// Material shading constants as authored by the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    #[serde(default)]
    pub name: String,
    pub color: [f32; 3],
    #[serde(default = "default_alpha")]
    pub alpha: f32,
    #[serde(default)]
    pub disable_backface_culling: bool,
    #[serde(default)]
    pub always_on_top: bool,
    #[serde(default)]
    pub fullbright: bool,
    #[serde(default)]
    pub textures: Vec<TextureSlot>,
}

fn default_alpha() -> f32 {
    1.0
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            color: [0.752_941_3, 0.752_941_3, 0.752_941_3],
            alpha: 1.0,
            disable_backface_culling: false,
            always_on_top: false,
            fullbright: false,
            textures: Vec::new(),
        }
    }
}

impl Material {
    /// Shading flag word of the material body record.
    pub fn flags(&self) -> u32 {
        let mut flags = 0;
        if self.disable_backface_culling {
            flags |= 0x2;
        }
        if self.always_on_top {
            flags |= 0x1_0000;
        }
        if !self.fullbright {
            flags |= 0x100_0000;
        }
        flags
    }

    /// Texture slots with diffuse slots sorted to the front.
    pub fn ordered_textures(&self) -> Vec<TextureSlot> {
        let mut ordered = Vec::with_capacity(self.textures.len());
        for slot in &self.textures {
            if slot.kind == TextureKind::Diffuse {
                ordered.insert(0, *slot);
            } else {
                ordered.push(*slot);
            }
        }
        ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_material_flags() {
        // Fullbright off sets the shading bit.
        assert_eq!(Material::default().flags(), 0x100_0000);
    }

    #[test]
    fn all_flag_bits() {
        let mat = Material {
            disable_backface_culling: true,
            always_on_top: true,
            fullbright: true,
            ..Default::default()
        };
        assert_eq!(mat.flags(), 0x2 | 0x1_0000);
    }

    #[test]
    fn texture_kind_flag_words() {
        assert_eq!(TextureKind::Diffuse.flags(), 0x400C_0101);
        assert_eq!(TextureKind::Reflective.flags(), 0x400C_2004);
        assert_eq!(TextureKind::Emissive.flags(), 0x400C_0104);
    }

    #[test]
    fn diffuse_slots_sort_first() {
        let mat = Material {
            textures: vec![
                TextureSlot {
                    texture: 0,
                    kind: TextureKind::Reflective,
                },
                TextureSlot {
                    texture: 1,
                    kind: TextureKind::Diffuse,
                },
                TextureSlot {
                    texture: 2,
                    kind: TextureKind::Emissive,
                },
            ],
            ..Default::default()
        };
        let ordered = mat.ordered_textures();
        assert_eq!(ordered[0].texture, 1);
        assert_eq!(ordered[1].texture, 0);
        assert_eq!(ordered[2].texture, 2);
    }
}
