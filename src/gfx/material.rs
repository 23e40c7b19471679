//! PBR material definition (metallic-roughness workflow)
//!
//! Matches the glTF material model: factor values plus optional texture
//! slots referencing the asset pool. Meshes loaded without an explicit
//! material resolve to [`PbrMaterial::default`].

use super::assets::TextureHandle;

/// How the alpha channel of the base color is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlphaMode {
    #[default]
    Opaque,
    /// Alpha-tested against `alpha_cutoff`
    Mask,
    Blend,
}

/// Material in the metallic-roughness workflow
#[derive(Debug, Clone)]
pub struct PbrMaterial {
    pub name: String,

    pub base_color: [f32; 4],
    /// 0 = dielectric, 1 = metal
    pub metallic: f32,
    /// 0 = mirror, 1 = fully rough
    pub roughness: f32,

    // Texture slots, absent when the asset does not provide them
    pub base_color_texture: Option<TextureHandle>,
    /// G = roughness, B = metallic
    pub metallic_roughness_texture: Option<TextureHandle>,
    pub normal_texture: Option<TextureHandle>,
    pub occlusion_texture: Option<TextureHandle>,
    pub emissive_texture: Option<TextureHandle>,

    pub emissive_factor: [f32; 3],

    pub alpha_mode: AlphaMode,
    pub alpha_cutoff: f32,

    pub double_sided: bool,
}

impl Default for PbrMaterial {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            base_color: [0.8, 0.8, 0.8, 1.0],
            metallic: 0.0,
            roughness: 0.5,
            base_color_texture: None,
            metallic_roughness_texture: None,
            normal_texture: None,
            occlusion_texture: None,
            emissive_texture: None,
            emissive_factor: [0.0, 0.0, 0.0],
            alpha_mode: AlphaMode::Opaque,
            alpha_cutoff: 0.5,
            double_sided: false,
        }
    }
}

impl PbrMaterial {
    pub fn new(name: &str, base_color: [f32; 4], metallic: f32, roughness: f32) -> Self {
        Self {
            name: name.to_string(),
            base_color,
            metallic: metallic.clamp(0.0, 1.0),
            roughness: roughness.clamp(0.0, 1.0),
            ..Default::default()
        }
    }

    pub fn has_base_color_texture(&self) -> bool {
        self.base_color_texture.is_some()
    }

    pub fn has_any_texture(&self) -> bool {
        self.base_color_texture.is_some()
            || self.metallic_roughness_texture.is_some()
            || self.normal_texture.is_some()
            || self.occlusion_texture.is_some()
            || self.emissive_texture.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_material_matches_fallback_contract() {
        let m = PbrMaterial::default();
        assert_eq!(m.base_color, [0.8, 0.8, 0.8, 1.0]);
        assert_eq!(m.metallic, 0.0);
        assert_eq!(m.roughness, 0.5);
        assert_eq!(m.alpha_mode, AlphaMode::Opaque);
        assert!(!m.has_any_texture());
    }

    #[test]
    fn new_clamps_factors() {
        let m = PbrMaterial::new("m", [1.0; 4], 2.0, -1.0);
        assert_eq!(m.metallic, 1.0);
        assert_eq!(m.roughness, 0.0);
    }
}
