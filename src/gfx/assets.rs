//! Arena-style asset storage
//!
//! Meshes and textures live in indexed pools owned by [`Assets`]; scene
//! objects and materials reference them through lightweight `Copy` handles
//! instead of shared pointers. Pool entries are never removed, so a handle
//! stays valid for the lifetime of the pool.

use super::mesh::Mesh;
use super::texture::Texture;

/// Index of a mesh in the asset pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u32);

/// Index of a texture in the asset pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Owns all meshes and textures used by scenes and models
#[derive(Default)]
pub struct Assets {
    meshes: Vec<Mesh>,
    textures: Vec<Texture>,
}

impl Assets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshHandle {
        let handle = MeshHandle(self.meshes.len() as u32);
        self.meshes.push(mesh);
        handle
    }

    pub fn add_texture(&mut self, texture: Texture) -> TextureHandle {
        let handle = TextureHandle(self.textures.len() as u32);
        self.textures.push(texture);
        handle
    }

    pub fn mesh(&self, handle: MeshHandle) -> Option<&Mesh> {
        self.meshes.get(handle.0 as usize)
    }

    pub fn texture(&self, handle: TextureHandle) -> Option<&Texture> {
        self.textures.get(handle.0 as usize)
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Uploads any meshes and textures that do not have GPU resources yet.
    ///
    /// Safe to call every frame; already uploaded entries are skipped.
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        for mesh in self.meshes.iter_mut() {
            mesh.upload(device);
        }
        for texture in self.textures.iter_mut() {
            texture.upload(device, queue);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_index_in_insertion_order() {
        let mut assets = Assets::new();
        let a = assets.add_mesh(Mesh::cube());
        let b = assets.add_mesh(Mesh::plane(1.0));
        assert_eq!(a, MeshHandle(0));
        assert_eq!(b, MeshHandle(1));
        assert_eq!(assets.mesh(a).unwrap().vertex_count(), 24);
        assert_eq!(assets.mesh(b).unwrap().vertex_count(), 4);
    }

    #[test]
    fn handles_stay_valid_across_later_pushes() {
        let mut assets = Assets::new();
        let first = assets.add_texture(Texture::white());
        for _ in 0..16 {
            assets.add_texture(Texture::white());
        }
        assert_eq!(assets.texture(first).unwrap().width, 1);
        assert_eq!(assets.texture_count(), 17);
    }

    #[test]
    fn lookup_past_end_is_none() {
        let assets = Assets::new();
        assert!(assets.mesh(MeshHandle(3)).is_none());
        assert!(assets.texture(TextureHandle(0)).is_none());
    }
}
