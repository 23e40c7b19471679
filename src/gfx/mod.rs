//! # Graphics Module
//!
//! All rendering-related functionality: camera and transforms, the asset
//! pool, mesh and material definitions, the glTF model loader, scene
//! management, and the render pipelines.
//!
//! ## Architecture Overview
//!
//! - **Camera / Transform** ([`camera`], [`transform`]) - view/projection and
//!   per-object matrix math
//! - **Assets** ([`assets`]) - arena-style pools for meshes and textures,
//!   referenced by lightweight handles
//! - **Model Loading** ([`model`]) - glTF 2.0 ingestion into the asset pool
//! - **Scene Management** ([`scene`]) - insertion-ordered object collection
//! - **Rendering** ([`rendering`]) - HDR forward pass, bloom, skybox,
//!   cubemap conversion

pub mod assets;
pub mod camera;
pub mod material;
pub mod mesh;
pub mod model;
pub mod rendering;
pub mod scene;
pub mod texture;
pub mod transform;

// Re-export commonly used types
pub use assets::{Assets, MeshHandle, TextureHandle};
pub use camera::Camera;
pub use material::{AlphaMode, PbrMaterial};
pub use mesh::Mesh;
pub use model::{Model, ModelError};
pub use rendering::{RenderEngine, RenderError};
pub use scene::{Scene, SceneObject};
pub use texture::Texture;
pub use transform::Transform;
