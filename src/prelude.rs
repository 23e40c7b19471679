//! # Brume Prelude
//!
//! Convenient single import for typical applications:
//!
//! ```rust
//! use brume::prelude::*;
//! ```

// Core application types
pub use crate::app::{BrumeApp, EngineConfig};
pub use crate::event::{Event, KeyCode, MouseButton};
pub use crate::layer::{EngineContext, Layer};

// Graphics and scene types
pub use crate::gfx::assets::{Assets, MeshHandle, TextureHandle};
pub use crate::gfx::camera::Camera;
pub use crate::gfx::material::{AlphaMode, PbrMaterial};
pub use crate::gfx::mesh::Mesh;
pub use crate::gfx::model::Model;
pub use crate::gfx::scene::{Scene, SceneObject};
pub use crate::gfx::texture::Texture;
pub use crate::gfx::transform::Transform;

// Default UI panel
pub use crate::ui::scene_panel;

// Common external types
pub use cgmath::{InnerSpace, Vector3, Zero};
pub use imgui::Ui;
