// src/lib.rs
//! Brume 3D Engine
//!
//! A compact real-time 3D rendering engine built on wgpu and winit: scene
//! graph, glTF model loading, PBR materials, and HDR post-processing
//! (bloom, skybox).

pub mod app;
pub mod event;
pub mod gfx;
pub mod layer;
pub mod prelude;
pub mod ui;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::{BrumeApp, EngineConfig};
pub use layer::{EngineContext, Layer};

/// Creates an application instance with default settings
pub fn default() -> BrumeApp {
    BrumeApp::new(EngineConfig::default())
}
