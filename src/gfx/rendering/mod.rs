// src/gfx/rendering/mod.rs
//! Core rendering functionality
//!
//! Render engine, pipeline management, and the post-processing pipelines
//! (bloom, cubemap conversion, skybox).

use thiserror::Error;

pub mod bloom;
pub mod cubemap;
pub mod global_bindings;
pub mod pipeline_manager;
pub mod render_engine;
pub mod skybox;

// Re-export main types
pub use bloom::Bloom;
pub use cubemap::equirectangular_to_cubemap;
pub use pipeline_manager::{PipelineConfig, PipelineManager};
pub use render_engine::RenderEngine;
pub use skybox::Skybox;

/// Errors from the post-processing and skybox constructors.
///
/// These follow the crate-wide convention of explicit results for fallible
/// construction; nothing in the rendering layer throws on bad input data.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid cubemap resolution {0} (must be 1-8192)")]
    InvalidResolution(u32),
    #[error("cubemap source must be an uploaded 2D texture")]
    InvalidSource,
    #[error("skybox texture is not a cubemap")]
    NotACubemap,
    #[error("image decode failed: {0}")]
    Image(#[from] image::ImageError),
}
