//! # User Interface Module
//!
//! Dear ImGui-based debug UI: the [`UiManager`] handles ImGui integration
//! with winit and wgpu (input capture, frame pacing, rendering), and
//! [`panel`] provides the default scene editing panel.
//!
//! When the UI wants the mouse or keyboard, events are consumed before they
//! reach the application layer, so camera controls never fight the panels.

pub mod manager;
pub mod panel;

// Re-export main types
pub use manager::UiManager;
pub use panel::scene_panel;
