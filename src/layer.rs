//! Application layer: per-frame lifecycle hooks
//!
//! The engine drives one boxed [`Layer`] through a fixed hook order each
//! frame: update, UI, render. Subsystem access goes through
//! [`EngineContext`], which borrows the engine-owned state for the duration
//! of the hook; there are no global singletons to reach around it.

use crate::event::Event;
use crate::gfx::assets::Assets;
use crate::gfx::camera::Camera;
use crate::gfx::rendering::RenderEngine;
use crate::gfx::scene::Scene;

/// Mutable access to engine state, passed into layer hooks
pub struct EngineContext<'a> {
    pub scene: &'a mut Scene,
    pub assets: &'a mut Assets,
    pub camera: &'a mut Camera,
    pub renderer: &'a mut RenderEngine,
    pub(crate) quit: &'a mut bool,
}

impl EngineContext<'_> {
    /// Asks the engine to exit at the end of the current frame.
    ///
    /// Cannot interrupt mid-frame; the flag is checked once per loop
    /// iteration.
    pub fn request_quit(&mut self) {
        *self.quit = true;
    }
}

/// Lifecycle hooks for application logic.
///
/// All hooks have empty default implementations; implement only what the
/// application needs. Hooks run on the main thread in a fixed order each
/// frame: `on_update`, `on_ui`, `on_render`.
#[allow(unused_variables)]
pub trait Layer {
    /// Called once, after the GPU context and window exist
    fn on_create(&mut self, ctx: &mut EngineContext) {}

    /// Called every frame with the time since the previous frame, in seconds
    fn on_update(&mut self, dt: f32, ctx: &mut EngineContext) {}

    /// Called just before the frame is rendered
    fn on_render(&mut self, ctx: &mut EngineContext) {}

    /// Called while the UI frame is being built
    fn on_ui(&mut self, ui: &imgui::Ui, scene: &mut Scene, assets: &mut Assets) {}

    /// Called for each window/input event not captured by the UI
    fn on_event(&mut self, event: &Event, ctx: &mut EngineContext) {}

    /// Called once when the engine shuts down
    fn on_destroy(&mut self) {}
}
