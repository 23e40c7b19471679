//! Engine events as a plain enum
//!
//! Window and input events are converted from winit into one tagged union,
//! so application layers dispatch with a `match` instead of downcasting.

use winit::dpi::PhysicalPosition;
use winit::event::{DeviceEvent, ElementState, MouseScrollDelta, WindowEvent};

// Re-exported so layers can match on keys/buttons without importing winit
pub use winit::event::MouseButton;
pub use winit::keyboard::KeyCode;

/// A window or input event delivered to the application layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    Resized {
        width: u32,
        height: u32,
    },
    Key {
        key: KeyCode,
        pressed: bool,
        repeat: bool,
    },
    MouseButton {
        button: MouseButton,
        pressed: bool,
    },
    /// Absolute cursor position in window pixels
    MouseMoved {
        x: f64,
        y: f64,
    },
    /// Relative mouse motion, for camera-look style input
    MouseMotion {
        dx: f64,
        dy: f64,
    },
    MouseScrolled {
        dx: f32,
        dy: f32,
    },
    Focus(bool),
    CloseRequested,
}

impl Event {
    /// Converts a winit window event; returns `None` for events the engine
    /// does not surface to layers.
    pub fn from_window_event(event: &WindowEvent) -> Option<Event> {
        match event {
            WindowEvent::Resized(size) => Some(Event::Resized {
                width: size.width,
                height: size.height,
            }),
            WindowEvent::KeyboardInput { event, .. } => {
                let winit::keyboard::PhysicalKey::Code(key) = event.physical_key else {
                    return None;
                };
                Some(Event::Key {
                    key,
                    pressed: event.state == ElementState::Pressed,
                    repeat: event.repeat,
                })
            }
            WindowEvent::MouseInput { state, button, .. } => Some(Event::MouseButton {
                button: *button,
                pressed: *state == ElementState::Pressed,
            }),
            WindowEvent::CursorMoved { position, .. } => Some(Event::MouseMoved {
                x: position.x,
                y: position.y,
            }),
            WindowEvent::MouseWheel { delta, .. } => {
                let (dx, dy) = match delta {
                    MouseScrollDelta::LineDelta(x, y) => (*x, *y),
                    MouseScrollDelta::PixelDelta(PhysicalPosition { x, y }) => {
                        ((x / 20.0) as f32, (y / 20.0) as f32)
                    }
                };
                Some(Event::MouseScrolled { dx, dy })
            }
            WindowEvent::Focused(focused) => Some(Event::Focus(*focused)),
            WindowEvent::CloseRequested => Some(Event::CloseRequested),
            _ => None,
        }
    }

    /// Converts a winit device event (raw mouse motion)
    pub fn from_device_event(event: &DeviceEvent) -> Option<Event> {
        match event {
            DeviceEvent::MouseMotion { delta: (dx, dy) } => {
                Some(Event::MouseMotion { dx: *dx, dy: *dy })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalSize;

    #[test]
    fn resize_maps_to_dimensions() {
        let event = Event::from_window_event(&WindowEvent::Resized(PhysicalSize::new(800, 600)));
        assert_eq!(event, Some(Event::Resized { width: 800, height: 600 }));
    }

    #[test]
    fn close_requested_maps_through() {
        let event = Event::from_window_event(&WindowEvent::CloseRequested);
        assert_eq!(event, Some(Event::CloseRequested));
    }

    #[test]
    fn focus_carries_state() {
        assert_eq!(
            Event::from_window_event(&WindowEvent::Focused(true)),
            Some(Event::Focus(true))
        );
    }

    #[test]
    fn mouse_motion_maps_from_device_event() {
        let event = Event::from_device_event(&DeviceEvent::MouseMotion { delta: (3.0, -2.0) });
        assert_eq!(event, Some(Event::MouseMotion { dx: 3.0, dy: -2.0 }));
    }
}
