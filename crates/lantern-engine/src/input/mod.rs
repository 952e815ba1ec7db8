//! Input subsystem.
//!
//! Public API is platform-agnostic and does not expose winit types.
//! The runtime translates platform events through [`platform::winit`].

mod frame;
mod poll;
mod state;
mod types;

pub mod platform;

pub use frame::InputFrame;
pub use poll::Input;
pub use state::InputState;
pub use types::{
    InputEvent,
    Key,
    KeyState,
    Modifiers,
    MouseButton,
    MouseButtonState,
    PointerButtonEvent,
    PointerMoveEvent,
};
