//! Lantern engine crate.
//!
//! A small 2D renderer (texture-batched scene pass, offscreen post-process, UI
//! overlay) plus the window, input, timing and text pieces a game loop needs.

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
pub mod render;
pub mod paint;
pub mod physics;
pub mod text;
