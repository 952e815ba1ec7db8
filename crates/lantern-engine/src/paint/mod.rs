//! Colour type shared by the renderer, UI and demo.

pub mod color;

pub use color::Color;
