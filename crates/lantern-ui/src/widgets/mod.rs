//! Widgets, as methods on [`UiFrame`](crate::UiFrame).
//!
//! Each call takes the next id in call order, so a widget that is skipped one frame
//! shifts the ids of every widget after it.

mod button;
mod label;
mod text_input;
