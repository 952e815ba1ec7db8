//! Lantern UI: immediate-mode widgets drawn through the engine's UI queue.
//!
//! ```rust,ignore
//! use lantern_ui::prelude::*;
//!
//! let mut ui = Ui::new(renderer.backend_mut(), UiStyle::default())?;
//!
//! // Each frame, after `renderer.begin_scene(..)`:
//! let mut frame = ui.begin(&mut renderer, ctx.input, &mut font);
//! if frame.button(10.0, 10.0, 120.0, 32.0, "Brighter", 16, Color::rgb(0.2, 0.4, 0.8)) {
//!     exposure += 0.01;
//! }
//! frame.text_input("your name", 10.0, 50.0, 16, 16, &mut name);
//! // `frame` ends the UI frame when dropped.
//! ```

pub mod debug;
pub mod input;
pub mod rect;
pub mod style;
pub mod ui;
mod widgets;

#[cfg(test)]
mod testing;

pub use debug::DebugStats;
pub use input::UiInput;
pub use rect::Rect;
pub use style::UiStyle;
pub use ui::{Ui, UiFrame, UiState, WidgetId, NO_WIDGET};

/// Everything a frame callback needs.
pub mod prelude {
    pub use crate::{DebugStats, Rect, Ui, UiFrame, UiInput, UiState, UiStyle, WidgetId};

    pub use lantern_engine::paint::Color;
    pub use lantern_engine::text::FontSource;
}
