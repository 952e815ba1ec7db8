use std::time::Duration;

use lantern_engine::paint::Color;

/// Colours and metrics shared by every widget.
#[derive(Debug, Clone, PartialEq)]
pub struct UiStyle {
    pub text_colour: Color,
    /// Placeholder text in an empty text input.
    pub hint_colour: Color,
    pub input_background: Color,
    /// Space between a text input's border and its text.
    pub padding: f32,
    /// Amount a hovered button's colour moves toward the opposite end of the range.
    pub highlight_delta: f32,
    /// How far a hovered button rises.
    pub hover_lift: f32,
    /// Delay between deletions while Backspace is held.
    pub backspace_repeat: Duration,
    /// Layer of widget backgrounds; text sits one layer above.
    pub layer: f32,
}

impl Default for UiStyle {
    fn default() -> Self {
        Self {
            text_colour: Color::WHITE,
            hint_colour: Color::rgb(0.5, 0.5, 0.5),
            input_background: Color::rgba(0.1, 0.1, 0.1, 0.8),
            padding: 4.0,
            highlight_delta: 0.3,
            hover_lift: 2.0,
            backspace_repeat: Duration::from_millis(100),
            layer: 8.0,
        }
    }
}
