use glam::Vec2;
use lantern_engine::input::{Input, Key, MouseButton};

/// What the UI reads from the input system each frame.
///
/// "Button" means the primary pointer button throughout.
pub trait UiInput {
    /// Pointer position in screen pixels, `None` when outside the window.
    fn pointer_position(&self) -> Option<Vec2>;

    fn button_down(&self) -> bool;

    /// The button went up since the previous frame.
    fn button_released(&self) -> bool;

    fn key_down(&self, key: Key) -> bool;

    /// Characters typed since the previous frame.
    fn text_chars(&self) -> &[char];
}

impl UiInput for Input {
    fn pointer_position(&self) -> Option<Vec2> {
        Input::pointer_position(self)
    }

    fn button_down(&self) -> bool {
        Input::button_down(self, MouseButton::Left)
    }

    fn button_released(&self) -> bool {
        Input::button_released(self, MouseButton::Left)
    }

    fn key_down(&self, key: Key) -> bool {
        Input::key_down(self, key)
    }

    fn text_chars(&self) -> &[char] {
        Input::text_chars(self)
    }
}
