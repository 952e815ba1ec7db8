use glam::Vec2;

use super::frame::InputFrame;
use super::state::InputState;
use super::types::{InputEvent, Key, MouseButton};

/// Polled view over the window's input.
///
/// The runtime feeds events through [`Input::apply`] and calls [`Input::end_frame`] once
/// the frame has been consumed, so the `*_pressed`/`*_released` queries and
/// [`Input::text_chars`] describe exactly the events since the previous frame.
#[derive(Debug, Default)]
pub struct Input {
    state: InputState,
    frame: InputFrame,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, ev: InputEvent) {
        self.state.apply_event(&mut self.frame, ev);
    }

    /// Drops per-frame deltas. Held keys and buttons persist.
    pub fn end_frame(&mut self) {
        self.frame.clear();
    }

    /// Pointer position in logical pixels, `None` when outside the window.
    pub fn pointer_position(&self) -> Option<Vec2> {
        self.state.pointer_pos.map(|(x, y)| Vec2::new(x, y))
    }

    #[inline]
    pub fn button_down(&self, button: MouseButton) -> bool {
        self.state.button_down(button)
    }

    #[inline]
    pub fn button_pressed(&self, button: MouseButton) -> bool {
        self.frame.buttons_pressed.contains(&button)
    }

    #[inline]
    pub fn button_released(&self, button: MouseButton) -> bool {
        self.frame.buttons_released.contains(&button)
    }

    #[inline]
    pub fn key_down(&self, key: Key) -> bool {
        self.state.key_down(key)
    }

    #[inline]
    pub fn key_pressed(&self, key: Key) -> bool {
        self.frame.keys_pressed.contains(&key)
    }

    /// Printable characters typed this frame.
    pub fn text_chars(&self) -> &[char] {
        &self.frame.text
    }

    pub fn state(&self) -> &InputState {
        &self.state
    }

    pub fn frame(&self) -> &InputFrame {
        &self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{KeyState, MouseButtonState, PointerButtonEvent, PointerMoveEvent};

    fn click(state: MouseButtonState) -> InputEvent {
        InputEvent::PointerButton(PointerButtonEvent { button: MouseButton::Left, state, x: 5.0, y: 6.0 })
    }

    #[test]
    fn deltas_last_one_frame() {
        let mut input = Input::new();
        input.apply(click(MouseButtonState::Pressed));
        input.apply(InputEvent::Text("hi".to_string()));
        assert!(input.button_pressed(MouseButton::Left));
        assert_eq!(input.text_chars(), &['h', 'i']);

        input.end_frame();
        assert!(!input.button_pressed(MouseButton::Left));
        assert!(input.button_down(MouseButton::Left));
        assert!(input.text_chars().is_empty());

        input.apply(click(MouseButtonState::Released));
        assert!(input.button_released(MouseButton::Left));
    }

    #[test]
    fn pointer_follows_moves() {
        let mut input = Input::new();
        assert_eq!(input.pointer_position(), None);
        input.apply(InputEvent::PointerMoved(PointerMoveEvent { x: 150.0, y: 150.0 }));
        assert_eq!(input.pointer_position(), Some(Vec2::new(150.0, 150.0)));
    }

    #[test]
    fn key_press_is_reported_once() {
        let mut input = Input::new();
        input.apply(InputEvent::Key { key: Key::Backspace, state: KeyState::Pressed, repeat: false });
        assert!(input.key_pressed(Key::Backspace));
        input.end_frame();
        input.apply(InputEvent::Key { key: Key::Backspace, state: KeyState::Pressed, repeat: true });
        assert!(!input.key_pressed(Key::Backspace));
        assert!(input.key_down(Key::Backspace));
    }
}
