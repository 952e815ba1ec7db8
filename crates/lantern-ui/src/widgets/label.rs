use glam::Vec2;
use lantern_engine::paint::Color;
use lantern_engine::render::GpuBackend;
use lantern_engine::text::FontSource;

use crate::input::UiInput;
use crate::ui::UiFrame;

impl<'a, B, I, F> UiFrame<'a, B, I, F>
where
    B: GpuBackend,
    I: UiInput + ?Sized,
    F: FontSource + ?Sized,
{
    /// Draws `text` with its top-left corner at `(x, y)` and returns its extent.
    ///
    /// Labels take no id.
    pub fn label(&mut self, text: &str, x: f32, y: f32, size: u32, colour: Color) -> Vec2 {
        let layout = self.layout_text(size, text);
        self.draw_text(&layout, Vec2::new(x, y), colour);
        layout.extent
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;
    use lantern_engine::paint::Color;

    use crate::testing::{Harness, ScriptedInput};

    #[test]
    fn returns_extent_and_consumes_no_id() {
        let mut h = Harness::new();
        let input = ScriptedInput::at(5.0, 5.0);

        h.open_scene();
        let mut frame = h.frame(&input);
        let extent = frame.label("hello", 0.0, 0.0, 20, Color::WHITE);
        assert_eq!(extent, Vec2::new(50.0, 20.0));
        frame.button(0.0, 0.0, 10.0, 10.0, "", 20, Color::BLACK);
        assert_eq!(frame.state().hot_item, 1);
    }

    #[test]
    fn empty_text_queues_nothing() {
        let mut h = Harness::new();
        let input = ScriptedInput::outside();

        h.open_scene();
        h.frame(&input).label("", 0.0, 0.0, 20, Color::WHITE);
        assert!(h.renderer.ui_queue().is_empty());
    }
}
