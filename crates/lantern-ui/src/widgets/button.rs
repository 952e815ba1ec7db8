use lantern_engine::paint::Color;
use lantern_engine::render::GpuBackend;
use lantern_engine::text::FontSource;

use crate::input::UiInput;
use crate::rect::Rect;
use crate::ui::UiFrame;

impl<'a, B, I, F> UiFrame<'a, B, I, F>
where
    B: GpuBackend,
    I: UiInput + ?Sized,
    F: FontSource + ?Sized,
{
    /// A push button with a centred label.
    ///
    /// Returns `true` on every frame the button is held down while it owns the press,
    /// not only on release.
    #[allow(clippy::too_many_arguments)]
    pub fn button(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        label: &str,
        label_size: u32,
        colour: Color,
    ) -> bool {
        let id = self.next_id();
        let mut rect = Rect::new(x, y, width, height);
        let mut colour = colour;

        if self.pointer_in(rect) {
            let delta = self.style().highlight_delta;
            colour = if colour.luminance() > 0.5 { colour.shifted(-delta) } else { colour.shifted(delta) };
            rect = rect.translated(0.0, -self.style().hover_lift);
            self.claim(id);
        }

        let text_colour = self.style().text_colour;
        let layout = self.layout_text(label_size, label);
        self.draw_rect(rect, colour);
        self.draw_text(&layout, rect.centre_offset(layout.extent), text_colour);

        let state = self.state();
        self.input.button_down() && state.hot_item == id && state.active_item == id
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;
    use lantern_engine::paint::Color;

    use crate::testing::{Harness, ScriptedInput};

    const BASE: Color = Color::rgb(0.2, 0.2, 0.2);

    // ── press protocol ───────────────────────────────────────────────────

    #[test]
    fn press_then_release_clears_active() {
        let mut h = Harness::new();
        let mut input = ScriptedInput::at(150.0, 150.0);

        input.down = true;
        h.open_scene();
        let mut frame = h.frame(&input);
        assert!(frame.button(100.0, 100.0, 300.0, 100.0, "go", 16, BASE));
        assert_eq!(frame.state().active_item, 1);
        drop(frame);
        assert_eq!(h.ui.active_item(), 1);

        input.down = false;
        input.released = true;
        h.open_scene();
        let mut frame = h.frame(&input);
        assert!(!frame.button(100.0, 100.0, 300.0, 100.0, "go", 16, BASE));
        frame.end();
        assert_eq!(h.ui.active_item(), 0);
    }

    #[test]
    fn press_started_elsewhere_is_not_stolen() {
        let mut h = Harness::new();
        let mut input = ScriptedInput::at(10.0, 10.0);
        input.down = true;

        h.open_scene();
        let mut frame = h.frame(&input);
        assert!(frame.button(0.0, 0.0, 50.0, 50.0, "a", 16, BASE));
        assert!(!frame.button(200.0, 0.0, 50.0, 50.0, "b", 16, BASE));
        drop(frame);

        // Pointer slides onto b while still held: a keeps the press.
        input.pointer = Some(Vec2::new(210.0, 10.0));
        h.open_scene();
        let mut frame = h.frame(&input);
        assert!(!frame.button(0.0, 0.0, 50.0, 50.0, "a", 16, BASE));
        assert!(!frame.button(200.0, 0.0, 50.0, 50.0, "b", 16, BASE));
        assert_eq!(frame.state().hot_item, 2);
        assert_eq!(frame.state().active_item, 1);
    }

    // ── visuals ──────────────────────────────────────────────────────────

    #[test]
    fn hover_lightens_dark_button_and_lifts_it() {
        let mut h = Harness::new();
        let input = ScriptedInput::at(150.0, 150.0);

        h.open_scene();
        h.frame(&input).button(100.0, 100.0, 300.0, 100.0, "go", 16, BASE);

        let bg = h.backgrounds()[0];
        let tint = bg.tint.unwrap();
        assert!((tint.r - 0.5).abs() < 1e-6);
        assert!((bg.transform.position.y * bg.transform.scale.y - 98.0).abs() < 1e-3);
    }

    #[test]
    fn hover_darkens_bright_button() {
        let mut h = Harness::new();
        let input = ScriptedInput::at(150.0, 150.0);

        h.open_scene();
        h.frame(&input).button(100.0, 100.0, 300.0, 100.0, "go", 16, Color::rgb(0.9, 0.9, 0.9));

        let tint = h.backgrounds()[0].tint.unwrap();
        assert!((tint.g - 0.6).abs() < 1e-6);
    }

    #[test]
    fn label_is_centred() {
        let mut h = Harness::new();
        let input = ScriptedInput::outside();

        h.open_scene();
        h.frame(&input).button(100.0, 100.0, 300.0, 100.0, "abcd", 20, BASE);

        // Test font: 10 px advance at size 20, 20 px line.
        let text = h.texts()[0];
        assert_eq!(text.transform.position.x, 230.0);
        assert_eq!(text.transform.position.y, 140.0);
    }
}
