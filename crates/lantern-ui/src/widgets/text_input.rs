use lantern_engine::input::Key;
use lantern_engine::render::GpuBackend;
use lantern_engine::text::FontSource;

use crate::input::UiInput;
use crate::rect::Rect;
use crate::ui::{UiFrame, NO_WIDGET};

impl<'a, B, I, F> UiFrame<'a, B, I, F>
where
    B: GpuBackend,
    I: UiInput + ?Sized,
    F: FontSource + ?Sized,
{
    /// Single-line text field editing `buffer`, at most `width_in_chars` characters.
    ///
    /// Pressing on the field focuses it; pressing anywhere else unfocuses it. While
    /// focused it appends typed characters the font can draw and deletes one character
    /// per repeat interval while Backspace is held. Returns `true` if `buffer` changed.
    pub fn text_input(
        &mut self,
        hint: &str,
        x: f32,
        y: f32,
        width_in_chars: usize,
        font_size: u32,
        buffer: &mut String,
    ) -> bool {
        let id = self.next_id();
        let padding = self.style().padding;
        let advance = self.font.average_advance(font_size);
        let rect = Rect::new(
            x,
            y,
            width_in_chars as f32 * advance + 2.0 * padding,
            font_size as f32 + 2.0 * padding,
        );

        if self.pointer_in(rect) {
            self.claim(id);
            if self.input.button_down() && self.ui.state.active_item == id && self.ui.state.focus_item != id {
                log::debug!("text input {id} focused");
                self.ui.state.focus_item = id;
            }
        } else if self.input.button_down() && self.ui.state.focus_item == id {
            log::debug!("text input {id} lost focus");
            self.ui.state.focus_item = NO_WIDGET;
        }

        let changed = self.ui.state.focus_item == id && self.edit(buffer, width_in_chars);

        let background = self.style().input_background;
        self.draw_rect(rect, background);

        let (text, colour) = if buffer.is_empty() {
            (hint, self.style().hint_colour)
        } else {
            (buffer.as_str(), self.style().text_colour)
        };
        let layout = self.layout_text(font_size, text);
        self.draw_text(&layout, rect.origin + padding, colour);

        changed
    }

    fn edit(&mut self, buffer: &mut String, max_chars: usize) -> bool {
        let input = self.input;
        let mut changed = false;

        for &ch in input.text_chars() {
            if buffer.chars().count() >= max_chars {
                break;
            }
            if self.font.supports(ch) {
                buffer.push(ch);
                changed = true;
            }
        }

        if input.key_down(Key::Backspace) {
            let due = self
                .ui
                .backspace_fired
                .is_none_or(|last| self.now.saturating_duration_since(last) >= self.ui.style.backspace_repeat);
            if due {
                self.ui.backspace_fired = Some(self.now);
                changed |= buffer.pop().is_some();
            }
        } else {
            self.ui.backspace_fired = None;
        }

        changed
    }
}
