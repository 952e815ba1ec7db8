use std::collections::BTreeMap;
use std::fmt::Display;

use lantern_engine::paint::Color;
use lantern_engine::render::GpuBackend;
use lantern_engine::text::FontSource;

use crate::input::UiInput;
use crate::ui::UiFrame;

/// Named values shown as a stack of labels, sorted by name.
#[derive(Debug, Default, Clone)]
pub struct DebugStats {
    entries: BTreeMap<String, String>,
}

impl DebugStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `label` to `value`, replacing any previous value.
    pub fn add(&mut self, label: impl Into<String>, value: impl Display) {
        self.entries.insert(label.into(), value.to_string());
    }

    pub fn remove(&mut self, label: &str) -> bool {
        self.entries.remove(label).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `"label: value"` lines in draw order.
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.entries.iter().map(|(k, v)| format!("{k}: {v}"))
    }

    /// Draws one label per entry downward from `(x, y)`. Returns the height used.
    pub fn draw<B, I, F>(&self, frame: &mut UiFrame<'_, B, I, F>, x: f32, y: f32, size: u32, colour: Color) -> f32
    where
        B: GpuBackend,
        I: UiInput + ?Sized,
        F: FontSource + ?Sized,
    {
        let mut pen = y;
        for line in self.lines() {
            pen += frame.label(&line, x, pen, size, colour).y;
        }
        pen - y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Harness, ScriptedInput};

    #[test]
    fn lines_are_sorted_and_replaced() {
        let mut stats = DebugStats::new();
        stats.add("lights", 3);
        stats.add("fps", 60);
        stats.add("fps", 59.5);
        assert_eq!(stats.lines().collect::<Vec<_>>(), vec!["fps: 59.5", "lights: 3"]);

        assert!(stats.remove("lights"));
        assert!(!stats.remove("lights"));
        assert_eq!(stats.len(), 1);
    }

    #[test]
    fn draw_stacks_labels() {
        let mut stats = DebugStats::new();
        stats.add("a", 1);
        stats.add("b", 2);

        let mut h = Harness::new();
        let input = ScriptedInput::outside();
        h.open_scene();
        let height = stats.draw(&mut h.frame(&input), 5.0, 5.0, 16, Color::WHITE);
        assert_eq!(height, 32.0);

        let ys: Vec<f32> = h.texts().iter().map(|t| t.transform.position.y).collect();
        assert_eq!(ys, vec![5.0, 21.0]);
    }
}
