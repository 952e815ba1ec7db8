//! Scripted input and a fixed-advance font for widget tests.

use std::collections::HashMap;
use std::time::Instant;

use glam::{Vec2, Vec3};
use lantern_engine::input::Key;
use lantern_engine::render::{
    Camera2D, GpuBackend, Image, Mesh, RecordingBackend, RenderItem, RendererConfig, SceneRenderer,
    Transform, UvRect,
};
use lantern_engine::text::{FontSource, TextLayout};

use crate::input::UiInput;
use crate::style::UiStyle;
use crate::ui::{Ui, UiFrame};

#[derive(Debug, Default)]
pub(crate) struct ScriptedInput {
    pub pointer: Option<Vec2>,
    pub down: bool,
    pub released: bool,
    pub keys: Vec<Key>,
    pub text: Vec<char>,
}

impl ScriptedInput {
    pub fn at(x: f32, y: f32) -> Self {
        Self { pointer: Some(Vec2::new(x, y)), ..Self::default() }
    }

    pub fn outside() -> Self {
        Self::default()
    }
}

impl UiInput for ScriptedInput {
    fn pointer_position(&self) -> Option<Vec2> {
        self.pointer
    }

    fn button_down(&self) -> bool {
        self.down
    }

    fn button_released(&self) -> bool {
        self.released
    }

    fn key_down(&self, key: Key) -> bool {
        self.keys.contains(&key)
    }

    fn text_chars(&self) -> &[char] {
        &self.text
    }
}

/// Every ASCII glyph advances `size / 2` pixels; lines are `size` pixels tall.
pub(crate) struct MonoFont {
    pub image: Image,
    layouts: HashMap<(u32, String), TextLayout>,
}

impl MonoFont {
    pub fn new<B: GpuBackend + ?Sized>(backend: &mut B) -> Self {
        let image = Image::solid(backend, [255; 4]).unwrap();
        Self { image, layouts: HashMap::new() }
    }
}

impl FontSource for MonoFont {
    fn layout(&mut self, backend: &mut dyn GpuBackend, size: u32, text: &str) -> TextLayout {
        if let Some(cached) = self.layouts.get(&(size, text.to_string())) {
            return *cached;
        }
        let line = size as f32;
        let layout = if text.is_empty() {
            TextLayout::empty(line)
        } else {
            let extent = Vec2::new(text.chars().count() as f32 * line / 2.0, line);
            let mesh = Mesh::quad(backend, extent.x, extent.y, UvRect::FULL);
            TextLayout { item: Some(RenderItem::new(mesh, self.image, Transform::default())), extent }
        };
        self.layouts.insert((size, text.to_string()), layout);
        layout
    }

    fn supports(&self, ch: char) -> bool {
        ch.is_ascii() && !ch.is_ascii_control()
    }

    fn average_advance(&mut self, size: u32) -> f32 {
        size as f32 / 2.0
    }
}

pub(crate) struct Harness {
    pub renderer: SceneRenderer<RecordingBackend>,
    pub ui: Ui,
    pub font: MonoFont,
    pub now: Instant,
}

impl Harness {
    pub fn new() -> Self {
        let mut renderer = SceneRenderer::new(RecordingBackend::new(800, 600), RendererConfig::default()).unwrap();
        let ui = Ui::new(renderer.backend_mut(), UiStyle::default()).unwrap();
        let font = MonoFont::new(renderer.backend_mut());
        Self { renderer, ui, font, now: Instant::now() }
    }

    pub fn open_scene(&mut self) {
        self.renderer.begin_scene(Camera2D::default(), Vec3::ONE, 1.0);
    }

    pub fn frame<'a>(
        &'a mut self,
        input: &'a ScriptedInput,
    ) -> UiFrame<'a, RecordingBackend, ScriptedInput, MonoFont> {
        self.ui.begin_at(&mut self.renderer, input, &mut self.font, self.now)
    }

    fn ui_items(&self) -> Vec<RenderItem> {
        self.renderer
            .ui_queue()
            .batches()
            .iter()
            .flat_map(|b| b.items.iter().copied())
            .collect()
    }

    /// Queued UI items drawn from the test font.
    pub fn texts(&self) -> Vec<RenderItem> {
        self.ui_items().into_iter().filter(|i| i.image == self.font.image).collect()
    }

    /// Queued UI items drawn from the shared white image.
    pub fn backgrounds(&self) -> Vec<RenderItem> {
        self.ui_items().into_iter().filter(|i| i.image != self.font.image).collect()
    }
}
