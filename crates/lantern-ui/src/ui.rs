use std::time::Instant;

use glam::{Vec2, Vec3};
use lantern_engine::paint::Color;
use lantern_engine::render::{
    GpuBackend, GpuError, Image, Mesh, RenderItem, SceneRenderer, Transform, Vertex, QUAD_INDICES,
};
use lantern_engine::text::{FontSource, TextLayout};

use crate::input::UiInput;
use crate::rect::Rect;
use crate::style::UiStyle;

/// Widget identity. Ids are handed out in call order each frame, starting at 1.
pub type WidgetId = u32;

/// The "no widget" id.
pub const NO_WIDGET: WidgetId = 0;

/// Interaction state that survives between frames.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct UiState {
    /// Widget under the pointer this frame.
    pub hot_item: WidgetId,
    /// Widget that owns the current button press.
    pub active_item: WidgetId,
    /// Text input receiving typed characters. Unlike `active_item` it outlives the press.
    pub focus_item: WidgetId,
    id_count: WidgetId,
}

/// Immediate-mode UI controller.
///
/// Owns the interaction state and the two GPU resources every widget background
/// shares. Widgets are only reachable through the [`UiFrame`] returned by
/// [`begin`](Ui::begin), which ends the frame when dropped.
pub struct Ui {
    pub(crate) state: UiState,
    pub(crate) style: UiStyle,
    white: Image,
    /// Unit square with its top-left corner at the origin.
    quad: Mesh,
    pub(crate) backspace_fired: Option<Instant>,
}

impl Ui {
    pub fn new<B: GpuBackend + ?Sized>(backend: &mut B, style: UiStyle) -> Result<Self, GpuError> {
        let white = Image::solid(backend, [255, 255, 255, 255])?;
        let vertices = [
            Vertex::new(0.0, 0.0, 0.0, 0.0, 0.0),
            Vertex::new(1.0, 0.0, 0.0, 1.0, 0.0),
            Vertex::new(1.0, 1.0, 0.0, 1.0, 1.0),
            Vertex::new(0.0, 1.0, 0.0, 0.0, 1.0),
        ];
        let quad = Mesh::upload(backend, &vertices, &QUAD_INDICES);

        Ok(Self {
            state: UiState::default(),
            style,
            white,
            quad,
            backspace_fired: None,
        })
    }

    /// Starts a UI frame. The renderer's frame must already be open.
    pub fn begin<'a, B, I, F>(
        &'a mut self,
        renderer: &'a mut SceneRenderer<B>,
        input: &'a I,
        font: &'a mut F,
    ) -> UiFrame<'a, B, I, F>
    where
        B: GpuBackend,
        I: UiInput + ?Sized,
        F: FontSource + ?Sized,
    {
        self.begin_at(renderer, input, font, Instant::now())
    }

    /// [`begin`](Ui::begin) with an explicit clock reading for key repeat.
    pub fn begin_at<'a, B, I, F>(
        &'a mut self,
        renderer: &'a mut SceneRenderer<B>,
        input: &'a I,
        font: &'a mut F,
        now: Instant,
    ) -> UiFrame<'a, B, I, F>
    where
        B: GpuBackend,
        I: UiInput + ?Sized,
        F: FontSource + ?Sized,
    {
        self.state.hot_item = NO_WIDGET;
        self.state.id_count = 1;
        UiFrame { ui: self, renderer, input, font, now }
    }

    #[inline]
    pub fn state(&self) -> UiState {
        self.state
    }

    #[inline]
    pub fn hot_item(&self) -> WidgetId {
        self.state.hot_item
    }

    #[inline]
    pub fn active_item(&self) -> WidgetId {
        self.state.active_item
    }

    #[inline]
    pub fn style(&self) -> &UiStyle {
        &self.style
    }

    pub fn style_mut(&mut self) -> &mut UiStyle {
        &mut self.style
    }
}

/// One frame of widget calls. Dropping it ends the frame.
pub struct UiFrame<'a, B, I, F>
where
    B: GpuBackend,
    I: UiInput + ?Sized,
    F: FontSource + ?Sized,
{
    pub(crate) ui: &'a mut Ui,
    pub(crate) renderer: &'a mut SceneRenderer<B>,
    pub(crate) input: &'a I,
    pub(crate) font: &'a mut F,
    pub(crate) now: Instant,
}

impl<'a, B, I, F> UiFrame<'a, B, I, F>
where
    B: GpuBackend,
    I: UiInput + ?Sized,
    F: FontSource + ?Sized,
{
    /// Ends the frame now instead of at the end of scope.
    pub fn end(self) {}

    #[inline]
    pub fn state(&self) -> UiState {
        self.ui.state
    }

    #[inline]
    pub fn style(&self) -> &UiStyle {
        &self.ui.style
    }

    pub(crate) fn next_id(&mut self) -> WidgetId {
        let id = self.ui.state.id_count;
        self.ui.state.id_count += 1;
        id
    }

    pub(crate) fn pointer_in(&self, rect: Rect) -> bool {
        self.input.pointer_position().is_some_and(|p| rect.contains(p))
    }

    /// Marks `id` hot and lets it claim a fresh press.
    pub(crate) fn claim(&mut self, id: WidgetId) {
        self.ui.state.hot_item = id;
        if self.ui.state.active_item == NO_WIDGET && self.input.button_down() {
            log::trace!("widget {id} took the press");
            self.ui.state.active_item = id;
        }
    }

    pub(crate) fn layout_text(&mut self, size: u32, text: &str) -> TextLayout {
        self.font.layout(self.renderer.backend_mut(), size, text)
    }

    pub(crate) fn draw_rect(&mut self, rect: Rect, colour: Color) {
        if rect.is_empty() {
            return;
        }
        // Scale also applies to the translation, so the offset is given in quad units.
        let transform = Transform {
            position: Vec3::new(rect.origin.x / rect.size.x, rect.origin.y / rect.size.y, self.ui.style.layer),
            scale: Vec3::new(rect.size.x, rect.size.y, 1.0),
            ..Transform::default()
        };
        let item = RenderItem::new(self.ui.quad, self.ui.white, transform).with_tint(colour);
        self.renderer.push_ui(item);
    }

    pub(crate) fn draw_text(&mut self, layout: &TextLayout, at: Vec2, colour: Color) {
        let Some(item) = layout.item else { return };
        let item = RenderItem {
            transform: Transform::at(at.x, at.y, self.ui.style.layer + 1.0),
            ..item
        }
        .with_tint(colour);
        self.renderer.push_ui(item);
    }
}

impl<'a, B, I, F> Drop for UiFrame<'a, B, I, F>
where
    B: GpuBackend,
    I: UiInput + ?Sized,
    F: FontSource + ?Sized,
{
    fn drop(&mut self) {
        if self.input.button_released() && self.ui.state.active_item != NO_WIDGET {
            log::trace!("widget {} released", self.ui.state.active_item);
            self.ui.state.active_item = NO_WIDGET;
        }
    }
}
