use crate::paint::Color;

use super::backend::MeshId;
use super::image::Image;
use super::mesh::Mesh;
use super::shader::ShaderId;
use super::transform::Transform;

/// One drawable for one frame.
///
/// `image` is the batching key: items are grouped by the whole atlas image, not by the
/// texture region they sample.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RenderItem {
    pub mesh: MeshId,
    pub index_count: u32,
    /// Program override. `None` uses the queue's default program.
    pub shader: Option<ShaderId>,
    pub image: Image,
    pub normal_map: Option<Image>,
    pub transform: Transform,
    pub tint: Option<Color>,
}

impl RenderItem {
    pub fn new(mesh: Mesh, image: Image, transform: Transform) -> Self {
        Self {
            mesh: mesh.id,
            index_count: mesh.index_count,
            shader: None,
            image,
            normal_map: None,
            transform,
            tint: None,
        }
    }

    pub fn with_tint(mut self, tint: Color) -> Self {
        self.tint = Some(tint);
        self
    }

    pub fn with_normal_map(mut self, normal_map: Image) -> Self {
        self.normal_map = Some(normal_map);
        self
    }

    pub fn with_shader(mut self, shader: ShaderId) -> Self {
        self.shader = Some(shader);
        self
    }

    #[inline]
    pub fn has_normal_map(&self) -> bool {
        self.normal_map.is_some()
    }
}

/// Anything that can be queued for drawing.
pub trait Renderable {
    fn render_items(&self) -> Vec<RenderItem>;
}

impl Renderable for RenderItem {
    fn render_items(&self) -> Vec<RenderItem> {
        vec![*self]
    }
}
