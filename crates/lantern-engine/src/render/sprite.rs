use glam::Vec3;

use crate::paint::Color;

use super::backend::GpuBackend;
use super::image::{Image, Texture};
use super::item::{RenderItem, Renderable};
use super::mesh::Mesh;
use super::transform::Transform;

/// A textured quad centred on its position.
///
/// A sprite built from several textures of one image flips through them as an
/// animation; each frame's quad is uploaded once at construction.
#[derive(Debug, Clone)]
pub struct Sprite {
    pub transform: Transform,
    width: f32,
    height: f32,
    image: Option<Image>,
    frames: Vec<Mesh>,
    frame: usize,
    frame_time: f32,
    elapsed: f32,
    normal_map: Option<Image>,
    tint: Option<Color>,
}

impl Sprite {
    pub fn new<B: GpuBackend + ?Sized>(backend: &mut B, width: f32, height: f32, position: Vec3, texture: Texture) -> Self {
        Self::animated(backend, width, height, position, &[texture], 0.0)
    }

    /// Builds an animated sprite showing each texture for `frame_time` seconds.
    ///
    /// Frames are expected to share one image; the first frame's image is the
    /// batching key. An empty `textures` slice yields a sprite that draws nothing.
    pub fn animated<B: GpuBackend + ?Sized>(
        backend: &mut B,
        width: f32,
        height: f32,
        position: Vec3,
        textures: &[Texture],
        frame_time: f32,
    ) -> Self {
        let frames = textures.iter().map(|t| Mesh::quad(backend, width, height, t.uv)).collect();
        let image = textures.first().map(|t| t.image);
        if textures.iter().any(|t| Some(t.image) != image) {
            log::warn!("sprite frames span several images; batching by the first");
        }

        Self {
            transform: Transform { position, ..Transform::default() },
            width,
            height,
            image,
            frames,
            frame: 0,
            frame_time,
            elapsed: 0.0,
            normal_map: None,
            tint: None,
        }
    }

    pub fn with_normal_map(mut self, normal_map: Image) -> Self {
        self.normal_map = Some(normal_map);
        self
    }

    pub fn with_tint(mut self, tint: Color) -> Self {
        self.tint = Some(tint);
        self
    }

    /// Advances the animation clock by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        if self.frames.len() < 2 || self.frame_time <= 0.0 {
            return;
        }
        self.elapsed += dt;
        while self.elapsed >= self.frame_time {
            self.elapsed -= self.frame_time;
            self.frame = (self.frame + 1) % self.frames.len();
        }
    }

    #[inline]
    pub fn frame(&self) -> usize {
        self.frame
    }

    #[inline]
    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    pub fn set_position(&mut self, x: f32, y: f32) {
        self.transform.position.x = x;
        self.transform.position.y = y;
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.transform.position
    }
}

impl Renderable for Sprite {
    fn render_items(&self) -> Vec<RenderItem> {
        let (Some(mesh), Some(image)) = (self.frames.get(self.frame), self.image) else {
            return Vec::new();
        };
        let mut item = RenderItem::new(*mesh, image, self.transform);
        item.normal_map = self.normal_map;
        item.tint = self.tint;
        vec![item]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backend::ImageId;
    use crate::render::recording::RecordingBackend;

    fn sheet() -> Image {
        Image { id: ImageId(3), width: 64, height: 16 }
    }

    fn frames() -> Vec<Texture> {
        (0..4).map(|i| Texture::from_region(sheet(), i as f32 * 16.0, 0.0, 16.0, 16.0)).collect()
    }

    #[test]
    fn single_texture_sprite_yields_one_item() {
        let mut gpu = RecordingBackend::new(800, 600);
        let sprite = Sprite::new(&mut gpu, 32.0, 32.0, Vec3::new(10.0, 20.0, 1.0), Texture::full(sheet()));
        let items = sprite.render_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].image, sheet());
        assert_eq!(items[0].index_count, 6);
        assert_eq!(items[0].transform.position, Vec3::new(10.0, 20.0, 1.0));
        assert!(!items[0].has_normal_map());
    }

    #[test]
    fn normal_map_and_tint_are_carried() {
        let mut gpu = RecordingBackend::new(800, 600);
        let normal = Image { id: ImageId(9), width: 16, height: 16 };
        let sprite = Sprite::new(&mut gpu, 16.0, 16.0, Vec3::ZERO, Texture::full(sheet()))
            .with_normal_map(normal)
            .with_tint(Color::BLACK);
        let item = sprite.render_items()[0];
        assert_eq!(item.normal_map, Some(normal));
        assert_eq!(item.tint, Some(Color::BLACK));
    }

    #[test]
    fn animation_wraps_through_frames() {
        let mut gpu = RecordingBackend::new(800, 600);
        let mut sprite = Sprite::animated(&mut gpu, 16.0, 16.0, Vec3::ZERO, &frames(), 0.1);
        let first = sprite.render_items()[0].mesh;

        sprite.advance(0.25);
        assert_eq!(sprite.frame(), 2);
        assert_ne!(sprite.render_items()[0].mesh, first);

        sprite.advance(0.2);
        assert_eq!(sprite.frame(), 0);
        assert_eq!(sprite.render_items()[0].mesh, first);
    }

    #[test]
    fn empty_sprite_draws_nothing() {
        let mut gpu = RecordingBackend::new(800, 600);
        let sprite = Sprite::animated(&mut gpu, 16.0, 16.0, Vec3::ZERO, &[], 0.1);
        assert!(sprite.render_items().is_empty());
    }
}
