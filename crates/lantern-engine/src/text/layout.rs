use std::collections::HashMap;

use glam::Vec2;

use crate::render::{GpuBackend, Image, Mesh, RenderItem, Transform, UvRect, Vertex};

/// Result of laying out one string.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TextLayout {
    /// Glyph quads anchored at the top-left corner. `None` for strings with no
    /// visible glyphs.
    pub item: Option<RenderItem>,
    /// Width and height in pixels.
    pub extent: Vec2,
}

impl TextLayout {
    pub fn empty(line_height: f32) -> Self {
        Self { item: None, extent: Vec2::new(0.0, line_height) }
    }
}

/// What the UI needs from a font.
pub trait FontSource {
    /// Lays out `text` at pixel `size`. Implementations memoize by `(size, text)`.
    fn layout(&mut self, backend: &mut dyn GpuBackend, size: u32, text: &str) -> TextLayout;

    /// Whether `ch` can be drawn.
    fn supports(&self, ch: char) -> bool;

    /// Mean horizontal advance at `size`, used to size text boxes in characters.
    fn average_advance(&mut self, size: u32) -> f32;
}

/// Placement of one rasterized glyph, y measured down from the line top.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GlyphMetrics {
    pub uv: UvRect,
    pub width: f32,
    pub height: f32,
    /// Offset from the pen position to the bitmap's left edge.
    pub left: f32,
    /// Offset from the line top to the bitmap's top edge.
    pub top: f32,
    pub advance: f32,
}

/// Builds glyph quads for `text`. Characters missing from `glyphs` advance by
/// `fallback_advance`; `'\n'` starts a new line.
pub(crate) fn text_mesh(
    glyphs: &HashMap<char, GlyphMetrics>,
    text: &str,
    line_height: f32,
    fallback_advance: f32,
) -> (Vec<Vertex>, Vec<u32>, Vec2) {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    let (mut pen_x, mut line_top, mut width) = (0.0f32, 0.0f32, 0.0f32);

    for ch in text.chars() {
        if ch == '\n' {
            width = width.max(pen_x);
            pen_x = 0.0;
            line_top += line_height;
            continue;
        }
        let Some(g) = glyphs.get(&ch) else {
            pen_x += fallback_advance;
            continue;
        };

        if g.width > 0.0 && g.height > 0.0 {
            let x0 = (pen_x + g.left).round();
            let y0 = (line_top + g.top).round();
            let (x1, y1) = (x0 + g.width, y0 + g.height);
            let base = vertices.len() as u32;
            vertices.extend_from_slice(&[
                Vertex::new(x0, y0, 0.0, g.uv.u_min, g.uv.v_min),
                Vertex::new(x1, y0, 0.0, g.uv.u_max, g.uv.v_min),
                Vertex::new(x1, y1, 0.0, g.uv.u_max, g.uv.v_max),
                Vertex::new(x0, y1, 0.0, g.uv.u_min, g.uv.v_max),
            ]);
            indices.extend_from_slice(&[base, base + 1, base + 3, base + 1, base + 2, base + 3]);
        }
        pen_x += g.advance;
    }

    let extent = Vec2::new(width.max(pen_x), line_top + line_height);
    (vertices, indices, extent)
}

/// Uploads a laid-out string as a render item sampling `atlas`.
pub(crate) fn upload_layout(
    backend: &mut dyn GpuBackend,
    atlas: Image,
    vertices: &[Vertex],
    indices: &[u32],
    extent: Vec2,
) -> TextLayout {
    if indices.is_empty() {
        return TextLayout { item: None, extent };
    }
    let mesh = Mesh::upload(backend, vertices, indices);
    TextLayout { item: Some(RenderItem::new(mesh, atlas, Transform::default())), extent }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyph(advance: f32) -> GlyphMetrics {
        GlyphMetrics {
            uv: UvRect::FULL,
            width: advance - 2.0,
            height: 10.0,
            left: 1.0,
            top: 2.0,
            advance,
        }
    }

    fn glyphs() -> HashMap<char, GlyphMetrics> {
        [('a', glyph(8.0)), ('b', glyph(10.0)), (' ', GlyphMetrics { width: 0.0, ..glyph(4.0) })]
            .into_iter()
            .collect()
    }

    #[test]
    fn pen_advances_per_glyph() {
        let (vertices, indices, extent) = text_mesh(&glyphs(), "ab", 16.0, 6.0);
        assert_eq!(indices.len(), 12);
        assert_eq!(vertices[0].position, [1.0, 2.0, 0.0]);
        assert_eq!(vertices[4].position, [9.0, 2.0, 0.0]);
        assert_eq!(extent, Vec2::new(18.0, 16.0));
    }

    #[test]
    fn blank_glyphs_only_advance() {
        let (_, indices, extent) = text_mesh(&glyphs(), "a a", 16.0, 6.0);
        assert_eq!(indices.len(), 12);
        assert_eq!(extent.x, 20.0);
    }

    #[test]
    fn newline_starts_next_line() {
        let (vertices, _, extent) = text_mesh(&glyphs(), "ab\na", 16.0, 6.0);
        assert_eq!(vertices[8].position, [1.0, 18.0, 0.0]);
        assert_eq!(extent, Vec2::new(18.0, 32.0));
    }

    #[test]
    fn unknown_characters_use_fallback_advance() {
        let (_, indices, extent) = text_mesh(&glyphs(), "é", 16.0, 6.0);
        assert!(indices.is_empty());
        assert_eq!(extent.x, 6.0);
    }
}
