use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::render::{GpuBackend, Image, UvRect};

use super::cache::LayoutCache;
use super::layout::{text_mesh, upload_layout, FontSource, GlyphMetrics, TextLayout};
use super::packer::ShelfPacker;

/// Printable ASCII, the glyph set baked into every atlas.
const FIRST_GLYPH: char = ' ';
const LAST_GLYPH: char = '~';

const ATLAS_WIDTH: u32 = 512;
const ATLAS_MAX_HEIGHT: u32 = 4096;
const GLYPH_PADDING: u32 = 1;

/// Distinct strings whose meshes stay resident.
const LAYOUT_CACHE_CAPACITY: usize = 256;

/// Error returned when a font cannot be loaded.
#[derive(Debug)]
pub enum FontLoadError {
    Io(std::io::Error),
    Parse(String),
}

impl fmt::Display for FontLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontLoadError::Io(e) => write!(f, "font load error: {e}"),
            FontLoadError::Parse(msg) => write!(f, "font parse error: {msg}"),
        }
    }
}

impl std::error::Error for FontLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FontLoadError::Io(e) => Some(e),
            FontLoadError::Parse(_) => None,
        }
    }
}

/// Glyphs of one pixel size, packed into one image.
struct SizedAtlas {
    image: Image,
    glyphs: HashMap<char, GlyphMetrics>,
    line_height: f32,
    average_advance: f32,
}

/// A TrueType/OpenType font drawn from per-size glyph atlases.
///
/// Atlases are rasterized the first time a size is requested. Layouts are cached by
/// `(size, text)`; the least recently drawn ones are dropped along with their meshes
/// once more than a few hundred distinct strings have been laid out.
pub struct Font {
    font: fontdue::Font,
    atlases: HashMap<u32, SizedAtlas>,
    layouts: LayoutCache,
    warned_sizes: Vec<u32>,
}

impl Font {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FontLoadError> {
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| FontLoadError::Parse(e.to_string()))?;
        Ok(Self {
            font,
            atlases: HashMap::new(),
            layouts: LayoutCache::new(LAYOUT_CACHE_CAPACITY),
            warned_sizes: Vec::new(),
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, FontLoadError> {
        let bytes = std::fs::read(path.as_ref()).map_err(FontLoadError::Io)?;
        Self::from_bytes(&bytes)
    }

    /// Number of cached layouts.
    pub fn cached_layouts(&self) -> usize {
        self.layouts.len()
    }

    fn ensure_atlas(&mut self, backend: &mut dyn GpuBackend, size: u32) -> Option<&SizedAtlas> {
        if !self.atlases.contains_key(&size) {
            match rasterize(&self.font, backend, size) {
                Some(atlas) => {
                    log::info!("rasterized font atlas for {size}px ({} glyphs)", atlas.glyphs.len());
                    self.atlases.insert(size, atlas);
                }
                None => {
                    if !self.warned_sizes.contains(&size) {
                        log::error!("could not build a font atlas for {size}px");
                        self.warned_sizes.push(size);
                    }
                    return None;
                }
            }
        }
        self.atlases.get(&size)
    }
}

fn rasterize(font: &fontdue::Font, backend: &mut dyn GpuBackend, size: u32) -> Option<SizedAtlas> {
    let px = size.max(1) as f32;
    let line = font.horizontal_line_metrics(px);
    let ascent = line.map(|l| l.ascent).unwrap_or(px);
    let line_height = line.map(|l| l.new_line_size).unwrap_or(px * 1.2).ceil();

    let mut packer = ShelfPacker::new(ATLAS_WIDTH, ATLAS_MAX_HEIGHT, GLYPH_PADDING);
    let mut placed = Vec::new();
    for ch in FIRST_GLYPH..=LAST_GLYPH {
        let (metrics, coverage) = font.rasterize(ch, px);
        let (w, h) = (metrics.width as u32, metrics.height as u32);
        let pos = if w == 0 || h == 0 { (0, 0) } else { packer.place(w, h)? };
        placed.push((ch, metrics, coverage, pos));
    }

    let height = packer.used_height().next_power_of_two();
    let mut rgba = vec![0u8; (ATLAS_WIDTH * height * 4) as usize];
    let (aw, ah) = (ATLAS_WIDTH as f32, height as f32);
    let mut glyphs = HashMap::with_capacity(placed.len());
    let mut advance_sum = 0.0;

    for (ch, m, coverage, (gx, gy)) in &placed {
        for row in 0..m.height {
            for col in 0..m.width {
                let alpha = coverage[row * m.width + col];
                let i = (((*gy as usize + row) * ATLAS_WIDTH as usize) + *gx as usize + col) * 4;
                rgba[i..i + 4].copy_from_slice(&[255, 255, 255, alpha]);
            }
        }

        let (w, h) = (m.width as f32, m.height as f32);
        glyphs.insert(
            *ch,
            GlyphMetrics {
                uv: UvRect {
                    u_min: *gx as f32 / aw,
                    u_max: (*gx as f32 + w) / aw,
                    v_min: *gy as f32 / ah,
                    v_max: (*gy as f32 + h) / ah,
                },
                width: w,
                height: h,
                left: m.xmin as f32,
                // fontdue measures ymin upward from the baseline.
                top: ascent - (m.ymin as f32 + h),
                advance: m.advance_width,
            },
        );
        advance_sum += m.advance_width;
    }

    let image = match Image::from_rgba(backend, ATLAS_WIDTH, height, &rgba) {
        Ok(image) => image,
        Err(e) => {
            log::error!("font atlas upload failed: {e}");
            return None;
        }
    };

    Some(SizedAtlas {
        image,
        average_advance: advance_sum / placed.len().max(1) as f32,
        glyphs,
        line_height,
    })
}

impl FontSource for Font {
    fn layout(&mut self, backend: &mut dyn GpuBackend, size: u32, text: &str) -> TextLayout {
        if let Some(cached) = self.layouts.get(size, text) {
            return cached;
        }

        let Some(atlas) = self.ensure_atlas(backend, size) else {
            return TextLayout::empty(size as f32);
        };
        let fallback = atlas.glyphs.get(&'?').map(|g| g.advance).unwrap_or(atlas.average_advance);
        let (vertices, indices, extent) = text_mesh(&atlas.glyphs, text, atlas.line_height, fallback);
        let image = atlas.image;

        let layout = upload_layout(backend, image, &vertices, &indices, extent);
        self.layouts.insert(backend, size, text, layout);
        layout
    }

    fn supports(&self, ch: char) -> bool {
        (FIRST_GLYPH..=LAST_GLYPH).contains(&ch)
    }

    fn average_advance(&mut self, size: u32) -> f32 {
        if let Some(atlas) = self.atlases.get(&size) {
            return atlas.average_advance;
        }
        let px = size.max(1) as f32;
        let sum: f32 = (FIRST_GLYPH..=LAST_GLYPH).map(|ch| self.font.metrics(ch, px).advance_width).sum();
        sum / (LAST_GLYPH as u32 - FIRST_GLYPH as u32 + 1) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_are_a_parse_error() {
        let err = Font::from_bytes(b"definitely not a font").err();
        assert!(matches!(err, Some(FontLoadError::Parse(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Font::load("/nonexistent/lantern/font.ttf").err();
        assert!(matches!(err, Some(FontLoadError::Io(_))));
    }

    #[test]
    fn glyph_range_is_printable_ascii() {
        assert_eq!(LAST_GLYPH as u32 - FIRST_GLYPH as u32 + 1, 95);
    }
}
