use std::fmt;
use std::path::{Path, PathBuf};

use super::backend::{GpuBackend, ImageId};
use super::error::GpuError;

// ── image ─────────────────────────────────────────────────────────────────

/// A GPU texture and its pixel dimensions.
///
/// Images own the GPU resource; [`Texture`]s only reference a region of one.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Image {
    pub id: ImageId,
    pub width: u32,
    pub height: u32,
}

impl Image {
    pub fn from_rgba<B: GpuBackend + ?Sized>(
        backend: &mut B,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<Self, GpuError> {
        let id = backend.create_image(width, height, rgba)?;
        Ok(Self { id, width, height })
    }

    /// A 1x1 image of a single colour.
    pub fn solid<B: GpuBackend + ?Sized>(backend: &mut B, rgba: [u8; 4]) -> Result<Self, GpuError> {
        Self::from_rgba(backend, 1, 1, &rgba)
    }

    /// Decodes an image file and uploads it as RGBA8.
    pub fn load<B: GpuBackend + ?Sized>(backend: &mut B, path: impl AsRef<Path>) -> Result<Self, ImageLoadError> {
        let path = path.as_ref();
        let decoded = ::image::open(path)
            .map_err(|source| ImageLoadError::Decode { path: path.to_path_buf(), source })?
            .to_rgba8();
        let (width, height) = decoded.dimensions();
        log::debug!("loaded image {} ({width}x{height})", path.display());
        Ok(Self::from_rgba(backend, width, height, decoded.as_raw())?)
    }
}

/// Error returned by [`Image::load`].
#[derive(Debug)]
pub enum ImageLoadError {
    Decode { path: PathBuf, source: ::image::ImageError },
    Gpu(GpuError),
}

impl fmt::Display for ImageLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageLoadError::Decode { path, source } => {
                write!(f, "failed to decode {}: {source}", path.display())
            }
            ImageLoadError::Gpu(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ImageLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImageLoadError::Decode { source, .. } => Some(source),
            ImageLoadError::Gpu(e) => Some(e),
        }
    }
}

impl From<GpuError> for ImageLoadError {
    fn from(e: GpuError) -> Self {
        ImageLoadError::Gpu(e)
    }
}

// ── texture ───────────────────────────────────────────────────────────────

/// Normalized sub-rectangle of an image.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct UvRect {
    pub u_min: f32,
    pub u_max: f32,
    pub v_min: f32,
    pub v_max: f32,
}

impl UvRect {
    pub const FULL: UvRect = UvRect { u_min: 0.0, u_max: 1.0, v_min: 0.0, v_max: 1.0 };
}

/// A region of a shared [`Image`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Texture {
    pub image: Image,
    pub uv: UvRect,
}

impl Texture {
    /// The whole image.
    pub fn full(image: Image) -> Self {
        Self { image, uv: UvRect::FULL }
    }

    /// A pixel region of `image`, converted to normalized coordinates.
    pub fn from_region(image: Image, x: f32, y: f32, width: f32, height: f32) -> Self {
        let (iw, ih) = (image.width as f32, image.height as f32);
        Self {
            image,
            uv: UvRect {
                u_min: x / iw,
                u_max: (x + width) / iw,
                v_min: y / ih,
                v_max: (y + height) / ih,
            },
        }
    }
}

// ── atlas ─────────────────────────────────────────────────────────────────

/// An image cut into a grid of equally sized square tiles, indexed row-major.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Atlas {
    pub image: Image,
    pub tile_size: u32,
    pub columns: u32,
    pub rows: u32,
}

impl Atlas {
    pub fn new(image: Image, tile_size: u32) -> Self {
        let tile_size = tile_size.max(1);
        Self {
            image,
            tile_size,
            columns: (image.width / tile_size).max(1),
            rows: (image.height / tile_size).max(1),
        }
    }

    pub fn tile_count(&self) -> u32 {
        self.columns * self.rows
    }

    /// Normalized top-left corner of tile `index`.
    pub fn offset(&self, index: u32) -> (f32, f32) {
        let col = index % self.columns;
        let row = index / self.columns;
        (col as f32 / self.columns as f32, row as f32 / self.rows as f32)
    }

    pub fn tile(&self, index: u32) -> Texture {
        let col = index % self.columns;
        let row = index / self.columns;
        let size = self.tile_size as f32;
        Texture::from_region(self.image, col as f32 * size, row as f32 * size, size, size)
    }

    /// Every tile in index order.
    pub fn tiles(&self) -> Vec<Texture> {
        (0..self.tile_count()).map(|i| self.tile(i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(width: u32, height: u32) -> Image {
        Image { id: ImageId(7), width, height }
    }

    #[test]
    fn region_is_normalized() {
        let t = Texture::from_region(image(64, 32), 16.0, 8.0, 16.0, 8.0);
        assert_eq!(t.uv, UvRect { u_min: 0.25, u_max: 0.5, v_min: 0.25, v_max: 0.5 });
    }

    #[test]
    fn regions_share_the_image() {
        let img = image(64, 64);
        let a = Texture::from_region(img, 0.0, 0.0, 32.0, 32.0);
        let b = Texture::from_region(img, 32.0, 0.0, 32.0, 32.0);
        assert_eq!(a.image.id, b.image.id);
    }

    // ── atlas ─────────────────────────────────────────────────────────────

    #[test]
    fn atlas_offset_walks_rows() {
        let atlas = Atlas::new(image(64, 64), 16);
        assert_eq!(atlas.offset(0), (0.0, 0.0));
        assert_eq!(atlas.offset(3), (0.75, 0.0));
        assert_eq!(atlas.offset(5), (0.25, 0.25));
    }

    #[test]
    fn atlas_tiles_cover_the_grid() {
        let atlas = Atlas::new(image(32, 16), 16);
        let tiles = atlas.tiles();
        assert_eq!(tiles.len(), 2);
        assert_eq!(tiles[1].uv.u_min, 0.5);
        assert_eq!(tiles[1].uv.v_max, 1.0);
    }
}
