//! Procedural textures, so the demo runs without an asset directory.

use anyhow::Result;
use lantern_engine::render::{Atlas, GpuBackend, Image, Texture};

pub const TILE: u32 = 32;

/// Floor tile indices in the atlas.
pub const FLOOR_LIGHT: u32 = 0;
pub const FLOOR_DARK: u32 = 1;
pub const WALL: u32 = 2;
pub const MOSS: u32 = 3;

struct Canvas {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl Canvas {
    fn new(width: u32, height: u32) -> Self {
        Self { width, height, rgba: vec![0; (width * height * 4) as usize] }
    }

    fn put(&mut self, x: u32, y: u32, c: [u8; 4]) {
        let i = ((y * self.width + x) * 4) as usize;
        self.rgba[i..i + 4].copy_from_slice(&c);
    }

    /// Fills the `size` square at `(ox, oy)` with `f(local_x, local_y)`.
    fn tile(&mut self, ox: u32, oy: u32, size: u32, f: impl Fn(u32, u32) -> [u8; 4]) {
        for y in 0..size {
            for x in 0..size {
                self.put(ox + x, oy + y, f(x, y));
            }
        }
    }

    fn upload<B: GpuBackend + ?Sized>(&self, backend: &mut B) -> Result<Image> {
        Ok(Image::from_rgba(backend, self.width, self.height, &self.rgba)?)
    }
}

/// Cheap deterministic per-pixel jitter.
fn speckle(x: u32, y: u32, seed: u32) -> u8 {
    let mut h = x.wrapping_mul(374_761_393) ^ y.wrapping_mul(668_265_263) ^ seed.wrapping_mul(2_246_822_519);
    h = (h ^ (h >> 13)).wrapping_mul(1_274_126_177);
    (h >> 24) as u8 % 24
}

fn shade(base: [u8; 3], x: u32, y: u32, seed: u32) -> [u8; 4] {
    let d = speckle(x, y, seed);
    [base[0].saturating_add(d), base[1].saturating_add(d), base[2].saturating_add(d), 255]
}

/// 2 x 2 atlas of 32 px floor, wall and moss tiles.
pub fn floor_atlas<B: GpuBackend + ?Sized>(backend: &mut B) -> Result<Atlas> {
    let mut c = Canvas::new(TILE * 2, TILE * 2);

    c.tile(0, 0, TILE, |x, y| {
        let grout = x == 0 || y == 0;
        if grout { [60, 58, 64, 255] } else { shade([110, 106, 118], x, y, 1) }
    });
    c.tile(TILE, 0, TILE, |x, y| {
        let grout = x == 0 || y == 0;
        if grout { [50, 48, 54, 255] } else { shade([88, 84, 96], x, y, 2) }
    });
    c.tile(0, TILE, TILE, |x, y| {
        // Running-bond bricks, 8 px courses.
        let course = y / 8;
        let offset = if course % 2 == 0 { 0 } else { 8 };
        let mortar = y % 8 == 0 || (x + offset) % 16 == 0;
        if mortar { [70, 60, 55, 255] } else { shade([150, 80, 60], x, y, 3) }
    });
    c.tile(TILE, TILE, TILE, |x, y| {
        let blot = speckle(x / 4, y / 4, 4) > 12;
        if blot { shade([60, 110, 60], x, y, 5) } else { shade([100, 100, 110], x, y, 6) }
    });

    Ok(Atlas::new(c.upload(backend)?, TILE))
}

/// Four 16 px frames of a bobbing blob, in one strip.
pub fn walker_frames<B: GpuBackend + ?Sized>(backend: &mut B) -> Result<Vec<Texture>> {
    const SIZE: u32 = 16;
    const BOB: [i32; 4] = [0, 1, 2, 1];
    let mut c = Canvas::new(SIZE * 4, SIZE);

    for (frame, bob) in BOB.iter().enumerate() {
        c.tile(frame as u32 * SIZE, 0, SIZE, |x, y| {
            let dx = x as f32 - 7.5;
            let dy = y as f32 - 8.5 + *bob as f32;
            let r2 = dx * dx + dy * dy * 1.4;
            if r2 < 36.0 {
                let eye = (x == 5 || x == 10) && y as i32 == 6 - bob;
                if eye { [20, 20, 30, 255] } else { [230, 200, 90, 255] }
            } else {
                [0, 0, 0, 0]
            }
        });
    }

    let image = c.upload(backend)?;
    Ok((0..4)
        .map(|i| Texture::from_region(image, (i * SIZE) as f32, 0.0, SIZE as f32, SIZE as f32))
        .collect())
}

/// A 32 px crate and its normal map. Plank edges are bevelled outward.
pub fn crate_with_normals<B: GpuBackend + ?Sized>(backend: &mut B) -> Result<(Texture, Image)> {
    let mut colour = Canvas::new(TILE, TILE);
    let mut normal = Canvas::new(TILE, TILE);
    let last = TILE - 1;

    colour.tile(0, 0, TILE, |x, y| {
        let frame = x < 3 || y < 3 || x > last - 3 || y > last - 3;
        let brace = x.abs_diff(y) < 2;
        if frame || brace { shade([120, 80, 40], x, y, 7) } else { shade([170, 120, 60], x, y, 8) }
    });

    normal.tile(0, 0, TILE, |x, y| {
        // Tangent-space normal encoded as 0..255 around 128; +z faces the viewer.
        let nx = if x < 3 { -90 } else if x > last - 3 { 90 } else { 0 };
        let ny = if y < 3 { 90 } else if y > last - 3 { -90 } else { 0 };
        [(128 + nx) as u8, (128 + ny) as u8, 220, 255]
    });

    Ok((Texture::full(colour.upload(backend)?), normal.upload(backend)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lantern_engine::render::{GpuCall, RecordingBackend};

    #[test]
    fn atlas_has_four_tiles() {
        let mut gpu = RecordingBackend::new(800, 600);
        let atlas = floor_atlas(&mut gpu).unwrap();
        assert_eq!(atlas.tile_count(), 4);
        assert_eq!((atlas.image.width, atlas.image.height), (64, 64));
    }

    #[test]
    fn walker_frames_share_one_image() {
        let mut gpu = RecordingBackend::new(800, 600);
        let frames = walker_frames(&mut gpu).unwrap();
        assert_eq!(frames.len(), 4);
        assert!(frames.iter().all(|f| f.image == frames[0].image));
        let uploads = gpu.calls().iter().filter(|c| matches!(c, GpuCall::CreateImage { .. })).count();
        assert_eq!(uploads, 1);
    }

    #[test]
    fn crate_normal_map_is_a_separate_image() {
        let mut gpu = RecordingBackend::new(800, 600);
        let (tex, normal) = crate_with_normals(&mut gpu).unwrap();
        assert_ne!(tex.image, normal);
        assert_eq!((normal.width, normal.height), (TILE, TILE));
    }
}
