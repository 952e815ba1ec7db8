use crate::physics::Collider;

use super::backend::GpuBackend;
use super::image::{Atlas, Texture};
use super::item::{RenderItem, Renderable};
use super::mesh::{Mesh, Vertex};
use super::transform::Transform;

// ── layers ────────────────────────────────────────────────────────────────

/// A `width` x `height` grid of atlas tile indices. `None` is an empty cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileLayer {
    width: u32,
    height: u32,
    tiles: Vec<Option<u32>>,
}

impl TileLayer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, tiles: vec![None; (width * height) as usize] }
    }

    pub fn filled(width: u32, height: u32, tile: u32) -> Self {
        Self { width, height, tiles: vec![Some(tile); (width * height) as usize] }
    }

    /// Row-major cells. `None` when the cell count does not match the size.
    pub fn from_cells(width: u32, height: u32, tiles: Vec<Option<u32>>) -> Option<Self> {
        (tiles.len() == (width * height) as usize).then_some(Self { width, height, tiles })
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn get(&self, col: u32, row: u32) -> Option<u32> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.tiles[(row * self.width + col) as usize]
    }

    /// Out-of-range cells are ignored.
    pub fn set(&mut self, col: u32, row: u32, tile: Option<u32>) {
        if col < self.width && row < self.height {
            self.tiles[(row * self.width + col) as usize] = tile;
        }
    }
}

// ── tilemap ───────────────────────────────────────────────────────────────

/// Layered tile grid drawn as a single mesh, with an optional collision layer.
///
/// Layer `n` sits at depth `n`, so later layers cover earlier ones. The top-left tile
/// corner is the world origin.
#[derive(Debug, Clone)]
pub struct Tilemap {
    width: u32,
    height: u32,
    tile_size: u32,
    atlas: Atlas,
    collision: Option<TileLayer>,
    mesh: Mesh,
}

impl Tilemap {
    /// Bakes `layers` into one mesh. `tile_size` is the on-screen tile size in pixels.
    ///
    /// The grid size comes from the first layer; layers of another size are skipped.
    pub fn new<B: GpuBackend + ?Sized>(
        backend: &mut B,
        atlas: Atlas,
        tile_size: u32,
        layers: &[TileLayer],
        collision: Option<TileLayer>,
    ) -> Self {
        let tile_size = tile_size.max(1);
        let (width, height) = layers.first().map(TileLayer::size).unwrap_or((0, 0));
        let mut kept = Vec::with_capacity(layers.len());
        for (i, layer) in layers.iter().enumerate() {
            if layer.size() == (width, height) {
                kept.push(layer);
            } else {
                log::warn!("tile layer {i} is {:?}, expected {:?}; skipped", layer.size(), (width, height));
            }
        }

        let collision = collision.filter(|c| {
            let ok = c.size() == (width, height);
            if !ok {
                log::warn!("collision layer size {:?} does not match the map; ignored", c.size());
            }
            ok
        });

        let tiles = atlas.tiles();
        let (vertices, indices) = tile_mesh(&kept, &tiles, tile_size);
        let mesh = Mesh::upload(backend, &vertices, &indices);
        log::debug!("tilemap {width}x{height}, {} layers, {} quads", kept.len(), indices.len() / 6);

        Self { width, height, tile_size, atlas, collision, mesh }
    }

    /// Map extent in pixels.
    pub fn pixel_size(&self) -> (u32, u32) {
        (self.width * self.tile_size, self.height * self.tile_size)
    }

    #[inline]
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// True when `(x, y)` is outside the map or on a collision tile.
    pub fn collides_point(&self, x: i32, y: i32) -> bool {
        let (w, h) = self.pixel_size();
        if x < 0 || y < 0 || x >= w as i32 || y >= h as i32 {
            return true;
        }
        self.solid_at(x as u32 / self.tile_size, y as u32 / self.tile_size)
    }

    /// True when any part of `collider` leaves the map or overlaps a collision tile.
    pub fn collides_collider(&self, collider: &Collider) -> bool {
        let (w, h) = self.pixel_size();
        if collider.x < 0 || collider.y < 0 || collider.right() > w as i32 || collider.bottom() > h as i32 {
            return true;
        }
        if collider.width <= 0 || collider.height <= 0 {
            return false;
        }

        let ts = self.tile_size;
        let (first_col, first_row) = (collider.x as u32 / ts, collider.y as u32 / ts);
        let (last_col, last_row) = ((collider.right() - 1) as u32 / ts, (collider.bottom() - 1) as u32 / ts);
        (first_row..=last_row).any(|row| (first_col..=last_col).any(|col| self.solid_at(col, row)))
    }

    fn solid_at(&self, col: u32, row: u32) -> bool {
        self.collision.as_ref().is_some_and(|c| c.get(col, row).is_some())
    }
}

impl Renderable for Tilemap {
    fn render_items(&self) -> Vec<RenderItem> {
        if self.mesh.index_count == 0 {
            return Vec::new();
        }
        vec![RenderItem::new(self.mesh, self.atlas.image, Transform::default())]
    }
}

/// One quad per non-empty cell, layer index as z.
fn tile_mesh(layers: &[&TileLayer], tiles: &[Texture], tile_size: u32) -> (Vec<Vertex>, Vec<u32>) {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    let size = tile_size as f32;

    for (z, layer) in layers.iter().enumerate() {
        let z = z as f32;
        for row in 0..layer.height {
            for col in 0..layer.width {
                let Some(tile) = layer.get(col, row) else { continue };
                let Some(texture) = tiles.get(tile as usize) else {
                    log::debug!("tile index {tile} outside the atlas; skipped");
                    continue;
                };

                let (x0, y0) = (col as f32 * size, row as f32 * size);
                let (x1, y1) = (x0 + size, y0 + size);
                let uv = texture.uv;
                let base = vertices.len() as u32;
                vertices.extend_from_slice(&[
                    Vertex::new(x0, y0, z, uv.u_min, uv.v_min),
                    Vertex::new(x1, y0, z, uv.u_max, uv.v_min),
                    Vertex::new(x1, y1, z, uv.u_max, uv.v_max),
                    Vertex::new(x0, y1, z, uv.u_min, uv.v_max),
                ]);
                indices.extend_from_slice(&[base, base + 1, base + 3, base + 1, base + 2, base + 3]);
            }
        }
    }

    (vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backend::ImageId;
    use crate::render::image::Image;
    use crate::render::recording::RecordingBackend;

    fn atlas() -> Atlas {
        Atlas::new(Image { id: ImageId(1), width: 32, height: 32 }, 16)
    }

    /// 4x3 map of 10 px tiles with a wall down column 2.
    fn walled_map(gpu: &mut RecordingBackend) -> Tilemap {
        let floor = TileLayer::filled(4, 3, 0);
        let mut walls = TileLayer::new(4, 3);
        for row in 0..3 {
            walls.set(2, row, Some(1));
        }
        Tilemap::new(gpu, atlas(), 10, &[floor], Some(walls))
    }

    #[test]
    fn layers_bake_into_one_mesh() {
        let mut gpu = RecordingBackend::new(800, 600);
        let floor = TileLayer::filled(4, 3, 0);
        let mut decor = TileLayer::new(4, 3);
        decor.set(1, 1, Some(3));
        let map = Tilemap::new(&mut gpu, atlas(), 10, &[floor, decor], None);

        let items = map.render_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].index_count, (12 + 1) * 6);
        assert_eq!(map.pixel_size(), (40, 30));
    }

    #[test]
    fn later_layers_sit_in_front() {
        let floor = TileLayer::filled(1, 1, 0);
        let top = TileLayer::filled(1, 1, 1);
        let (vertices, _) = tile_mesh(&[&floor, &top], &atlas().tiles(), 8);
        assert_eq!(vertices[0].position[2], 0.0);
        assert_eq!(vertices[4].position[2], 1.0);
        assert_eq!(vertices[2].position, [8.0, 8.0, 0.0]);
    }

    #[test]
    fn mismatched_layer_is_skipped() {
        let mut gpu = RecordingBackend::new(800, 600);
        let map = Tilemap::new(&mut gpu, atlas(), 10, &[TileLayer::filled(2, 2, 0), TileLayer::filled(3, 3, 0)], None);
        assert_eq!(map.render_items()[0].index_count, 4 * 6);
    }

    #[test]
    fn from_cells_checks_length() {
        assert!(TileLayer::from_cells(2, 2, vec![None; 4]).is_some());
        assert!(TileLayer::from_cells(2, 2, vec![None; 3]).is_none());
    }

    // ── collision ─────────────────────────────────────────────────────────

    #[test]
    fn points_hit_walls_and_bounds() {
        let mut gpu = RecordingBackend::new(800, 600);
        let map = walled_map(&mut gpu);
        assert!(!map.collides_point(5, 5));
        assert!(map.collides_point(25, 5));
        assert!(map.collides_point(-1, 5));
        assert!(map.collides_point(40, 5));
    }

    #[test]
    fn collider_overlapping_wall_collides() {
        let mut gpu = RecordingBackend::new(800, 600);
        let map = walled_map(&mut gpu);
        assert!(!map.collides_collider(&Collider { x: 0, y: 0, width: 10, height: 10 }));
        assert!(map.collides_collider(&Collider { x: 12, y: 0, width: 10, height: 10 }));
        // Right edge exactly on the wall boundary does not overlap it.
        assert!(!map.collides_collider(&Collider { x: 10, y: 0, width: 10, height: 10 }));
    }

    #[test]
    fn collider_leaving_the_map_collides() {
        let mut gpu = RecordingBackend::new(800, 600);
        let map = walled_map(&mut gpu);
        assert!(map.collides_collider(&Collider { x: 35, y: 25, width: 10, height: 10 }));
        assert!(map.collides_collider(&Collider { x: -2, y: 0, width: 4, height: 4 }));
    }

    #[test]
    fn map_without_collision_layer_is_open() {
        let mut gpu = RecordingBackend::new(800, 600);
        let map = Tilemap::new(&mut gpu, atlas(), 10, &[TileLayer::filled(4, 3, 0)], None);
        assert!(!map.collides_point(25, 5));
    }
}
