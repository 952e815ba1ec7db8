use bytemuck::{Pod, Zeroable};

use super::backend::{GpuBackend, MeshId};
use super::image::UvRect;

// ── vertex ────────────────────────────────────────────────────────────────

/// Vertex layout shared by every program: position (x, y, z) + texture coordinate.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, u: f32, v: f32) -> Self {
        Self { position: [x, y, z], uv: [u, v] }
    }

    const ATTRS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];

    pub(crate) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Index order for one quad whose corners are listed top-left, top-right,
/// bottom-right, bottom-left.
pub const QUAD_INDICES: [u32; 6] = [0, 1, 3, 1, 2, 3];

// ── mesh handle ───────────────────────────────────────────────────────────

/// Uploaded geometry plus the number of indices to draw.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Mesh {
    pub id: MeshId,
    pub index_count: u32,
}

impl Mesh {
    pub fn upload<B: GpuBackend + ?Sized>(backend: &mut B, vertices: &[Vertex], indices: &[u32]) -> Self {
        let id = backend.create_mesh(vertices, indices);
        Self { id, index_count: indices.len() as u32 }
    }

    /// A `width` x `height` quad centred on the origin.
    pub fn quad<B: GpuBackend + ?Sized>(backend: &mut B, width: f32, height: f32, uv: UvRect) -> Self {
        let vertices = quad_vertices(width, height, uv);
        Self::upload(backend, &vertices, &QUAD_INDICES)
    }

    /// Full-screen quad in clip space used by the post-process pass.
    pub fn screen_quad<B: GpuBackend + ?Sized>(backend: &mut B) -> Self {
        Self::upload(backend, &SCREEN_QUAD, &QUAD_INDICES)
    }
}

/// Corners of a centred quad, top-left first. Y grows downward, so the top edge
/// samples `v_min`.
pub fn quad_vertices(width: f32, height: f32, uv: UvRect) -> [Vertex; 4] {
    let (w2, h2) = (width / 2.0, height / 2.0);
    [
        Vertex::new(-w2, -h2, 0.0, uv.u_min, uv.v_min),
        Vertex::new(w2, -h2, 0.0, uv.u_max, uv.v_min),
        Vertex::new(w2, h2, 0.0, uv.u_max, uv.v_max),
        Vertex::new(-w2, h2, 0.0, uv.u_min, uv.v_max),
    ]
}

/// Clip-space corners. Clip +Y is up while texture rows start at the top, so the
/// upper corners sample v = 0.
pub const SCREEN_QUAD: [Vertex; 4] = [
    Vertex::new(-1.0, 1.0, 0.0, 0.0, 0.0),
    Vertex::new(1.0, 1.0, 0.0, 1.0, 0.0),
    Vertex::new(1.0, -1.0, 0.0, 1.0, 1.0),
    Vertex::new(-1.0, -1.0, 0.0, 0.0, 1.0),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_is_centred() {
        let v = quad_vertices(10.0, 4.0, UvRect::FULL);
        assert_eq!(v[0].position, [-5.0, -2.0, 0.0]);
        assert_eq!(v[2].position, [5.0, 2.0, 0.0]);
    }

    #[test]
    fn quad_uses_region_uvs() {
        let uv = UvRect { u_min: 0.25, u_max: 0.5, v_min: 0.0, v_max: 0.5 };
        let v = quad_vertices(1.0, 1.0, uv);
        assert_eq!(v[0].uv, [0.25, 0.0]);
        assert_eq!(v[1].uv, [0.5, 0.0]);
        assert_eq!(v[2].uv, [0.5, 0.5]);
        assert_eq!(v[3].uv, [0.25, 0.5]);
    }

    #[test]
    fn quad_indices_cover_both_triangles() {
        let mut used = QUAD_INDICES.to_vec();
        used.sort_unstable();
        used.dedup();
        assert_eq!(used, vec![0, 1, 2, 3]);
    }

    #[test]
    fn vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 20);
    }
}
