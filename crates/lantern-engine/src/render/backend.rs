//! Capability interface between the scene renderer and a GPU implementation.
//!
//! The renderer speaks a small state-machine vocabulary (bind a target, set depth/blend
//! state, bind textures to units, bind a mesh, draw). Implementations either translate
//! it into real GPU work (`WgpuBackend`) or record it (`RecordingBackend`).

use super::error::GpuError;
use super::mesh::Vertex;

/// Handle to a compiled program (vertex + fragment stage).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub(crate) u32);

/// Handle to a GPU texture.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ImageId(pub(crate) u32);

/// Handle to an uploaded vertex/index buffer pair.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub(crate) u32);

/// Handle to an offscreen colour + depth target.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct FramebufferId(pub(crate) u32);

/// Opaque uniform location within a program.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct UniformLocation(pub(crate) u32);

impl ProgramId {
    /// Raw index, useful for logging.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl ImageId {
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Texture units available to programs.
///
/// Unit 0 is the main colour texture, unit 1 the normal map.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TextureUnit {
    Color,
    Normal,
}

impl TextureUnit {
    #[inline]
    pub fn slot(self) -> usize {
        match self {
            TextureUnit::Color => 0,
            TextureUnit::Normal => 1,
        }
    }
}

/// Where draw calls land.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum RenderTarget {
    Offscreen(FramebufferId),
    Screen,
}

/// Buffer clear request.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Clear {
    pub color: Option<[f32; 4]>,
    pub depth: bool,
}

impl Clear {
    pub const fn color_and_depth(color: [f32; 4]) -> Self {
        Self { color: Some(color), depth: true }
    }

    pub const fn color(color: [f32; 4]) -> Self {
        Self { color: Some(color), depth: false }
    }

    pub const fn depth() -> Self {
        Self { color: None, depth: true }
    }
}

/// Value written to a uniform.
///
/// Arrays are written element by element starting at the location; a shorter array
/// leaves the trailing elements untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat4([[f32; 4]; 4]),
    Vec3Array(Vec<[f32; 3]>),
    Vec4Array(Vec<[f32; 4]>),
}

/// An offscreen target and the image holding its colour attachment.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Framebuffer {
    pub id: FramebufferId,
    pub color: ImageId,
    pub width: u32,
    pub height: u32,
}

/// GPU operations used by the scene renderer and the collaborators that build
/// resources (fonts, sprites, tilemaps).
///
/// State set through `bind_target`, `set_depth_test`, `set_blending`, `bind_texture`,
/// `use_program` and `bind_mesh` persists until changed, the way a GL context does.
pub trait GpuBackend {
    /// Compiles and links a program. `label` is used for diagnostics only.
    fn compile_program(
        &mut self,
        label: &str,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<ProgramId, GpuError>;

    /// Queries the location of a named uniform. `None` when the program has no such
    /// uniform. Callers are expected to cache the answer.
    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation>;

    fn use_program(&mut self, program: ProgramId);

    /// Writes a uniform value into `program`'s uniform storage.
    fn set_uniform(&mut self, program: ProgramId, location: UniformLocation, value: &UniformValue);

    fn create_mesh(&mut self, vertices: &[Vertex], indices: &[u32]) -> MeshId;

    /// Releases a mesh. Draws already recorded this frame may still use it; the id
    /// must not be bound afterwards.
    fn destroy_mesh(&mut self, mesh: MeshId);

    /// Uploads tightly packed RGBA8 pixels.
    fn create_image(&mut self, width: u32, height: u32, rgba: &[u8]) -> Result<ImageId, GpuError>;

    fn create_framebuffer(&mut self, width: u32, height: u32) -> Framebuffer;

    fn bind_target(&mut self, target: RenderTarget);

    fn set_viewport(&mut self, x: u32, y: u32, width: u32, height: u32);

    fn set_depth_test(&mut self, enabled: bool);

    /// Enables or disables (SRC_ALPHA, ONE_MINUS_SRC_ALPHA) blending.
    fn set_blending(&mut self, enabled: bool);

    fn clear(&mut self, clear: Clear);

    fn bind_texture(&mut self, unit: TextureUnit, image: ImageId);

    fn bind_mesh(&mut self, mesh: MeshId);

    fn draw_indexed(&mut self, index_count: u32);

    /// Size of the screen target in physical pixels.
    fn screen_size(&self) -> (u32, u32);
}

/// Validates an RGBA8 upload before it reaches a backend.
pub(crate) fn check_rgba_len(width: u32, height: u32, rgba: &[u8]) -> Result<(), GpuError> {
    if width == 0 || height == 0 {
        return Err(GpuError::InvalidImage(format!("zero-sized image {width}x{height}")));
    }
    let expected = width as usize * height as usize * 4;
    if rgba.len() != expected {
        return Err(GpuError::InvalidImage(format!(
            "expected {expected} bytes for {width}x{height} RGBA8, got {}",
            rgba.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba_len_matches_dimensions() {
        assert!(check_rgba_len(2, 2, &[0; 16]).is_ok());
    }

    #[test]
    fn rgba_len_mismatch_is_rejected() {
        let err = check_rgba_len(2, 2, &[0; 12]).unwrap_err();
        assert!(matches!(err, GpuError::InvalidImage(_)));
    }

    #[test]
    fn zero_sized_image_is_rejected() {
        assert!(check_rgba_len(0, 4, &[]).is_err());
    }

    #[test]
    fn texture_unit_slots() {
        assert_eq!(TextureUnit::Color.slot(), 0);
        assert_eq!(TextureUnit::Normal.slot(), 1);
    }
}
