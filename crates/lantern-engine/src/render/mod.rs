//! GPU rendering subsystem.
//!
//! Everything above [`GpuBackend`] is GPU-agnostic: the [`SceneRenderer`] records
//! draws through the trait, [`WgpuBackend`] replays them with wgpu, and
//! [`RecordingBackend`] captures them for tests.
//!
//! Convention:
//! - world and UI geometry are in pixels, top-left origin, +Y down
//! - the z translation of an item is its layer; larger is closer

mod backend;
mod camera;
mod error;
mod image;
mod item;
mod light;
mod mesh;
mod queue;
mod renderer;
mod shader;
mod sprite;
mod tilemap;
mod transform;

pub mod recording;
pub mod wgpu_backend;

pub use backend::{
    Clear, Framebuffer, FramebufferId, GpuBackend, ImageId, MeshId, ProgramId, RenderTarget,
    TextureUnit, UniformLocation, UniformValue,
};
pub use camera::{screen_projection, Camera2D, CAMERA_DEPTH};
pub use error::GpuError;
pub use image::{Atlas, Image, ImageLoadError, Texture, UvRect};
pub use item::{RenderItem, Renderable};
pub use light::{Light, LightUniforms, DEFAULT_FALLOFF, MAX_LIGHTS};
pub use mesh::{quad_vertices, Mesh, Vertex, QUAD_INDICES, SCREEN_QUAD};
pub use queue::{Batch, BatchQueue};
pub use recording::{DrawRecord, GpuCall, RecordingBackend};
pub use renderer::{
    RendererConfig, SceneRenderer, DEFAULT_POST, OBJECT_SHADER, POST_SHADER, UI_SHADER,
};
pub use shader::{uniforms, Shader, ShaderId};
pub use sprite::Sprite;
pub use tilemap::{TileLayer, Tilemap};
pub use transform::Transform;
pub use wgpu_backend::WgpuBackend;
