//! GPU device + surface management.
//!
//! Creates the wgpu device and queue, configures the window surface and presents
//! rendered frames.

mod gpu;

pub use gpu::{FrameOutcome, Gpu, GpuInit};
