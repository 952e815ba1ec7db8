use winit::window::Window;

use crate::device::{FrameOutcome, Gpu};
use crate::input::Input;
use crate::render::{SceneRenderer, WgpuBackend};
use crate::time::FrameTime;
use crate::window::RuntimeCtx;

use super::app::AppControl;

/// Borrowed window handle with size queries.
pub struct WindowCtx<'a> {
    pub window: &'a Window,
}

impl<'a> WindowCtx<'a> {
    /// Returns the logical window size as `(width, height)`.
    pub fn logical_size(&self) -> (f32, f32) {
        let phys = self.window.inner_size();
        let logi: winit::dpi::LogicalSize<f64> = phys.to_logical(self.window.scale_factor());
        (logi.width as f32, logi.height as f32)
    }

    /// Returns the drawable size in physical pixels.
    pub fn physical_size(&self) -> (u32, u32) {
        let phys = self.window.inner_size();
        (phys.width, phys.height)
    }
}

/// Context passed to [`App::init`](super::App::init).
pub struct InitCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a Gpu<'w>,
    pub runtime: &'a mut RuntimeCtx,
}

impl<'a, 'w> InitCtx<'a, 'w> {
    /// A backend sharing this window's device, queue and surface format.
    pub fn create_backend(&self) -> WgpuBackend {
        self.gpu.create_backend()
    }
}

/// Per-frame context passed to [`App::on_frame`](super::App::on_frame).
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `Gpu<'w>`
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a mut Gpu<'w>,
    pub input: &'a Input,
    pub time: FrameTime,
    pub runtime: &'a mut RuntimeCtx,
}

impl<'a, 'w> FrameCtx<'a, 'w> {
    /// Renders the renderer's open frame to the window and presents it.
    ///
    /// On a recoverable surface error the frame is dropped; the next `begin_scene`
    /// discards whatever was queued. Returns `Exit` only on a fatal surface error.
    pub fn present(&mut self, renderer: &mut SceneRenderer<WgpuBackend>) -> AppControl {
        match self.gpu.present(self.window.window, renderer) {
            FrameOutcome::Fatal => AppControl::Exit,
            FrameOutcome::Presented | FrameOutcome::Skipped => AppControl::Continue,
        }
    }
}
