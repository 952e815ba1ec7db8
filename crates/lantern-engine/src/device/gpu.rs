use anyhow::{Context, Result};
use wgpu::SurfaceError;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::render::{SceneRenderer, WgpuBackend};

/// Surface preferences for the window the engine draws into.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Pick an sRGB swapchain format when the surface offers one.
    pub prefer_srgb: bool,
    /// FIFO doubles as the frame limiter.
    pub present_mode: wgpu::PresentMode,
    /// Frames the CPU may queue ahead of presentation. A hint.
    pub frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
            frame_latency: 2,
        }
    }
}

/// What became of one call to [`Gpu::present`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameOutcome {
    Presented,
    /// Nothing reached the screen; the next frame can try again.
    Skipped,
    /// The surface cannot be recovered.
    Fatal,
}

/// How to respond to a failed surface acquire.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Recovery {
    Reconfigure,
    Skip,
    Fatal,
}

fn recovery(err: &SurfaceError) -> Recovery {
    match err {
        SurfaceError::Lost | SurfaceError::Outdated => Recovery::Reconfigure,
        SurfaceError::Timeout | SurfaceError::Other => Recovery::Skip,
        SurfaceError::OutOfMemory => Recovery::Fatal,
    }
}

/// Device, queue and window surface.
///
/// The surface borrows the window for `'w`; the runtime keeps both in one
/// self-referential entry so the window outlives the `Gpu`.
pub struct Gpu<'w> {
    surface: wgpu::Surface<'w>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    /// Last size reported by the window. May be zero while minimized.
    size: PhysicalSize<u32>,
}

impl<'w> Gpu<'w> {
    pub async fn new(window: &'w Window, init: GpuInit) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window).context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let info = adapter.get_info();
        log::info!("using adapter `{}` ({:?}, {:?})", info.name, info.backend, info.device_type);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("lantern device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let caps = surface.get_capabilities(&adapter);
        let format = choose_surface_format(&caps.formats, init.prefer_srgb)
            .context("no supported surface formats")?;
        let alpha_mode = caps.alpha_modes.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = surface_config(&init, format, alpha_mode, size);
        surface.configure(&device, &config);
        log::debug!("surface configured: {format:?} {}x{}", config.width, config.height);

        Ok(Gpu { surface, device, queue, config, size })
    }

    /// A backend sharing this window's device, queue and surface format.
    pub fn create_backend(&self) -> WgpuBackend {
        WgpuBackend::new(
            self.device.clone(),
            self.queue.clone(),
            self.config.format,
            (self.config.width, self.config.height),
        )
    }

    /// Reconfigures the surface. A zero size is remembered and configuration waits
    /// for the next non-zero one.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.size = new_size;
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
    }

    /// Renders `renderer`'s open frame into the next swapchain image and presents it.
    ///
    /// When nothing is presented the renderer's queues are left untouched; the next
    /// `begin_scene` discards them.
    pub fn present(&mut self, window: &Window, renderer: &mut SceneRenderer<WgpuBackend>) -> FrameOutcome {
        if self.size.width == 0 || self.size.height == 0 {
            return FrameOutcome::Skipped;
        }
        renderer.backend_mut().resize(self.config.width, self.config.height);

        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(err) => {
                log::warn!("surface error: {err}");
                return match recovery(&err) {
                    Recovery::Reconfigure => {
                        self.surface.configure(&self.device, &self.config);
                        FrameOutcome::Skipped
                    }
                    Recovery::Skip => FrameOutcome::Skipped,
                    Recovery::Fatal => FrameOutcome::Fatal,
                };
            }
        };
        let view = surface_texture.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("lantern frame encoder") });

        renderer.render();
        renderer.backend_mut().flush(&mut encoder, &view);

        window.pre_present_notify();
        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        FrameOutcome::Presented
    }
}

fn surface_config(
    init: &GpuInit,
    format: wgpu::TextureFormat,
    alpha_mode: wgpu::CompositeAlphaMode,
    size: PhysicalSize<u32>,
) -> wgpu::SurfaceConfiguration {
    wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: size.width.max(1),
        height: size.height.max(1),
        present_mode: init.present_mode,
        alpha_mode,
        view_formats: vec![],
        desired_maximum_frame_latency: init.frame_latency,
    }
}

fn choose_surface_format(formats: &[wgpu::TextureFormat], prefer_srgb: bool) -> Option<wgpu::TextureFormat> {
    let first = *formats.first()?;
    if prefer_srgb {
        let preferred = [wgpu::TextureFormat::Bgra8UnormSrgb, wgpu::TextureFormat::Rgba8UnormSrgb];
        if let Some(f) = preferred.into_iter().find(|f| formats.contains(f)) {
            return Some(f);
        }
    }
    Some(first)
}
