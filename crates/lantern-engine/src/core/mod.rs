//! Contracts between the runtime (platform loop) and the application.
//!
//! The application sees the window, GPU and input only through these contexts.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, InitCtx, WindowCtx};
