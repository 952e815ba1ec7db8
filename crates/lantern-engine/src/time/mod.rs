//! Frame timing.
//!
//! - `FrameClock`: one per loop, `tick()` once per presented frame
//! - `FpsTicker`: frames-per-second samples from a background ticker thread

mod frame_clock;
mod ticker;

pub use frame_clock::{FrameClock, FrameTime};
pub use ticker::{FpsCounter, FpsSample, FpsTicker};
