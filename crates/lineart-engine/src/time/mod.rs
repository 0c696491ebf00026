//! Time subsystem.
//!
//! Frame timing without coupling to the runtime. The runtime owns one
//! `FrameClock` per window and ticks it once per presented frame; the
//! resulting `FrameTime` carries the monotonic frame counter animations key off.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
