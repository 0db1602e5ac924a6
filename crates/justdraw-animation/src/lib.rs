//! # JustDraw Animation
//!
//! Frame timing, frame-rate independent interpolation and the frame loop
//! that drives a sketch's `setup` and `draw` callbacks.
//!
//! ## Features
//!
//! - **FrameTiming**: target framerate, measured fps and the frame counter
//! - **Interpolation**: `lerp`, `lerp_fixed`, `lerp_or_finish`, `lerp_color`
//! - **Frame loop**: `Sketch` callbacks paced by a `FrameScheduler`
//!
//! ## Architecture
//!
//! ```text
//! FrameLoop
//!    ├── Sketch (setup once, draw per frame)
//!    ├── FrameTiming (framerate, fps, frames)
//!    └── FrameScheduler
//!           ├── SleepScheduler (wall clock)
//!           └── ManualScheduler (fixed steps)
//! ```

mod frame_loop;
mod timing;

pub use frame_loop::{
    Frame, FrameLoop, FrameScheduler, LoopState, ManualScheduler, Sketch, SetupFlow,
    SleepScheduler,
};
pub use timing::{lerp_color, FrameTiming, Pace, DEFAULT_FRAMERATE};
