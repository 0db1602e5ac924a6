//! Frame timing and interpolation.

use std::time::Duration;

use justdraw_common::{Color, DrawError, Result};
use tracing::{debug, trace};

/// Target framerate a new loop starts with.
pub const DEFAULT_FRAMERATE: f64 = 60.0;

/// How the next frame is requested from the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pace {
    /// Synchronized with display refresh (`requestAnimationFrame`).
    AnimationFrame,
    /// A fixed delay between frames (`setTimeout`).
    Interval(Duration),
}

/// Target framerate, measured fps and the number of drawn frames.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameTiming {
    framerate: f64,
    fps: f64,
    frames: u64,
}

impl Default for FrameTiming {
    fn default() -> Self {
        Self {
            framerate: DEFAULT_FRAMERATE,
            fps: DEFAULT_FRAMERATE,
            frames: 0,
        }
    }
}

impl FrameTiming {
    pub fn new(framerate: f64) -> Result<Self> {
        let mut timing = Self::default();
        timing.set_framerate(framerate)?;
        timing.fps = framerate;
        Ok(timing)
    }

    /// Target frames per second.
    pub fn framerate(&self) -> f64 {
        self.framerate
    }

    /// Measured frames per second of the last frame.
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Frames drawn so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Set the target framerate. Zero, negative and non-finite values are rejected.
    pub fn set_framerate(&mut self, framerate: f64) -> Result<()> {
        if !framerate.is_finite() || framerate <= 0.0 {
            return Err(DrawError::InvalidFramerate(framerate));
        }
        debug!(framerate, "framerate set");
        self.framerate = framerate;
        Ok(())
    }

    /// Pacing for the next frame: display refresh at exactly 60, a fixed
    /// interval otherwise.
    pub fn pace(&self) -> Pace {
        if self.framerate == DEFAULT_FRAMERATE {
            Pace::AnimationFrame
        } else {
            Pace::Interval(Duration::from_secs_f64(1.0 / self.framerate))
        }
    }

    /// Measure fps from the time since the previous frame. A zero delta
    /// (the first frame) keeps the previous value.
    pub(crate) fn begin_frame(&mut self, delta: Duration) {
        if !delta.is_zero() {
            self.fps = 1.0 / delta.as_secs_f64();
        }
        trace!(frame = self.frames, fps = self.fps, "frame");
    }

    pub(crate) fn end_frame(&mut self) {
        self.frames += 1;
    }

    /// Move `percent` of the way from `from` to `to`, scaled so the motion
    /// per second stays the same when the measured fps drops below target.
    pub fn lerp(&self, from: f64, to: f64, percent: f64) -> f64 {
        percent * self.framerate / self.fps * (to - from) + from
    }

    /// `lerp` against the target framerate only, ignoring measured fps.
    pub fn lerp_fixed(&self, from: f64, to: f64, percent: f64) -> f64 {
        percent * (to - from) + from
    }

    /// `lerp` that snaps: once `from` is within `threshold` of `to`,
    /// `finish` runs and `from` is returned unchanged.
    pub fn lerp_or_finish<F>(&self, from: f64, to: f64, percent: f64, threshold: f64, finish: F) -> f64
    where
        F: FnOnce(),
    {
        if (to - from).abs() < threshold {
            finish();
            return from;
        }
        self.lerp(from, to, percent)
    }
}

/// Linear interpolation per channel, alpha included.
pub fn lerp_color(from: Color, to: Color, percent: f32) -> Color {
    Color::new(
        percent * (to.r - from.r) + from.r,
        percent * (to.g - from.g) + from.g,
        percent * (to.b - from.b) + from.b,
        percent * (to.a - from.a) + from.a,
    )
}
