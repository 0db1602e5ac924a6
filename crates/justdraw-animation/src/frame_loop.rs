//! The frame loop.
//!
//! A [`Sketch`] is set up once and then drawn once per frame. Frames are
//! paced by a [`FrameScheduler`], which stands in for the host's
//! `requestAnimationFrame` / `setTimeout`.

use std::ops::ControlFlow;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::timing::{FrameTiming, Pace, DEFAULT_FRAMERATE};

/// What the loop does after `setup`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SetupFlow {
    /// Start drawing frames immediately.
    #[default]
    Start,
    /// Do not start; the owner calls [`FrameLoop::run`] when ready.
    Wait,
}

/// Per-frame information handed to [`Sketch::draw`].
#[derive(Debug)]
pub struct Frame<'a> {
    /// Zero-based index of this frame.
    pub index: u64,
    /// Time since the previous frame, zero for the first one.
    pub delta: Duration,
    pub timing: &'a FrameTiming,
}

impl Frame<'_> {
    /// Shorthand for [`FrameTiming::lerp`].
    pub fn lerp(&self, from: f64, to: f64, percent: f64) -> f64 {
        self.timing.lerp(from, to, percent)
    }
}

/// User callbacks driven by the loop.
pub trait Sketch {
    /// Runs once before the first frame. The target framerate may be
    /// changed here.
    fn setup(&mut self, _timing: &mut FrameTiming) -> SetupFlow {
        SetupFlow::Start
    }

    /// Draw one frame. Returning `Break` stops the loop.
    fn draw(&mut self, frame: &Frame<'_>) -> ControlFlow<()>;
}

/// Source of frame ticks.
pub trait FrameScheduler {
    /// Wait for the next frame slot and return the time elapsed since the
    /// previous one. `None` ends the loop.
    fn next_frame(&mut self, pace: Pace) -> Option<Duration>;
}

/// Schedules frames on the wall clock by sleeping the current thread.
#[derive(Debug, Default)]
pub struct SleepScheduler {
    last: Option<Instant>,
}

impl SleepScheduler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameScheduler for SleepScheduler {
    fn next_frame(&mut self, pace: Pace) -> Option<Duration> {
        let now = Instant::now();
        let last = *self.last.get_or_insert(now);

        match pace {
            // Refresh-synced: wait out the remainder of the display interval
            Pace::AnimationFrame => {
                let interval = Duration::from_secs_f64(1.0 / DEFAULT_FRAMERATE);
                if let Some(remaining) = interval.checked_sub(now.duration_since(last)) {
                    thread::sleep(remaining);
                }
            }
            // Timeout: the full delay starts after the frame was drawn
            Pace::Interval(delay) => thread::sleep(delay),
        }

        let woke = Instant::now();
        self.last = Some(woke);
        Some(woke.duration_since(last))
    }
}

/// Schedules frames without waiting, advancing a virtual clock. Used for
/// headless runs and tests.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    step: Option<Duration>,
    remaining: Option<u64>,
    elapsed: Duration,
    paces: Vec<Pace>,
}

impl ManualScheduler {
    /// Each frame lasts exactly as long as the requested pace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Each frame lasts `step`, whatever the pace.
    pub fn with_step(step: Duration) -> Self {
        Self {
            step: Some(step),
            ..Self::default()
        }
    }

    /// Stop after `frames` more ticks.
    pub fn limit(mut self, frames: u64) -> Self {
        self.remaining = Some(frames);
        self
    }

    /// Virtual time elapsed so far.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Paces requested so far, in order.
    pub fn paces(&self) -> &[Pace] {
        &self.paces
    }
}

impl FrameScheduler for ManualScheduler {
    fn next_frame(&mut self, pace: Pace) -> Option<Duration> {
        self.paces.push(pace);
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return None;
            }
            *remaining -= 1;
        }

        let delta = self.step.unwrap_or(match pace {
            Pace::AnimationFrame => Duration::from_secs_f64(1.0 / DEFAULT_FRAMERATE),
            Pace::Interval(delay) => delay,
        });
        self.elapsed += delta;
        Some(delta)
    }
}

/// Lifecycle of a [`FrameLoop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// `launch` has not run yet.
    Idle,
    /// Setup asked to wait.
    Waiting,
    Running,
    Stopped,
}

/// Drives a sketch with a scheduler.
#[derive(Debug)]
pub struct FrameLoop<S, F> {
    sketch: S,
    scheduler: F,
    timing: FrameTiming,
    state: LoopState,
}

impl<S: Sketch, F: FrameScheduler> FrameLoop<S, F> {
    pub fn new(sketch: S, scheduler: F) -> Self {
        Self {
            sketch,
            scheduler,
            timing: FrameTiming::default(),
            state: LoopState::Idle,
        }
    }

    pub fn timing(&self) -> &FrameTiming {
        &self.timing
    }

    pub fn timing_mut(&mut self) -> &mut FrameTiming {
        &mut self.timing
    }

    pub fn sketch(&self) -> &S {
        &self.sketch
    }

    pub fn sketch_mut(&mut self) -> &mut S {
        &mut self.sketch
    }

    pub fn scheduler(&self) -> &F {
        &self.scheduler
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Run `setup` once and, unless it asks to wait, start the loop.
    /// Returns the number of frames drawn.
    pub fn launch(&mut self) -> u64 {
        if self.state != LoopState::Idle {
            return 0;
        }

        match self.sketch.setup(&mut self.timing) {
            SetupFlow::Start => self.run(),
            SetupFlow::Wait => {
                debug!("setup asked to wait, frame loop not started");
                self.state = LoopState::Waiting;
                0
            }
        }
    }

    /// Draw frames until the sketch breaks or the scheduler ends.
    /// Returns the number of frames drawn by this call.
    pub fn run(&mut self) -> u64 {
        self.state = LoopState::Running;
        let start = self.timing.frames();
        let mut delta = Duration::ZERO;

        loop {
            if self.tick(delta).is_break() {
                break;
            }
            match self.scheduler.next_frame(self.timing.pace()) {
                Some(next) => delta = next,
                None => break,
            }
        }

        self.state = LoopState::Stopped;
        let drawn = self.timing.frames() - start;
        debug!(frames = drawn, "frame loop stopped");
        drawn
    }

    /// Draw a single frame `delta` after the previous one. For hosts that
    /// own their event loop.
    pub fn tick(&mut self, delta: Duration) -> ControlFlow<()> {
        self.timing.begin_frame(delta);
        let frame = Frame {
            index: self.timing.frames(),
            delta,
            timing: &self.timing,
        };
        let flow = self.sketch.draw(&frame);
        self.timing.end_frame();
        trace!(frames = self.timing.frames(), "frame drawn");
        flow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        stop_after: u64,
        framerate: Option<f64>,
        wait: bool,
        frames: Vec<(u64, Duration, f64)>,
    }

    impl Sketch for Counter {
        fn setup(&mut self, timing: &mut FrameTiming) -> SetupFlow {
            if let Some(framerate) = self.framerate {
                timing.set_framerate(framerate).unwrap();
            }
            if self.wait {
                SetupFlow::Wait
            } else {
                SetupFlow::Start
            }
        }

        fn draw(&mut self, frame: &Frame<'_>) -> ControlFlow<()> {
            self.frames.push((frame.index, frame.delta, frame.timing.fps()));
            if frame.index + 1 >= self.stop_after {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        }
    }

    #[test]
    fn test_run_until_break() {
        let sketch = Counter {
            stop_after: 3,
            ..Default::default()
        };
        let mut frame_loop = FrameLoop::new(sketch, ManualScheduler::new());

        assert_eq!(frame_loop.launch(), 3);
        assert_eq!(frame_loop.state(), LoopState::Stopped);
        assert_eq!(frame_loop.timing().frames(), 3);

        let frames = &frame_loop.sketch().frames;
        assert_eq!(frames[0].0, 0);
        assert_eq!(frames[0].1, Duration::ZERO);
        assert_eq!(frames[0].2, 60.0);
        assert_eq!(frames[2].0, 2);
    }

    #[test]
    fn test_scheduler_limit_ends_loop() {
        let sketch = Counter {
            stop_after: u64::MAX,
            ..Default::default()
        };
        let scheduler = ManualScheduler::with_step(Duration::from_millis(50)).limit(4);
        let mut frame_loop = FrameLoop::new(sketch, scheduler);

        assert_eq!(frame_loop.launch(), 5);
        assert!((frame_loop.timing().fps() - 20.0).abs() < 1e-6);
        assert_eq!(frame_loop.scheduler().elapsed(), Duration::from_millis(200));
    }

    #[test]
    fn test_pace_follows_framerate() {
        let sketch = Counter {
            stop_after: 3,
            framerate: Some(10.0),
            ..Default::default()
        };
        let mut frame_loop = FrameLoop::new(sketch, ManualScheduler::new());
        frame_loop.launch();

        let interval = Pace::Interval(Duration::from_secs_f64(0.1));
        assert_eq!(frame_loop.scheduler().paces(), &[interval, interval]);
        assert!((frame_loop.timing().fps() - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_setup_wait() {
        let sketch = Counter {
            stop_after: 1,
            wait: true,
            ..Default::default()
        };
        let mut frame_loop = FrameLoop::new(sketch, ManualScheduler::new());

        assert_eq!(frame_loop.launch(), 0);
        assert_eq!(frame_loop.state(), LoopState::Waiting);
        assert!(frame_loop.sketch().frames.is_empty());

        // a second launch does not rerun setup
        assert_eq!(frame_loop.launch(), 0);
        assert_eq!(frame_loop.run(), 1);
    }

    #[test]
    fn test_tick() {
        let sketch = Counter {
            stop_after: u64::MAX,
            ..Default::default()
        };
        let mut frame_loop = FrameLoop::new(sketch, ManualScheduler::new());
        assert!(frame_loop.tick(Duration::from_millis(25)).is_continue());
        assert_eq!(frame_loop.timing().frames(), 1);
        assert!((frame_loop.timing().fps() - 40.0).abs() < 1e-6);
    }

    #[test]
    fn test_sleep_scheduler_interval() {
        let mut scheduler = SleepScheduler::new();
        let delta = scheduler
            .next_frame(Pace::Interval(Duration::from_millis(5)))
            .unwrap();
        assert!(delta >= Duration::from_millis(5));
    }
}
