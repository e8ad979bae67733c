//! Frame-rate throttled render loop
//!
//! The scheduler is a best-effort rate cap: ticks that arrive before the
//! frame interval has elapsed are dropped, late ticks simply render late.
//! The first tick always renders. Animation speed is therefore tied to
//! frames rendered, not wall time.

use crate::error::{RenderError, RenderResult};
use crate::host::{Clock, DrawSurface, FrameTimer, ImageDecoder};
use crate::renderer::Renderer;
use crate::scene::SceneForest;
use crate::types::DEFAULT_FPS;

/// Per-frame user hook, handed the forest after each rendered frame
pub type FrameCallback = Box<dyn FnMut(&mut SceneForest)>;

/// Scheduler statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub ticks: u64,
    pub rendered: u64,
    pub dropped: u64,
}

/// Drives a [`Renderer`] at a capped frame rate
pub struct FrameScheduler<T, C> {
    timer: T,
    clock: C,
    fps: u32,
    last_time: Option<f64>,
    callback: FrameCallback,
    stats: SchedulerStats,
}

impl<T, C> FrameScheduler<T, C>
where
    T: FrameTimer,
    C: Clock,
{
    /// Scheduler at the default 24 fps with a no-op callback
    pub fn new(timer: T, clock: C) -> Self {
        Self {
            timer,
            clock,
            fps: DEFAULT_FPS,
            last_time: None,
            callback: Box::new(|_| {}),
            stats: SchedulerStats::default(),
        }
    }

    pub fn with_fps(mut self, fps: u32) -> RenderResult<Self> {
        self.set_fps(fps)?;
        Ok(self)
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn set_fps(&mut self, fps: u32) -> RenderResult<()> {
        if fps == 0 {
            return Err(RenderError::InvalidFps);
        }
        self.fps = fps;
        Ok(())
    }

    /// Minimum time between two rendered frames
    pub fn interval_ms(&self) -> f64 {
        1000.0 / f64::from(self.fps)
    }

    pub fn set_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&mut SceneForest) + 'static,
    {
        self.callback = Box::new(callback);
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// Clock reading of the last rendered frame, if any
    pub fn last_time(&self) -> Option<f64> {
        self.last_time
    }

    /// Whether a frame is due at `now`
    pub fn is_due(&self, now: f64) -> bool {
        match self.last_time {
            Some(last) => now - last > self.interval_ms(),
            None => true,
        }
    }

    /// One scheduling tick: render if the interval has elapsed.
    ///
    /// Returns whether a frame was rendered. A failed frame propagates its
    /// error and leaves `last_time` untouched.
    pub fn tick<S, D>(&mut self, renderer: &mut Renderer<S, D>) -> RenderResult<bool>
    where
        S: DrawSurface,
        D: ImageDecoder<Image = S::Image>,
    {
        self.stats.ticks += 1;
        let now = self.clock.now_ms();
        if !self.is_due(now) {
            self.stats.dropped += 1;
            return Ok(false);
        }

        renderer.render_frame()?;
        self.last_time = Some(now);
        self.stats.rendered += 1;
        (self.callback)(renderer.forest_mut());
        Ok(true)
    }

    /// Tick until the timer reports teardown or a frame fails.
    pub fn run<S, D>(&mut self, renderer: &mut Renderer<S, D>) -> RenderResult<SchedulerStats>
    where
        S: DrawSurface,
        D: ImageDecoder<Image = S::Image>,
    {
        log::info!("render loop started at {} fps", self.fps);
        loop {
            if let Err(err) = self.tick(renderer) {
                log::warn!("render loop stopped: {err}");
                return Err(err);
            }
            if !self.timer.next_tick() {
                break;
            }
        }
        log::info!(
            "render loop finished: {} frames rendered, {} ticks dropped",
            self.stats.rendered,
            self.stats.dropped
        );
        Ok(self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{recording_renderer, Op};
    use glam::{IVec2, UVec2};
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::rc::Rc;

    /// Clock replaying a fixed list of timestamps
    #[derive(Clone)]
    struct ScriptedClock(Rc<RefCell<VecDeque<f64>>>);

    impl ScriptedClock {
        fn new(times: &[f64]) -> Self {
            Self(Rc::new(RefCell::new(times.iter().copied().collect())))
        }
    }

    impl Clock for ScriptedClock {
        fn now_ms(&self) -> f64 {
            self.0.borrow_mut().pop_front().unwrap_or(f64::MAX)
        }
    }

    /// Timer that allows a fixed number of ticks
    struct CountdownTimer(usize);

    impl FrameTimer for CountdownTimer {
        fn next_tick(&mut self) -> bool {
            if self.0 == 0 {
                return false;
            }
            self.0 -= 1;
            true
        }
    }

    #[test]
    fn test_default_rate() {
        let scheduler = FrameScheduler::new(CountdownTimer(0), || 0.0);
        assert_eq!(scheduler.fps(), 24);
        assert!((scheduler.interval_ms() - 41.666).abs() < 0.01);
    }

    #[test]
    fn test_zero_fps_rejected() {
        let result = FrameScheduler::new(CountdownTimer(0), || 0.0).with_fps(0);
        assert!(matches!(result, Err(RenderError::InvalidFps)));
    }

    #[test]
    fn test_rate_cap_drops_early_ticks() {
        let mut renderer = recording_renderer();
        let clock = ScriptedClock::new(&[100.0, 120.0, 150.0, 260.0]);
        let mut scheduler = FrameScheduler::new(CountdownTimer(0), clock);

        // 20ms after a rendered frame: dropped
        assert!(scheduler.tick(&mut renderer).unwrap());
        assert!(!scheduler.tick(&mut renderer).unwrap());
        // 50ms after: rendered
        assert!(scheduler.tick(&mut renderer).unwrap());
        assert!(scheduler.tick(&mut renderer).unwrap());

        assert_eq!(scheduler.last_time(), Some(260.0));
        assert_eq!(
            scheduler.stats(),
            SchedulerStats {
                ticks: 4,
                rendered: 3,
                dropped: 1
            }
        );
        let clears = renderer.surface().ops.iter().filter(|op| matches!(op, Op::Clear(..))).count();
        assert_eq!(clears, 3);
    }

    #[test]
    fn test_run_advances_cycle_once_per_rendered_frame() {
        let mut renderer = recording_renderer();
        renderer
            .load_sprite("walk:64x16", IVec2::ZERO, UVec2::new(16, 16))
            .unwrap();

        // the second tick lands 30ms after the first and is dropped
        let clock = ScriptedClock::new(&[30.0, 60.0, 110.0, 160.0, 210.0]);
        let seen = Rc::new(Cell::new(0));
        let mut scheduler = FrameScheduler::new(CountdownTimer(4), clock);
        let counter = Rc::clone(&seen);
        scheduler.set_callback(move |forest| {
            counter.set(counter.get() + 1);
            assert_eq!(forest.len(), 1);
        });

        let stats = scheduler.run(&mut renderer).unwrap();

        assert_eq!(stats.ticks, 5);
        assert_eq!(stats.rendered, 4);
        assert_eq!(stats.dropped, 1);
        assert_eq!(seen.get(), 4);
        assert_eq!(renderer.forest().roots()[0].cursor(), Some(0));
    }

    #[test]
    fn test_failed_frame_stops_loop() {
        let mut renderer = recording_renderer();
        renderer
            .load_sprite("walk:32x16", IVec2::ZERO, UVec2::new(16, 16))
            .unwrap();
        if let Some(node) = renderer.forest_mut().get_mut(0) {
            if let crate::scene::NodeKind::Composite { children, .. } = &mut node.kind {
                children.clear();
            }
        }

        let mut scheduler = FrameScheduler::new(CountdownTimer(10), ScriptedClock::new(&[100.0]));
        let result = scheduler.run(&mut renderer);

        assert!(matches!(result, Err(RenderError::EmptyComposite)));
        assert_eq!(scheduler.last_time(), None);
        assert_eq!(scheduler.stats().rendered, 0);
    }

    #[test]
    fn test_first_tick_renders_immediately() {
        let mut renderer = recording_renderer();
        renderer
            .load_sprite("walk:32x16", IVec2::ZERO, UVec2::new(16, 16))
            .unwrap();
        // a clock that starts counting when the loop starts
        let mut scheduler = FrameScheduler::new(CountdownTimer(0), ScriptedClock::new(&[0.0]));

        assert!(scheduler.is_due(0.0));
        assert!(scheduler.tick(&mut renderer).unwrap());
        assert_eq!(scheduler.last_time(), Some(0.0));
        assert!(!scheduler.is_due(10.0));
        assert_eq!(renderer.surface().ops.len(), 2);
    }
}
