//! Wall clock and sleep-based frame timer
//!
//! Stand-ins for a display's refresh callback when rendering headless.

use sprite_compositor::{Clock, FrameTimer};
use std::thread;
use std::time::{Duration, Instant};

/// Milliseconds since construction, from a monotonic clock
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Sleep timer options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SleepTimerConfig {
    /// Simulated display refresh rate
    pub refresh_hz: u32,
    /// Stop after this many ticks; `None` runs until the process exits
    pub max_ticks: Option<u64>,
}

impl Default for SleepTimerConfig {
    fn default() -> Self {
        Self {
            refresh_hz: 60,
            max_ticks: None,
        }
    }
}

/// Ticks at roughly `refresh_hz`, sleeping off whatever is left of each
/// refresh interval
#[derive(Debug)]
pub struct SleepTimer {
    interval: Duration,
    max_ticks: Option<u64>,
    ticks: u64,
    next_deadline: Instant,
}

impl SleepTimer {
    pub fn new(config: SleepTimerConfig) -> Self {
        let refresh_ns = 1_000_000_000 / u64::from(config.refresh_hz.max(1));
        let interval = Duration::from_nanos(refresh_ns);
        Self {
            interval,
            max_ticks: config.max_ticks,
            ticks: 0,
            next_deadline: Instant::now() + interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

impl FrameTimer for SleepTimer {
    fn next_tick(&mut self) -> bool {
        if self.max_ticks.is_some_and(|max| self.ticks >= max) {
            log::debug!("sleep timer exhausted after {} ticks", self.ticks);
            return false;
        }

        let now = Instant::now();
        if let Some(remaining) = self.next_deadline.checked_duration_since(now) {
            thread::sleep(remaining);
            self.next_deadline += self.interval;
        } else {
            // fell behind; realign instead of bursting to catch up
            self.next_deadline = now + self.interval;
        }
        self.ticks += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now_ms();
        thread::sleep(Duration::from_millis(2));
        let b = clock.now_ms();
        assert!(b >= a + 1.0, "expected at least 1ms between {a} and {b}");
    }

    #[test]
    fn test_timer_stops_after_max_ticks() {
        let mut timer = SleepTimer::new(SleepTimerConfig {
            refresh_hz: 1000,
            max_ticks: Some(3),
        });

        let mut allowed = 0;
        while timer.next_tick() {
            allowed += 1;
        }
        assert_eq!(allowed, 3);
        assert_eq!(timer.ticks(), 3);
    }

    #[test]
    fn test_timer_paces_ticks() {
        let mut timer = SleepTimer::new(SleepTimerConfig {
            refresh_hz: 200,
            max_ticks: Some(4),
        });
        assert_eq!(timer.interval(), Duration::from_millis(5));

        let start = Instant::now();
        while timer.next_tick() {}
        assert!(start.elapsed() >= Duration::from_millis(15));
    }
}
