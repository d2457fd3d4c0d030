//! Section timings and broad-phase statistics
//!
//! Timers keep a rolling window of the most recent samples so averages track
//! the current load rather than the whole run.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Samples kept per named timer
pub const TIMING_WINDOW: usize = 100;

/// Broad-phase effectiveness counters
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CollisionStats {
    /// Candidate pairs tested by the narrow phase
    pub checks: u64,
    /// Candidate pairs that actually overlapped and were separated
    pub verified: u64,
}

impl CollisionStats {
    /// Percentage of checks that turned out to be real contacts.
    pub fn verification_rate(&self) -> f32 {
        if self.checks == 0 {
            0.0
        } else {
            self.verified as f32 / self.checks as f32 * 100.0
        }
    }
}

/// Summary of one named timer over its current window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingSummary {
    pub average: Duration,
    pub min: Duration,
    pub max: Duration,
    pub calls: usize,
    pub total: Duration,
}

#[derive(Debug)]
struct Timer {
    name: &'static str,
    samples: VecDeque<Duration>,
    total: Duration,
}

impl Timer {
    fn push(&mut self, sample: Duration) {
        self.samples.push_back(sample);
        self.total += sample;
        if self.samples.len() > TIMING_WINDOW {
            if let Some(old) = self.samples.pop_front() {
                self.total -= old;
            }
        }
    }

    fn summary(&self) -> Option<TimingSummary> {
        let calls = self.samples.len();
        let min = self.samples.iter().min().copied()?;
        let max = self.samples.iter().max().copied()?;
        Some(TimingSummary {
            average: self.total / calls as u32,
            min,
            max,
            calls,
            total: self.total,
        })
    }
}

#[derive(Debug, Default)]
pub struct Profiler {
    timers: Vec<Timer>,
    pub collisions: CollisionStats,
}

impl Profiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one sample to the timer called `name`, creating it on first use.
    pub fn record(&mut self, name: &'static str, elapsed: Duration) {
        match self.timers.iter_mut().find(|t| t.name == name) {
            Some(timer) => timer.push(elapsed),
            None => {
                let mut timer = Timer {
                    name,
                    samples: VecDeque::with_capacity(TIMING_WINDOW + 1),
                    total: Duration::ZERO,
                };
                timer.push(elapsed);
                self.timers.push(timer);
            }
        }
    }

    /// Run `f` and record how long it took under `name`.
    pub fn time<R>(&mut self, name: &'static str, f: impl FnOnce() -> R) -> R {
        let start = Instant::now();
        let out = f();
        self.record(name, start.elapsed());
        out
    }

    /// Start a guard that records under `name` when it goes out of scope.
    pub fn scoped(&mut self, name: &'static str) -> ScopedTimer<'_> {
        ScopedTimer {
            profiler: self,
            name,
            start: Instant::now(),
        }
    }

    pub fn summary(&self, name: &str) -> Option<TimingSummary> {
        self.timers
            .iter()
            .find(|t| t.name == name)
            .and_then(Timer::summary)
    }

    /// Average over the current window, zero for an unknown timer.
    pub fn average(&self, name: &str) -> Duration {
        self.summary(name).map_or(Duration::ZERO, |s| s.average)
    }

    pub fn reset_collision_stats(&mut self) {
        self.collisions = CollisionStats::default();
    }

    /// Log every timer and the collision counters, then reset the counters.
    pub fn report(&mut self) {
        for timer in &self.timers {
            if let Some(s) = timer.summary() {
                log::info!(
                    "{}: avg {:?} min {:?} max {:?} calls {} total {:?}",
                    timer.name,
                    s.average,
                    s.min,
                    s.max,
                    s.calls,
                    s.total
                );
            }
        }
        log::info!(
            "collision checks {} verified {} ({:.2}%)",
            self.collisions.checks,
            self.collisions.verified,
            self.collisions.verification_rate()
        );
        self.reset_collision_stats();
    }
}

/// Records the time between its creation and drop into a [`Profiler`]
pub struct ScopedTimer<'a> {
    profiler: &'a mut Profiler,
    name: &'static str,
    start: Instant,
}

impl ScopedTimer<'_> {
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for ScopedTimer<'_> {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        self.profiler.record(self.name, elapsed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_tracks_min_max_average() {
        let mut profiler = Profiler::new();
        profiler.record("collide", Duration::from_micros(10));
        profiler.record("collide", Duration::from_micros(30));

        let s = profiler.summary("collide").unwrap();
        assert_eq!(s.calls, 2);
        assert_eq!(s.min, Duration::from_micros(10));
        assert_eq!(s.max, Duration::from_micros(30));
        assert_eq!(s.average, Duration::from_micros(20));
        assert_eq!(s.total, Duration::from_micros(40));
    }

    #[test]
    fn window_drops_oldest_samples() {
        let mut profiler = Profiler::new();
        profiler.record("step", Duration::from_millis(500));
        for _ in 0..TIMING_WINDOW {
            profiler.record("step", Duration::from_micros(1));
        }

        let s = profiler.summary("step").unwrap();
        assert_eq!(s.calls, TIMING_WINDOW);
        assert_eq!(s.max, Duration::from_micros(1));
        assert_eq!(profiler.average("step"), Duration::from_micros(1));
    }

    #[test]
    fn unknown_timer_has_no_summary() {
        let profiler = Profiler::new();
        assert!(profiler.summary("missing").is_none());
        assert_eq!(profiler.average("missing"), Duration::ZERO);
    }

    #[test]
    fn time_returns_closure_value() {
        let mut profiler = Profiler::new();
        let v = profiler.time("work", || 42);
        assert_eq!(v, 42);
        assert_eq!(profiler.summary("work").unwrap().calls, 1);
    }

    #[test]
    fn scoped_timer_records_on_drop() {
        let mut profiler = Profiler::new();
        {
            let timer = profiler.scoped("rebuild");
            std::thread::sleep(Duration::from_millis(2));
            assert!(timer.elapsed() >= Duration::from_millis(2));
        }
        {
            let _timer = profiler.scoped("rebuild");
        }

        let s = profiler.summary("rebuild").unwrap();
        assert_eq!(s.calls, 2);
        assert!(s.max >= Duration::from_millis(2));
    }

    #[test]
    fn report_resets_collision_counters() {
        let mut profiler = Profiler::new();
        profiler.collisions.checks = 10;
        profiler.collisions.verified = 4;
        assert_eq!(profiler.collisions.verification_rate(), 40.0);

        profiler.report();
        assert_eq!(profiler.collisions, CollisionStats::default());
        assert_eq!(profiler.collisions.verification_rate(), 0.0);
    }
}
