//! Stopwatch Engine - start/pause/reset with anchor-based elapsed time
//!
//! Elapsed time is never accumulated tick by tick. While running it is
//! always `now - anchor`, and the anchor is recomputed on every resume as
//! `now - elapsed`, so pause/resume cycles add no drift and the result does
//! not depend on how often the host samples.

use std::fmt;

use tempora_core::EpochMillis;
use tracing::debug;

/// Stopwatch lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StopwatchState {
    /// Zeroed, not running
    #[default]
    Idle,
    /// Counting
    Running,
    /// Frozen at a non-zero or zero elapsed value
    Paused,
}

/// Millisecond stopwatch
#[derive(Clone, Debug, Default)]
pub struct Stopwatch {
    state: StopwatchState,
    /// Frozen elapsed time (meaningful while Idle or Paused)
    elapsed_ms: u64,
    /// Instant corresponding to elapsed = 0 for the current run segment
    anchor: Option<EpochMillis>,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin or resume counting; no-op while already running
    pub fn start(&mut self, now: EpochMillis) {
        if self.state == StopwatchState::Running {
            return;
        }
        self.anchor = Some(now.saturating_sub_millis(self.elapsed_ms));
        self.state = StopwatchState::Running;
        debug!(elapsed_ms = self.elapsed_ms, "stopwatch running");
    }

    /// Freeze the elapsed time; no-op unless running
    pub fn pause(&mut self, now: EpochMillis) {
        if self.state != StopwatchState::Running {
            return;
        }
        self.elapsed_ms = self.sample(now);
        self.anchor = None;
        self.state = StopwatchState::Paused;
        debug!(elapsed_ms = self.elapsed_ms, "stopwatch paused");
    }

    /// Flip between running and paused (single play/pause button)
    pub fn toggle(&mut self, now: EpochMillis) {
        match self.state {
            StopwatchState::Running => self.pause(now),
            StopwatchState::Idle | StopwatchState::Paused => self.start(now),
        }
    }

    /// Zero the stopwatch and stop it, from any state
    pub fn reset(&mut self) {
        self.elapsed_ms = 0;
        self.anchor = None;
        self.state = StopwatchState::Idle;
    }

    /// Elapsed milliseconds as of `now`
    ///
    /// Pure in `now`: while running this is `now - anchor` (saturating at
    /// zero), otherwise the frozen value.
    pub fn sample(&self, now: EpochMillis) -> u64 {
        match (self.state, self.anchor) {
            (StopwatchState::Running, Some(anchor)) => now.millis_since(anchor),
            _ => self.elapsed_ms,
        }
    }

    /// Display decomposition of `sample(now)`
    pub fn readout(&self, now: EpochMillis) -> StopwatchReadout {
        StopwatchReadout::from_millis(self.sample(now))
    }

    pub fn state(&self) -> StopwatchState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == StopwatchState::Running
    }

    pub fn anchor(&self) -> Option<EpochMillis> {
        self.anchor
    }
}

/// Minutes / seconds / centiseconds view of an elapsed time
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StopwatchReadout {
    pub minutes: u64,
    pub seconds: u64,
    pub centiseconds: u64,
}

impl StopwatchReadout {
    pub fn from_millis(elapsed_ms: u64) -> Self {
        StopwatchReadout {
            minutes: elapsed_ms / 60_000,
            seconds: (elapsed_ms % 60_000) / 1_000,
            centiseconds: (elapsed_ms % 1_000) / 10,
        }
    }

    /// "MM:SS"
    pub fn minutes_seconds(&self) -> String {
        format!("{:02}:{:02}", self.minutes, self.seconds)
    }

    /// "CC"
    pub fn centis(&self) -> String {
        format!("{:02}", self.centiseconds)
    }
}

impl fmt::Display for StopwatchReadout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}.{:02}",
            self.minutes, self.seconds, self.centiseconds
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn at(ms: i64) -> EpochMillis {
        EpochMillis::from_millis(ms)
    }

    #[test]
    fn test_initial_state() {
        let sw = Stopwatch::new();
        assert_eq!(sw.state(), StopwatchState::Idle);
        assert_eq!(sw.sample(at(123_456)), 0);
        assert!(sw.anchor().is_none());
    }

    #[test]
    fn test_start_and_sample() {
        let mut sw = Stopwatch::new();
        sw.start(at(10_000));

        assert_eq!(sw.sample(at(10_000)), 0);
        assert_eq!(sw.sample(at(12_345)), 2_345);
        assert_eq!(sw.anchor(), Some(at(10_000)));
    }

    #[test]
    fn test_pause_resume_ignores_gap() {
        let mut sw = Stopwatch::new();
        sw.start(at(0));
        sw.pause(at(1_500));
        assert_eq!(sw.state(), StopwatchState::Paused);

        // Idle gap while paused is not counted
        assert_eq!(sw.sample(at(90_000)), 1_500);

        sw.start(at(100_000));
        assert_eq!(sw.anchor(), Some(at(98_500)));
        assert_eq!(sw.sample(at(100_250)), 1_750);
    }

    #[test]
    fn test_redundant_transitions() {
        let mut sw = Stopwatch::new();

        // Pause while idle
        sw.pause(at(5));
        assert_eq!(sw.state(), StopwatchState::Idle);

        sw.start(at(1_000));
        // Start while running keeps the original anchor
        sw.start(at(2_000));
        assert_eq!(sw.sample(at(3_000)), 2_000);

        sw.pause(at(3_000));
        sw.pause(at(9_000));
        assert_eq!(sw.sample(at(9_000)), 2_000);
    }

    #[test]
    fn test_reset_from_every_state() {
        let mut sw = Stopwatch::new();
        sw.reset();
        assert_eq!(sw.state(), StopwatchState::Idle);

        sw.start(at(0));
        sw.reset();
        assert_eq!(sw.state(), StopwatchState::Idle);
        assert_eq!(sw.sample(at(50_000)), 0);

        sw.start(at(0));
        sw.pause(at(700));
        sw.reset();
        assert_eq!(sw.state(), StopwatchState::Idle);
        assert_eq!(sw.sample(at(50_000)), 0);

        // Next start counts from zero
        sw.start(at(60_000));
        assert_eq!(sw.sample(at(60_040)), 40);
    }

    #[test]
    fn test_toggle() {
        let mut sw = Stopwatch::new();
        sw.toggle(at(0));
        assert!(sw.is_running());
        sw.toggle(at(250));
        assert_eq!(sw.state(), StopwatchState::Paused);
        assert_eq!(sw.sample(at(1_000)), 250);
    }

    #[test]
    fn test_readout() {
        let r = StopwatchReadout::from_millis(125_034);
        assert_eq!(r.minutes_seconds(), "02:05");
        assert_eq!(r.centis(), "03");
        assert_eq!(r.to_string(), "02:05.03");

        assert_eq!(StopwatchReadout::from_millis(0).to_string(), "00:00.00");
        assert_eq!(StopwatchReadout::from_millis(6_000_000).to_string(), "100:00.00");
    }

    proptest! {
        #[test]
        fn prop_sample_independent_of_cadence(
            start in 0i64..1_000_000,
            polls in proptest::collection::vec(1i64..50, 1..100),
        ) {
            let mut sw = Stopwatch::new();
            sw.start(at(start));

            let mut now = start;
            let mut last = 0;
            for dt in polls {
                now += dt;
                let elapsed = sw.sample(at(now));
                prop_assert_eq!(elapsed, (now - start) as u64);
                prop_assert!(elapsed >= last);
                last = elapsed;
            }
        }

        #[test]
        fn prop_pause_resume_no_drift(
            segments in proptest::collection::vec((1i64..10_000, 0i64..100_000), 1..20),
        ) {
            let mut sw = Stopwatch::new();
            let mut now = 0i64;
            let mut running_total = 0u64;

            for (run, gap) in segments {
                sw.start(at(now));
                now += run;
                running_total += run as u64;
                sw.pause(at(now));
                now += gap;
                prop_assert_eq!(sw.sample(at(now)), running_total);
            }
        }
    }
}
