//! Time Engine - per-frame hand angles with whole-second change detection

use tempora_core::{Clock, WallTime};
use tracing::trace;

use crate::{ClockAngles, FormattedTime};

/// Output of one refresh tick
#[derive(Clone, Debug, PartialEq)]
pub struct Tick {
    /// Hand rotations for this instant
    pub angles: ClockAngles,
    /// Present only when the (hour, minute, second) triple changed
    pub formatted: Option<FormattedTime>,
}

impl Tick {
    /// Whether downstream consumers should be notified
    pub fn changed(&self) -> bool {
        self.formatted.is_some()
    }
}

/// Time Engine - computes clock-face state on every display refresh
///
/// Angles are a pure function of `now`. The only retained state is the
/// last (hour, minute, second) triple, used to emit the formatted string
/// at most once per second.
#[derive(Debug, Default)]
pub struct TimeEngine {
    /// Last emitted (hour, minute, second)
    last_triple: Option<(u32, u32, u32)>,
    /// Ticks computed so far
    ticks: u64,
    /// Formatted strings emitted so far
    emitted: u64,
}

impl TimeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute angles for `now`, and the formatted time if the second changed
    pub fn compute_tick(&mut self, now: &WallTime) -> Tick {
        self.ticks += 1;

        let angles = ClockAngles::at(now);
        let triple = (now.hour(), now.minute(), now.second());

        let formatted = if self.last_triple != Some(triple) {
            self.last_triple = Some(triple);
            self.emitted += 1;
            let formatted = FormattedTime::from_wall(now);
            trace!(time = %formatted, "clock second changed");
            Some(formatted)
        } else {
            None
        };

        Tick { angles, formatted }
    }

    /// Compute a tick reading `now` from the given clock
    pub fn tick(&mut self, clock: &dyn Clock) -> Tick {
        self.compute_tick(&clock.wall_time())
    }

    /// Forget the last emitted triple so the next tick emits again
    pub fn reset_dedup(&mut self) {
        self.last_triple = None;
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::time::Duration;
    use tempora_core::{EpochMillis, ManualClock};

    fn wall(h: u32, m: u32, s: u32, ms: u32) -> WallTime {
        WallTime::from_hms_milli(h, m, s, ms).unwrap()
    }

    #[test]
    fn test_first_tick_emits() {
        let mut engine = TimeEngine::new();
        let tick = engine.compute_tick(&wall(13, 0, 0, 0));

        assert_eq!(tick.formatted.unwrap().as_str(), "1:00 PM");
    }

    #[test]
    fn test_same_second_does_not_emit() {
        let mut engine = TimeEngine::new();

        assert!(engine.compute_tick(&wall(8, 15, 30, 0)).changed());
        assert!(!engine.compute_tick(&wall(8, 15, 30, 16)).changed());
        assert!(!engine.compute_tick(&wall(8, 15, 30, 999)).changed());
        assert!(engine.compute_tick(&wall(8, 15, 31, 0)).changed());

        assert_eq!(engine.ticks(), 4);
        assert_eq!(engine.emitted(), 2);
    }

    #[test]
    fn test_redundant_tick_same_millisecond() {
        let mut engine = TimeEngine::new();
        let now = wall(22, 41, 7, 333);

        let a = engine.compute_tick(&now);
        let b = engine.compute_tick(&now);

        // Angles idempotent, string emitted once
        assert_eq!(a.angles, b.angles);
        assert!(a.changed());
        assert!(!b.changed());
    }

    #[test]
    fn test_second_change_emits_even_if_string_unchanged() {
        // The string only shows H:MM, but dedup is keyed on the full triple
        let mut engine = TimeEngine::new();
        let a = engine.compute_tick(&wall(9, 5, 1, 0)).formatted.unwrap();
        let b = engine.compute_tick(&wall(9, 5, 2, 0)).formatted.unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_reset_dedup() {
        let mut engine = TimeEngine::new();
        let now = wall(0, 0, 0, 0);

        engine.compute_tick(&now);
        engine.reset_dedup();
        assert!(engine.compute_tick(&now).changed());
    }

    #[test]
    fn test_tick_from_clock() {
        let clock = ManualClock::new(EpochMillis::ZERO);
        let mut engine = TimeEngine::new();

        let tick = engine.tick(&clock);
        assert_eq!(tick.formatted.unwrap().as_str(), "12:00 AM");

        clock.advance(Duration::from_millis(1_500));
        let tick = engine.tick(&clock);
        assert!((tick.angles.second_degrees - 9.0).abs() < 1e-9);
        assert!(tick.changed());
    }

    proptest! {
        #[test]
        fn prop_second_angle_matches_components(s in 0u32..60, ms in 0u32..1000) {
            let angles = ClockAngles::at(&wall(4, 20, s, ms));
            let expected = (s as f64 + ms as f64 / 1000.0) * 6.0;

            prop_assert!((angles.second_degrees.rem_euclid(360.0) - expected).abs() < 1e-9);
            prop_assert!(angles.second_degrees >= 0.0 && angles.second_degrees < 360.0);
        }

        #[test]
        fn prop_second_angle_monotonic_within_minute(a in 0u32..60_000, b in 0u32..60_000) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let lo = ClockAngles::at(&wall(7, 7, lo / 1000, lo % 1000));
            let hi = ClockAngles::at(&wall(7, 7, hi / 1000, hi % 1000));

            prop_assert!(lo.second_degrees <= hi.second_degrees);
        }

        #[test]
        fn prop_emits_once_per_distinct_second(steps in proptest::collection::vec(0u64..400, 1..200)) {
            let clock = ManualClock::new(EpochMillis::from_millis(1_700_000_000_000));
            let mut engine = TimeEngine::new();
            let mut last_emitted: Option<(u32, u32, u32)> = None;
            let mut distinct = 0u64;
            let mut previous: Option<(u32, u32, u32)> = None;

            for step in steps {
                clock.advance(Duration::from_millis(step));
                let now = clock.wall_time();
                let triple = (now.hour(), now.minute(), now.second());
                if previous != Some(triple) {
                    distinct += 1;
                    previous = Some(triple);
                }

                let tick = engine.compute_tick(&now);
                if tick.changed() {
                    // Never twice in a row for the same triple
                    prop_assert_ne!(last_emitted, Some(triple));
                    last_emitted = Some(triple);
                }
            }

            prop_assert_eq!(engine.emitted(), distinct);
        }
    }
}
