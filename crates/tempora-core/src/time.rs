//! Time primitives for Tempora
//!
//! Two notions of time are used:
//! - `WallTime`: local civil time (hour/minute/second/millisecond), drives the clock face
//! - `EpochMillis`: milliseconds since the Unix epoch, drives the stopwatch

use std::ops::{Add, Sub};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, Timelike, Utc, Weekday};

/// Wall-clock instant, milliseconds since the Unix epoch
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct EpochMillis(pub i64);

impl EpochMillis {
    pub const ZERO: EpochMillis = EpochMillis(0);

    #[inline]
    pub fn from_millis(millis: i64) -> Self {
        EpochMillis(millis)
    }

    #[inline]
    pub fn as_millis(self) -> i64 {
        self.0
    }

    /// Milliseconds elapsed since `earlier`, zero if `earlier` is in the future
    #[inline]
    pub fn millis_since(self, earlier: EpochMillis) -> u64 {
        self.0.saturating_sub(earlier.0).max(0) as u64
    }

    #[inline]
    pub fn saturating_sub_millis(self, millis: u64) -> Self {
        EpochMillis(self.0.saturating_sub(millis.min(i64::MAX as u64) as i64))
    }
}

impl Add<Duration> for EpochMillis {
    type Output = EpochMillis;

    #[inline]
    fn add(self, rhs: Duration) -> Self::Output {
        EpochMillis(self.0.saturating_add(rhs.as_millis() as i64))
    }
}

impl Sub<Duration> for EpochMillis {
    type Output = EpochMillis;

    #[inline]
    fn sub(self, rhs: Duration) -> Self::Output {
        EpochMillis(self.0.saturating_sub(rhs.as_millis() as i64))
    }
}

/// Local civil time as read off the wall
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WallTime(NaiveDateTime);

impl WallTime {
    pub fn new(datetime: NaiveDateTime) -> Self {
        WallTime(datetime)
    }

    /// Build a wall time on 1970-01-01; `None` if any component is out of range
    pub fn from_hms_milli(hour: u32, minute: u32, second: u32, milli: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(1970, 1, 1)?
            .and_hms_milli_opt(hour, minute, second, milli)
            .map(WallTime)
    }

    #[inline]
    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    #[inline]
    pub fn minute(&self) -> u32 {
        self.0.minute()
    }

    #[inline]
    pub fn second(&self) -> u32 {
        self.0.second()
    }

    /// Millisecond within the second, 0..=999 (leap-second nanos are folded in)
    #[inline]
    pub fn millisecond(&self) -> u32 {
        (self.0.nanosecond() / 1_000_000).min(999)
    }

    #[inline]
    pub fn weekday(&self) -> Weekday {
        self.0.weekday()
    }

    #[inline]
    pub fn date(&self) -> NaiveDate {
        self.0.date()
    }

    pub fn as_naive(&self) -> NaiveDateTime {
        self.0
    }
}

impl From<NaiveDateTime> for WallTime {
    fn from(datetime: NaiveDateTime) -> Self {
        WallTime(datetime)
    }
}

/// Source of the current time
///
/// Both readings must come from the same underlying instant source so that
/// a host can mix them freely.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch
    fn epoch_millis(&self) -> EpochMillis;

    /// Local civil time
    fn wall_time(&self) -> WallTime;
}

/// The operating system clock, local timezone
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn epoch_millis(&self) -> EpochMillis {
        EpochMillis(Utc::now().timestamp_millis())
    }

    fn wall_time(&self) -> WallTime {
        WallTime(Local::now().naive_local())
    }
}

/// Manually driven clock for simulation and tests
///
/// Wall time is the epoch reading interpreted as UTC. Clones share the same
/// underlying instant.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    millis: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start: EpochMillis) -> Self {
        ManualClock {
            millis: Arc::new(AtomicI64::new(start.0)),
        }
    }

    /// Start at the given civil time (interpreted as UTC)
    pub fn at(datetime: NaiveDateTime) -> Self {
        Self::new(EpochMillis(datetime.and_utc().timestamp_millis()))
    }

    pub fn advance(&self, by: Duration) {
        self.millis
            .fetch_add(by.as_millis().min(i64::MAX as u128) as i64, Ordering::SeqCst);
    }

    pub fn set(&self, to: EpochMillis) {
        self.millis.store(to.0, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn epoch_millis(&self) -> EpochMillis {
        EpochMillis(self.millis.load(Ordering::SeqCst))
    }

    fn wall_time(&self) -> WallTime {
        let millis = self.millis.load(Ordering::SeqCst);
        let datetime = DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or_default();
        WallTime(datetime.naive_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_millis_since() {
        let a = EpochMillis::from_millis(1_000);
        let b = EpochMillis::from_millis(1_250);

        assert_eq!(b.millis_since(a), 250);
        // Never negative
        assert_eq!(a.millis_since(b), 0);
    }

    #[test]
    fn test_wall_time_components() {
        let t = WallTime::from_hms_milli(13, 7, 42, 918).unwrap();
        assert_eq!(t.hour(), 13);
        assert_eq!(t.minute(), 7);
        assert_eq!(t.second(), 42);
        assert_eq!(t.millisecond(), 918);

        assert!(WallTime::from_hms_milli(24, 0, 0, 0).is_none());
    }

    #[test]
    fn test_manual_clock_shared() {
        let clock = ManualClock::new(EpochMillis::from_millis(5_000));
        let other = clock.clone();

        clock.advance(Duration::from_millis(1_500));
        assert_eq!(other.epoch_millis(), EpochMillis::from_millis(6_500));

        other.set(EpochMillis::ZERO);
        assert_eq!(clock.epoch_millis(), EpochMillis::ZERO);
    }

    #[test]
    fn test_manual_clock_wall_time() {
        let start = NaiveDate::from_ymd_opt(2026, 10, 18)
            .unwrap()
            .and_hms_milli_opt(23, 59, 59, 500)
            .unwrap();
        let clock = ManualClock::at(start);
        assert_eq!(clock.wall_time().hour(), 23);

        clock.advance(Duration::from_millis(600));
        let t = clock.wall_time();
        assert_eq!((t.hour(), t.minute(), t.second(), t.millisecond()), (0, 0, 0, 100));
        assert_eq!(t.weekday(), Weekday::Mon);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_millis_since_add(start in -1_000_000_000i64..1_000_000_000, step in 0u64..10_000_000) {
                let a = EpochMillis::from_millis(start);
                let b = a + Duration::from_millis(step);
                prop_assert_eq!(b.millis_since(a), step);
                prop_assert_eq!(a.millis_since(b), 0);
                prop_assert_eq!(b.saturating_sub_millis(step), a);
            }
        }
    }
}
