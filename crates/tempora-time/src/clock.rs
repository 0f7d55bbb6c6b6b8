//! Clock-face geometry and human-readable time strings

use std::fmt;

use tempora_core::WallTime;

/// Degrees swept by the hour hand per hour
const HOUR_HAND_DEG: f64 = 30.0;
/// Degrees swept by the minute and second hands per unit
const MINUTE_HAND_DEG: f64 = 6.0;

/// Rotation of each hand, in degrees clockwise from 12 o'clock
///
/// Values are continuous so hands sweep instead of ticking. The display
/// applies the rotation modulo 360.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClockAngles {
    pub hour_degrees: f64,
    pub minute_degrees: f64,
    pub second_degrees: f64,
}

impl ClockAngles {
    /// Compute hand angles for a wall time
    pub fn at(t: &WallTime) -> Self {
        let hour = (t.hour() % 12) as f64;
        let minute = t.minute() as f64;
        let second = t.second() as f64;
        let milli = t.millisecond() as f64;

        ClockAngles {
            hour_degrees: (hour + minute / 60.0) * HOUR_HAND_DEG,
            minute_degrees: (minute + second / 60.0) * MINUTE_HAND_DEG,
            second_degrees: (second + milli / 1000.0) * MINUTE_HAND_DEG,
        }
    }
}

/// Half of the day
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Period {
    Am,
    Pm,
}

impl Period {
    pub fn of_hour(hour: u32) -> Self {
        if hour < 12 {
            Period::Am
        } else {
            Period::Pm
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Am => "AM",
            Period::Pm => "PM",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hour on a 12-hour dial: 0 and 12 both read as 12
#[inline]
pub fn hour_of_twelve(hour: u32) -> u32 {
    match hour % 12 {
        0 => 12,
        h => h,
    }
}

/// "H:MM AM/PM" string, 12-hour convention
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FormattedTime(String);

impl FormattedTime {
    pub fn from_hm(hour: u32, minute: u32) -> Self {
        FormattedTime(format!(
            "{}:{:02} {}",
            hour_of_twelve(hour),
            minute,
            Period::of_hour(hour)
        ))
    }

    pub fn from_wall(t: &WallTime) -> Self {
        Self::from_hm(t.hour(), t.minute())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for FormattedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FormattedTime {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Weekday and long date, e.g. "Sunday" / "October 18, 2026"
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DateCaption {
    pub weekday: String,
    pub full_date: String,
}

impl DateCaption {
    pub fn from_wall(t: &WallTime) -> Self {
        let date = t.date();
        DateCaption {
            weekday: date.format("%A").to_string(),
            full_date: date.format("%B %-d, %Y").to_string(),
        }
    }

    /// The "Month D" part of the full date
    pub fn month_day(&self) -> &str {
        self.full_date
            .split(',')
            .next()
            .unwrap_or(self.full_date.as_str())
    }

    /// The year part of the full date, without the separator
    pub fn year(&self) -> &str {
        self.full_date
            .split_once(',')
            .map(|(_, year)| year.trim())
            .unwrap_or("")
    }
}

/// Per-field string decomposition of a wall time
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimeParts {
    pub hours: String,
    pub minutes: String,
    pub seconds: String,
    pub period: Period,
    pub full_date: String,
}

impl TimeParts {
    pub fn from_wall(t: &WallTime) -> Self {
        TimeParts {
            hours: hour_of_twelve(t.hour()).to_string(),
            minutes: format!("{:02}", t.minute()),
            seconds: format!("{:02}", t.second()),
            period: Period::of_hour(t.hour()),
            full_date: DateCaption::from_wall(t).full_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn wall(h: u32, m: u32, s: u32, ms: u32) -> WallTime {
        WallTime::from_hms_milli(h, m, s, ms).unwrap()
    }

    #[test]
    fn test_angles_at_three_thirty() {
        let angles = ClockAngles::at(&wall(15, 30, 0, 0));

        assert!((angles.hour_degrees - 105.0).abs() < 1e-9);
        assert!((angles.minute_degrees - 180.0).abs() < 1e-9);
        assert!(angles.second_degrees.abs() < 1e-9);
    }

    #[test]
    fn test_second_hand_sweeps() {
        let angles = ClockAngles::at(&wall(0, 0, 59, 500));
        assert!((angles.second_degrees - 357.0).abs() < 1e-9);

        let angles = ClockAngles::at(&wall(0, 0, 10, 250));
        assert!((angles.second_degrees - 61.5).abs() < 1e-9);
    }

    #[test]
    fn test_formatting_midnight_and_afternoon() {
        assert_eq!(FormattedTime::from_hm(0, 5).as_str(), "12:05 AM");
        assert_eq!(FormattedTime::from_hm(13, 0).as_str(), "1:00 PM");
        assert_eq!(FormattedTime::from_hm(12, 59).as_str(), "12:59 PM");
        assert_eq!(FormattedTime::from_hm(11, 9).as_str(), "11:09 AM");
    }

    #[test]
    fn test_date_caption() {
        let t = WallTime::new(
            NaiveDate::from_ymd_opt(2026, 10, 18)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
        );
        let caption = DateCaption::from_wall(&t);

        assert_eq!(caption.weekday, "Sunday");
        assert_eq!(caption.full_date, "October 18, 2026");
        assert_eq!(caption.month_day(), "October 18");
        assert_eq!(caption.year(), "2026");
    }

    #[test]
    fn test_time_parts() {
        let parts = TimeParts::from_wall(&wall(0, 4, 9, 0));

        assert_eq!(parts.hours, "12");
        assert_eq!(parts.minutes, "04");
        assert_eq!(parts.seconds, "09");
        assert_eq!(parts.period, Period::Am);
        assert_eq!(parts.full_date, "January 1, 1970");
    }
}
