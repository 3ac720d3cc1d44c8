use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::core::types::{MICROS_PER_SECOND, Timestamp};

const SECOND: i64 = MICROS_PER_SECOND;
const MINUTE: i64 = 60 * SECOND;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;

/// Fixed UTC offset used both for tick alignment and for calendar labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceZone {
    offset_seconds: i32,
}

impl Default for ReferenceZone {
    fn default() -> Self {
        Self::from_offset_seconds(4 * 60 * 60)
    }
}

impl ReferenceZone {
    #[must_use]
    pub const fn utc() -> Self {
        Self { offset_seconds: 0 }
    }

    /// Offsets outside chrono's +-24h range collapse to UTC.
    #[must_use]
    pub const fn from_offset_seconds(offset_seconds: i32) -> Self {
        if offset_seconds <= -86_400 || offset_seconds >= 86_400 {
            return Self::utc();
        }
        Self { offset_seconds }
    }

    #[must_use]
    pub const fn offset_seconds(self) -> i32 {
        self.offset_seconds
    }

    #[must_use]
    pub const fn offset_micros(self) -> i64 {
        self.offset_seconds as i64 * MICROS_PER_SECOND
    }

    fn fixed_offset(self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.offset_seconds)
    }

    /// Converts a microsecond timestamp into wall-clock time in this zone.
    #[must_use]
    pub fn local_datetime(self, time: Timestamp) -> Option<DateTime<FixedOffset>> {
        let seconds = time.div_euclid(MICROS_PER_SECOND);
        let nanos = (time.rem_euclid(MICROS_PER_SECOND) * 1_000) as u32;
        let utc = DateTime::<Utc>::from_timestamp(seconds, nanos)?;
        Some(utc.with_timezone(&self.fixed_offset()?))
    }
}

/// Label family chosen for a tick step. Each variant is a pure
/// `Timestamp -> String` function parameterized by the reference zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepFormat {
    /// `%dns`: the last three digits of the raw timestamp.
    Nanos,
    /// Milliseconds within the second with one decimal, e.g. `234.5ms`.
    FractionalMillis,
    /// Whole milliseconds within the second, e.g. `234ms`.
    Millis,
    /// Seconds within the minute with one decimal, e.g. `7.5s`.
    FractionalSeconds,
    /// `HH:MM:SSs`.
    HourMinuteSecond,
    /// `HH:MM`.
    HourMinute,
    /// `Mon HH:MM`.
    WeekdayHourMinute,
    /// `MM/DD Mon`.
    MonthDayWeekday,
    /// `YYYY/MM/DD`.
    YearMonthDay,
    /// `YYYY`.
    Year,
    /// Plain integer rendering, used when no step candidate applies.
    Raw,
}

impl StepFormat {
    #[must_use]
    pub fn format(self, time: Timestamp, zone: ReferenceZone) -> String {
        match self {
            Self::Nanos => format!("{}ns", time.rem_euclid(1_000)),
            Self::FractionalMillis => {
                let tenths = time.div_euclid(100).rem_euclid(10_000);
                format!("{:.1}ms", tenths as f64 * 0.1)
            }
            Self::Millis => format!("{}ms", time.div_euclid(1_000).rem_euclid(1_000)),
            Self::FractionalSeconds => {
                let tenths = time.div_euclid(100_000).rem_euclid(600);
                format!("{:.1}s", tenths as f64 * 0.1)
            }
            Self::HourMinuteSecond => self.calendar(time, zone, "%H:%M:%Ss"),
            Self::HourMinute => self.calendar(time, zone, "%H:%M"),
            Self::WeekdayHourMinute => self.calendar(time, zone, "%a %H:%M"),
            Self::MonthDayWeekday => self.calendar(time, zone, "%m/%d %a"),
            Self::YearMonthDay => self.calendar(time, zone, "%Y/%m/%d"),
            Self::Year => self.calendar(time, zone, "%Y"),
            Self::Raw => time.to_string(),
        }
    }

    fn calendar(self, time: Timestamp, zone: ReferenceZone, pattern: &str) -> String {
        match zone.local_datetime(time) {
            Some(local) => local.format(pattern).to_string(),
            None => time.to_string(),
        }
    }
}

/// One row of the step table: the largest raw step it covers and its labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepCandidate {
    pub threshold_us: i64,
    pub format: StepFormat,
}

impl StepCandidate {
    const fn new(threshold_us: i64, format: StepFormat) -> Self {
        Self {
            threshold_us,
            format,
        }
    }
}

/// Calendar-aware tick steps, strictly increasing by threshold.
pub const STEP_CANDIDATES: &[StepCandidate] = &[
    StepCandidate::new(1, StepFormat::Nanos),
    StepCandidate::new(2, StepFormat::Nanos),
    StepCandidate::new(5, StepFormat::Nanos),
    StepCandidate::new(20, StepFormat::Nanos),
    StepCandidate::new(50, StepFormat::Nanos),
    StepCandidate::new(100, StepFormat::FractionalMillis),
    StepCandidate::new(200, StepFormat::FractionalMillis),
    StepCandidate::new(500, StepFormat::FractionalMillis),
    StepCandidate::new(1_000, StepFormat::Millis),
    StepCandidate::new(2_000, StepFormat::Millis),
    StepCandidate::new(5_000, StepFormat::Millis),
    StepCandidate::new(10_000, StepFormat::Millis),
    StepCandidate::new(20_000, StepFormat::Millis),
    StepCandidate::new(50_000, StepFormat::Millis),
    StepCandidate::new(100_000, StepFormat::FractionalSeconds),
    StepCandidate::new(200_000, StepFormat::FractionalSeconds),
    StepCandidate::new(500_000, StepFormat::FractionalSeconds),
    StepCandidate::new(SECOND, StepFormat::HourMinuteSecond),
    StepCandidate::new(2 * SECOND, StepFormat::HourMinuteSecond),
    StepCandidate::new(3 * SECOND, StepFormat::HourMinuteSecond),
    StepCandidate::new(5 * SECOND, StepFormat::HourMinuteSecond),
    StepCandidate::new(6 * SECOND, StepFormat::HourMinuteSecond),
    StepCandidate::new(10 * SECOND, StepFormat::HourMinuteSecond),
    StepCandidate::new(15 * SECOND, StepFormat::HourMinuteSecond),
    StepCandidate::new(20 * SECOND, StepFormat::HourMinuteSecond),
    StepCandidate::new(30 * SECOND, StepFormat::HourMinuteSecond),
    StepCandidate::new(MINUTE, StepFormat::HourMinute),
    StepCandidate::new(2 * MINUTE, StepFormat::HourMinute),
    StepCandidate::new(3 * MINUTE, StepFormat::HourMinute),
    StepCandidate::new(5 * MINUTE, StepFormat::HourMinute),
    StepCandidate::new(6 * MINUTE, StepFormat::HourMinute),
    StepCandidate::new(10 * MINUTE, StepFormat::HourMinute),
    StepCandidate::new(15 * MINUTE, StepFormat::HourMinute),
    StepCandidate::new(20 * MINUTE, StepFormat::HourMinute),
    StepCandidate::new(30 * MINUTE, StepFormat::HourMinute),
    StepCandidate::new(HOUR, StepFormat::HourMinute),
    StepCandidate::new(2 * HOUR, StepFormat::HourMinute),
    StepCandidate::new(3 * HOUR, StepFormat::HourMinute),
    StepCandidate::new(4 * HOUR, StepFormat::HourMinute),
    StepCandidate::new(6 * HOUR, StepFormat::WeekdayHourMinute),
    StepCandidate::new(8 * HOUR, StepFormat::WeekdayHourMinute),
    StepCandidate::new(12 * HOUR, StepFormat::WeekdayHourMinute),
    StepCandidate::new(DAY, StepFormat::MonthDayWeekday),
    StepCandidate::new(2 * DAY, StepFormat::MonthDayWeekday),
    StepCandidate::new(4 * DAY, StepFormat::MonthDayWeekday),
    StepCandidate::new(7 * DAY, StepFormat::YearMonthDay),
    StepCandidate::new(10 * DAY, StepFormat::YearMonthDay),
    StepCandidate::new(15 * DAY, StepFormat::YearMonthDay),
    StepCandidate::new(20 * DAY, StepFormat::YearMonthDay),
    StepCandidate::new(30 * DAY, StepFormat::YearMonthDay),
    StepCandidate::new(60 * DAY, StepFormat::YearMonthDay),
    StepCandidate::new(100 * DAY, StepFormat::YearMonthDay),
    StepCandidate::new(150 * DAY, StepFormat::YearMonthDay),
    StepCandidate::new(200 * DAY, StepFormat::YearMonthDay),
    StepCandidate::new(300 * DAY, StepFormat::YearMonthDay),
    StepCandidate::new(365 * DAY, StepFormat::Year),
];

/// Largest step the table can align to.
pub const MAX_STEP_US: i64 = 365 * DAY;

/// Picks the first candidate whose threshold covers `raw_step_us`.
///
/// Returns `None` when the raw step exceeds the table (or is NaN); callers
/// then fall back to `StepFormat::Raw`.
#[must_use]
pub fn select_formatter(raw_step_us: f64) -> Option<StepCandidate> {
    STEP_CANDIDATES
        .iter()
        .copied()
        .find(|candidate| candidate.threshold_us as f64 >= raw_step_us)
}
