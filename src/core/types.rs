use serde::{Deserialize, Serialize};

/// Microseconds since the Unix epoch.
pub type Timestamp = i64;

pub const MICROS_PER_SECOND: i64 = 1_000_000;

/// One stored sample value.
///
/// Line channels carry `Number` or `Missing`, scatter channels only `Number`,
/// text channels only `Text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SampleValue {
    Number(f64),
    Missing,
    Text(String),
}

impl SampleValue {
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Missing | Self::Text(_) => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Number(_) | Self::Missing => None,
        }
    }
}

/// Numeric point handed to the plotting collaborator. `None` is a gap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotPoint {
    pub time: Timestamp,
    pub value: Option<f64>,
}

impl PlotPoint {
    #[must_use]
    pub fn new(time: Timestamp, value: Option<f64>) -> Self {
        Self { time, value }
    }
}

/// Rectangle in window-fraction units, origin at the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[must_use]
    pub fn unit() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }
}

/// Bounding box of prepared data on one value axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataLimits {
    pub time_min: f64,
    pub time_max: f64,
    pub value_min: f64,
    pub value_max: f64,
}

impl DataLimits {
    #[must_use]
    pub fn from_point(time: f64, value: f64) -> Self {
        Self {
            time_min: time,
            time_max: time,
            value_min: value,
            value_max: value,
        }
    }

    pub fn include(&mut self, time: f64, value: f64) {
        self.time_min = self.time_min.min(time);
        self.time_max = self.time_max.max(time);
        self.value_min = self.value_min.min(value);
        self.value_max = self.value_max.max(value);
    }

    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            time_min: self.time_min.min(other.time_min),
            time_max: self.time_max.max(other.time_max),
            value_min: self.value_min.min(other.value_min),
            value_max: self.value_max.max(other.value_max),
        }
    }
}
