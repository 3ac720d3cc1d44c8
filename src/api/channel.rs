use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::core::{DataLimits, PlotPoint, SampleValue, Timestamp};
use crate::error::{StripChartError, StripChartResult};

use super::channel_options::{ChannelKindTag, ChannelOptions, LineStyle, ScatterStyle, TextStyle};
use super::ids::AxisId;

/// Kind-specific channel state: style plus the data last handed to the
/// plotting collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelKind {
    Line {
        style: LineStyle,
        points: Vec<PlotPoint>,
    },
    Scatter {
        style: ScatterStyle,
        offsets: Vec<(Timestamp, f64)>,
    },
    Text {
        style: TextStyle,
        shown: String,
    },
}

impl ChannelKind {
    /// Builds a kind from declaration options, rejecting unsupported ones.
    pub fn from_options(tag: ChannelKindTag, options: &ChannelOptions) -> StripChartResult<Self> {
        Ok(match tag {
            ChannelKindTag::Line => Self::Line {
                style: LineStyle::from_options(options)?,
                points: Vec::new(),
            },
            ChannelKindTag::Scatter => Self::Scatter {
                style: ScatterStyle::from_options(options)?,
                offsets: Vec::new(),
            },
            ChannelKindTag::Text => Self::Text {
                style: TextStyle::from_options(options)?,
                shown: String::new(),
            },
        })
    }

    #[must_use]
    pub fn tag(&self) -> ChannelKindTag {
        match self {
            Self::Line { .. } => ChannelKindTag::Line,
            Self::Scatter { .. } => ChannelKindTag::Scatter,
            Self::Text { .. } => ChannelKindTag::Text,
        }
    }

    fn parse_value(&self, raw: Option<&str>) -> StripChartResult<SampleValue> {
        match self {
            Self::Line { .. } => match raw.map(str::trim) {
                None | Some("") => Ok(SampleValue::Missing),
                Some(text) => parse_number(text),
            },
            Self::Scatter { .. } => match raw.map(str::trim) {
                None | Some("") => Err(StripChartError::InvalidSampleValue(String::new())),
                Some(text) => parse_number(text),
            },
            Self::Text { .. } => Ok(SampleValue::Text(raw.unwrap_or_default().to_owned())),
        }
    }

    fn accepts(&self, value: &SampleValue) -> bool {
        matches!(
            (self, value),
            (Self::Line { .. }, SampleValue::Number(_) | SampleValue::Missing)
                | (Self::Scatter { .. }, SampleValue::Number(_))
                | (Self::Text { .. }, SampleValue::Text(_))
        )
    }
}

fn parse_number(text: &str) -> StripChartResult<SampleValue> {
    text.parse::<f64>()
        .map(SampleValue::Number)
        .map_err(|_| StripChartError::InvalidSampleValue(text.to_owned()))
}

/// Outcome of a single append.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleUpdate {
    /// A new point was stored.
    Appended,
    /// The sample continued a flat run; the run's end timestamp moved.
    Extended,
}

/// One named time series.
///
/// `times` and `values` always have equal length and `times` never decreases
/// when fed in order. The dirty flag starts set and is consumed by
/// `prepare_artists`.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    name: String,
    axis: AxisId,
    z_order: usize,
    kind: ChannelKind,
    times: Vec<Timestamp>,
    values: Vec<SampleValue>,
    dirty: bool,
    last_observed_time: Option<Timestamp>,
}

impl Channel {
    pub fn new(name: impl Into<String>, axis: AxisId, z_order: usize, kind: ChannelKind) -> Self {
        Self {
            name: name.into(),
            axis,
            z_order,
            kind,
            times: Vec::new(),
            values: Vec::new(),
            dirty: true,
            last_observed_time: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn axis(&self) -> AxisId {
        self.axis
    }

    #[must_use]
    pub fn z_order(&self) -> usize {
        self.z_order
    }

    #[must_use]
    pub fn kind(&self) -> &ChannelKind {
        &self.kind
    }

    #[must_use]
    pub fn kind_tag(&self) -> ChannelKindTag {
        self.kind.tag()
    }

    #[must_use]
    pub fn times(&self) -> &[Timestamp] {
        &self.times
    }

    #[must_use]
    pub fn values(&self) -> &[SampleValue] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[must_use]
    pub fn last_observed_time(&self) -> Option<Timestamp> {
        self.last_observed_time
    }

    /// Stored samples as numeric plot points. Text samples map to gaps.
    #[must_use]
    pub fn points(&self) -> Vec<PlotPoint> {
        self.times
            .iter()
            .zip(&self.values)
            .map(|(time, value)| PlotPoint::new(*time, value.as_number()))
            .collect()
    }

    /// Parses `raw` for this channel's kind and stores it.
    ///
    /// `None` (or an empty field) is the missing marker on line channels.
    /// A sample older than the last stored one is rejected with
    /// `OutOfOrderSample` and nothing changes.
    pub fn append_sample(
        &mut self,
        time: Timestamp,
        raw: Option<&str>,
    ) -> StripChartResult<SampleUpdate> {
        self.check_order(time)?;
        let value = self.kind.parse_value(raw)?;
        Ok(self.store(time, value))
    }

    /// Stores an already typed value; it must match the channel kind.
    pub fn append_value(
        &mut self,
        time: Timestamp,
        value: SampleValue,
    ) -> StripChartResult<SampleUpdate> {
        if !self.kind.accepts(&value) {
            return Err(StripChartError::InvalidData(format!(
                "{} channel '{}' cannot store {value:?}",
                self.kind.tag(),
                self.name
            )));
        }
        self.check_order(time)?;
        Ok(self.store(time, value))
    }

    fn check_order(&self, time: Timestamp) -> StripChartResult<()> {
        match self.times.last() {
            Some(&last) if time < last => Err(StripChartError::OutOfOrderSample {
                channel: self.name.clone(),
                time,
                last,
            }),
            _ => Ok(()),
        }
    }

    fn store(&mut self, time: Timestamp, value: SampleValue) -> SampleUpdate {
        self.dirty = true;

        let len = self.values.len();
        let extends_flat_run = matches!(self.kind, ChannelKind::Line { .. })
            && len > 1
            && self.values[len - 1] == self.values[len - 2]
            && self.values[len - 1] == value;

        if extends_flat_run {
            self.times[len - 1] = time;
            trace!(channel = %self.name, time, "flat run extended");
            return SampleUpdate::Extended;
        }

        self.times.push(time);
        self.values.push(value);
        trace!(channel = %self.name, time, count = self.times.len(), "sample appended");
        SampleUpdate::Appended
    }

    /// Refreshes the prepared artist data and reports whether it changed.
    ///
    /// Line channels also refresh when the stream's latest timestamp moved so
    /// a repeated last value can follow it.
    pub fn prepare_artists(&mut self, stream_last_time: Option<Timestamp>) -> bool {
        let observed_moved = self.last_observed_time != stream_last_time;
        match &mut self.kind {
            ChannelKind::Line { style, points } => {
                if !self.dirty && !observed_moved {
                    return false;
                }
                *points = self
                    .times
                    .iter()
                    .zip(&self.values)
                    .map(|(time, value)| PlotPoint::new(*time, value.as_number()))
                    .collect();
                if style.repeat {
                    if let (Some(last), Some(stream_last)) = (points.last().copied(), stream_last_time)
                    {
                        if last.time != stream_last {
                            points.push(PlotPoint::new(stream_last, last.value));
                        }
                    }
                }
            }
            ChannelKind::Scatter { offsets, .. } => {
                if !self.dirty {
                    return false;
                }
                *offsets = self
                    .times
                    .iter()
                    .zip(&self.values)
                    .filter_map(|(time, value)| value.as_number().map(|v| (*time, v)))
                    .collect();
            }
            ChannelKind::Text { shown, .. } => {
                if !self.dirty {
                    return false;
                }
                if let Some(last) = self.values.last().and_then(SampleValue::as_text) {
                    *shown = last.to_owned();
                }
            }
        }

        self.last_observed_time = stream_last_time;
        self.dirty = false;
        true
    }

    /// Bounding box of the prepared points, ignoring gaps and text.
    #[must_use]
    pub fn data_limits(&self) -> Option<DataLimits> {
        let mut limits: Option<DataLimits> = None;
        let mut include = |time: Timestamp, value: f64| {
            if !value.is_finite() {
                return;
            }
            let time = time as f64;
            limits
                .get_or_insert(DataLimits::from_point(time, value))
                .include(time, value);
        };

        match &self.kind {
            ChannelKind::Line { points, .. } => {
                for point in points {
                    if let Some(value) = point.value {
                        include(point.time, value);
                    }
                }
            }
            ChannelKind::Scatter { offsets, .. } => {
                for (time, value) in offsets {
                    include(*time, *value);
                }
            }
            ChannelKind::Text { .. } => {}
        }
        limits
    }

    /// Prepared line points including a synthesized repeat point, if any.
    #[must_use]
    pub fn prepared_points(&self) -> Vec<PlotPoint> {
        match &self.kind {
            ChannelKind::Line { points, .. } => points.clone(),
            ChannelKind::Scatter { offsets, .. } => offsets
                .iter()
                .map(|(time, value)| PlotPoint::new(*time, Some(*value)))
                .collect(),
            ChannelKind::Text { .. } => Vec::new(),
        }
    }

    /// Text currently shown by a text channel.
    #[must_use]
    pub fn shown_text(&self) -> Option<&str> {
        match &self.kind {
            ChannelKind::Text { shown, .. } => Some(shown),
            ChannelKind::Line { .. } | ChannelKind::Scatter { .. } => None,
        }
    }

    /// Latest text whose timestamp is at or before `time`, empty before the
    /// first sample.
    #[must_use]
    pub fn text_at(&self, time: Timestamp) -> Option<&str> {
        if !matches!(self.kind, ChannelKind::Text { .. }) {
            return None;
        }
        let index = self.times.partition_point(|t| *t <= time);
        Some(
            index
                .checked_sub(1)
                .and_then(|i| self.values[i].as_text())
                .unwrap_or(""),
        )
    }

    /// Shows the text under the pointer. Returns whether the shown text changed.
    pub fn hover(&mut self, time: Timestamp) -> bool {
        let Some(text) = self.text_at(time).map(str::to_owned) else {
            return false;
        };
        self.show_text(text)
    }

    /// Restores the latest text after the pointer leaves.
    pub fn hover_leave(&mut self) -> bool {
        let last = match (&self.kind, self.values.last()) {
            (ChannelKind::Text { .. }, Some(value)) => value.as_text().unwrap_or("").to_owned(),
            _ => return false,
        };
        self.show_text(last)
    }

    fn show_text(&mut self, text: String) -> bool {
        match &mut self.kind {
            ChannelKind::Text { shown, .. } if *shown != text => {
                *shown = text;
                true
            }
            _ => false,
        }
    }

    /// Releases the channel. Consuming `self` guarantees no later invalidation.
    pub fn destroy(self) {
        debug!(
            channel = %self.name,
            kind = %self.kind.tag(),
            samples = self.times.len(),
            "channel destroyed"
        );
    }
}
