use serde::{Deserialize, Serialize};

use crate::core::{DataLimits, Rect, StepFormat, TimeTick, Timestamp};
use crate::error::{StripChartError, StripChartResult};

use super::channel_options::ChannelKindTag;
use super::ids::{AxisId, StreamId};
use super::stream::Stream;
use super::window::Window;

pub const WINDOW_SNAPSHOT_JSON_SCHEMA_V1: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSnapshot {
    pub name: String,
    pub kind: ChannelKindTag,
    pub axis: AxisId,
    pub z_order: usize,
    pub stored_points: usize,
    pub prepared_points: usize,
    pub dirty: bool,
    pub shown_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisSnapshot {
    pub id: AxisId,
    pub name: Option<String>,
    pub weight: f64,
    pub rect: Rect,
    pub data_limits: Option<DataLimits>,
    pub value_view: Option<(f64, f64)>,
    /// Value-axis labels at the view bounds.
    pub value_labels: Option<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamSnapshot {
    pub id: StreamId,
    pub title: String,
    pub zoomed: bool,
    pub dirty: bool,
    pub last_timestamp: Option<Timestamp>,
    pub time_view: Option<(f64, f64)>,
    pub tick_step_us: Option<i64>,
    pub tick_format: StepFormat,
    pub time_ticks: Vec<TimeTick>,
    /// Set when the view is too wide to place time ticks.
    pub tick_error: Option<String>,
    pub axes: Vec<AxisSnapshot>,
    pub channels: Vec<ChannelSnapshot>,
}

/// Serializable state dump used by tooling and regression tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSnapshot {
    pub title: String,
    pub dirty: bool,
    pub streams: Vec<StreamSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSnapshotJsonContractV1 {
    pub schema_version: u32,
    pub snapshot: WindowSnapshot,
}

impl StreamSnapshot {
    /// Captures `stream`. Ticks come from a copy of its locator, so taking a
    /// snapshot never changes the stream.
    #[must_use]
    pub fn capture(stream: &Stream) -> Self {
        let mut locator = *stream.locator();
        let labeler = stream.labeler();
        let (time_ticks, tick_error) = match stream.time_view() {
            Some((view_min, view_max)) => match labeler.ticks(
                &mut locator,
                view_min.floor() as Timestamp,
                view_max.ceil() as Timestamp,
                stream.axis_width_px(),
            ) {
                Ok(ticks) => (ticks, None),
                Err(err) => (Vec::new(), Some(err.to_string())),
            },
            None => (Vec::new(), None),
        };

        Self {
            id: stream.id(),
            title: stream.title(),
            zoomed: stream.is_zoomed(),
            dirty: stream.is_dirty(),
            last_timestamp: stream.last_timestamp(),
            time_view: stream.time_view(),
            tick_step_us: locator.active_step_us(),
            tick_format: locator.active_format(),
            time_ticks,
            tick_error,
            axes: stream
                .axes()
                .iter()
                .map(|axis| AxisSnapshot {
                    id: axis.id,
                    name: axis.name.clone(),
                    weight: axis.weight,
                    rect: axis.rect,
                    data_limits: axis.data_limits,
                    value_view: axis.value_view,
                    value_labels: axis
                        .value_view
                        .map(|(low, high)| (axis.format_value(low), axis.format_value(high))),
                })
                .collect(),
            channels: stream
                .channels()
                .map(|channel| ChannelSnapshot {
                    name: channel.name().to_owned(),
                    kind: channel.kind_tag(),
                    axis: channel.axis(),
                    z_order: channel.z_order(),
                    stored_points: channel.len(),
                    prepared_points: channel.prepared_points().len(),
                    dirty: channel.is_dirty(),
                    shown_text: channel.shown_text().map(str::to_owned),
                })
                .collect(),
        }
    }
}

impl Window {
    #[must_use]
    pub fn snapshot(&self) -> WindowSnapshot {
        WindowSnapshot {
            title: self.title().to_owned(),
            dirty: self.is_dirty(),
            streams: self.streams().map(StreamSnapshot::capture).collect(),
        }
    }
}

impl WindowSnapshot {
    pub fn to_json_contract_v1_pretty(&self) -> StripChartResult<String> {
        let payload = WindowSnapshotJsonContractV1 {
            schema_version: WINDOW_SNAPSHOT_JSON_SCHEMA_V1,
            snapshot: self.clone(),
        };
        serde_json::to_string_pretty(&payload).map_err(|e| {
            StripChartError::InvalidData(format!("failed to serialize snapshot contract v1: {e}"))
        })
    }

    pub fn from_json_contract_v1_str(input: &str) -> StripChartResult<Self> {
        let payload: WindowSnapshotJsonContractV1 = serde_json::from_str(input).map_err(|e| {
            StripChartError::InvalidData(format!("failed to parse snapshot json payload: {e}"))
        })?;
        if payload.schema_version != WINDOW_SNAPSHOT_JSON_SCHEMA_V1 {
            return Err(StripChartError::InvalidData(format!(
                "unsupported snapshot schema version: {}",
                payload.schema_version
            )));
        }
        Ok(payload.snapshot)
    }
}
