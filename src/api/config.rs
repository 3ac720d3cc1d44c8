use serde::{Deserialize, Serialize};

use crate::core::{ReferenceZone, TickLabeler};
use crate::error::{StripChartError, StripChartResult};

/// Longest accepted manual zoom hold, one day.
pub const MAX_ZOOM_HOLD_SECS: u64 = 24 * 60 * 60;

/// Window bootstrap configuration.
///
/// Serializable so hosts can keep viewer setup next to their data files.
/// Missing JSON fields fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_title")]
    pub title: String,
    /// Timer period the host should use for `Window::tick`.
    #[serde(default = "default_window_update_interval_ms")]
    pub window_update_interval_ms: u64,
    /// Timer period for stream-level sources.
    #[serde(default = "default_stream_update_interval_ms")]
    pub stream_update_interval_ms: u64,
    #[serde(default = "default_label_thinning_width_px")]
    pub label_thinning_width_px: f64,
    #[serde(default = "default_zone_offset_seconds")]
    pub zone_offset_seconds: i32,
    #[serde(default = "default_zoom_hold_secs")]
    pub zoom_hold_secs: u64,
    #[serde(default = "default_zoom_step")]
    pub zoom_step: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            window_update_interval_ms: default_window_update_interval_ms(),
            stream_update_interval_ms: default_stream_update_interval_ms(),
            label_thinning_width_px: default_label_thinning_width_px(),
            zone_offset_seconds: default_zone_offset_seconds(),
            zoom_hold_secs: default_zoom_hold_secs(),
            zoom_step: default_zoom_step(),
        }
    }
}

impl WindowConfig {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_zone_offset_seconds(mut self, zone_offset_seconds: i32) -> Self {
        self.zone_offset_seconds = zone_offset_seconds;
        self
    }

    #[must_use]
    pub fn with_label_thinning_width_px(mut self, width_px: f64) -> Self {
        self.label_thinning_width_px = width_px;
        self
    }

    #[must_use]
    pub fn with_zoom_hold_secs(mut self, zoom_hold_secs: u64) -> Self {
        self.zoom_hold_secs = zoom_hold_secs;
        self
    }

    #[must_use]
    pub fn with_zoom_step(mut self, zoom_step: f64) -> Self {
        self.zoom_step = zoom_step;
        self
    }

    #[must_use]
    pub fn with_update_intervals_ms(mut self, window_ms: u64, stream_ms: u64) -> Self {
        self.window_update_interval_ms = window_ms;
        self.stream_update_interval_ms = stream_ms;
        self
    }

    #[must_use]
    pub fn reference_zone(&self) -> ReferenceZone {
        ReferenceZone::from_offset_seconds(self.zone_offset_seconds)
    }

    #[must_use]
    pub fn tick_labeler(&self) -> TickLabeler {
        TickLabeler::new(self.label_thinning_width_px)
    }

    pub fn validate(self) -> StripChartResult<Self> {
        if !self.label_thinning_width_px.is_finite() || self.label_thinning_width_px < 0.0 {
            return Err(StripChartError::InvalidData(
                "label thinning width must be finite and >= 0".to_owned(),
            ));
        }
        if self.zoom_hold_secs > MAX_ZOOM_HOLD_SECS {
            return Err(StripChartError::InvalidData(format!(
                "zoom hold must be <= {MAX_ZOOM_HOLD_SECS} s"
            )));
        }
        if !self.zoom_step.is_finite() || self.zoom_step <= 0.0 || self.zoom_step >= 1.0 {
            return Err(StripChartError::InvalidData(
                "zoom step must be finite and in (0, 1)".to_owned(),
            ));
        }
        if self.window_update_interval_ms == 0 || self.stream_update_interval_ms == 0 {
            return Err(StripChartError::InvalidData(
                "update intervals must be > 0".to_owned(),
            ));
        }
        Ok(self)
    }

    pub fn from_json_str(input: &str) -> StripChartResult<Self> {
        let config: Self = serde_json::from_str(input).map_err(|e| {
            StripChartError::InvalidData(format!("failed to parse window config json: {e}"))
        })?;
        config.validate()
    }

    pub fn to_json_pretty(&self) -> StripChartResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            StripChartError::InvalidData(format!("failed to serialize window config json: {e}"))
        })
    }
}

/// Per-stream options given at creation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StreamConfig {
    #[serde(default)]
    pub title: Option<String>,
    /// Width of the sliding time view; `None` autoscales to all data.
    #[serde(default)]
    pub time_window_secs: Option<f64>,
}

impl StreamConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_time_window_secs(mut self, seconds: f64) -> Self {
        self.time_window_secs = Some(seconds);
        self
    }
}

fn default_title() -> String {
    "Figure 1".to_owned()
}

fn default_window_update_interval_ms() -> u64 {
    300
}

fn default_stream_update_interval_ms() -> u64 {
    200
}

fn default_label_thinning_width_px() -> f64 {
    500.0
}

fn default_zone_offset_seconds() -> i32 {
    4 * 60 * 60
}

fn default_zoom_hold_secs() -> u64 {
    30
}

fn default_zoom_step() -> f64 {
    0.2
}
