use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::step_table::{ReferenceZone, StepFormat, select_formatter};
use crate::core::types::Timestamp;
use crate::error::{StripChartError, StripChartResult};

/// Number of ticks the locator aims for across the visible range.
pub const TARGET_TICK_COUNT: i64 = 10;

/// Label rendered for ticks too close to the axis origin.
pub const PLACEHOLDER_LABEL: &str = "--";

const PLACEHOLDER_ORIGIN_DISTANCE: Timestamp = 20;

/// Tick position with its rendered label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeTick {
    pub time: Timestamp,
    pub label: String,
}

/// Adaptive time-axis locator.
///
/// Each `tick_values` call picks a step from the step table and remembers the
/// matching formatter, which `format` then uses for labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeLocator {
    zone: ReferenceZone,
    active_step_us: Option<i64>,
    active_format: StepFormat,
}

impl Default for TimeLocator {
    fn default() -> Self {
        Self::new(ReferenceZone::default())
    }
}

impl TimeLocator {
    #[must_use]
    pub fn new(zone: ReferenceZone) -> Self {
        Self {
            zone,
            active_step_us: None,
            active_format: StepFormat::Raw,
        }
    }

    #[must_use]
    pub fn zone(&self) -> ReferenceZone {
        self.zone
    }

    /// Step chosen by the last successful `tick_values` call.
    #[must_use]
    pub fn active_step_us(&self) -> Option<i64> {
        self.active_step_us
    }

    #[must_use]
    pub fn active_format(&self) -> StepFormat {
        self.active_format
    }

    /// Generates aligned tick positions in `[first_tick, view_max)`.
    ///
    /// The first tick sits on a step boundary in the reference zone and may
    /// precede `view_min`. Views wider than the step table supports yield
    /// `UnsupportedViewWidth` and reset the active formatter to raw output.
    /// A first tick below `i64::MIN` yields `InvalidData`.
    pub fn tick_values(
        &mut self,
        view_min: Timestamp,
        view_max: Timestamp,
    ) -> StripChartResult<Vec<Timestamp>> {
        let raw_step_us = (view_max as f64 - view_min as f64) / TARGET_TICK_COUNT as f64;

        let Some(candidate) = select_formatter(raw_step_us) else {
            self.active_step_us = None;
            self.active_format = StepFormat::Raw;
            return Err(StripChartError::UnsupportedViewWidth { raw_step_us });
        };

        let step = candidate.threshold_us;
        self.active_step_us = Some(step);
        self.active_format = candidate.format;

        let offset = self.zone.offset_micros();
        let shifted = view_min.saturating_add(offset);
        let first = shifted
            .checked_sub(shifted.rem_euclid(step))
            .and_then(|aligned| aligned.checked_sub(offset));
        let Some(mut tick) = first else {
            return Err(StripChartError::InvalidData(format!(
                "first tick before {view_min} is out of the timestamp range"
            )));
        };

        let mut ticks = Vec::new();
        while tick < view_max {
            ticks.push(tick);
            match tick.checked_add(step) {
                Some(next) => tick = next,
                None => break,
            }
        }

        trace!(
            view_min,
            view_max,
            step,
            tick_count = ticks.len(),
            "time ticks located"
        );
        Ok(ticks)
    }

    /// Formats a tick with the formatter selected by the last located range.
    #[must_use]
    pub fn format(&self, time: Timestamp) -> String {
        self.active_format.format(time, self.zone)
    }

    /// Full-precision readout used for cursor positions.
    #[must_use]
    pub fn cursor_label(&self, time: Timestamp) -> String {
        match self.zone.local_datetime(time) {
            Some(local) => local.format("DATE: %Y/%m/%d %H:%M:%S.%6f").to_string(),
            None => time.to_string(),
        }
    }
}

/// Render-boundary rules for time-axis labels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickLabeler {
    pub thinning_width_px: f64,
}

impl Default for TickLabeler {
    fn default() -> Self {
        Self {
            thinning_width_px: 500.0,
        }
    }
}

impl TickLabeler {
    #[must_use]
    pub fn new(thinning_width_px: f64) -> Self {
        Self { thinning_width_px }
    }

    /// Label for tick number `index` at `time` on an axis `axis_width_px` wide.
    ///
    /// Narrow axes keep only odd-indexed labels; ticks near the origin render
    /// as a placeholder.
    #[must_use]
    pub fn label(
        &self,
        locator: &TimeLocator,
        index: usize,
        time: Timestamp,
        axis_width_px: f64,
    ) -> String {
        if time < PLACEHOLDER_ORIGIN_DISTANCE {
            return PLACEHOLDER_LABEL.to_owned();
        }

        if axis_width_px >= self.thinning_width_px || index % 2 == 1 {
            return locator.format(time);
        }

        String::new()
    }

    /// Locates and labels ticks for one axis in a single call.
    pub fn ticks(
        &self,
        locator: &mut TimeLocator,
        view_min: Timestamp,
        view_max: Timestamp,
        axis_width_px: f64,
    ) -> StripChartResult<Vec<TimeTick>> {
        let positions = locator.tick_values(view_min, view_max)?;
        Ok(positions
            .into_iter()
            .enumerate()
            .map(|(index, time)| TimeTick {
                time,
                label: self.label(locator, index, time, axis_width_px),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::{PLACEHOLDER_LABEL, TickLabeler, TimeLocator};
    use crate::core::step_table::ReferenceZone;

    #[test]
    fn labels_near_origin_are_placeholders() {
        let mut locator = TimeLocator::new(ReferenceZone::utc());
        locator.tick_values(0, 100).expect("ticks");
        let labeler = TickLabeler::default();
        assert_eq!(labeler.label(&locator, 1, 19, 800.0), PLACEHOLDER_LABEL);
        assert_ne!(labeler.label(&locator, 1, 20, 800.0), PLACEHOLDER_LABEL);
    }

    #[test]
    fn narrow_axis_drops_even_indexed_labels() {
        let mut locator = TimeLocator::new(ReferenceZone::utc());
        locator.tick_values(1_000, 1_100).expect("ticks");
        let labeler = TickLabeler::new(500.0);

        assert_eq!(labeler.label(&locator, 0, 1_000, 499.0), "");
        assert_eq!(labeler.label(&locator, 1, 1_010, 499.0), "10ns");
        assert_eq!(labeler.label(&locator, 0, 1_000, 500.0), "0ns");
    }

    #[test]
    fn cursor_label_shows_microseconds_in_reference_zone() {
        let locator = TimeLocator::new(ReferenceZone::utc());
        assert_eq!(
            locator.cursor_label(1_500_000),
            "DATE: 1970/01/01 00:00:01.500000"
        );
    }
}
