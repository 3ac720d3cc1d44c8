use std::time::{Duration, Instant};

use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::core::{
    DataLimits, MICROS_PER_SECOND, Rect, SampleValue, TickLabeler, TimeLocator, TimeTick,
    Timestamp, ValueFormat,
};
use crate::error::{StripChartError, StripChartResult};

use super::channel::{Channel, ChannelKind, SampleUpdate};
use super::channel_options::{ChannelKindTag, ChannelOptions};
use super::config::{StreamConfig, WindowConfig};
use super::ids::{AxisId, IdGenerator, StreamId};

const STREAM_INSET_RATIO: f64 = 0.9;
const AXIS_GAP_RATIO: f64 = 0.005;
const AXIS_FILL_RATIO: f64 = 0.99;
const TIME_WINDOW_LEAD_RATIO: f64 = 0.01;
const VALUE_MARGIN_RATIO: f64 = 0.03;

/// Wheel direction for `Stream::zoom_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

/// A value axis stacked inside a stream; all axes share the time axis.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueAxis {
    pub id: AxisId,
    pub name: Option<String>,
    pub weight: f64,
    pub format: ValueFormat,
    pub rect: Rect,
    pub data_limits: Option<DataLimits>,
    pub value_view: Option<(f64, f64)>,
}

impl ValueAxis {
    fn new(id: AxisId, name: Option<String>, weight: f64) -> Self {
        Self {
            id,
            name,
            weight,
            format: ValueFormat::default(),
            rect: Rect::unit(),
            data_limits: None,
            value_view: None,
        }
    }

    /// Formats a value with this axis' label format.
    #[must_use]
    pub fn format_value(&self, value: f64) -> String {
        self.format.format(value)
    }
}

/// A group of channels sharing one time axis.
///
/// Channels keep insertion order, which is also their stacking order. The
/// stream is dirty while any channel has unconsumed samples or its layout
/// changed; `prepare_artists` consumes both.
#[derive(Debug)]
pub struct Stream {
    id: StreamId,
    name: String,
    zoomed: bool,
    time_window_secs: Option<f64>,
    channels: IndexMap<String, Channel>,
    axes: SmallVec<[ValueAxis; 2]>,
    locator: TimeLocator,
    labeler: TickLabeler,
    dirty: bool,
    dirty_layout: bool,
    position: Rect,
    window_width_px: f64,
    last_timestamp: Option<Timestamp>,
    time_view: Option<(f64, f64)>,
    custom_scale_until: Option<Instant>,
    zoom_hold: Duration,
    zoom_step: f64,
    derived_generation: u64,
}

impl Stream {
    pub fn new(
        id: StreamId,
        ids: &mut IdGenerator,
        config: &StreamConfig,
        window: &WindowConfig,
    ) -> Self {
        let mut axes = SmallVec::new();
        axes.push(ValueAxis::new(ids.next_axis_id(), None, 1.0));
        Self {
            id,
            name: config.title.clone().unwrap_or_else(|| "Nothing".to_owned()),
            zoomed: false,
            time_window_secs: config.time_window_secs,
            channels: IndexMap::new(),
            axes,
            locator: TimeLocator::new(window.reference_zone()),
            labeler: window.tick_labeler(),
            dirty: true,
            dirty_layout: true,
            position: Rect::unit(),
            window_width_px: 0.0,
            last_timestamp: None,
            time_view: None,
            custom_scale_until: None,
            zoom_hold: Duration::from_secs(window.zoom_hold_secs),
            zoom_step: window.zoom_step,
            derived_generation: 0,
        }
    }

    #[must_use]
    pub fn id(&self) -> StreamId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Title text as displayed; manual zoom appends a marker.
    #[must_use]
    pub fn title(&self) -> String {
        if self.zoomed {
            format!("{} Zoomed", self.name)
        } else {
            self.name.clone()
        }
    }

    #[must_use]
    pub fn is_zoomed(&self) -> bool {
        self.zoomed
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty || self.dirty_layout
    }

    #[must_use]
    pub fn last_timestamp(&self) -> Option<Timestamp> {
        self.last_timestamp
    }

    #[must_use]
    pub fn position(&self) -> Rect {
        self.position
    }

    #[must_use]
    pub fn time_view(&self) -> Option<(f64, f64)> {
        self.time_view
    }

    /// Counts recomputations of derived state (data limits), one per changed pass.
    #[must_use]
    pub fn derived_generation(&self) -> u64 {
        self.derived_generation
    }

    #[must_use]
    pub fn axes(&self) -> &[ValueAxis] {
        &self.axes
    }

    #[must_use]
    pub fn axis(&self, id: AxisId) -> Option<&ValueAxis> {
        self.axes.iter().find(|axis| axis.id == id)
    }

    #[must_use]
    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.get(name)
    }

    #[must_use]
    pub fn contains_channel(&self, name: &str) -> bool {
        self.channels.contains_key(name)
    }

    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.values()
    }

    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    #[must_use]
    pub fn locator(&self) -> &TimeLocator {
        &self.locator
    }

    #[must_use]
    pub fn labeler(&self) -> TickLabeler {
        self.labeler
    }

    /// Declares a channel, replacing any channel with the same name. A
    /// replaced channel's axis is removed once no channel uses it.
    ///
    /// `axis`, `axis_weight` and `format` place the channel on a value axis;
    /// the remaining options must be valid for `tag`. Nothing changes when
    /// validation fails.
    pub fn create_channel(
        &mut self,
        ids: &mut IdGenerator,
        name: &str,
        tag: ChannelKindTag,
        mut options: ChannelOptions,
    ) -> StripChartResult<()> {
        let axis_name = options.shift_remove("axis");
        let axis_weight = options.shift_remove("axis_weight");
        let format = options
            .shift_remove("format")
            .map(|pattern| {
                ValueFormat::parse(&pattern).ok_or_else(|| StripChartError::InvalidChannelOption {
                    kind: tag.as_str(),
                    key: "format".to_owned(),
                    value: pattern.clone(),
                })
            })
            .transpose()?;
        let kind = ChannelKind::from_options(tag, &options)?;

        let existing_axis = axis_name.as_deref().and_then(|axis_name| {
            self.axes
                .iter()
                .position(|axis| axis.name.as_deref() == Some(axis_name))
        });
        let axis_index = match (existing_axis, axis_weight, axis_name) {
            (Some(index), _, _) => index,
            (None, Some(weight), axis_name) => {
                let parsed = weight
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|w| w.is_finite() && *w > 0.0)
                    .ok_or_else(|| StripChartError::InvalidChannelOption {
                        kind: tag.as_str(),
                        key: "axis_weight".to_owned(),
                        value: weight.clone(),
                    })?;
                self.axes
                    .push(ValueAxis::new(ids.next_axis_id(), axis_name, parsed));
                self.axes.len() - 1
            }
            (None, None, Some(axis_name)) => {
                return Err(StripChartError::InvalidChannelOption {
                    kind: tag.as_str(),
                    key: "axis".to_owned(),
                    value: axis_name,
                });
            }
            (None, None, None) => 0,
        };
        if let Some(format) = format {
            self.axes[axis_index].format = format;
        }
        let axis = self.axes[axis_index].id;

        let replaced = self.channels.shift_remove(name);
        let z_order = self.channels.len();
        self.channels
            .insert(name.to_owned(), Channel::new(name, axis, z_order, kind));
        if let Some(previous) = replaced {
            previous.destroy();
            self.drop_unused_axes();
        }

        debug!(
            stream = %self.id,
            channel = name,
            kind = %tag,
            %axis,
            "channel created"
        );
        self.dirty = true;
        self.dirty_layout = true;
        Ok(())
    }

    /// Drops named axes that no channel is placed on any more. The default
    /// axis always stays.
    fn drop_unused_axes(&mut self) {
        let default_axis = self.axes[0].id;
        let channels = &self.channels;
        self.axes.retain(|axis| {
            axis.id == default_axis || channels.values().any(|channel| channel.axis() == axis.id)
        });
    }

    /// Parses and stores a sample on `channel`, invalidating the stream.
    pub fn append_sample(
        &mut self,
        channel: &str,
        time: Timestamp,
        raw: Option<&str>,
    ) -> StripChartResult<SampleUpdate> {
        let target = self
            .channels
            .get_mut(channel)
            .ok_or_else(|| StripChartError::UnknownChannel(channel.to_owned()))?;
        let update = target.append_sample(time, raw)?;
        self.observe(time);
        Ok(update)
    }

    /// Stores an already typed sample on `channel`, invalidating the stream.
    pub fn append_value(
        &mut self,
        channel: &str,
        time: Timestamp,
        value: SampleValue,
    ) -> StripChartResult<SampleUpdate> {
        let target = self
            .channels
            .get_mut(channel)
            .ok_or_else(|| StripChartError::UnknownChannel(channel.to_owned()))?;
        let update = target.append_value(time, value)?;
        self.observe(time);
        Ok(update)
    }

    fn observe(&mut self, time: Timestamp) {
        self.dirty = true;
        self.last_timestamp = Some(self.last_timestamp.map_or(time, |last| last.max(time)));
    }

    /// Places the stream inside `rect` (window-fraction units) with a margin.
    ///
    /// Returns whether the layout changed.
    pub fn set_position(&mut self, rect: Rect, window_width_px: f64) -> bool {
        let width = rect.width * STREAM_INSET_RATIO;
        let height = rect.height * STREAM_INSET_RATIO;
        let inset = Rect::new(
            rect.x + (rect.width - width) * 0.5,
            rect.y + (rect.height - height) * 0.5,
            width,
            height,
        );
        self.window_width_px = window_width_px;

        if inset == self.position {
            return false;
        }
        self.position = inset;
        self.dirty_layout = true;
        true
    }

    /// Pixel width of the time axis, used for label thinning.
    #[must_use]
    pub fn axis_width_px(&self) -> f64 {
        self.position.width * self.window_width_px
    }

    pub fn prepare_artists(&mut self) -> bool {
        self.prepare_artists_at(Instant::now())
    }

    /// Runs one redraw pass for this stream.
    ///
    /// Channels are only visited when the stream is dirty; derived state is
    /// recomputed at most once, and only when something changed.
    pub fn prepare_artists_at(&mut self, now: Instant) -> bool {
        let mut changed = false;

        if self.dirty_layout {
            self.layout_axes();
            self.dirty_layout = false;
            changed = true;
        }

        if self.dirty {
            for channel in self.channels.values_mut() {
                changed = channel.prepare_artists(self.last_timestamp) || changed;
            }
            self.dirty = false;
        }

        if changed {
            self.recompute_data_limits();
        }

        if self.zoom_hold_expired(now) {
            self.scale_to_default();
            changed = true;
        } else if changed && self.custom_scale_until.is_none() {
            self.scale_to_default();
        }

        trace!(stream = %self.id, changed, "stream prepared");
        changed
    }

    /// Whether a manual zoom is waiting to be dropped at `now`.
    #[must_use]
    pub fn zoom_hold_expired(&self, now: Instant) -> bool {
        self.custom_scale_until.is_some_and(|until| now >= until)
    }

    fn layout_axes(&mut self) {
        let total_weight: f64 = self.axes.iter().map(|axis| axis.weight).sum();
        if total_weight <= 0.0 {
            return;
        }

        let position = self.position;
        let mut y = position.y;
        for axis in self.axes.iter_mut().rev() {
            let height = axis.weight * position.height / total_weight;
            axis.rect = Rect::new(
                position.x,
                y + height * AXIS_GAP_RATIO,
                position.width,
                height * AXIS_FILL_RATIO,
            );
            y += height;
        }
    }

    fn recompute_data_limits(&mut self) {
        for axis in &mut self.axes {
            axis.data_limits = self
                .channels
                .values()
                .filter(|channel| channel.axis() == axis.id)
                .filter_map(Channel::data_limits)
                .reduce(DataLimits::union);
        }
        self.derived_generation += 1;
    }

    /// Returns to automatic scaling and clears any zoom marker.
    pub fn scale_to_default(&mut self) {
        self.custom_scale_until = None;
        self.zoomed = false;

        let Some(overall) = self
            .axes
            .iter()
            .filter_map(|axis| axis.data_limits)
            .reduce(DataLimits::union)
        else {
            return;
        };

        match self.time_window_secs {
            Some(window_secs) => {
                let width = window_secs * MICROS_PER_SECOND as f64;
                let lead = width * TIME_WINDOW_LEAD_RATIO;
                self.time_view = Some((overall.time_max - width + lead, overall.time_max + lead));
                for axis in &mut self.axes {
                    axis.value_view = axis.data_limits.map(|limits| {
                        let margin = (limits.value_max - limits.value_min) * VALUE_MARGIN_RATIO;
                        (limits.value_min - margin, limits.value_max + margin)
                    });
                }
            }
            None => {
                self.time_view = Some((overall.time_min, overall.time_max));
                for axis in &mut self.axes {
                    axis.value_view = axis
                        .data_limits
                        .map(|limits| (limits.value_min, limits.value_max));
                }
            }
        }
    }

    /// Zooms the time view around `anchor` and holds it against auto-scaling.
    ///
    /// Zooming in shrinks the view by the zoom step `k`; zooming out grows it
    /// by `k / (1 + k)`. The point under `anchor` keeps its relative position.
    pub fn zoom_at(
        &mut self,
        anchor: f64,
        direction: ZoomDirection,
        now: Instant,
    ) -> StripChartResult<()> {
        let (mut view_min, mut view_max) = self.time_view.ok_or_else(|| {
            StripChartError::InvalidData("stream has no time view to zoom".to_owned())
        })?;
        if !anchor.is_finite() {
            return Err(StripChartError::InvalidData(
                "zoom anchor must be finite".to_owned(),
            ));
        }

        let until = now.checked_add(self.zoom_hold).ok_or_else(|| {
            StripChartError::InvalidData("zoom hold overflows the clock".to_owned())
        })?;

        let interval = (view_max - view_min).abs();
        if interval == 0.0 {
            return Ok(());
        }
        let k = self.zoom_step;
        let delta = match direction {
            ZoomDirection::In => interval * k,
            ZoomDirection::Out => -(interval * k / (1.0 + k)),
        };
        let anchor_ratio = (anchor - view_min).abs() / interval;
        view_min += anchor_ratio * delta;
        view_max -= (1.0 - anchor_ratio) * delta;

        self.time_view = Some((view_min, view_max));
        self.custom_scale_until = Some(until);
        self.zoomed = true;
        debug!(stream = %self.id, view_min, view_max, "stream zoomed");
        Ok(())
    }

    /// Located and labeled ticks for the current time view.
    pub fn time_ticks(&mut self) -> StripChartResult<Vec<TimeTick>> {
        let Some((view_min, view_max)) = self.time_view else {
            return Ok(Vec::new());
        };
        let axis_width_px = self.axis_width_px();
        self.labeler.ticks(
            &mut self.locator,
            view_min.floor() as Timestamp,
            view_max.ceil() as Timestamp,
            axis_width_px,
        )
    }

    #[must_use]
    pub fn cursor_label(&self, time: Timestamp) -> String {
        self.locator.cursor_label(time)
    }

    /// Shows hover text for every text channel. Returns whether any changed.
    pub fn hover(&mut self, time: Timestamp) -> bool {
        let mut changed = false;
        for channel in self.channels.values_mut() {
            changed = channel.hover(time) || changed;
        }
        changed
    }

    pub fn hover_leave(&mut self) -> bool {
        let mut changed = false;
        for channel in self.channels.values_mut() {
            changed = channel.hover_leave() || changed;
        }
        changed
    }

    /// Releases all channels; consuming `self` guarantees no later redraw.
    pub fn destroy(self) {
        let channel_count = self.channels.len();
        for (_, channel) in self.channels {
            channel.destroy();
        }
        debug!(stream = %self.id, channel_count, "stream destroyed");
    }
}
