use std::io::BufRead;
use std::time::Instant;

use indexmap::IndexMap;
use tracing::{debug, trace, warn};

use crate::core::{Rect, Timestamp};
use crate::error::{StripChartError, StripChartResult};

use super::channel::SampleUpdate;
use super::channel_options::{ChannelKindTag, ChannelOptions};
use super::config::{StreamConfig, WindowConfig};
use super::ids::{IdGenerator, StreamId};
use super::records::{LoadSummary, load_records};
use super::sources::DataSource;
use super::stream::{Stream, ZoomDirection};

struct StreamSlot {
    stream: Stream,
    source: Option<Box<dyn DataSource>>,
}

/// Top-level container of streams and root of the redraw scheduler.
///
/// The window exclusively owns its streams, which own their channels. Every
/// mutation routed through the window marks it dirty; a `prepare_artists`
/// pass visits streams only while the window is dirty.
pub struct Window {
    config: WindowConfig,
    ids: IdGenerator,
    streams: IndexMap<StreamId, StreamSlot>,
    dirty: bool,
    size_px: Option<(f64, f64)>,
}

impl std::fmt::Debug for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Window")
            .field("title", &self.config.title)
            .field("streams", &self.streams.len())
            .field("dirty", &self.dirty)
            .field("size_px", &self.size_px)
            .finish()
    }
}

impl Window {
    pub fn new(config: WindowConfig) -> StripChartResult<Self> {
        Ok(Self {
            config: config.validate()?,
            ids: IdGenerator::new(),
            streams: IndexMap::new(),
            dirty: true,
            size_px: None,
        })
    }

    #[must_use]
    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.config.title
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    pub fn create_stream(&mut self, config: StreamConfig) -> StreamId {
        self.insert_stream(config, None)
    }

    /// Creates a stream fed by `source` on every `tick`.
    pub fn create_stream_with_source(
        &mut self,
        config: StreamConfig,
        source: Box<dyn DataSource>,
    ) -> StreamId {
        self.insert_stream(config, Some(source))
    }

    fn insert_stream(
        &mut self,
        config: StreamConfig,
        source: Option<Box<dyn DataSource>>,
    ) -> StreamId {
        let id = self.ids.next_stream_id();
        let stream = Stream::new(id, &mut self.ids, &config, &self.config);
        self.streams.insert(id, StreamSlot { stream, source });
        debug!(window = %self.config.title, stream = %id, "stream created");
        self.dirty = true;
        self.relayout();
        id
    }

    pub fn set_stream_source(
        &mut self,
        id: StreamId,
        source: Box<dyn DataSource>,
    ) -> StripChartResult<()> {
        self.slot_mut(id)?.source = Some(source);
        Ok(())
    }

    /// Removes and destroys a stream with all its channels.
    pub fn destroy_stream(&mut self, id: StreamId) -> StripChartResult<()> {
        let slot = self
            .streams
            .shift_remove(&id)
            .ok_or(StripChartError::UnknownStream(id.0))?;
        slot.stream.destroy();
        self.dirty = true;
        self.relayout();
        Ok(())
    }

    #[must_use]
    pub fn stream(&self, id: StreamId) -> Option<&Stream> {
        self.streams.get(&id).map(|slot| &slot.stream)
    }

    /// Mutable access to a stream. The window is invalidated up front since
    /// the caller may change anything.
    pub fn stream_mut(&mut self, id: StreamId) -> Option<&mut Stream> {
        let slot = self.streams.get_mut(&id)?;
        self.dirty = true;
        Some(&mut slot.stream)
    }

    pub fn streams(&self) -> impl Iterator<Item = &Stream> {
        self.streams.values().map(|slot| &slot.stream)
    }

    #[must_use]
    pub fn stream_ids(&self) -> Vec<StreamId> {
        self.streams.keys().copied().collect()
    }

    fn slot_mut(&mut self, id: StreamId) -> StripChartResult<&mut StreamSlot> {
        self.streams
            .get_mut(&id)
            .ok_or(StripChartError::UnknownStream(id.0))
    }

    pub fn create_channel(
        &mut self,
        stream: StreamId,
        name: &str,
        tag: ChannelKindTag,
        options: ChannelOptions,
    ) -> StripChartResult<()> {
        let slot = self
            .streams
            .get_mut(&stream)
            .ok_or(StripChartError::UnknownStream(stream.0))?;
        slot.stream
            .create_channel(&mut self.ids, name, tag, options)?;
        self.dirty = true;
        Ok(())
    }

    /// Appends a sample; the channel, its stream and the window become dirty.
    pub fn append_sample(
        &mut self,
        stream: StreamId,
        channel: &str,
        time: Timestamp,
        raw: Option<&str>,
    ) -> StripChartResult<SampleUpdate> {
        let update = self
            .slot_mut(stream)?
            .stream
            .append_sample(channel, time, raw)?;
        self.dirty = true;
        Ok(update)
    }

    /// Loads records into one stream; see `load_records`.
    pub fn load_records<R: BufRead>(
        &mut self,
        stream: StreamId,
        reader: &mut R,
    ) -> StripChartResult<LoadSummary> {
        let slot = self
            .streams
            .get_mut(&stream)
            .ok_or(StripChartError::UnknownStream(stream.0))?;
        let result = load_records(&mut slot.stream, &mut self.ids, reader);
        if slot.stream.is_dirty() {
            self.dirty = true;
        }
        result
    }

    /// Recomputes stream rectangles for a canvas of the given pixel size.
    pub fn resize(&mut self, width_px: f64, height_px: f64) {
        self.size_px = Some((width_px, height_px));
        self.relayout();
    }

    fn relayout(&mut self) {
        let Some((width_px, height_px)) = self.size_px else {
            return;
        };
        let rects = grid_layout(self.streams.len(), Rect::unit(), width_px, height_px);
        for (slot, rect) in self.streams.values_mut().zip(rects) {
            if slot.stream.set_position(rect, width_px) {
                self.dirty = true;
            }
        }
    }

    pub fn zoom_at(
        &mut self,
        stream: StreamId,
        anchor: f64,
        direction: ZoomDirection,
    ) -> StripChartResult<()> {
        self.slot_mut(stream)?
            .stream
            .zoom_at(anchor, direction, Instant::now())?;
        self.dirty = true;
        Ok(())
    }

    /// Drops a manual zoom and returns to default scaling.
    pub fn reset_view(&mut self, stream: StreamId) -> StripChartResult<()> {
        self.slot_mut(stream)?.stream.scale_to_default();
        self.dirty = true;
        Ok(())
    }

    pub fn prepare_artists(&mut self) -> bool {
        self.prepare_artists_at(Instant::now())
    }

    /// One redraw pass: no-op while clean, otherwise prepares every stream
    /// once and reports whether any of them changed. An expired zoom hold
    /// counts as a pending change.
    pub fn prepare_artists_at(&mut self, now: Instant) -> bool {
        let hold_expired = self
            .streams
            .values()
            .any(|slot| slot.stream.zoom_hold_expired(now));
        if !self.dirty && !hold_expired {
            return false;
        }

        let mut changed = false;
        for slot in self.streams.values_mut() {
            changed = slot.stream.prepare_artists_at(now) || changed;
        }
        self.dirty = false;
        trace!(window = %self.config.title, changed, "window prepared");
        changed
    }

    pub fn tick(&mut self) -> bool {
        self.tick_at(Instant::now())
    }

    /// Timer callback: polls every source, then runs one redraw pass.
    ///
    /// A failing source is logged and skipped for this tick only.
    pub fn tick_at(&mut self, now: Instant) -> bool {
        for slot in self.streams.values_mut() {
            let Some(source) = slot.source.as_mut() else {
                continue;
            };
            if !source.is_update_needed(&slot.stream) {
                continue;
            }
            if let Err(err) = source.update(&mut slot.stream, &mut self.ids) {
                warn!(
                    stream = %slot.stream.id(),
                    source = source.id(),
                    error = %err,
                    "source update failed, skipping this tick"
                );
            }
            if slot.stream.is_dirty() {
                self.dirty = true;
            }
        }
        self.prepare_artists_at(now)
    }

    /// Releases all streams and their channels.
    pub fn destroy(self) {
        let stream_count = self.streams.len();
        for (_, slot) in self.streams {
            slot.stream.destroy();
        }
        debug!(window = %self.config.title, stream_count, "window destroyed");
    }
}

/// Splits `rect` among `count` streams.
///
/// Up to three streams sit side by side. Larger sets are halved recursively,
/// stacked when the area is at least 0.9 times as tall as wide in pixels and
/// placed side by side otherwise. The first half goes top or left.
#[must_use]
pub fn grid_layout(count: usize, rect: Rect, width_px: f64, height_px: f64) -> Vec<Rect> {
    let mut rects = Vec::with_capacity(count);
    split_layout(count, rect, width_px, height_px, &mut rects);
    rects
}

fn split_layout(count: usize, rect: Rect, width_px: f64, height_px: f64, out: &mut Vec<Rect>) {
    match count {
        0 => {}
        1..=3 => {
            let width = rect.width / count as f64;
            for index in 0..count {
                out.push(Rect::new(
                    rect.x + width * index as f64,
                    rect.y,
                    width,
                    rect.height,
                ));
            }
        }
        _ => {
            let half = count / 2;
            let rest = count - half;
            if rect.height * height_px >= rect.width * width_px * 0.9 {
                let height = rect.height / 2.0;
                let top = Rect::new(rect.x, rect.y + height, rect.width, height);
                let bottom = Rect::new(rect.x, rect.y, rect.width, height);
                split_layout(half, top, width_px, height_px, out);
                split_layout(rest, bottom, width_px, height_px, out);
            } else {
                let width = rect.width / 2.0;
                let left = Rect::new(rect.x, rect.y, width, rect.height);
                let right = Rect::new(rect.x + width, rect.y, width, rect.height);
                split_layout(half, left, width_px, height_px, out);
                split_layout(rest, right, width_px, height_px, out);
            }
        }
    }
}
