use std::io::BufRead;

use indexmap::IndexMap;

use crate::core::{SampleValue, Timestamp};
use crate::error::StripChartResult;

use super::channel_options::{ChannelKindTag, ChannelOptions};
use super::ids::IdGenerator;
use super::records::{LoadSummary, load_complete_records};
use super::stream::Stream;

/// Feeds a stream from the window's update tick.
///
/// `update` runs to completion on the tick thread; an error only aborts the
/// current tick for this source.
pub trait DataSource {
    fn id(&self) -> &str;

    /// Lets a source skip ticks; polled before every `update`.
    fn is_update_needed(&mut self, _stream: &Stream) -> bool {
        true
    }

    fn update(&mut self, stream: &mut Stream, ids: &mut IdGenerator) -> StripChartResult<()>;
}

/// Reads records from any buffered reader until EOF on each tick.
///
/// Wrapping a `BufReader<File>` gives tail-like behavior: bytes appended to
/// the file after EOF are picked up by the next tick. A trailing line without
/// its newline is held until the rest of it arrives.
#[derive(Debug)]
pub struct RecordSource<R: BufRead> {
    id: String,
    reader: R,
    partial: Vec<u8>,
    totals: LoadSummary,
}

impl<R: BufRead> RecordSource<R> {
    pub fn new(id: impl Into<String>, reader: R) -> Self {
        Self {
            id: id.into(),
            reader,
            partial: Vec::new(),
            totals: LoadSummary::default(),
        }
    }

    /// Accumulated counters across all ticks.
    #[must_use]
    pub fn totals(&self) -> LoadSummary {
        self.totals
    }

    /// Bytes of an incomplete trailing line waiting for its newline.
    #[must_use]
    pub fn pending_bytes(&self) -> usize {
        self.partial.len()
    }
}

impl<R: BufRead> DataSource for RecordSource<R> {
    fn id(&self) -> &str {
        &self.id
    }

    fn update(&mut self, stream: &mut Stream, ids: &mut IdGenerator) -> StripChartResult<()> {
        let summary = load_complete_records(stream, ids, &mut self.reader, &mut self.partial)?;
        self.totals.merge(summary);
        Ok(())
    }
}

/// Waveform produced by `SyntheticSource`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyntheticSignal {
    Sine { amplitude: f64, period_samples: u32 },
    Square { low: f64, high: f64, period_samples: u32 },
}

impl SyntheticSignal {
    fn sample(self, index: u64) -> f64 {
        match self {
            Self::Sine {
                amplitude,
                period_samples,
            } => {
                let period = f64::from(period_samples.max(1));
                let phase = (index as f64 / period) * std::f64::consts::TAU;
                amplitude * phase.sin()
            }
            Self::Square {
                low,
                high,
                period_samples,
            } => {
                let half = u64::from(period_samples.max(2) / 2);
                if (index / half) % 2 == 0 { low } else { high }
            }
        }
    }
}

/// Deterministic demo source: declares its line channels on the first update
/// and appends one sample per channel on every `stride`-th tick.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    id: String,
    signals: IndexMap<String, SyntheticSignal>,
    start: Timestamp,
    step_us: i64,
    stride: u32,
    polls: u64,
    emitted: u64,
    initialized: bool,
}

impl SyntheticSource {
    pub fn new(id: impl Into<String>, start: Timestamp, step_us: i64) -> Self {
        Self {
            id: id.into(),
            signals: IndexMap::new(),
            start,
            step_us: step_us.max(1),
            stride: 1,
            polls: 0,
            emitted: 0,
            initialized: false,
        }
    }

    #[must_use]
    pub fn with_signal(mut self, name: impl Into<String>, signal: SyntheticSignal) -> Self {
        self.signals.insert(name.into(), signal);
        self
    }

    /// Emits on every `stride`-th poll only.
    #[must_use]
    pub fn with_stride(mut self, stride: u32) -> Self {
        self.stride = stride.max(1);
        self
    }

    #[must_use]
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    fn declare(&self, stream: &mut Stream, ids: &mut IdGenerator) -> StripChartResult<()> {
        for name in self.signals.keys() {
            let options: ChannelOptions = [
                ("drawstyle", "steps-pre"),
                ("axis", "top"),
                ("axis_weight", "0.8"),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
            stream.create_channel(ids, name, ChannelKindTag::Line, options)?;
        }
        Ok(())
    }
}

impl DataSource for SyntheticSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_update_needed(&mut self, _stream: &Stream) -> bool {
        let due = !self.initialized || self.polls % u64::from(self.stride) == 0;
        self.polls += 1;
        due
    }

    fn update(&mut self, stream: &mut Stream, ids: &mut IdGenerator) -> StripChartResult<()> {
        if !self.initialized {
            self.declare(stream, ids)?;
            self.initialized = true;
        }

        let time = self.start + self.emitted as i64 * self.step_us;
        for (name, signal) in &self.signals {
            stream.append_value(name, time, SampleValue::Number(signal.sample(self.emitted)))?;
        }
        self.emitted += 1;
        Ok(())
    }
}
