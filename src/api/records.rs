use std::io::BufRead;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::Timestamp;
use crate::error::{StripChartError, StripChartResult};

use super::channel_options::{ChannelKindTag, ChannelOptions};
use super::ids::IdGenerator;
use super::stream::Stream;

/// One parsed line of the semicolon-delimited record format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// `a;<name>;<type>;<key=value>;...`
    Declare {
        name: String,
        kind: String,
        options: ChannelOptions,
    },
    /// `v;<timestamp_us>;<name>;<value>`
    Sample {
        time: Timestamp,
        channel: String,
        value: String,
    },
}

/// Parses one line. Returns `None` for lines that are skipped silently:
/// fewer than three fields, an unknown record tag, or a bad timestamp.
#[must_use]
pub fn parse_record(line: &str) -> Option<Record> {
    let line = line.trim_end_matches(['\n', '\r']);
    let fields: Vec<&str> = line.split(';').collect();
    if fields.len() < 3 {
        return None;
    }

    match fields[0] {
        "a" => {
            let fields: Vec<&str> = line.trim_end().split(';').collect();
            Some(Record::Declare {
                name: fields[1].to_owned(),
                kind: fields[2].to_owned(),
                options: unpack_options(&fields[3..]),
            })
        }
        "v" => {
            let time = fields[1].trim().parse::<Timestamp>().ok()?;
            let value = match fields.len() {
                3 => "",
                4 => fields[3],
                // Text values may contain the delimiter; keep the raw tail.
                _ => &line[fields[0].len() + fields[1].len() + fields[2].len() + 3..],
            };
            Some(Record::Sample {
                time,
                channel: fields[2].to_owned(),
                value: value.to_owned(),
            })
        }
        _ => None,
    }
}

fn unpack_options(fields: &[&str]) -> ChannelOptions {
    fields
        .iter()
        .filter(|field| field.chars().count() > 1)
        .map(|&field| {
            let (key, value) = field.split_once('=').unwrap_or((field, ""));
            (key.to_owned(), value.to_owned())
        })
        .collect()
}

/// Counters reported by `load_records`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoadSummary {
    /// Lines with at least three fields.
    pub lines: usize,
    pub declarations: usize,
    pub samples: usize,
    pub skipped_duplicate_declarations: usize,
    pub skipped_unknown_channels: usize,
    /// Samples older than their channel's last sample.
    pub skipped_out_of_order: usize,
    /// Bytes consumed from the reader, for resuming a growing file.
    pub bytes_read: u64,
}

impl LoadSummary {
    pub fn merge(&mut self, other: Self) {
        self.lines += other.lines;
        self.declarations += other.declarations;
        self.samples += other.samples;
        self.skipped_duplicate_declarations += other.skipped_duplicate_declarations;
        self.skipped_unknown_channels += other.skipped_unknown_channels;
        self.skipped_out_of_order += other.skipped_out_of_order;
        self.bytes_read += other.bytes_read;
    }
}

/// Applies every record from `reader` to `stream`, in order, until EOF.
///
/// Samples for undeclared channels and samples older than their channel's
/// last sample are logged and skipped. Unknown channel types, unsupported
/// options and unparsable values abort the load; records applied before the
/// failure stay applied.
pub fn load_records<R: BufRead>(
    stream: &mut Stream,
    ids: &mut IdGenerator,
    reader: &mut R,
) -> StripChartResult<LoadSummary> {
    read_records(stream, ids, reader, None)
}

/// Like `load_records`, but a final line without `\n` is moved into
/// `partial` instead of being applied. The next call prepends it, so a
/// line flushed in pieces by a writer is applied once, whole. Held bytes
/// count towards `bytes_read` only when their line completes.
pub fn load_complete_records<R: BufRead>(
    stream: &mut Stream,
    ids: &mut IdGenerator,
    reader: &mut R,
    partial: &mut Vec<u8>,
) -> StripChartResult<LoadSummary> {
    read_records(stream, ids, reader, Some(partial))
}

fn read_records<R: BufRead>(
    stream: &mut Stream,
    ids: &mut IdGenerator,
    reader: &mut R,
    mut partial: Option<&mut Vec<u8>>,
) -> StripChartResult<LoadSummary> {
    let mut summary = LoadSummary::default();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let read = reader.read_until(b'\n', &mut buf)?;
        if read == 0 {
            break;
        }
        if let Some(held) = partial.as_deref_mut() {
            held.extend_from_slice(&buf);
            if !held.ends_with(b"\n") {
                break;
            }
            std::mem::swap(held, &mut buf);
            held.clear();
        }
        summary.bytes_read += buf.len() as u64;

        let line = std::str::from_utf8(&buf).map_err(|e| {
            StripChartError::InvalidData(format!("record line is not valid utf-8: {e}"))
        })?;
        if line.split(';').nth(2).is_some() {
            summary.lines += 1;
        }
        let Some(record) = parse_record(line) else {
            continue;
        };
        apply_record(stream, ids, record, &mut summary)?;
    }

    if summary.lines > 0 {
        let last = stream
            .last_timestamp()
            .map(|time| stream.cursor_label(time))
            .unwrap_or_default();
        info!(
            stream = %stream.id(),
            lines = summary.lines,
            samples = summary.samples,
            last = %last,
            "records loaded"
        );
    }
    Ok(summary)
}

fn apply_record(
    stream: &mut Stream,
    ids: &mut IdGenerator,
    record: Record,
    summary: &mut LoadSummary,
) -> StripChartResult<()> {
    match record {
        Record::Declare {
            name,
            kind,
            options,
        } => {
            if stream.contains_channel(&name) {
                debug!(channel = %name, "duplicate declaration ignored");
                summary.skipped_duplicate_declarations += 1;
                return Ok(());
            }
            let tag: ChannelKindTag = kind.parse()?;
            stream.create_channel(ids, &name, tag, options)?;
            summary.declarations += 1;
        }
        Record::Sample {
            time,
            channel,
            value,
        } => match stream.append_sample(&channel, time, Some(&value)) {
            Ok(_) => summary.samples += 1,
            Err(StripChartError::UnknownChannel(_)) => {
                warn!(channel = %channel, time, "unknown channel in record, line skipped");
                summary.skipped_unknown_channels += 1;
            }
            Err(StripChartError::OutOfOrderSample { last, .. }) => {
                warn!(
                    channel = %channel,
                    time,
                    last,
                    "out-of-order sample in record, line skipped"
                );
                summary.skipped_out_of_order += 1;
            }
            Err(err) => return Err(err),
        },
    }
    Ok(())
}
