use thiserror::Error;

use crate::core::Timestamp;

pub type StripChartResult<T> = Result<T, StripChartError>;

#[derive(Debug, Error)]
pub enum StripChartError {
    #[error("unknown channel type '{0}'")]
    UnknownChannelKind(String),

    #[error("{kind}: unknown arg '{key}'")]
    UnsupportedChannelOption { kind: &'static str, key: String },

    #[error("{kind}: invalid value '{value}' for arg '{key}'")]
    InvalidChannelOption {
        kind: &'static str,
        key: String,
        value: String,
    },

    #[error("unknown channel '{0}'")]
    UnknownChannel(String),

    #[error("sample at {time} on channel '{channel}' is older than its last sample at {last}")]
    OutOfOrderSample {
        channel: String,
        time: Timestamp,
        last: Timestamp,
    },

    #[error("unknown stream id {0}")]
    UnknownStream(u64),

    #[error("unsupported view width: raw tick step {raw_step_us} us exceeds the step table")]
    UnsupportedViewWidth { raw_step_us: f64 },

    #[error("invalid sample value '{0}'")]
    InvalidSampleValue(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
