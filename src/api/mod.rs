mod channel;
mod channel_options;
mod config;
mod ids;
mod records;
mod snapshot;
mod sources;
mod stream;
mod window;

pub use channel::{Channel, ChannelKind, SampleUpdate};
pub use channel_options::{
    ChannelKindTag, ChannelOptions, DrawStyle, LineStyle, ScatterStyle, TextStyle,
};
pub use config::{MAX_ZOOM_HOLD_SECS, StreamConfig, WindowConfig};
pub use ids::{AxisId, IdGenerator, StreamId};
pub use records::{LoadSummary, Record, load_complete_records, load_records, parse_record};
pub use snapshot::{
    AxisSnapshot, ChannelSnapshot, StreamSnapshot, WINDOW_SNAPSHOT_JSON_SCHEMA_V1, WindowSnapshot,
    WindowSnapshotJsonContractV1,
};
pub use sources::{DataSource, RecordSource, SyntheticSignal, SyntheticSource};
pub use stream::{Stream, ValueAxis, ZoomDirection};
pub use window::{Window, grid_layout};
