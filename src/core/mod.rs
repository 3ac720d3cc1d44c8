pub mod step_table;
pub mod time_locator;
pub mod types;
pub mod value_format;

pub use step_table::{
    MAX_STEP_US, ReferenceZone, STEP_CANDIDATES, StepCandidate, StepFormat, select_formatter,
};
pub use time_locator::{PLACEHOLDER_LABEL, TARGET_TICK_COUNT, TickLabeler, TimeLocator, TimeTick};
pub use types::{DataLimits, MICROS_PER_SECOND, PlotPoint, Rect, SampleValue, Timestamp};
pub use value_format::{ValueConversion, ValueFormat};
