//! stripchart-rs: headless core of a live multi-channel strip-chart viewer.
//!
//! The `core` module holds the adaptive time-axis locator and value
//! formatting; `api` holds the window/stream/channel model with its dirty
//! cascade, the record loader and data sources.

pub mod api;
pub mod core;
pub mod error;
pub mod telemetry;

pub use api::{StreamConfig, Window, WindowConfig};
pub use error::{StripChartError, StripChartResult};
