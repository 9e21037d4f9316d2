//! observation-charts: time-bucketed aggregation core for health observation charts.
//!
//! The crate turns timestamped numeric health samples into ordered chart
//! buckets for a selectable time scope (day/week/month/half-year) and keeps a
//! published [`core::ChartState`] in sync with an external sample store
//! through a debounced reactive binding.

pub mod api;
pub mod core;
pub mod error;
pub mod telemetry;

pub use api::{ObservationChartConfig, ObservationChartModel, SampleStore};
pub use core::{AxisStride, Bucket, ChartScope, ChartState, PresentationUnit, Sample};
pub use error::{ChartError, ChartResult};
