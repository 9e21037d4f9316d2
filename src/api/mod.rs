pub mod chart_model;
pub mod store;

pub use chart_model::{Clock, ObservationChartConfig, ObservationChartModel};
pub use store::SampleStore;
