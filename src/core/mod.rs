pub mod aggregate;
pub mod scope;
pub mod types;

pub use aggregate::{aggregate, chart_state};
pub use scope::{AxisStride, ChartScope, PresentationUnit};
pub use types::{Bucket, ChartState, Sample};
