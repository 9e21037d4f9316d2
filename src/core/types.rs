use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::scope::ChartScope;
use crate::error::{ChartError, ChartResult};

/// A single timestamped numeric health observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> ChartResult<Self> {
        if !value.is_finite() {
            return Err(ChartError::InvalidData(
                "sample value must be finite".to_owned(),
            ));
        }
        Ok(Self { timestamp, value })
    }
}

/// An aggregation interval identified by its ending boundary.
///
/// Buckets are derived data, rebuilt wholesale on every aggregation pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub boundary: DateTime<Utc>,
    pub value: f64,
}

/// Whole-chart snapshot consumed by a rendering surface.
///
/// `max_value` is the largest bucket value (or `0.0` when all buckets are
/// empty) and drives y-axis scaling. Buckets are strictly ascending by
/// boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartState {
    pub scope: ChartScope,
    pub buckets: Vec<Bucket>,
    pub max_value: f64,
}

impl ChartState {
    #[must_use]
    pub fn empty(scope: ChartScope) -> Self {
        Self {
            scope,
            buckets: Vec::new(),
            max_value: 0.0,
        }
    }
}
