use async_trait::async_trait;

use crate::core::Sample;
use crate::error::ChartResult;

/// Read-only access to an external observation store.
///
/// `filter_key` is an opaque code (e.g. a LOINC code such as `"55423-8"` for
/// step count) matched against the store's own coding system; matching
/// semantics belong to the store, not to this crate.
#[async_trait]
pub trait SampleStore: Send + Sync {
    async fn fetch_samples(&self, filter_key: &str) -> ChartResult<Vec<Sample>>;
}
