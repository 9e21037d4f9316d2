use chrono::{DateTime, Utc};

use crate::core::scope::ChartScope;
use crate::core::types::{Bucket, ChartState, Sample};

/// Groups raw samples into ordered buckets for the given scope.
///
/// Boundaries are generated from `scope.earliest_date(now)`. Each bucket sums
/// the values of samples strictly between the previous boundary and its own;
/// a sample lying exactly on a boundary joins neither neighboring bucket.
/// Empty ranges produce a `0.0` bucket rather than being omitted, and
/// non-finite sample values are skipped so they cannot poison a bucket sum.
///
/// Pure and deterministic for fixed inputs; `now` is injected rather than
/// read from a clock.
#[must_use]
pub fn aggregate(samples: &[Sample], scope: ChartScope, now: DateTime<Utc>) -> Vec<Bucket> {
    let boundaries = scope.boundaries(now);
    let mut buckets = Vec::with_capacity(boundaries.len());
    let mut prev = scope.earliest_date(now);

    for boundary in boundaries {
        let sum = samples
            .iter()
            .filter(|sample| sample.value.is_finite())
            .filter(|sample| prev < sample.timestamp && sample.timestamp < boundary)
            .map(|sample| sample.value)
            .sum();
        buckets.push(Bucket {
            boundary,
            value: sum,
        });
        prev = boundary;
    }

    buckets
}

/// Builds the whole-chart snapshot, including the y-axis maximum.
#[must_use]
pub fn chart_state(samples: &[Sample], scope: ChartScope, now: DateTime<Utc>) -> ChartState {
    let buckets = aggregate(samples, scope, now);
    let max_value = buckets.iter().map(|bucket| bucket.value).fold(0.0, f64::max);
    ChartState {
        scope,
        buckets,
        max_value,
    }
}
