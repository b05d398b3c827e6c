//! Client-side similarity threshold

use crate::error::{FilterError, FilterResult};
use crate::types::{ResultSet, SearchResult};

/// Keep only results whose cosine similarity (`1 - distance`) is at least
/// `threshold`, preserving their order.
///
/// With no threshold the input is returned untouched. With a threshold,
/// the result set must have been scored with the cosine metric; any other
/// metric fails with [`FilterError::UnsupportedMetric`] and nothing is
/// filtered. Results without a distance never pass a threshold.
pub fn apply_similarity_threshold(
    results: ResultSet,
    threshold: Option<f32>,
) -> FilterResult<ResultSet> {
    let Some(threshold) = threshold else {
        return Ok(results);
    };

    if !results.distance_metric.supports_similarity() {
        return Err(FilterError::UnsupportedMetric {
            metric: results.distance_metric.to_string(),
        });
    }

    let ResultSet {
        distance_metric,
        results: mut hits,
    } = results;
    hits.retain(|hit| meets_threshold(hit, threshold));

    Ok(ResultSet::new(distance_metric, hits))
}

#[inline]
fn meets_threshold(hit: &SearchResult, threshold: f32) -> bool {
    // NaN similarity compares false and is dropped with missing distances.
    hit.cosine_similarity()
        .is_some_and(|similarity| similarity >= threshold)
}
