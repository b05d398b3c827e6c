//! End-to-end smoke run against one index
//!
//! ensure bucket → create index if absent → put two vectors → query →
//! similarity threshold → local `kind` check → optional cleanup.

use crate::config::{SmokeConfig, FILTER_KIND_KEY};
use crate::error::{ProbeError, ProbeResult};
use crate::provision::{create_index_if_absent, ensure_vector_bucket, Provisioned};
use crate::query_filter::QueryFilter;
use crate::sample::{generate_run_id, key_suffix, VectorSampler};
use crate::store::{QueryRequest, VectorRecord, VectorStore};
use metrics::counter;
use s3v_filter::{apply_similarity_threshold, validate_metadata_filter, Metadata, ResultSet};
use serde::Serialize;
use tracing::{info, warn};

/// Metadata `kind` stamped on every smoke vector
pub const SMOKE_KIND: &str = "smoke";

/// Summary of a successful smoke run
#[derive(Debug, Clone, Serialize)]
pub struct SmokeReport {
    pub run_id: String,
    pub vector_bucket: Provisioned,
    pub index: Provisioned,
    pub inserted_keys: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<QueryFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_similarity: Option<f32>,
    /// Hits returned by the service before the threshold
    pub returned: usize,
    /// Hits removed by the similarity threshold
    pub dropped_by_threshold: usize,
    pub results: ResultSet,
    pub cleaned_up: bool,
}

/// The two vectors inserted by a smoke run
pub fn smoke_records(sampler: &mut VectorSampler, suffix: &str) -> Vec<VectorRecord> {
    (1..=2)
        .map(|n| {
            let mut metadata = Metadata::new();
            metadata.insert(FILTER_KIND_KEY.to_string(), SMOKE_KIND.into());
            metadata.insert("n".to_string(), n.to_string().into());
            VectorRecord {
                key: format!("smoke-{n}-{suffix}"),
                data: sampler.sample(),
                metadata,
            }
        })
        .collect()
}

struct QueryOutcome {
    returned: usize,
    results: ResultSet,
}

/// Run the smoke sequence.
///
/// With `cleanup` set, the inserted keys are deleted even when the query or
/// the filter check failed; in that case the original error is returned and
/// a failed delete is only logged.
pub async fn run_smoke(store: &dyn VectorStore, config: &SmokeConfig) -> ProbeResult<SmokeReport> {
    config.validate_all()?;
    let run_id = generate_run_id("smoke");
    let bucket = config.index.vector_bucket_name.as_str();
    let index = config.index.index_name.as_str();
    let filter = config.query_filter()?;

    info!(
        run_id,
        store = store.name(),
        bucket,
        index,
        dimension = config.index.dimension,
        metric = %config.index.distance_metric,
        index_type = %config.index.index_type,
        top_k = config.top_k,
        filter = ?filter.as_ref().map(|f| f.to_string()),
        min_similarity = ?config.min_similarity,
        cleanup = config.cleanup,
        "Starting smoke run"
    );

    let vector_bucket = ensure_vector_bucket(store, bucket, &run_id).await?;
    let index_state = create_index_if_absent(store, &config.index, &run_id).await?;

    let mut sampler = VectorSampler::new(config.index.dimension as usize, config.seed);
    let records = smoke_records(&mut sampler, &key_suffix());
    let keys: Vec<String> = records.iter().map(|r| r.key.clone()).collect();
    store.put_vectors(bucket, index, &records).await?;
    info!(run_id, count = keys.len(), keys = ?keys, "Inserted smoke vectors");

    let outcome = query_and_check(store, config, filter.clone(), &mut sampler, &run_id).await;

    let mut cleaned_up = false;
    if config.cleanup {
        match store.delete_vectors(bucket, index, &keys).await {
            Ok(()) => {
                info!(run_id, count = keys.len(), "Deleted smoke vectors");
                cleaned_up = true;
            }
            Err(e) if outcome.is_ok() => return Err(e),
            Err(e) => warn!(run_id, error = %e, "Cleanup failed after an earlier error"),
        }
    }

    let QueryOutcome { returned, results } = outcome?;
    Ok(SmokeReport {
        run_id,
        vector_bucket,
        index: index_state,
        inserted_keys: keys,
        filter,
        min_similarity: config.min_similarity,
        returned,
        dropped_by_threshold: returned - results.len(),
        results,
        cleaned_up,
    })
}

async fn query_and_check(
    store: &dyn VectorStore,
    config: &SmokeConfig,
    filter: Option<QueryFilter>,
    sampler: &mut VectorSampler,
    run_id: &str,
) -> ProbeResult<QueryOutcome> {
    let request = QueryRequest::new(&config.index, config.top_k, sampler.sample()).with_filter(filter);
    let results = store.query_vectors(&request).await?;
    let returned = results.len();
    counter!("s3v.query.results").increment(returned as u64);

    let results = apply_similarity_threshold(results, config.min_similarity).inspect_err(|e| {
        warn!(run_id, metric = e.metric(), "Similarity threshold not applicable");
    })?;
    let dropped = returned - results.len();
    if dropped > 0 {
        counter!("s3v.threshold.dropped").increment(dropped as u64);
    }
    info!(
        run_id,
        metric = %results.distance_metric,
        returned,
        kept = results.len(),
        dropped,
        "Query complete"
    );

    if let Some(expected) = config.expected_metadata() {
        let violations = validate_metadata_filter(&results, Some(&expected));
        if !violations.is_empty() {
            counter!("s3v.filter.violations").increment(violations.len() as u64);
            warn!(run_id, filter = %expected, keys = ?violations, "Filter validation failed");
            return Err(ProbeError::FilterViolation {
                filter: expected.to_string(),
                keys: violations,
            });
        }
    }

    Ok(QueryOutcome { returned, results })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexConfig;
    use crate::testing::{Call, MockStore};
    use s3v_filter::{DistanceMetric, FilterError, MetadataValue, SearchResult};

    fn config() -> SmokeConfig {
        let mut index = IndexConfig::new("my-vectors", "smoke-index");
        index.dimension = 8;
        let mut config = SmokeConfig::new(index);
        config.seed = Some(7);
        config
    }

    // ── Happy path ────────────────────────────────────────

    #[tokio::test]
    async fn test_smoke_run_provisions_and_queries() {
        let store = MockStore::new();
        let report = run_smoke(&store, &config()).await.unwrap();

        assert_eq!(report.vector_bucket, Provisioned::Created);
        assert_eq!(report.index, Provisioned::Created);
        assert_eq!(report.inserted_keys.len(), 2);
        assert!(report.inserted_keys[0].starts_with("smoke-1-"));
        assert!(report.inserted_keys[1].starts_with("smoke-2-"));
        assert_eq!(report.returned, 2);
        assert_eq!(report.dropped_by_threshold, 0);
        assert!(!report.cleaned_up);
        assert_eq!(store.stored_keys().len(), 2);
        assert_eq!(
            store.calls(),
            vec![
                Call::GetVectorBucket,
                Call::CreateVectorBucket,
                Call::CreateIndex,
                Call::PutVectors,
                Call::QueryVectors,
            ]
        );
    }

    #[test]
    fn test_smoke_records_metadata() {
        let mut sampler = VectorSampler::new(4, Some(1));
        let records = smoke_records(&mut sampler, "abcd1234");
        assert_eq!(records[0].key, "smoke-1-abcd1234");
        assert_eq!(records[1].key, "smoke-2-abcd1234");
        assert_eq!(records[0].metadata["kind"], MetadataValue::from("smoke"));
        assert_eq!(records[1].metadata["n"], MetadataValue::from("2"));
        assert_eq!(records[0].data.len(), 4);
    }

    #[tokio::test]
    async fn test_existing_index_is_reused() {
        let store = MockStore::new()
            .with_bucket("my-vectors")
            .with_index("smoke-index");
        let report = run_smoke(&store, &config()).await.unwrap();
        assert_eq!(report.vector_bucket, Provisioned::Existing);
        assert_eq!(report.index, Provisioned::Existing);
    }

    #[tokio::test]
    async fn test_query_requests_metadata_and_distance() {
        let store = MockStore::new();
        let mut config = config();
        config.top_k = 3;
        config.filter_kind = Some("smoke".into());
        run_smoke(&store, &config).await.unwrap();

        let queries = store.queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].top_k, 3);
        assert_eq!(queries[0].query_vector.len(), 8);
        assert!(queries[0].return_metadata);
        assert!(queries[0].return_distance);
        assert_eq!(
            queries[0].filter.as_ref().map(|f| f.as_json().clone()),
            Some(serde_json::json!({"kind": "smoke"}))
        );
    }

    #[tokio::test]
    async fn test_cleanup_deletes_inserted_keys() {
        let store = MockStore::new();
        let mut config = config();
        config.cleanup = true;
        let report = run_smoke(&store, &config).await.unwrap();
        assert!(report.cleaned_up);
        assert_eq!(store.deleted(), report.inserted_keys);
        assert!(store.stored_keys().is_empty());
    }

    // ── Threshold ─────────────────────────────────────────

    #[tokio::test]
    async fn test_threshold_drops_distant_hits() {
        let scripted = ResultSet::new(
            DistanceMetric::Cosine,
            vec![
                SearchResult::new("a").with_distance(0.1),
                SearchResult::new("b").with_distance(0.2),
                SearchResult::new("c").with_distance(0.5),
            ],
        );
        let store = MockStore::new().respond_with(scripted);
        let mut config = config();
        config.min_similarity = Some(0.8);

        let report = run_smoke(&store, &config).await.unwrap();
        assert_eq!(report.returned, 3);
        assert_eq!(report.dropped_by_threshold, 1);
        assert_eq!(report.results.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_threshold_with_euclidean_fails() {
        let store = MockStore::new().with_metric(DistanceMetric::Euclidean);
        let mut config = config();
        config.min_similarity = Some(0.5);

        let err = run_smoke(&store, &config).await.unwrap_err();
        assert!(matches!(
            err,
            ProbeError::Filter(FilterError::UnsupportedMetric { ref metric }) if metric == "euclidean"
        ));
    }

    #[tokio::test]
    async fn test_threshold_with_capitalized_metric_name_fails() {
        let store = MockStore::new().with_metric(DistanceMetric::from("Cosine"));
        let mut config = config();
        config.min_similarity = Some(0.0);

        let err = run_smoke(&store, &config).await.unwrap_err();
        assert!(matches!(
            err,
            ProbeError::Filter(FilterError::UnsupportedMetric { ref metric }) if metric == "Cosine"
        ));
    }

    // ── Filter validation ─────────────────────────────────

    #[tokio::test]
    async fn test_filter_violation_reports_keys() {
        let scripted = ResultSet::new(
            DistanceMetric::Cosine,
            vec![
                SearchResult::new("ok").with_distance(0.1).with_meta("kind", "smoke"),
                SearchResult::new("bad").with_distance(0.2).with_meta("kind", "other"),
                SearchResult::new("bare").with_distance(0.3),
            ],
        );
        let store = MockStore::new().respond_with(scripted);
        let mut config = config();
        config.filter_kind = Some("smoke".into());

        match run_smoke(&store, &config).await.unwrap_err() {
            ProbeError::FilterViolation { filter, keys } => {
                assert_eq!(filter, r#"kind == "smoke""#);
                assert_eq!(keys, vec!["bad".to_string(), "bare".to_string()]);
            }
            other => panic!("Expected FilterViolation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cleanup_runs_after_violation() {
        let store = MockStore::new();
        let mut config = config();
        // stored vectors are kind=smoke, the mock ignores the server filter
        config.filter_kind = Some("other".into());
        config.cleanup = true;

        let err = run_smoke(&store, &config).await.unwrap_err();
        assert!(matches!(err, ProbeError::FilterViolation { .. }));
        assert_eq!(store.deleted().len(), 2);
    }

    #[tokio::test]
    async fn test_query_error_wins_over_cleanup_error() {
        let store = MockStore::new()
            .fail_on(Call::QueryVectors, || ProbeError::Timeout("QueryVectors".into()))
            .fail_on(Call::DeleteVectors, || ProbeError::Connection("DeleteVectors".into()));
        let mut config = config();
        config.cleanup = true;

        let err = run_smoke(&store, &config).await.unwrap_err();
        assert!(matches!(err, ProbeError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_cleanup_error_after_success_is_returned() {
        let store = MockStore::new()
            .fail_on(Call::DeleteVectors, || ProbeError::Permission("DeleteVectors".into()));
        let mut config = config();
        config.cleanup = true;

        let err = run_smoke(&store, &config).await.unwrap_err();
        assert!(matches!(err, ProbeError::Permission(_)));
    }

    #[tokio::test]
    async fn test_invalid_config_makes_no_calls() {
        let store = MockStore::new();
        let mut config = config();
        config.min_similarity = Some(1.5);
        assert!(matches!(
            run_smoke(&store, &config).await,
            Err(ProbeError::Config(_))
        ));
        assert!(store.calls().is_empty());
    }
}
