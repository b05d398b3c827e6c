//! Hybrid search demo: vector similarity combined with a metadata filter
//!
//! Inserts three labelled vectors, queries with
//! `category == apples AND origin IN (NL, DE)`, checks the category of every
//! hit locally, and always deletes what it inserted.

use crate::config::HybridConfig;
use crate::error::{ProbeError, ProbeResult};
use crate::provision::{ensure_index, ensure_vector_bucket, Provisioned};
use crate::query_filter::QueryFilter;
use crate::sample::{generate_run_id, key_suffix, VectorSampler};
use crate::store::{QueryRequest, VectorRecord, VectorStore};
use metrics::counter;
use s3v_filter::{validate_metadata_filter, Metadata, MetadataFilter, ResultSet};
use serde::Serialize;
use tracing::{info, warn};

pub const CATEGORY_KEY: &str = "category";
pub const ORIGIN_KEY: &str = "origin";

/// Category every hybrid hit must carry
pub const EXPECTED_CATEGORY: &str = "apples";

/// Origins accepted by the hybrid filter
pub const ACCEPTED_ORIGINS: [&str; 2] = ["NL", "DE"];

/// `(key prefix, category, origin)` of the inserted vectors
const SAMPLES: [(&str, &str, &str); 3] = [
    ("hybrid-apples-nl", "apples", "NL"),
    ("hybrid-apples-de", "apples", "DE"),
    ("hybrid-bananas-ec", "bananas", "EC"),
];

/// Summary of a hybrid run
#[derive(Debug, Clone, Serialize)]
pub struct HybridReport {
    pub run_id: String,
    pub vector_bucket: Provisioned,
    pub index: Provisioned,
    pub inserted_keys: Vec<String>,
    pub filter: QueryFilter,
    pub results: ResultSet,
    pub deleted_keys: Vec<String>,
}

/// `{"$and": [{"category": {"$eq": "apples"}}, {"origin": {"$in": ["NL", "DE"]}}]}`
pub fn hybrid_filter() -> QueryFilter {
    QueryFilter::and([
        QueryFilter::field_eq(CATEGORY_KEY, EXPECTED_CATEGORY),
        QueryFilter::one_of(ORIGIN_KEY, ACCEPTED_ORIGINS),
    ])
}

/// The three vectors inserted by a hybrid run
pub fn hybrid_records(sampler: &mut VectorSampler, suffix: &str) -> Vec<VectorRecord> {
    SAMPLES
        .iter()
        .map(|(prefix, category, origin)| {
            let mut metadata = Metadata::new();
            metadata.insert(CATEGORY_KEY.to_string(), (*category).into());
            metadata.insert(ORIGIN_KEY.to_string(), (*origin).into());
            VectorRecord {
                key: format!("{prefix}-{suffix}"),
                data: sampler.sample(),
                metadata,
            }
        })
        .collect()
}

/// Run the hybrid demo. The inserted keys are deleted whether or not the
/// insert, query or check succeeded; the first error wins.
pub async fn run_hybrid(
    store: &dyn VectorStore,
    config: &HybridConfig,
) -> ProbeResult<HybridReport> {
    config.validate_all()?;
    let run_id = generate_run_id("hybrid");
    let bucket = config.index.vector_bucket_name.as_str();
    let index = config.index.index_name.as_str();
    let filter = hybrid_filter();

    info!(
        run_id,
        store = store.name(),
        bucket,
        index,
        dimension = config.index.dimension,
        metric = %config.index.distance_metric,
        index_type = %config.index.index_type,
        top_k = config.top_k,
        "Starting hybrid run"
    );

    let vector_bucket = ensure_vector_bucket(store, bucket, &run_id).await?;
    let index_state = ensure_index(store, &config.index, &run_id).await?;

    let mut sampler = VectorSampler::new(config.index.dimension as usize, config.seed);
    let records = hybrid_records(&mut sampler, &key_suffix());
    let keys: Vec<String> = records.iter().map(|r| r.key.clone()).collect();

    let outcome = insert_and_query(store, config, &records, &filter, &mut sampler, &run_id).await;

    let cleanup = store.delete_vectors(bucket, index, &keys).await;
    match (&outcome, cleanup) {
        (_, Ok(())) => info!(run_id, count = keys.len(), "Deleted hybrid vectors"),
        (Ok(_), Err(e)) => return Err(e),
        (Err(_), Err(e)) => warn!(run_id, error = %e, "Cleanup failed after an earlier error"),
    }

    Ok(HybridReport {
        run_id,
        vector_bucket,
        index: index_state,
        inserted_keys: keys.clone(),
        filter,
        results: outcome?,
        deleted_keys: keys,
    })
}

async fn insert_and_query(
    store: &dyn VectorStore,
    config: &HybridConfig,
    records: &[VectorRecord],
    filter: &QueryFilter,
    sampler: &mut VectorSampler,
    run_id: &str,
) -> ProbeResult<ResultSet> {
    let bucket = config.index.vector_bucket_name.as_str();
    let index = config.index.index_name.as_str();

    store.put_vectors(bucket, index, records).await?;
    info!(run_id, count = records.len(), "Inserted hybrid vectors");

    let request = QueryRequest::new(&config.index, config.top_k, sampler.sample())
        .with_filter(Some(filter.clone()));
    let results = store.query_vectors(&request).await?;
    counter!("s3v.query.results").increment(results.len() as u64);
    info!(run_id, filter = %filter, returned = results.len(), "Hybrid query complete");

    let expected = MetadataFilter::new(CATEGORY_KEY, EXPECTED_CATEGORY);
    let violations = validate_metadata_filter(&results, Some(&expected));
    if !violations.is_empty() {
        counter!("s3v.filter.violations").increment(violations.len() as u64);
        warn!(run_id, filter = %expected, keys = ?violations, "Filter validation failed");
        return Err(ProbeError::FilterViolation {
            filter: expected.to_string(),
            keys: violations,
        });
    }
    Ok(results)
}
