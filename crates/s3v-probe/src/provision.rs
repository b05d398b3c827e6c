//! Vector bucket and index provisioning
//!
//! Get-then-create for buckets and indexes. A `Conflict` on create means
//! a concurrent writer got there first and counts as success.

use crate::config::IndexConfig;
use crate::error::ProbeResult;
use crate::store::VectorStore;
use serde::Serialize;
use tracing::info;

/// Outcome of an ensure/create step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provisioned {
    /// Resource was already there
    Existing,
    /// Resource was created by this call
    Created,
}

/// Make sure the vector bucket exists, creating it when missing.
pub async fn ensure_vector_bucket(
    store: &dyn VectorStore,
    bucket: &str,
    run_id: &str,
) -> ProbeResult<Provisioned> {
    if store.vector_bucket_exists(bucket).await? {
        info!(run_id, bucket, "Vector bucket exists");
        return Ok(Provisioned::Existing);
    }

    info!(run_id, bucket, "Creating vector bucket");
    match store.create_vector_bucket(bucket).await {
        Ok(()) => {
            info!(run_id, bucket, "Vector bucket created");
            Ok(Provisioned::Created)
        }
        Err(e) if e.is_conflict() => {
            info!(run_id, bucket, "Vector bucket already exists (concurrent create)");
            Ok(Provisioned::Existing)
        }
        Err(e) => Err(e),
    }
}

/// Make sure the index exists, creating it from `index` when missing.
pub async fn ensure_index(
    store: &dyn VectorStore,
    index: &IndexConfig,
    run_id: &str,
) -> ProbeResult<Provisioned> {
    if store
        .index_exists(&index.vector_bucket_name, &index.index_name)
        .await?
    {
        info!(run_id, index = %index.index_name, "Index exists");
        return Ok(Provisioned::Existing);
    }
    create_index_if_absent(store, index, run_id).await
}

/// Create the index without a prior lookup; an existing index is not an
/// error.
pub async fn create_index_if_absent(
    store: &dyn VectorStore,
    index: &IndexConfig,
    run_id: &str,
) -> ProbeResult<Provisioned> {
    info!(
        run_id,
        index = %index.index_name,
        dimension = index.dimension,
        distance = %index.distance_metric,
        data_type = %index.data_type,
        "Creating vector index"
    );
    match store.create_index(index).await {
        Ok(()) => {
            info!(run_id, index = %index.index_name, "Vector index created");
            Ok(Provisioned::Created)
        }
        Err(e) if e.is_conflict() => {
            info!(run_id, index = %index.index_name, "Vector index already exists");
            Ok(Provisioned::Existing)
        }
        Err(e) => Err(e),
    }
}
