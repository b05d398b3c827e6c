//! Amazon S3 Vectors implementation of [`VectorStore`]
//!
//! Thin wrapper over `aws_sdk_s3vectors::Client`. Every SDK failure is
//! classified by [`classify_sdk_error`] and tagged with the operation
//! name; `Get*` calls that report a missing resource become `Ok(false)`.
//! Lookups and data-plane calls are retried on transient errors;
//! `Create*` calls are not, since provisioning already treats a conflict
//! as success.

use crate::classify::classify_sdk_error;
use crate::config::IndexConfig;
use crate::document::{document_to_metadata, metadata_to_document};
use crate::error::{ProbeError, ProbeResult};
use crate::retry::{with_retry, RetryPolicy};
use crate::store::{QueryRequest, VectorRecord, VectorStore};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3vectors::types::{
    DataType, DistanceMetric as SdkDistanceMetric, PutInputVector, QueryOutputVector, VectorData,
};
use aws_sdk_s3vectors::operation::query_vectors::QueryVectorsOutput;
use aws_sdk_s3vectors::Client;
use s3v_filter::{DistanceMetric, ResultSet, SearchResult};
use tracing::debug;

/// S3 Vectors backed store
#[derive(Debug, Clone)]
pub struct S3VectorsStore {
    client: Client,
    retry: RetryPolicy,
}

impl S3VectorsStore {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Map an existence probe: `Ok` → true, NotFound → false, anything else
/// is an error.
fn exists(result: ProbeResult<()>) -> ProbeResult<bool> {
    match result {
        Ok(()) => Ok(true),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

fn sdk_metric(metric: &DistanceMetric) -> ProbeResult<SdkDistanceMetric> {
    match metric {
        DistanceMetric::Cosine => Ok(SdkDistanceMetric::Cosine),
        DistanceMetric::Euclidean => Ok(SdkDistanceMetric::Euclidean),
        DistanceMetric::Other(name) => Err(ProbeError::Config(format!(
            "unsupported distance metric '{name}'"
        ))),
    }
}

fn put_input_vector(record: &VectorRecord) -> ProbeResult<PutInputVector> {
    PutInputVector::builder()
        .key(&record.key)
        .data(VectorData::Float32(record.data.clone()))
        .set_metadata(
            (!record.metadata.is_empty()).then(|| metadata_to_document(&record.metadata)),
        )
        .build()
        .map_err(|e| ProbeError::Config(format!("failed to build PutInputVector: {e}")))
}

fn search_result(vector: &QueryOutputVector) -> SearchResult {
    SearchResult {
        key: vector.key().to_string(),
        distance: vector.distance(),
        metadata: vector.metadata().and_then(document_to_metadata),
    }
}

/// Metric name used when the response carries none. Never cosine, so a
/// similarity threshold on such a response is rejected.
pub const UNREPORTED_METRIC: &str = "unreported";

fn result_set(output: &QueryVectorsOutput) -> ResultSet {
    let metric = match output.distance_metric() {
        Some(metric) => DistanceMetric::from(metric.as_str()),
        None => DistanceMetric::Other(UNREPORTED_METRIC.to_string()),
    };
    ResultSet::new(metric, output.vectors().iter().map(search_result).collect())
}

#[async_trait]
impl VectorStore for S3VectorsStore {
    fn name(&self) -> &str {
        "s3vectors"
    }

    async fn vector_bucket_exists(&self, bucket: &str) -> ProbeResult<bool> {
        let result = with_retry(&self.retry, "GetVectorBucket", || async move {
            self.client
                .get_vector_bucket()
                .vector_bucket_name(bucket)
                .send()
                .await
                .map(|_| ())
                .map_err(|e| classify_sdk_error(&e).context("GetVectorBucket"))
        })
        .await;
        exists(result)
    }

    async fn create_vector_bucket(&self, bucket: &str) -> ProbeResult<()> {
        self.client
            .create_vector_bucket()
            .vector_bucket_name(bucket)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e).context("CreateVectorBucket"))?;
        Ok(())
    }

    async fn index_exists(&self, bucket: &str, index: &str) -> ProbeResult<bool> {
        let result = with_retry(&self.retry, "GetIndex", || async move {
            self.client
                .get_index()
                .vector_bucket_name(bucket)
                .index_name(index)
                .send()
                .await
                .map(|_| ())
                .map_err(|e| classify_sdk_error(&e).context("GetIndex"))
        })
        .await;
        exists(result)
    }

    async fn create_index(&self, index: &IndexConfig) -> ProbeResult<()> {
        let data_type = match index.data_type {
            crate::config::VectorDataType::Float32 => DataType::Float32,
        };
        self.client
            .create_index()
            .vector_bucket_name(&index.vector_bucket_name)
            .index_name(&index.index_name)
            .dimension(index.dimension)
            .distance_metric(sdk_metric(&index.distance_metric)?)
            .data_type(data_type)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e).context("CreateIndex"))?;
        Ok(())
    }

    async fn put_vectors(
        &self,
        bucket: &str,
        index: &str,
        vectors: &[VectorRecord],
    ) -> ProbeResult<()> {
        let batch = vectors
            .iter()
            .map(put_input_vector)
            .collect::<ProbeResult<Vec<_>>>()?;
        debug!(bucket, index, count = batch.len(), "PutVectors");
        let batch = &batch;
        with_retry(&self.retry, "PutVectors", || async move {
            self.client
                .put_vectors()
                .vector_bucket_name(bucket)
                .index_name(index)
                .set_vectors(Some(batch.clone()))
                .send()
                .await
                .map_err(|e| classify_sdk_error(&e).context("PutVectors"))
        })
        .await?;
        Ok(())
    }

    async fn query_vectors(&self, request: &QueryRequest) -> ProbeResult<ResultSet> {
        debug!(
            bucket = %request.vector_bucket_name,
            index = %request.index_name,
            top_k = request.top_k,
            filter = ?request.filter.as_ref().map(|f| f.to_string()),
            "QueryVectors"
        );
        let output = with_retry(&self.retry, "QueryVectors", || async move {
            self.client
                .query_vectors()
                .vector_bucket_name(&request.vector_bucket_name)
                .index_name(&request.index_name)
                .top_k(request.top_k)
                .query_vector(VectorData::Float32(request.query_vector.clone()))
                .set_filter(request.filter.as_ref().map(|f| f.to_document()))
                .return_metadata(request.return_metadata)
                .return_distance(request.return_distance)
                .send()
                .await
                .map_err(|e| classify_sdk_error(&e).context("QueryVectors"))
        })
        .await?;

        Ok(result_set(&output))
    }

    async fn delete_vectors(&self, bucket: &str, index: &str, keys: &[String]) -> ProbeResult<()> {
        if keys.is_empty() {
            return Ok(());
        }
        debug!(bucket, index, count = keys.len(), "DeleteVectors");
        with_retry(&self.retry, "DeleteVectors", || async move {
            self.client
                .delete_vectors()
                .vector_bucket_name(bucket)
                .index_name(index)
                .set_keys(Some(keys.to_vec()))
                .send()
                .await
                .map_err(|e| classify_sdk_error(&e).context("DeleteVectors"))
        })
        .await?;
        Ok(())
    }
}
