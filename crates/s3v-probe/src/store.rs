//! Vector store trait: the seam between runs and the AWS SDK
//!
//! Runs (smoke, hybrid) only talk to a `dyn VectorStore`. The production
//! implementation is [`crate::s3vectors::S3VectorsStore`]; tests use an
//! in-memory double.

use crate::config::IndexConfig;
use crate::error::ProbeResult;
use crate::query_filter::QueryFilter;
use async_trait::async_trait;
use s3v_filter::{Metadata, ResultSet};
use serde::Serialize;

/// One vector to insert
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorRecord {
    pub key: String,
    #[serde(skip)]
    pub data: Vec<f32>,
    pub metadata: Metadata,
}

/// Parameters of a nearest-neighbor query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub vector_bucket_name: String,
    pub index_name: String,
    pub top_k: i32,
    pub query_vector: Vec<f32>,
    pub filter: Option<QueryFilter>,
    pub return_metadata: bool,
    pub return_distance: bool,
}

impl QueryRequest {
    /// Query with metadata and distances requested, no filter
    pub fn new(index: &IndexConfig, top_k: i32, query_vector: Vec<f32>) -> Self {
        Self {
            vector_bucket_name: index.vector_bucket_name.clone(),
            index_name: index.index_name.clone(),
            top_k,
            query_vector,
            filter: None,
            return_metadata: true,
            return_distance: true,
        }
    }

    pub fn with_filter(mut self, filter: Option<QueryFilter>) -> Self {
        self.filter = filter;
        self
    }
}

/// Control- and data-plane operations used by the runs.
///
/// Errors are already classified: a missing resource is
/// `ProbeError::NotFound`, a duplicate create is `ProbeError::Conflict`.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Store name for logging (e.g. "s3vectors")
    fn name(&self) -> &str;

    async fn vector_bucket_exists(&self, bucket: &str) -> ProbeResult<bool>;

    async fn create_vector_bucket(&self, bucket: &str) -> ProbeResult<()>;

    async fn index_exists(&self, bucket: &str, index: &str) -> ProbeResult<bool>;

    /// Create the index described by `index`
    async fn create_index(&self, index: &IndexConfig) -> ProbeResult<()>;

    async fn put_vectors(
        &self,
        bucket: &str,
        index: &str,
        vectors: &[VectorRecord],
    ) -> ProbeResult<()>;

    /// Run a nearest-neighbor query and return the hits best-first
    async fn query_vectors(&self, request: &QueryRequest) -> ProbeResult<ResultSet>;

    async fn delete_vectors(&self, bucket: &str, index: &str, keys: &[String]) -> ProbeResult<()>;
}
