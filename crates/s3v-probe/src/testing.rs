//! In-memory `VectorStore` double for orchestration tests

use crate::config::IndexConfig;
use crate::error::{ProbeError, ProbeResult};
use crate::store::{QueryRequest, VectorRecord, VectorStore};
use async_trait::async_trait;
use parking_lot::Mutex;
use s3v_filter::{DistanceMetric, ResultSet, SearchResult};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Store operation, used for call recording and failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    GetVectorBucket,
    CreateVectorBucket,
    GetIndex,
    CreateIndex,
    PutVectors,
    QueryVectors,
    DeleteVectors,
}

type Failure = Box<dyn Fn() -> ProbeError + Send + Sync>;

#[derive(Default)]
struct State {
    buckets: HashSet<String>,
    indexes: HashSet<String>,
    vectors: BTreeMap<String, VectorRecord>,
    calls: Vec<Call>,
    queries: Vec<QueryRequest>,
    deleted: Vec<String>,
}

/// Records every call and keeps vectors in memory.
///
/// `query_vectors` ranks stored vectors by cosine distance and ignores the
/// server-side filter, unless a response was scripted with
/// [`MockStore::respond_with`].
pub struct MockStore {
    state: Mutex<State>,
    failures: Mutex<HashMap<Call, Failure>>,
    response: Mutex<Option<ResultSet>>,
    metric: DistanceMetric,
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            failures: Mutex::new(HashMap::new()),
            response: Mutex::new(None),
            metric: DistanceMetric::Cosine,
        }
    }

    pub fn with_bucket(self, bucket: &str) -> Self {
        self.state.lock().buckets.insert(bucket.to_string());
        self
    }

    pub fn with_index(self, index: &str) -> Self {
        self.state.lock().indexes.insert(index.to_string());
        self
    }

    /// Metric reported with query results
    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Fail every call of `call` with the error built by `f`
    pub fn fail_on<F>(self, call: Call, f: F) -> Self
    where
        F: Fn() -> ProbeError + Send + Sync + 'static,
    {
        self.failures.lock().insert(call, Box::new(f));
        self
    }

    /// Return `results` from every query instead of ranking stored vectors
    pub fn respond_with(self, results: ResultSet) -> Self {
        *self.response.lock() = Some(results);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn queries(&self) -> Vec<QueryRequest> {
        self.state.lock().queries.clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.state.lock().deleted.clone()
    }

    pub fn stored_keys(&self) -> Vec<String> {
        self.state.lock().vectors.keys().cloned().collect()
    }

    pub fn has_bucket(&self, bucket: &str) -> bool {
        self.state.lock().buckets.contains(bucket)
    }

    pub fn has_index(&self, index: &str) -> bool {
        self.state.lock().indexes.contains(index)
    }

    fn record(&self, call: Call) -> ProbeResult<()> {
        self.state.lock().calls.push(call);
        match self.failures.lock().get(&call) {
            Some(f) => Err(f()),
            None => Ok(()),
        }
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for MockStore {
    fn name(&self) -> &str {
        "mock"
    }

    async fn vector_bucket_exists(&self, bucket: &str) -> ProbeResult<bool> {
        self.record(Call::GetVectorBucket)?;
        Ok(self.has_bucket(bucket))
    }

    async fn create_vector_bucket(&self, bucket: &str) -> ProbeResult<()> {
        self.record(Call::CreateVectorBucket)?;
        self.state.lock().buckets.insert(bucket.to_string());
        Ok(())
    }

    async fn index_exists(&self, _bucket: &str, index: &str) -> ProbeResult<bool> {
        self.record(Call::GetIndex)?;
        Ok(self.has_index(index))
    }

    async fn create_index(&self, index: &IndexConfig) -> ProbeResult<()> {
        self.record(Call::CreateIndex)?;
        let mut state = self.state.lock();
        if !state.indexes.insert(index.index_name.clone()) {
            return Err(ProbeError::Conflict(format!(
                "CreateIndex: index '{}' already exists",
                index.index_name
            )));
        }
        Ok(())
    }

    async fn put_vectors(
        &self,
        _bucket: &str,
        _index: &str,
        vectors: &[VectorRecord],
    ) -> ProbeResult<()> {
        self.record(Call::PutVectors)?;
        let mut state = self.state.lock();
        for v in vectors {
            state.vectors.insert(v.key.clone(), v.clone());
        }
        Ok(())
    }

    async fn query_vectors(&self, request: &QueryRequest) -> ProbeResult<ResultSet> {
        self.record(Call::QueryVectors)?;
        let mut state = self.state.lock();
        state.queries.push(request.clone());

        if let Some(results) = self.response.lock().clone() {
            return Ok(results);
        }

        let mut hits: Vec<SearchResult> = state
            .vectors
            .values()
            .map(|v| SearchResult {
                key: v.key.clone(),
                distance: request
                    .return_distance
                    .then(|| cosine_distance(&request.query_vector, &v.data)),
                metadata: request.return_metadata.then(|| v.metadata.clone()),
            })
            .collect();
        hits.sort_by(|a, b| {
            a.distance
                .unwrap_or(f32::MAX)
                .total_cmp(&b.distance.unwrap_or(f32::MAX))
        });
        hits.truncate(request.top_k.max(0) as usize);
        Ok(ResultSet::new(self.metric.clone(), hits))
    }

    async fn delete_vectors(&self, _bucket: &str, _index: &str, keys: &[String]) -> ProbeResult<()> {
        self.record(Call::DeleteVectors)?;
        let mut state = self.state.lock();
        for key in keys {
            state.vectors.remove(key);
            state.deleted.push(key.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_distance() {
        assert!(cosine_distance(&[1.0, 0.0], &[1.0, 0.0]).abs() < 1e-6);
        assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]) - 2.0).abs() < 1e-6);
        assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 0.0]), 1.0);
    }

    #[tokio::test]
    async fn test_query_ranks_by_distance() {
        let store = MockStore::new();
        let records = [("far", vec![0.0, 1.0]), ("near", vec![1.0, 0.1])]
            .into_iter()
            .map(|(key, data)| VectorRecord {
                key: key.into(),
                data,
                metadata: Default::default(),
            })
            .collect::<Vec<_>>();
        store.put_vectors("b", "i", &records).await.unwrap();

        let index = IndexConfig::new("my-vectors", "smoke-index");
        let request = QueryRequest::new(&index, 1, vec![1.0, 0.0]);
        let results = store.query_vectors(&request).await.unwrap();
        assert_eq!(results.keys().collect::<Vec<_>>(), vec!["near"]);
    }
}
