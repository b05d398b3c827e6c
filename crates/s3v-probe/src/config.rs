//! Run configuration
//!
//! Plain data structs with `validator` rules for numeric ranges plus
//! hand-written checks for AWS naming rules and cross-field constraints.
//! The binary fills them from CLI flags / `S3V_*` environment variables.

use crate::error::{ProbeError, ProbeResult};
use crate::query_filter::QueryFilter;
use s3v_filter::{DistanceMetric, MetadataFilter};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Region used when neither the flag nor the SDK chain yields one
pub const DEFAULT_REGION: &str = "us-east-1";

/// Metadata key checked by the smoke run's local filter validation
pub const FILTER_KIND_KEY: &str = "kind";

// ─────────────────────────────────────────────────────────────────
// AWS connection
// ─────────────────────────────────────────────────────────────────

/// How to reach AWS.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AwsConfig {
    /// AWS region (e.g. `us-east-1`). Uses SDK default resolution if omitted.
    #[serde(default)]
    pub region: Option<String>,

    /// Custom endpoint URL (for testing with LocalStack, etc.).
    #[serde(default)]
    pub endpoint_url: Option<String>,

    /// Per-operation timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    #[validate(range(min = 1, max = 300))]
    pub timeout_secs: u64,

    /// Maximum retries per data-plane call on transient errors.
    #[serde(default = "default_max_retries")]
    #[validate(range(min = 0, max = 10))]
    pub max_retries: u32,

    /// Initial backoff in milliseconds for retry.
    #[serde(default = "default_initial_backoff_ms")]
    #[validate(range(min = 50, max = 60_000))]
    pub initial_backoff_ms: u64,

    /// Maximum backoff in milliseconds for retry.
    #[serde(default = "default_max_backoff_ms")]
    #[validate(range(min = 100, max = 300_000))]
    pub max_backoff_ms: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    200
}

fn default_max_backoff_ms() -> u64 {
    5_000
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            region: None,
            endpoint_url: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl AwsConfig {
    /// Validate retry parameters.
    pub fn validate_retry(&self) -> Result<(), String> {
        if self.initial_backoff_ms > self.max_backoff_ms {
            return Err(format!(
                "initial_backoff_ms ({}) must be <= max_backoff_ms ({})",
                self.initial_backoff_ms, self.max_backoff_ms
            ));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────
// Index definition
// ─────────────────────────────────────────────────────────────────

/// Element type of stored vectors. S3 Vectors currently only offers
/// `float32`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum VectorDataType {
    #[default]
    Float32,
}

impl fmt::Display for VectorDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VectorDataType::Float32 => f.write_str("float32"),
        }
    }
}

impl FromStr for VectorDataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "float32" => Ok(VectorDataType::Float32),
            other => Err(format!(
                "unsupported vector data type '{other}' (supported: float32)"
            )),
        }
    }
}

/// Target vector bucket and index, plus the parameters used when the
/// index has to be created.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct IndexConfig {
    /// Name of the S3 vector bucket.
    pub vector_bucket_name: String,

    /// Name of the vector index within the bucket.
    pub index_name: String,

    /// Dimension of vectors.
    #[serde(default = "default_dimension")]
    #[validate(range(min = 1, max = 4096))]
    pub dimension: i32,

    /// Distance metric for the index.
    #[serde(default)]
    pub distance_metric: DistanceMetric,

    /// Vector element type.
    #[serde(default)]
    pub data_type: VectorDataType,

    /// Index type label. S3 Vectors has no per-index type setting, so this
    /// is reported in logs only.
    #[serde(default = "default_index_type")]
    #[validate(length(min = 1, max = 64))]
    pub index_type: String,
}

fn default_dimension() -> i32 {
    1536
}

/// Default index type label
pub const DEFAULT_INDEX_TYPE: &str = "flat";

fn default_index_type() -> String {
    DEFAULT_INDEX_TYPE.to_string()
}

impl IndexConfig {
    pub fn new(vector_bucket_name: impl Into<String>, index_name: impl Into<String>) -> Self {
        Self {
            vector_bucket_name: vector_bucket_name.into(),
            index_name: index_name.into(),
            dimension: default_dimension(),
            distance_metric: DistanceMetric::default(),
            data_type: VectorDataType::default(),
            index_type: default_index_type(),
        }
    }

    /// Run all checks: ranges, naming rules, supported metric.
    pub fn validate_all(&self) -> ProbeResult<()> {
        self.validate()?;
        validate_bucket_name(&self.vector_bucket_name).map_err(ProbeError::Config)?;
        validate_index_name(&self.index_name).map_err(ProbeError::Config)?;
        validate_index_metric(&self.distance_metric).map_err(ProbeError::Config)?;
        Ok(())
    }
}

/// Validate vector bucket name (AWS naming rules).
pub fn validate_bucket_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("vector bucket name must not be empty".to_string());
    }
    if name.len() < 3 || name.len() > 63 {
        return Err(format!(
            "vector bucket name must be 3–63 characters (got {})",
            name.len()
        ));
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    {
        return Err(
            "vector bucket name must contain only lowercase letters, digits, and hyphens"
                .to_string(),
        );
    }
    if name.starts_with('-') || name.ends_with('-') {
        return Err("vector bucket name must not start or end with a hyphen".to_string());
    }
    Ok(())
}

/// Validate vector index name: 3–63 characters of lowercase letters,
/// digits, hyphens and dots, starting and ending with a letter or digit.
pub fn validate_index_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("index name must not be empty".to_string());
    }
    if name.len() < 3 || name.len() > 63 {
        return Err(format!(
            "index name must be 3–63 characters (got {})",
            name.len()
        ));
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'.')
    {
        return Err(
            "index name must contain only lowercase letters, digits, hyphens, and dots"
                .to_string(),
        );
    }
    let edge_ok = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    let bytes = name.as_bytes();
    if !edge_ok(bytes[0]) || !edge_ok(bytes[bytes.len() - 1]) {
        return Err("index name must start and end with a letter or digit".to_string());
    }
    Ok(())
}

/// Only metrics the service can create an index with.
pub fn validate_index_metric(metric: &DistanceMetric) -> Result<(), String> {
    match metric {
        DistanceMetric::Cosine | DistanceMetric::Euclidean => Ok(()),
        DistanceMetric::Other(name) => Err(format!(
            "unsupported distance metric '{name}' (supported: cosine, euclidean)"
        )),
    }
}

/// A similarity threshold must be a finite value in `[0, 1]`.
pub fn validate_similarity(threshold: Option<f32>) -> Result<(), String> {
    match threshold {
        Some(t) if !t.is_finite() => Err(format!("min similarity must be finite (got {t})")),
        Some(t) if !(0.0..=1.0).contains(&t) => {
            Err(format!("min similarity must be within [0, 1] (got {t})"))
        }
        _ => Ok(()),
    }
}

/// Truthy flag values: `1`, `true`, `yes` (case-insensitive). Anything
/// else, including the empty string, is false.
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

// ─────────────────────────────────────────────────────────────────
// Runs
// ─────────────────────────────────────────────────────────────────

/// Configuration for the credential check.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CredentialCheckConfig {
    #[validate(nested)]
    pub aws: AwsConfig,

    /// Plain S3 bucket probed with `HeadBucket`.
    #[validate(length(min = 1, max = 255))]
    pub bucket: String,
}

impl CredentialCheckConfig {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            aws: AwsConfig::default(),
            bucket: bucket.into(),
        }
    }

    pub fn validate_all(&self) -> ProbeResult<()> {
        self.validate()?;
        self.aws.validate_retry().map_err(ProbeError::Config)?;
        Ok(())
    }
}

/// Configuration for the smoke run.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SmokeConfig {
    #[validate(nested)]
    pub aws: AwsConfig,

    #[validate(nested)]
    pub index: IndexConfig,

    /// Number of nearest neighbors to request.
    #[serde(default = "default_smoke_top_k")]
    #[validate(range(min = 1, max = 100))]
    pub top_k: i32,

    /// Expected `kind` metadata value; drives both the server-side filter
    /// (unless `filter_json` is set) and local validation.
    #[serde(default)]
    pub filter_kind: Option<String>,

    /// Raw JSON filter expression sent with the query.
    #[serde(default)]
    pub filter_json: Option<String>,

    /// Delete the inserted vectors at the end of the run.
    #[serde(default)]
    pub cleanup: bool,

    /// Client-side cosine similarity threshold.
    #[serde(default)]
    pub min_similarity: Option<f32>,

    /// Seed for the random vectors; derived from the clock when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_smoke_top_k() -> i32 {
    5
}

impl SmokeConfig {
    pub fn new(index: IndexConfig) -> Self {
        Self {
            aws: AwsConfig::default(),
            index,
            top_k: default_smoke_top_k(),
            filter_kind: None,
            filter_json: None,
            cleanup: false,
            min_similarity: None,
            seed: None,
        }
    }

    /// Run all checks, including parsing the JSON filter.
    pub fn validate_all(&self) -> ProbeResult<()> {
        self.validate()?;
        self.aws.validate_retry().map_err(ProbeError::Config)?;
        self.index.validate_all()?;
        validate_similarity(self.min_similarity).map_err(ProbeError::Config)?;
        self.query_filter()?;
        Ok(())
    }

    /// Non-blank `kind` filter value.
    pub fn filter_kind(&self) -> Option<&str> {
        non_blank(&self.filter_kind)
    }

    /// Filter sent to the service: the JSON expression when present,
    /// otherwise `{"kind": <filter_kind>}`.
    pub fn query_filter(&self) -> ProbeResult<Option<QueryFilter>> {
        if let Some(raw) = non_blank(&self.filter_json) {
            return QueryFilter::from_json_str(raw)
                .map(Some)
                .map_err(|e| ProbeError::Config(format!("invalid JSON filter: {e}")));
        }
        Ok(self
            .filter_kind()
            .map(|kind| QueryFilter::equals(FILTER_KIND_KEY, kind)))
    }

    /// Constraint re-checked locally on the returned hits.
    pub fn expected_metadata(&self) -> Option<MetadataFilter> {
        self.filter_kind()
            .map(|kind| MetadataFilter::new(FILTER_KIND_KEY, kind))
    }
}

/// Configuration for the hybrid (vector + metadata filter) demo.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct HybridConfig {
    #[validate(nested)]
    pub aws: AwsConfig,

    #[validate(nested)]
    pub index: IndexConfig,

    #[serde(default = "default_hybrid_top_k")]
    #[validate(range(min = 1, max = 100))]
    pub top_k: i32,

    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_hybrid_top_k() -> i32 {
    20
}

impl HybridConfig {
    pub fn new(index: IndexConfig) -> Self {
        Self {
            aws: AwsConfig::default(),
            index,
            top_k: default_hybrid_top_k(),
            seed: None,
        }
    }

    pub fn validate_all(&self) -> ProbeResult<()> {
        self.validate()?;
        self.aws.validate_retry().map_err(ProbeError::Config)?;
        self.index.validate_all()
    }
}
