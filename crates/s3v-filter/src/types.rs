//! Result set data model
//!
//! Mirrors the shape of a `QueryVectors` response without depending on
//! the AWS SDK: an ordered list of hits (best match first) plus the
//! distance metric the index scored them with. Metadata is schema-less,
//! so it is kept as a map from caller-defined keys to small scalar values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Metadata attached to a stored vector
pub type Metadata = BTreeMap<String, MetadataValue>;

/// Distance metric reported alongside query results.
///
/// Unknown metric names are preserved verbatim so that guards can name
/// them in error messages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DistanceMetric {
    /// Cosine distance, in `[0, 2]`
    #[default]
    Cosine,
    /// Euclidean (L2) distance
    Euclidean,
    /// Any other metric name returned by the service
    Other(String),
}

impl DistanceMetric {
    /// Wire name of the metric
    pub fn as_str(&self) -> &str {
        match self {
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::Euclidean => "euclidean",
            DistanceMetric::Other(name) => name,
        }
    }

    /// Whether `similarity = 1 - distance` is meaningful for this metric
    pub fn supports_similarity(&self) -> bool {
        matches!(self, DistanceMetric::Cosine)
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceMetric {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(DistanceMetric::from(s))
    }
}

/// Wire names match exactly; `"Cosine"` is not cosine.
impl From<String> for DistanceMetric {
    fn from(s: String) -> Self {
        match s.as_str() {
            "cosine" => DistanceMetric::Cosine,
            "euclidean" => DistanceMetric::Euclidean,
            _ => DistanceMetric::Other(s),
        }
    }
}

impl From<&str> for DistanceMetric {
    fn from(s: &str) -> Self {
        DistanceMetric::from(s.to_string())
    }
}

impl From<DistanceMetric> for String {
    fn from(metric: DistanceMetric) -> Self {
        metric.as_str().to_string()
    }
}

/// A single metadata value.
///
/// S3 Vectors metadata values are strings, numbers, booleans, or lists of
/// those. Equality is strict: `"1"` and `1` are different values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    String(String),
    Number(f64),
    Bool(bool),
    List(Vec<MetadataValue>),
}

impl MetadataValue {
    /// Borrow the value as a string, if it is one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::String(s) => write!(f, "{s:?}"),
            MetadataValue::Number(n) => write!(f, "{n}"),
            MetadataValue::Bool(b) => write!(f, "{b}"),
            MetadataValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        MetadataValue::String(s.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        MetadataValue::String(s)
    }
}

impl From<f64> for MetadataValue {
    fn from(n: f64) -> Self {
        MetadataValue::Number(n)
    }
}

impl From<i64> for MetadataValue {
    fn from(n: i64) -> Self {
        MetadataValue::Number(n as f64)
    }
}

impl From<bool> for MetadataValue {
    fn from(b: bool) -> Self {
        MetadataValue::Bool(b)
    }
}

/// One nearest-neighbor hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Vector key
    pub key: String,
    /// Distance from the query vector; absent when the service did not
    /// return one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
    /// Attached metadata, if requested and present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl SearchResult {
    /// Create a hit with no distance and no metadata
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            distance: None,
            metadata: None,
        }
    }

    /// Set the distance
    pub fn with_distance(mut self, distance: f32) -> Self {
        self.distance = Some(distance);
        self
    }

    /// Add one metadata entry
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata
            .get_or_insert_with(Metadata::new)
            .insert(key.into(), value.into());
        self
    }

    /// `1 - distance`. Only meaningful for cosine-scored results.
    pub fn cosine_similarity(&self) -> Option<f32> {
        self.distance.map(|d| 1.0 - d)
    }

    /// Look up a metadata value by key
    pub fn metadata_value(&self, key: &str) -> Option<&MetadataValue> {
        self.metadata.as_ref()?.get(key)
    }
}

/// Ordered query results plus the metric that produced them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSet {
    pub distance_metric: DistanceMetric,
    pub results: Vec<SearchResult>,
}

impl ResultSet {
    pub fn new(distance_metric: DistanceMetric, results: Vec<SearchResult>) -> Self {
        Self {
            distance_metric,
            results,
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Keys in result order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.results.iter().map(|r| r.key.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SearchResult> {
        self.results.iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a SearchResult;
    type IntoIter = std::slice::Iter<'a, SearchResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

/// Expected `key == value` constraint checked against returned metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataFilter {
    pub key: String,
    pub expected: MetadataValue,
}

impl MetadataFilter {
    pub fn new(key: impl Into<String>, expected: impl Into<MetadataValue>) -> Self {
        Self {
            key: key.into(),
            expected: expected.into(),
        }
    }

    /// Whether a hit carries the expected value under the filter key.
    /// A missing key (or missing metadata) never matches.
    pub fn matches(&self, result: &SearchResult) -> bool {
        result.metadata_value(&self.key) == Some(&self.expected)
    }
}

impl fmt::Display for MetadataFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} == {}", self.key, self.expected)
    }
}
