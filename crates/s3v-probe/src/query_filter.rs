//! Server-side metadata filter expressions
//!
//! S3 Vectors accepts a JSON-like filter document with the query, e.g.
//!
//! ```json
//! {"$and": [{"category": {"$eq": "apples"}}, {"origin": {"$in": ["NL", "DE"]}}]}
//! ```
//!
//! [`QueryFilter`] holds such an expression as JSON and converts it to the
//! SDK `Document` right before the call.

use crate::document::json_to_document;
use aws_smithy_types::Document;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A filter expression sent with `QueryVectors`.
///
/// Always a JSON object at the top level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Value", into = "serde_json::Value")]
pub struct QueryFilter(serde_json::Value);

impl QueryFilter {
    /// `{"<key>": <value>}` (implicit equality)
    pub fn equals(key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        let mut map = serde_json::Map::new();
        map.insert(key.into(), value.into());
        Self(serde_json::Value::Object(map))
    }

    /// `{"<key>": {"$eq": <value>}}`
    pub fn field_eq(key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self::operator(key, "$eq", value.into())
    }

    /// `{"<key>": {"$in": [<values>...]}}`
    pub fn one_of<I, V>(key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<serde_json::Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        Self::operator(key, "$in", serde_json::Value::Array(values))
    }

    /// `{"$and": [<filters>...]}`
    pub fn and(filters: impl IntoIterator<Item = QueryFilter>) -> Self {
        let clauses = filters.into_iter().map(|f| f.0).collect();
        Self::equals("$and", serde_json::Value::Array(clauses))
    }

    /// Parse a filter from JSON text. The top level must be an object.
    pub fn from_json_str(raw: &str) -> Result<Self, String> {
        let value: serde_json::Value = serde_json::from_str(raw).map_err(|e| e.to_string())?;
        Self::try_from(value)
    }

    pub fn as_json(&self) -> &serde_json::Value {
        &self.0
    }

    /// Convert into the SDK document type
    pub fn to_document(&self) -> Document {
        json_to_document(&self.0)
    }

    fn operator(key: impl Into<String>, op: &str, value: serde_json::Value) -> Self {
        let mut inner = serde_json::Map::new();
        inner.insert(op.to_string(), value);
        Self::equals(key, serde_json::Value::Object(inner))
    }
}

impl TryFrom<serde_json::Value> for QueryFilter {
    type Error = String;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        if value.is_object() {
            Ok(Self(value))
        } else {
            Err(format!("filter must be a JSON object, got: {value}"))
        }
    }
}

impl From<QueryFilter> for serde_json::Value {
    fn from(filter: QueryFilter) -> Self {
        filter.0
    }
}

impl fmt::Display for QueryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
