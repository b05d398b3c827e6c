//! Conversions between SDK `Document`s, JSON, and result metadata

use aws_smithy_types::{Document, Number};
use s3v_filter::{Metadata, MetadataValue};
use std::collections::HashMap;
use tracing::trace;

/// Convert a `serde_json::Value` into an S3 Vectors `Document`.
pub fn json_to_document(value: &serde_json::Value) -> Document {
    match value {
        serde_json::Value::Null => Document::Null,
        serde_json::Value::Bool(b) => Document::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Document::Number(Number::PosInt(u))
            } else if let Some(i) = n.as_i64() {
                Document::Number(Number::NegInt(i))
            } else if let Some(f) = n.as_f64() {
                Document::Number(Number::Float(f))
            } else {
                Document::String(n.to_string())
            }
        }
        serde_json::Value::String(s) => Document::String(s.clone()),
        serde_json::Value::Array(arr) => Document::Array(arr.iter().map(json_to_document).collect()),
        serde_json::Value::Object(obj) => Document::Object(
            obj.iter()
                .map(|(k, v)| (k.clone(), json_to_document(v)))
                .collect(),
        ),
    }
}

/// Convert one metadata value into a `Document`.
pub fn metadata_value_to_document(value: &MetadataValue) -> Document {
    match value {
        MetadataValue::String(s) => Document::String(s.clone()),
        MetadataValue::Bool(b) => Document::Bool(*b),
        MetadataValue::Number(n) => Document::Number(Number::Float(*n)),
        MetadataValue::List(items) => {
            Document::Array(items.iter().map(metadata_value_to_document).collect())
        }
    }
}

/// Convert vector metadata into the `Document` object sent with `PutVectors`.
pub fn metadata_to_document(metadata: &Metadata) -> Document {
    let map: HashMap<String, Document> = metadata
        .iter()
        .map(|(k, v)| (k.clone(), metadata_value_to_document(v)))
        .collect();
    Document::Object(map)
}

/// Convert a returned `Document` value into a metadata value.
///
/// `null` and nested objects have no scalar representation and yield
/// `None`; list elements that cannot be represented are dropped.
pub fn document_to_metadata_value(doc: &Document) -> Option<MetadataValue> {
    match doc {
        Document::String(s) => Some(MetadataValue::String(s.clone())),
        Document::Bool(b) => Some(MetadataValue::Bool(*b)),
        Document::Number(n) => Some(MetadataValue::Number(n.to_f64_lossy())),
        Document::Array(items) => Some(MetadataValue::List(
            items.iter().filter_map(document_to_metadata_value).collect(),
        )),
        _ => None,
    }
}

/// Convert the metadata `Document` returned for a hit.
///
/// Anything other than a top-level object is treated as "no metadata".
pub fn document_to_metadata(doc: &Document) -> Option<Metadata> {
    let Document::Object(map) = doc else {
        trace!(?doc, "Ignoring non-object metadata document");
        return None;
    };
    let metadata = map
        .iter()
        .filter_map(|(k, v)| match document_to_metadata_value(v) {
            Some(value) => Some((k.clone(), value)),
            None => {
                trace!(key = %k, "Skipping non-scalar metadata value");
                None
            }
        })
        .collect();
    Some(metadata)
}
