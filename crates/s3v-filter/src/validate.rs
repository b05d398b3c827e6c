//! Post-hoc metadata filter validation
//!
//! The filter sent with the query is evaluated server-side. This check
//! re-asserts a reduced form of it (`key == expected`) on the returned
//! hits and reports the offending keys.

use crate::types::{MetadataFilter, ResultSet};

/// Keys of results whose metadata does not satisfy `filter`, in result
/// order.
///
/// An absent filter yields no violations. A result with no metadata, or
/// without the filter key, is a violation. The caller decides whether a
/// non-empty list is fatal.
pub fn validate_metadata_filter(
    results: &ResultSet,
    filter: Option<&MetadataFilter>,
) -> Vec<String> {
    let Some(filter) = filter else {
        return Vec::new();
    };

    results
        .iter()
        .filter(|hit| !filter.matches(hit))
        .map(|hit| hit.key.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DistanceMetric, SearchResult};

    #[test]
    fn test_reports_mismatched_value() {
        let set = ResultSet::new(
            DistanceMetric::Cosine,
            vec![
                SearchResult::new("a").with_meta("kind", "x"),
                SearchResult::new("b").with_meta("kind", "y"),
            ],
        );
        let filter = MetadataFilter::new("kind", "x");
        assert_eq!(validate_metadata_filter(&set, Some(&filter)), vec!["b"]);
    }

    #[test]
    fn test_missing_key_and_missing_metadata_are_violations() {
        let set = ResultSet::new(
            DistanceMetric::Cosine,
            vec![
                SearchResult::new("no-meta"),
                SearchResult::new("other-key").with_meta("n", "1"),
                SearchResult::new("ok").with_meta("kind", "smoke"),
            ],
        );
        let filter = MetadataFilter::new("kind", "smoke");
        assert_eq!(
            validate_metadata_filter(&set, Some(&filter)),
            vec!["no-meta", "other-key"]
        );
    }

    #[test]
    fn test_type_mismatch_is_violation() {
        let set = ResultSet::new(
            DistanceMetric::Cosine,
            vec![SearchResult::new("a").with_meta("n", 1.0)],
        );
        let filter = MetadataFilter::new("n", "1");
        assert_eq!(validate_metadata_filter(&set, Some(&filter)), vec!["a"]);
    }

    #[test]
    fn test_no_filter_no_violations() {
        let set = ResultSet::new(
            DistanceMetric::Euclidean,
            vec![SearchResult::new("a"), SearchResult::new("b").with_meta("kind", "y")],
        );
        assert!(validate_metadata_filter(&set, None).is_empty());
    }

    #[test]
    fn test_input_not_mutated() {
        let set = ResultSet::new(
            DistanceMetric::Cosine,
            vec![SearchResult::new("a").with_meta("kind", "y")],
        );
        let before = set.clone();
        let _ = validate_metadata_filter(&set, Some(&MetadataFilter::new("kind", "x")));
        assert_eq!(set, before);
    }
}
